//! Binary and symbolic representations of Pep/9 instructions.
//!
//! A Pep/9 instruction is either one byte long (a unary instruction,
//! consisting of just the instruction specifier) or three bytes long
//! (the instruction specifier followed by a 16-bit operand
//! specifier, most significant byte first):
//!
//! |Instruction specifier|Operand specifier|
//! |---------------------|-----------------|
//! |       8 bits        |     16 bits     |
//!
//! The low bits of the instruction specifier of a non-unary
//! instruction select the addressing mode.  Most instructions use a
//! three-bit `aaa` field:
//!
//! | aaa | Mode | Name                      |
//! |-----|------|---------------------------|
//! | 000 | i    | Immediate                 |
//! | 001 | d    | Direct                    |
//! | 010 | n    | Indirect                  |
//! | 011 | s    | Stack-relative            |
//! | 100 | sf   | Stack-relative deferred   |
//! | 101 | x    | Indexed                   |
//! | 110 | sx   | Stack-indexed             |
//! | 111 | sfx  | Stack-deferred indexed    |
//!
//! The branch instructions and CALL instead use a one-bit `a` field
//! which allows only immediate (0) and indexed (1) addressing.
//!
//! The table of mnemonics below follows the Pep/9 instruction set as
//! published in Warford, "Computer Systems", fifth edition, Figure
//! 8.2, and is held as data in [`INSTRUCTION_TABLE`].
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

#[cfg(test)]
use test_strategy::proptest;

mod format;

/// Length in bytes of a non-unary instruction.
pub const NONUNARY_WIDTH: usize = 3;

/// Length in bytes of a unary instruction.
pub const UNARY_WIDTH: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AddressingMode {
    Immediate,
    Direct,
    Indirect,
    StackRelative,
    StackRelativeDeferred,
    Indexed,
    StackIndexed,
    StackDeferredIndexed,
}

impl AddressingMode {
    pub const ALL: [AddressingMode; 8] = [
        AddressingMode::Immediate,
        AddressingMode::Direct,
        AddressingMode::Indirect,
        AddressingMode::StackRelative,
        AddressingMode::StackRelativeDeferred,
        AddressingMode::Indexed,
        AddressingMode::StackIndexed,
        AddressingMode::StackDeferredIndexed,
    ];

    /// The three-bit `aaa` field for this mode.
    pub fn aaa_field(&self) -> u8 {
        match self {
            AddressingMode::Immediate => 0,
            AddressingMode::Direct => 1,
            AddressingMode::Indirect => 2,
            AddressingMode::StackRelative => 3,
            AddressingMode::StackRelativeDeferred => 4,
            AddressingMode::Indexed => 5,
            AddressingMode::StackIndexed => 6,
            AddressingMode::StackDeferredIndexed => 7,
        }
    }

    /// The letters used to select this mode in assembly language.
    pub fn suffix(&self) -> &'static str {
        match self {
            AddressingMode::Immediate => "i",
            AddressingMode::Direct => "d",
            AddressingMode::Indirect => "n",
            AddressingMode::StackRelative => "s",
            AddressingMode::StackRelativeDeferred => "sf",
            AddressingMode::Indexed => "x",
            AddressingMode::StackIndexed => "sx",
            AddressingMode::StackDeferredIndexed => "sfx",
        }
    }

    /// Bit mask of this mode within a [`ModeSet`].
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAddressingMode(pub String);

impl Display for UnknownAddressingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an addressing mode", self.0)
    }
}

impl std::error::Error for UnknownAddressingMode {}

impl FromStr for AddressingMode {
    type Err = UnknownAddressingMode;

    fn from_str(s: &str) -> Result<AddressingMode, UnknownAddressingMode> {
        let lower = s.to_ascii_lowercase();
        AddressingMode::ALL
            .into_iter()
            .find(|mode| mode.suffix() == lower)
            .ok_or_else(|| UnknownAddressingMode(s.to_string()))
    }
}

/// A set of addressing modes, used to describe which modes are legal
/// for an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModeSet(u8);

impl ModeSet {
    pub const NONE: ModeSet = ModeSet(0);
    pub const ALL: ModeSet = ModeSet(0xFF);
    pub const IMMEDIATE: ModeSet = ModeSet(AddressingMode::Immediate.bit());
    pub const BRANCH: ModeSet =
        ModeSet(AddressingMode::Immediate.bit() | AddressingMode::Indexed.bit());
    pub const ALL_BUT_IMMEDIATE: ModeSet = ModeSet(0xFF & !AddressingMode::Immediate.bit());
    pub const STRING_OUTPUT: ModeSet = ModeSet(
        AddressingMode::Direct.bit()
            | AddressingMode::Indirect.bit()
            | AddressingMode::StackRelative.bit()
            | AddressingMode::StackRelativeDeferred.bit()
            | AddressingMode::Indexed.bit(),
    );

    pub fn contains(&self, mode: AddressingMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = AddressingMode> + '_ {
        AddressingMode::ALL
            .into_iter()
            .filter(|mode| self.contains(*mode))
    }
}

/// How the addressing mode is folded into the instruction specifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// No operand, no addressing mode.
    Unary,
    /// One-bit `a` field; the mode may be omitted and then defaults
    /// to immediate.
    Branch,
    /// Three-bit `aaa` field; the mode must be given.
    General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Mnemonic {
    Stop,
    Ret,
    Rettr,
    Movspa,
    Movflga,
    Movaflg,
    Nota,
    Notx,
    Nega,
    Negx,
    Asla,
    Aslx,
    Asra,
    Asrx,
    Rola,
    Rolx,
    Rora,
    Rorx,
    Br,
    Brle,
    Brlt,
    Breq,
    Brne,
    Brge,
    Brgt,
    Brv,
    Brc,
    Call,
    Nop0,
    Nop1,
    Nop,
    Deci,
    Deco,
    Hexo,
    Stro,
    Addsp,
    Subsp,
    Adda,
    Addx,
    Suba,
    Subx,
    Anda,
    Andx,
    Ora,
    Orx,
    Cpwa,
    Cpwx,
    Cpba,
    Cpbx,
    Ldwa,
    Ldwx,
    Ldba,
    Ldbx,
    Stwa,
    Stwx,
    Stba,
    Stbx,
}

/// One row of the instruction set table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionInfo {
    pub mnemonic: Mnemonic,
    pub name: &'static str,
    /// Instruction specifier with the addressing-mode field zero.
    pub opcode: u8,
    pub encoding: Encoding,
    pub legal_modes: ModeSet,
}

const fn unary(mnemonic: Mnemonic, name: &'static str, opcode: u8) -> InstructionInfo {
    InstructionInfo {
        mnemonic,
        name,
        opcode,
        encoding: Encoding::Unary,
        legal_modes: ModeSet::NONE,
    }
}

const fn branch(mnemonic: Mnemonic, name: &'static str, opcode: u8) -> InstructionInfo {
    InstructionInfo {
        mnemonic,
        name,
        opcode,
        encoding: Encoding::Branch,
        legal_modes: ModeSet::BRANCH,
    }
}

const fn general(
    mnemonic: Mnemonic,
    name: &'static str,
    opcode: u8,
    legal_modes: ModeSet,
) -> InstructionInfo {
    InstructionInfo {
        mnemonic,
        name,
        opcode,
        encoding: Encoding::General,
        legal_modes,
    }
}

/// The Pep/9 instruction set, in instruction-specifier order.
pub const INSTRUCTION_TABLE: &[InstructionInfo] = &[
    unary(Mnemonic::Stop, "STOP", 0x00),
    unary(Mnemonic::Ret, "RET", 0x01),
    unary(Mnemonic::Rettr, "RETTR", 0x02),
    unary(Mnemonic::Movspa, "MOVSPA", 0x03),
    unary(Mnemonic::Movflga, "MOVFLGA", 0x04),
    unary(Mnemonic::Movaflg, "MOVAFLG", 0x05),
    unary(Mnemonic::Nota, "NOTA", 0x06),
    unary(Mnemonic::Notx, "NOTX", 0x07),
    unary(Mnemonic::Nega, "NEGA", 0x08),
    unary(Mnemonic::Negx, "NEGX", 0x09),
    unary(Mnemonic::Asla, "ASLA", 0x0A),
    unary(Mnemonic::Aslx, "ASLX", 0x0B),
    unary(Mnemonic::Asra, "ASRA", 0x0C),
    unary(Mnemonic::Asrx, "ASRX", 0x0D),
    unary(Mnemonic::Rola, "ROLA", 0x0E),
    unary(Mnemonic::Rolx, "ROLX", 0x0F),
    unary(Mnemonic::Rora, "RORA", 0x10),
    unary(Mnemonic::Rorx, "RORX", 0x11),
    branch(Mnemonic::Br, "BR", 0x12),
    branch(Mnemonic::Brle, "BRLE", 0x14),
    branch(Mnemonic::Brlt, "BRLT", 0x16),
    branch(Mnemonic::Breq, "BREQ", 0x18),
    branch(Mnemonic::Brne, "BRNE", 0x1A),
    branch(Mnemonic::Brge, "BRGE", 0x1C),
    branch(Mnemonic::Brgt, "BRGT", 0x1E),
    branch(Mnemonic::Brv, "BRV", 0x20),
    branch(Mnemonic::Brc, "BRC", 0x22),
    branch(Mnemonic::Call, "CALL", 0x24),
    unary(Mnemonic::Nop0, "NOP0", 0x26),
    unary(Mnemonic::Nop1, "NOP1", 0x27),
    general(Mnemonic::Nop, "NOP", 0x28, ModeSet::IMMEDIATE),
    general(Mnemonic::Deci, "DECI", 0x30, ModeSet::ALL_BUT_IMMEDIATE),
    general(Mnemonic::Deco, "DECO", 0x38, ModeSet::ALL),
    general(Mnemonic::Hexo, "HEXO", 0x40, ModeSet::ALL),
    general(Mnemonic::Stro, "STRO", 0x48, ModeSet::STRING_OUTPUT),
    general(Mnemonic::Addsp, "ADDSP", 0x50, ModeSet::ALL),
    general(Mnemonic::Subsp, "SUBSP", 0x58, ModeSet::ALL),
    general(Mnemonic::Adda, "ADDA", 0x60, ModeSet::ALL),
    general(Mnemonic::Addx, "ADDX", 0x68, ModeSet::ALL),
    general(Mnemonic::Suba, "SUBA", 0x70, ModeSet::ALL),
    general(Mnemonic::Subx, "SUBX", 0x78, ModeSet::ALL),
    general(Mnemonic::Anda, "ANDA", 0x80, ModeSet::ALL),
    general(Mnemonic::Andx, "ANDX", 0x88, ModeSet::ALL),
    general(Mnemonic::Ora, "ORA", 0x90, ModeSet::ALL),
    general(Mnemonic::Orx, "ORX", 0x98, ModeSet::ALL),
    general(Mnemonic::Cpwa, "CPWA", 0xA0, ModeSet::ALL),
    general(Mnemonic::Cpwx, "CPWX", 0xA8, ModeSet::ALL),
    general(Mnemonic::Cpba, "CPBA", 0xB0, ModeSet::ALL),
    general(Mnemonic::Cpbx, "CPBX", 0xB8, ModeSet::ALL),
    general(Mnemonic::Ldwa, "LDWA", 0xC0, ModeSet::ALL),
    general(Mnemonic::Ldwx, "LDWX", 0xC8, ModeSet::ALL),
    general(Mnemonic::Ldba, "LDBA", 0xD0, ModeSet::ALL),
    general(Mnemonic::Ldbx, "LDBX", 0xD8, ModeSet::ALL),
    general(Mnemonic::Stwa, "STWA", 0xE0, ModeSet::ALL_BUT_IMMEDIATE),
    general(Mnemonic::Stwx, "STWX", 0xE8, ModeSet::ALL_BUT_IMMEDIATE),
    general(Mnemonic::Stba, "STBA", 0xF0, ModeSet::ALL_BUT_IMMEDIATE),
    general(Mnemonic::Stbx, "STBX", 0xF8, ModeSet::ALL_BUT_IMMEDIATE),
];

impl Mnemonic {
    pub fn info(&self) -> &'static InstructionInfo {
        match INSTRUCTION_TABLE.iter().find(|row| row.mnemonic == *self) {
            Some(row) => row,
            None => unreachable!("every mnemonic has a row in INSTRUCTION_TABLE"),
        }
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn is_unary(&self) -> bool {
        self.info().encoding == Encoding::Unary
    }

    /// Number of bytes the instruction occupies in memory.
    pub fn width(&self) -> usize {
        if self.is_unary() {
            UNARY_WIDTH
        } else {
            NONUNARY_WIDTH
        }
    }

    /// The addressing mode assumed when the programmer gives none, if
    /// the instruction permits the mode to be omitted.
    pub fn default_mode(&self) -> Option<AddressingMode> {
        match self.info().encoding {
            Encoding::Branch => Some(AddressingMode::Immediate),
            Encoding::Unary | Encoding::General => None,
        }
    }

    pub fn allows(&self, mode: AddressingMode) -> bool {
        self.info().legal_modes.contains(mode)
    }

    /// Compute the instruction specifier for this mnemonic used with
    /// `mode`.  Returns `None` if the mode is not legal.
    pub fn instruction_specifier(&self, mode: Option<AddressingMode>) -> Option<u8> {
        let info = self.info();
        match (info.encoding, mode) {
            (Encoding::Unary, None) => Some(info.opcode),
            (Encoding::Unary, Some(_)) => None,
            (_, None) => None,
            (Encoding::Branch, Some(m)) if self.allows(m) => match m {
                AddressingMode::Indexed => Some(info.opcode | 1),
                _ => Some(info.opcode),
            },
            (Encoding::General, Some(m)) if self.allows(m) => Some(info.opcode | m.aaa_field()),
            (_, Some(_)) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMnemonic(pub String);

impl Display for UnknownMnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a Pep/9 mnemonic", self.0)
    }
}

impl std::error::Error for UnknownMnemonic {}

impl FromStr for Mnemonic {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Mnemonic, UnknownMnemonic> {
        INSTRUCTION_TABLE
            .iter()
            .find(|row| row.name.eq_ignore_ascii_case(s))
            .map(|row| row.mnemonic)
            .ok_or_else(|| UnknownMnemonic(s.to_string()))
    }
}

/// Encode an instruction into its bytes.  Returns `None` if the
/// addressing mode is not legal for the mnemonic.
pub fn encode(mnemonic: Mnemonic, mode: Option<AddressingMode>, operand: u16) -> Option<Vec<u8>> {
    let specifier = mnemonic.instruction_specifier(mode)?;
    if mnemonic.is_unary() {
        Some(vec![specifier])
    } else {
        let [hi, lo] = operand.to_be_bytes();
        Some(vec![specifier, hi, lo])
    }
}

#[test]
fn test_table_is_in_specifier_order() {
    for pair in INSTRUCTION_TABLE.windows(2) {
        assert!(
            pair[0].opcode < pair[1].opcode,
            "{} should precede {}",
            pair[0].name,
            pair[1].name
        );
    }
}

#[test]
fn test_mnemonic_lookup_ignores_case() {
    assert_eq!("ldwa".parse::<Mnemonic>(), Ok(Mnemonic::Ldwa));
    assert_eq!("LdWa".parse::<Mnemonic>(), Ok(Mnemonic::Ldwa));
    assert_eq!(
        "LDA".parse::<Mnemonic>(),
        Err(UnknownMnemonic("LDA".to_string()))
    );
}

#[test]
fn test_addressing_mode_lookup() {
    assert_eq!("sfx".parse::<AddressingMode>(), Ok(AddressingMode::StackDeferredIndexed));
    assert_eq!("SF".parse::<AddressingMode>(), Ok(AddressingMode::StackRelativeDeferred));
    assert!("q".parse::<AddressingMode>().is_err());
}

#[test]
fn test_encode_scenario() {
    assert_eq!(
        encode(Mnemonic::Ldwa, Some(AddressingMode::Immediate), 5),
        Some(vec![0xC0, 0x00, 0x05])
    );
    assert_eq!(
        encode(Mnemonic::Br, Some(AddressingMode::Immediate), 0),
        Some(vec![0x12, 0x00, 0x00])
    );
    assert_eq!(
        encode(Mnemonic::Br, Some(AddressingMode::Indexed), 0x1234),
        Some(vec![0x13, 0x12, 0x34])
    );
    assert_eq!(encode(Mnemonic::Stop, None, 0), Some(vec![0x00]));
    assert_eq!(
        encode(Mnemonic::Stwa, Some(AddressingMode::StackIndexed), 2),
        Some(vec![0xE6, 0x00, 0x02])
    );
}

#[test]
fn test_illegal_modes_are_rejected() {
    assert_eq!(encode(Mnemonic::Stwa, Some(AddressingMode::Immediate), 0), None);
    assert_eq!(encode(Mnemonic::Br, Some(AddressingMode::Direct), 0), None);
    assert_eq!(encode(Mnemonic::Stop, Some(AddressingMode::Immediate), 0), None);
    assert_eq!(encode(Mnemonic::Ldwa, None, 0), None);
    assert_eq!(Mnemonic::Br.default_mode(), Some(AddressingMode::Immediate));
    assert_eq!(Mnemonic::Ldwa.default_mode(), None);
}

#[cfg(test)]
#[proptest]
fn general_specifier_carries_mode(#[strategy(0usize..8)] mode_index: usize) {
    let mode = AddressingMode::ALL[mode_index];
    let specifier = Mnemonic::Ldwa
        .instruction_specifier(Some(mode))
        .expect("LDWA allows every mode");
    assert_eq!(specifier & 0x07, mode.aaa_field());
    assert_eq!(specifier & 0xF8, 0xC0);
}
