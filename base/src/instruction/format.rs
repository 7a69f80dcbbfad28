/// Human-oriented formatting for instructions (or parts of instructions).
use std::fmt::{self, Display, Formatter};

use super::{AddressingMode, InstructionInfo, Mnemonic, ModeSet};

/// Mnemonics are shown in upper case, as in the assembler listing.
impl Display for Mnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

/// Addressing modes are shown as the suffix used to select them.
impl Display for AddressingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(self.suffix())
    }
}

/// Render a set of modes the way the textbook does, for example
/// `{i, x}`.
impl Display for ModeSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str("{")?;
        for (i, mode) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{mode}")?;
        }
        f.write_str("}")
    }
}

impl Display for InstructionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:02X} {}", self.opcode, self.name)?;
        if self.legal_modes != ModeSet::NONE {
            write!(f, " {}", self.legal_modes)?;
        }
        Ok(())
    }
}

#[test]
fn test_display_mode_set() {
    assert_eq!(ModeSet::BRANCH.to_string(), "{i, x}");
    assert_eq!(ModeSet::NONE.to_string(), "{}");
    assert_eq!(
        ModeSet::STRING_OUTPUT.to_string(),
        "{d, n, s, sf, x}"
    );
}

#[test]
fn test_display_instruction_info() {
    assert_eq!(Mnemonic::Stop.info().to_string(), "00 STOP");
    assert_eq!(Mnemonic::Call.info().to_string(), "24 CALL {i, x}");
    assert_eq!(Mnemonic::Ldwa.to_string(), "LDWA");
    assert_eq!(AddressingMode::StackIndexed.to_string(), "sx");
}
