//! A Pep/9 memory image.
//!
//! The image is the whole 64 KiB address space.  An operating system
//! is installed into the top of memory and the region from its start
//! address upwards is treated as ROM: later loads (of user programs)
//! may not write into it.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use super::types::{Address, IndexBy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The block would run off the top of the address space.
    DoesNotFit { start: Address, len: usize },
    /// The block overlaps the installed operating system.
    OverlapsRom {
        start: Address,
        len: usize,
        rom_start: Address,
    },
}

impl Display for MemoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            MemoryError::DoesNotFit { start, len } => write!(
                f,
                "{len} bytes loaded at {start} would run past the end of memory"
            ),
            MemoryError::OverlapsRom {
                start,
                len,
                rom_start,
            } => write!(
                f,
                "{len} bytes loaded at {start} would overwrite the operating system, which starts at {rom_start}"
            ),
        }
    }
}

impl Error for MemoryError {}

/// A summary of what is loaded, suitable for handing to a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    pub rom_start: Option<Address>,
    pub user_program: Option<(Address, usize)>,
}

#[derive(Clone)]
pub struct MemoryImage {
    bytes: Box<[u8]>,
    rom_start: Option<Address>,
    user_program: Option<(Address, usize)>,
}

impl Default for MemoryImage {
    fn default() -> MemoryImage {
        MemoryImage::new()
    }
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("rom_start", &self.rom_start)
            .field("user_program", &self.user_program)
            .finish_non_exhaustive()
    }
}

fn check_fits(start: Address, len: usize) -> Result<(), MemoryError> {
    // The last byte of the block is at start + len - 1.
    if len == 0 || start.checked_add(len - 1).is_some() {
        Ok(())
    } else {
        Err(MemoryError::DoesNotFit { start, len })
    }
}

impl MemoryImage {
    pub fn new() -> MemoryImage {
        MemoryImage {
            bytes: vec![0_u8; Address::SPACE].into_boxed_slice(),
            rom_start: None,
            user_program: None,
        }
    }

    pub fn rom_start(&self) -> Option<Address> {
        self.rom_start
    }

    pub fn user_program(&self) -> Option<(Address, usize)> {
        self.user_program
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            rom_start: self.rom_start,
            user_program: self.user_program,
        }
    }

    pub fn is_rom(&self, addr: Address) -> bool {
        matches!(self.rom_start, Some(rom) if addr >= rom)
    }

    fn copy_in(&mut self, start: Address, data: &[u8]) {
        let begin = usize::from(start);
        self.bytes[begin..begin + data.len()].copy_from_slice(data);
    }

    /// Install an operating system image.  Any previously installed
    /// operating system is replaced, and everything from `start` to the
    /// top of memory becomes ROM.
    pub fn install_rom(&mut self, start: Address, data: &[u8]) -> Result<(), MemoryError> {
        check_fits(start, data.len())?;
        if let Some(old) = self.rom_start {
            let begin = usize::from(old);
            self.bytes[begin..].fill(0);
        }
        self.copy_in(start, data);
        self.rom_start = Some(start);
        Ok(())
    }

    /// Load a user program.  The program may not overlap the
    /// operating system, if one is installed.
    pub fn load(&mut self, start: Address, data: &[u8]) -> Result<(), MemoryError> {
        check_fits(start, data.len())?;
        if let Some(rom_start) = self.rom_start {
            let end = usize::from(start) + data.len();
            if !data.is_empty() && end > usize::from(rom_start) {
                return Err(MemoryError::OverlapsRom {
                    start,
                    len: data.len(),
                    rom_start,
                });
            }
        }
        self.copy_in(start, data);
        self.user_program = Some((start, data.len()));
        Ok(())
    }

    pub fn read_byte(&self, addr: Address) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Words are big-endian and the second byte wraps round to
    /// address zero.
    pub fn read_word(&self, addr: Address) -> u16 {
        let hi = self.read_byte(addr);
        let lo = self.read_byte(addr.index_by(1_u16));
        u16::from_be_bytes([hi, lo])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_read() {
        let mut mem = MemoryImage::new();
        mem.load(Address::new(0x10), &[0x12, 0x34, 0x56])
            .expect("load should succeed");
        assert_eq!(mem.read_byte(Address::new(0x10)), 0x12);
        assert_eq!(mem.read_word(Address::new(0x11)), 0x3456);
        assert_eq!(mem.user_program(), Some((Address::new(0x10), 3)));
    }

    #[test]
    fn test_load_past_end() {
        let mut mem = MemoryImage::new();
        assert_eq!(
            mem.load(Address::new(0xFFFF), &[1, 2]),
            Err(MemoryError::DoesNotFit {
                start: Address::new(0xFFFF),
                len: 2
            })
        );
        assert!(mem.load(Address::new(0xFFFE), &[1, 2]).is_ok());
    }

    #[test]
    fn test_rom_is_protected() {
        let mut mem = MemoryImage::new();
        mem.install_rom(Address::new(0xFC00), &[0xAA; 0x400])
            .expect("OS should fit");
        assert!(mem.is_rom(Address::new(0xFFFF)));
        assert!(!mem.is_rom(Address::new(0xFBFF)));
        assert!(mem.load(Address::new(0xFBFE), &[0, 0]).is_ok());
        assert!(matches!(
            mem.load(Address::new(0xFBFF), &[0, 0]),
            Err(MemoryError::OverlapsRom { .. })
        ));
        assert_eq!(mem.read_byte(Address::new(0xFC00)), 0xAA);
    }

    #[test]
    fn test_reinstall_clears_old_rom() {
        let mut mem = MemoryImage::new();
        mem.install_rom(Address::new(0xFF00), &[0x11; 0x100])
            .expect("OS should fit");
        mem.install_rom(Address::new(0xFFF0), &[0x22; 0x10])
            .expect("OS should fit");
        assert_eq!(mem.read_byte(Address::new(0xFF00)), 0);
        assert_eq!(mem.read_byte(Address::new(0xFFF0)), 0x22);
        assert_eq!(mem.rom_start(), Some(Address::new(0xFFF0)));
    }
}
