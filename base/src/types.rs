/// Pep/9 has a 16-bit address space.  Addresses are unsigned and all
/// address arithmetic wraps modulo 0x10000, in the same way the
/// machine's own adder does when it computes an effective address.
use std::fmt::{self, Debug, Display, Formatter, UpperHex};

use serde::Serialize;

#[cfg(test)]
use test_strategy::Arbitrary;

/// The `IndexBy` trait implements address arithmetic (adding a signed
/// or unsigned value to an address).
///
/// Indexing wraps.  This is also the behaviour we need when a program
/// is relocated by a negative delta (for example when undoing an
/// earlier relocation).
pub trait IndexBy<T> {
    fn index_by(&self, delta: T) -> Address;
}

#[cfg_attr(test, derive(Arbitrary))]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(u16);

impl Address {
    pub const ZERO: Address = Address(0);
    pub const MAX: Address = Address(u16::MAX);

    /// Number of addressable bytes.
    pub const SPACE: usize = 1 << 16;

    pub const fn new(a: u16) -> Address {
        Address(a)
    }

    /// Offset of this address from `base`, treating the address space
    /// as a ring.
    pub fn offset_from(&self, base: Address) -> u16 {
        self.0.wrapping_sub(base.0)
    }

    /// Returns the address `n` bytes further on, or `None` if that
    /// would run off the top of memory.  Unlike `index_by`, this does
    /// not wrap; the assembler uses it to detect programs which are
    /// too large.
    pub fn checked_add(&self, n: usize) -> Option<Address> {
        let end = usize::from(self.0).checked_add(n)?;
        u16::try_from(end).ok().map(Address)
    }
}

impl IndexBy<i32> for Address {
    fn index_by(&self, delta: i32) -> Address {
        // Truncation to 16 bits is the wrapping we want.
        Address(self.0.wrapping_add(delta as u16))
    }
}

impl IndexBy<u16> for Address {
    fn index_by(&self, delta: u16) -> Address {
        Address(self.0.wrapping_add(delta))
    }
}

impl From<u16> for Address {
    fn from(a: u16) -> Address {
        Address(a)
    }
}

impl From<Address> for u16 {
    fn from(a: Address) -> u16 {
        a.0
    }
}

impl From<Address> for usize {
    fn from(a: Address) -> usize {
        usize::from(a.0)
    }
}

impl From<Address> for i32 {
    fn from(a: Address) -> i32 {
        i32::from(a.0)
    }
}

impl TryFrom<usize> for Address {
    type Error = std::num::TryFromIntError;

    fn try_from(n: usize) -> Result<Address, Self::Error> {
        u16::try_from(n).map(Address)
    }
}

/// Addresses are conventionally shown as four hex digits, which is
/// how they appear in the assembler listing.
impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{:04X})", self.0)
    }
}

impl UpperHex for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        UpperHex::fmt(&self.0, f)
    }
}

#[test]
fn test_address_display() {
    assert_eq!(Address::new(0x1A).to_string(), "001A");
    assert_eq!(Address::MAX.to_string(), "FFFF");
    assert_eq!(format!("{:?}", Address::new(3)), "Address(0x0003)");
}

#[test]
fn test_address_index_by_wraps() {
    assert_eq!(Address::MAX.index_by(1_i32), Address::ZERO);
    assert_eq!(Address::ZERO.index_by(-1_i32), Address::MAX);
    assert_eq!(Address::new(0x1000).index_by(0x10_u16), Address::new(0x1010));
}

#[test]
fn test_address_checked_add() {
    assert_eq!(
        Address::new(0xFFFE).checked_add(1),
        Some(Address::new(0xFFFF))
    );
    assert_eq!(Address::new(0xFFFE).checked_add(2), None);
    assert_eq!(Address::ZERO.checked_add(0), Some(Address::ZERO));
}
