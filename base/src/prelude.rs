//! The prelude exports a number of structs which are useful in
//! representing things to do with Pep/9.  Providing this prelude
//! is the main purpose of the base crate.
pub use super::charset::{decode_escapes, EscapeError};
pub use super::instruction::*;
pub use super::memory::{MemoryError, MemoryImage, MemorySummary};
pub use super::types::IndexBy;
pub use super::types::*;
