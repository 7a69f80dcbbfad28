//! The `base` crate defines the Pep/9-related things which are useful
//! in both an assembler and other associated tools (a simulator, or
//! a front end which shows memory).  The idea is that if you want to
//! write a loader, it would depend on the base crate but would not
//! need to depend on the assembler library itself.

mod types;

pub mod charset;
pub mod instruction;
pub mod memory;
pub mod prelude;
