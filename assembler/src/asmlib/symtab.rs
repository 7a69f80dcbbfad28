use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{event, Level};

use base::prelude::*;

use super::symbol::SymbolName;
use super::types::LineNumber;

/// How a symbol got its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolDefinition {
    /// The symbol labels a location, so it moves when the program is
    /// placed by `.BURN`.
    Address,
    /// The symbol was defined by `.EQUATE` and never moves.
    Equate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolTableEntry {
    pub name: SymbolName,
    pub value: u16,
    pub defined: bool,
    pub multiply_defined: bool,
    pub definition: SymbolDefinition,
    /// The first line on which the symbol was defined, or (for a
    /// symbol which is used but never defined) first used.
    pub line: LineNumber,
}

impl SymbolTableEntry {
    pub fn is_relocatable(&self) -> bool {
        self.definition == SymbolDefinition::Address
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DuplicateDefinition {
    pub(crate) first_line: LineNumber,
}

/// Symbols are kept in name order, which is the order in which the
/// listing shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: BTreeMap<SymbolName, SymbolTableEntry>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a definition of `name`.  A second definition leaves the
    /// first value in place but marks the entry as multiply defined.
    pub(crate) fn define(
        &mut self,
        name: SymbolName,
        value: u16,
        definition: SymbolDefinition,
        line: LineNumber,
    ) -> Result<(), DuplicateDefinition> {
        match self.entries.get_mut(&name) {
            Some(entry) if entry.defined => {
                event!(
                    Level::DEBUG,
                    "symbol {name} defined again at line {line} (first at line {})",
                    entry.line
                );
                entry.multiply_defined = true;
                Err(DuplicateDefinition {
                    first_line: entry.line,
                })
            }
            Some(entry) => {
                entry.value = value;
                entry.defined = true;
                entry.definition = definition;
                entry.line = line;
                Ok(())
            }
            None => {
                self.entries.insert(
                    name.clone(),
                    SymbolTableEntry {
                        name,
                        value,
                        defined: true,
                        multiply_defined: false,
                        definition,
                        line,
                    },
                );
                Ok(())
            }
        }
    }

    /// Note a use of a symbol which has no definition, so that the
    /// table can report it.
    pub(crate) fn note_undefined(&mut self, name: &SymbolName, line: LineNumber) {
        self.entries
            .entry(name.clone())
            .or_insert_with(|| SymbolTableEntry {
                name: name.clone(),
                value: 0,
                defined: false,
                multiply_defined: false,
                definition: SymbolDefinition::Address,
                line,
            });
    }

    pub fn get(&self, name: &SymbolName) -> Option<&SymbolTableEntry> {
        self.entries.get(name)
    }

    /// The value of a defined symbol.
    pub fn value_of(&self, name: &SymbolName) -> Option<u16> {
        self.get(name)
            .filter(|entry| entry.defined)
            .map(|entry| entry.value)
    }

    /// Give the address symbol defined on `line` its final address.
    /// `.EQUATE` symbols, and later (duplicate) definitions of a
    /// symbol, are left alone.
    pub(crate) fn place(&mut self, name: &SymbolName, line: LineNumber, address: Address) {
        if let Some(entry) = self.entries.get_mut(name) {
            if entry.defined && entry.is_relocatable() && entry.line == line {
                entry.value = u16::from(address);
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &SymbolTableEntry> {
        self.entries.values()
    }

    pub fn defined_entries(&self) -> impl Iterator<Item = &SymbolTableEntry> {
        self.entries().filter(|entry| entry.defined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let mut symtab = SymbolTable::new();
        assert!(symtab.is_empty());
        assert_eq!(
            symtab.define(SymbolName::from("main"), 3, SymbolDefinition::Address, 1),
            Ok(())
        );
        assert_eq!(symtab.value_of(&SymbolName::from("main")), Some(3));
        assert_eq!(symtab.value_of(&SymbolName::from("MAIN")), None);
    }

    #[test]
    fn test_duplicate_keeps_first_value() {
        let mut symtab = SymbolTable::new();
        let name = SymbolName::from("START");
        assert!(symtab
            .define(name.clone(), 0, SymbolDefinition::Address, 1)
            .is_ok());
        assert_eq!(
            symtab.define(name.clone(), 3, SymbolDefinition::Address, 2),
            Err(DuplicateDefinition { first_line: 1 })
        );
        let entry = symtab.get(&name).expect("START should be in the table");
        assert_eq!(entry.value, 0);
        assert!(entry.multiply_defined);
    }

    #[test]
    fn test_undefined_symbols_have_no_value() {
        let mut symtab = SymbolTable::new();
        let name = SymbolName::from("nowhere");
        symtab.note_undefined(&name, 4);
        assert_eq!(symtab.value_of(&name), None);
        assert_eq!(symtab.defined_entries().count(), 0);
        assert_eq!(symtab.entries().count(), 1);
    }

    #[test]
    fn test_place_skips_equates_and_duplicates() {
        let mut symtab = SymbolTable::new();
        let here = SymbolName::from("loop");
        let truth = SymbolName::from("TRUE");
        assert!(symtab
            .define(here.clone(), 0x10, SymbolDefinition::Address, 1)
            .is_ok());
        assert!(symtab
            .define(truth.clone(), 1, SymbolDefinition::Equate, 2)
            .is_ok());
        assert!(symtab
            .define(here.clone(), 0x20, SymbolDefinition::Address, 3)
            .is_err());
        symtab.place(&here, 1, Address::new(0x110));
        symtab.place(&truth, 2, Address::new(0x200));
        assert_eq!(symtab.value_of(&here), Some(0x110));
        assert_eq!(symtab.value_of(&truth), Some(1));
        symtab.place(&here, 3, Address::new(0x300));
        assert_eq!(symtab.value_of(&here), Some(0x110));
    }
}
