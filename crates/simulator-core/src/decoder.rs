//! Mask/match decode dispatch.
//!
//! Formats are tried in registration order and the first description with
//! `encoding & mask == match` claims the word. Tables therefore list narrow
//! masks before broader ones sharing an opcode; see
//! [`IsaTable::dispatch_conflicts`].

use crate::fault::SimulationError;
use crate::isa::{InstDescription, Instruction, IsaTable};

/// Decoder over one instruction table.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    table: &'a IsaTable,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder for `table`.
    #[must_use]
    pub const fn new(table: &'a IsaTable) -> Self {
        Self { table }
    }

    /// Returns the first description claiming `encoding`.
    #[must_use]
    pub fn lookup(&self, encoding: u32) -> Option<&'a InstDescription> {
        self.table
            .descriptions()
            .iter()
            .find(|desc| desc.matches(encoding))
    }

    /// Decodes `encoding` fetched from `address`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::IllegalInstruction`] when no description
    /// claims the word.
    pub fn decode(&self, address: u32, encoding: u32) -> Result<Instruction, SimulationError> {
        let desc = self
            .lookup(encoding)
            .ok_or(SimulationError::IllegalInstruction { address, encoding })?;
        Ok(desc.decode(address, encoding)?)
    }
}

impl IsaTable {
    /// Decodes `encoding` with this table; see [`Decoder::decode`].
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::IllegalInstruction`] when no description
    /// claims the word.
    pub fn decode(&self, address: u32, encoding: u32) -> Result<Instruction, SimulationError> {
        Decoder::new(self).decode(address, encoding)
    }
}
