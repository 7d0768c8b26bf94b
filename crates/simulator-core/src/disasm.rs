//! Disassembly of memory images into listing rows.

use crate::decoder::Decoder;
use crate::isa::{DisplayOptions, IsaTable};
use crate::memory::{combine_cells, Cell};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One disassembled instruction or undecodable cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the first cell.
    pub address: u32,
    /// Number of cells covered by this row.
    pub cells: u32,
    /// Raw word (a single cell for undecodable data).
    pub encoding: u32,
    /// Mnemonic, or `None` when no format claims the word.
    pub mnemonic: Option<String>,
    /// Rendered text (`data 0x..` for undecodable cells).
    pub text: String,
}

impl DisassemblyRow {
    /// Returns `true` when no format claimed this row.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        self.mnemonic.is_none()
    }
}

/// Disassembles `cells` loaded at `base`.
///
/// Cells that do not start a decodable instruction are emitted one per row
/// as data, and decoding resumes at the next cell.
#[must_use]
pub fn disassemble(
    table: &IsaTable,
    base: u32,
    cells: &[Cell],
    options: DisplayOptions,
) -> Vec<DisassemblyRow> {
    let decoder = Decoder::new(table);
    let width = usize::try_from(table.instruction_cells()).unwrap_or(1).max(1);
    let mut rows = Vec::new();
    let mut offset = 0;
    while offset < cells.len() {
        let address = base.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX));
        let decoded = cells.get(offset..offset + width).and_then(|window| {
            let word = combine_cells(window, table.cell_bits(), table.byte_order());
            let word = u32::try_from(word).ok()?;
            decoder.decode(address, word).ok()
        });
        if let Some(instruction) = decoded {
            rows.push(DisassemblyRow {
                address,
                cells: table.instruction_cells(),
                encoding: instruction.encoding,
                mnemonic: Some(instruction.mnemonic().to_string()),
                text: instruction.format(options),
            });
            offset += width;
        } else {
            let value = u32::from(cells[offset]);
            rows.push(DisassemblyRow {
                address,
                cells: 1,
                encoding: value,
                mnemonic: None,
                text: format!("data {value:#x}"),
            });
            offset += 1;
        }
    }
    rows
}
