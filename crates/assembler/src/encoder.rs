//! Encoding pass and memory image layout.
//!
//! Resolved instructions are encoded into cells and placed into a sparse
//! address map. Two items claiming the same cell is an error. The map can
//! then be flattened into a contiguous cell block or a byte image starting
//! at the lowest used address.

use std::collections::BTreeMap;

use simulator_core::{Cell, IsaTable};

use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::mnemonic::AsmInstruction;

/// Sparse cell map keyed by address.
pub type Encodings = BTreeMap<i64, Cell>;

/// Encodes every resolved instruction and places its cells.
///
/// Instructions without operands (not yet resolved) are skipped.
///
/// # Errors
///
/// Fails when an encoding does not fit or two items overlap.
pub fn encode_all(
    instructions: &[AsmInstruction],
    table: &IsaTable,
) -> Result<Encodings, AssemblerError> {
    let mut encodings = Encodings::new();
    for inst in instructions {
        let Some(operands) = &inst.operands else {
            continue;
        };
        let cells = inst.description.encode(inst, operands, table)?;
        for (address, cell) in (inst.address..).zip(cells) {
            if encodings.insert(address, cell).is_some() {
                return Err(AssemblerError::at_token(
                    AssemblerErrorKind::OverlappingCode { address },
                    &inst.mnemonic,
                ));
            }
        }
    }
    Ok(encodings)
}

/// Contiguous cells from the lowest to the highest used address, zero-filling gaps.
#[must_use]
pub fn flatten_cells(encodings: &Encodings) -> Vec<Cell> {
    let (Some((&first, _)), Some((&last, _))) =
        (encodings.first_key_value(), encodings.last_key_value())
    else {
        return Vec::new();
    };
    (first..=last)
        .map(|address| encodings.get(&address).copied().unwrap_or(0))
        .collect()
}

/// Byte image of [`flatten_cells`]; cells wider than a byte are serialized big-endian.
#[must_use]
pub fn flatten_bytes(encodings: &Encodings, cell_bits: u32) -> Vec<u8> {
    let cells = flatten_cells(encodings);
    if cell_bits <= 8 {
        return cells.iter().map(|cell| cell.to_be_bytes()[1]).collect();
    }
    cells.iter().flat_map(|cell| cell.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_are_zero_filled() {
        let encodings: Encodings = [(0x10, 0x1123), (0x12, 0x0000), (0x13, 0x00FF)].into();
        assert_eq!(flatten_cells(&encodings), [0x1123, 0, 0, 0x00FF]);
        assert_eq!(
            flatten_bytes(&encodings, 16),
            [0x11, 0x23, 0, 0, 0, 0, 0x00, 0xFF]
        );
    }

    #[test]
    fn byte_cells_map_one_to_one() {
        let encodings: Encodings = [(4, 0x93), (5, 0x02)].into();
        assert_eq!(flatten_bytes(&encodings, 8), [0x93, 0x02]);
    }

    #[test]
    fn empty_map_gives_empty_image() {
        assert!(flatten_cells(&Encodings::new()).is_empty());
        assert!(flatten_bytes(&Encodings::new(), 8).is_empty());
    }
}
