//! Memory devices addressed in ISA-sized cells.
//!
//! A cell is the smallest addressable unit of an ISA: a byte on RISC-V and a
//! 16-bit word on TOY. Both fit in [`Cell`]; devices mask written values to
//! their configured cell width.

/// Bounds-routed arbiter over several devices.
pub mod map;
/// Flat RAM with uninitialized-cell tracking.
pub mod ram;

pub use map::MemoryMap;
pub use ram::{AccessKind, MemoryAccess, SimpleRam};

use crate::fault::SimulationError;

/// Value of one addressable memory cell.
pub type Cell = u16;

/// Order in which cells of a multi-cell value are laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ByteOrder {
    /// Least significant cell at the lowest address.
    Little,
    /// Most significant cell at the lowest address.
    Big,
}

/// A memory device shared by every `execute` call.
pub trait MemorySubsystem {
    /// Inclusive `(lowest, highest)` address served by this device.
    fn bounds(&self) -> (u32, u32);

    /// Reads `len` consecutive cells starting at `address`.
    ///
    /// # Errors
    ///
    /// Fails when the range leaves the device or touches uninitialized cells.
    fn read(&mut self, address: i64, len: usize) -> Result<Vec<Cell>, SimulationError>;

    /// Writes `data` to consecutive cells starting at `address`.
    ///
    /// # Errors
    ///
    /// Fails when the range leaves the device.
    fn write(&mut self, address: i64, data: &[Cell]) -> Result<(), SimulationError>;

    /// Returns `true` when `[address, address + len)` lies within [`Self::bounds`].
    fn contains(&self, address: i64, len: usize) -> bool {
        let (min, max) = self.bounds();
        let Some(end) = last_address(address, len) else {
            return false;
        };
        address >= i64::from(min) && end <= i64::from(max)
    }

    /// Reads a single cell.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MemorySubsystem::read`].
    fn read_cell(&mut self, address: i64) -> Result<Cell, SimulationError> {
        let cells = self.read(address, 1)?;
        cells
            .first()
            .copied()
            .ok_or(SimulationError::UnmappedAccess {
                start: address,
                end: address,
            })
    }

    /// Writes a single cell.
    ///
    /// # Errors
    ///
    /// Same conditions as [`MemorySubsystem::write`].
    fn write_cell(&mut self, address: i64, value: Cell) -> Result<(), SimulationError> {
        self.write(address, &[value])
    }
}

/// Last address touched by an access of `len` cells, if the access is non-empty.
#[must_use]
pub fn last_address(address: i64, len: usize) -> Option<i64> {
    let len = i64::try_from(len).ok()?;
    if len == 0 {
        return None;
    }
    address.checked_add(len - 1)
}

/// Combines cells of `cell_bits` width into one value.
#[must_use]
pub fn combine_cells(cells: &[Cell], cell_bits: u32, order: ByteOrder) -> u64 {
    let fold = |acc: u64, cell: &Cell| (acc << cell_bits) | u64::from(*cell);
    match order {
        ByteOrder::Big => cells.iter().fold(0, fold),
        ByteOrder::Little => cells.iter().rev().fold(0, fold),
    }
}

/// Splits the low `count * cell_bits` bits of `value` into cells.
#[must_use]
pub fn split_cells(value: u64, count: usize, cell_bits: u32, order: ByteOrder) -> Vec<Cell> {
    let mask = (1_u64 << cell_bits) - 1;
    let mut cells: Vec<Cell> = (0..count)
        .map(|index| {
            let shift = u32::try_from(index).unwrap_or(u32::MAX).saturating_mul(cell_bits);
            Cell::try_from(value.checked_shr(shift).unwrap_or(0) & mask).unwrap_or_default()
        })
        .collect();
    if order == ByteOrder::Big {
        cells.reverse();
    }
    cells
}
