use super::{last_address, Cell, MemorySubsystem};
use crate::fault::SimulationError;

/// Direction of a logged memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Cells were read.
    Read,
    /// Cells were written.
    Write,
}

/// One logged access, recorded when the access log is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryAccess {
    /// Read or write.
    pub kind: AccessKind,
    /// First accessed address.
    pub address: u32,
    /// Cell values read or written.
    pub cells: Vec<Cell>,
}

/// Flat RAM starting at `base`, with per-cell initialization tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRam {
    base: u32,
    cell_bits: u32,
    cells: Vec<Option<Cell>>,
    access_log: Option<Vec<MemoryAccess>>,
}

impl SimpleRam {
    /// Creates `size` uninitialized cells of `cell_bits` width at `base`.
    #[must_use]
    pub fn new(base: u32, size: usize, cell_bits: u32) -> Self {
        Self {
            base,
            cell_bits: cell_bits.clamp(1, Cell::BITS),
            cells: vec![None; size],
            access_log: None,
        }
    }

    /// Creates `size` zero-initialized cells.
    #[must_use]
    pub fn zeroed(base: u32, size: usize, cell_bits: u32) -> Self {
        let mut ram = Self::new(base, size, cell_bits);
        ram.cells.fill(Some(0));
        ram
    }

    /// Starts recording every read and write.
    #[must_use]
    pub fn with_access_log(mut self) -> Self {
        self.access_log = Some(Vec::new());
        self
    }

    /// Recorded accesses, oldest first (empty when logging is disabled).
    #[must_use]
    pub fn access_log(&self) -> &[MemoryAccess] {
        self.access_log.as_deref().unwrap_or_default()
    }

    /// Width of one cell in bits.
    #[must_use]
    pub const fn cell_bits(&self) -> u32 {
        self.cell_bits
    }

    /// Returns the stored value without logging, `None` when uninitialized
    /// or out of range.
    #[must_use]
    pub fn peek(&self, address: u32) -> Option<Cell> {
        let offset = usize::try_from(address.checked_sub(self.base)?).ok()?;
        self.cells.get(offset).copied().flatten()
    }

    fn offset(&self, address: i64, len: usize) -> Result<usize, SimulationError> {
        let (min, max) = self.bounds();
        let end = last_address(address, len).unwrap_or(address);
        if self.cells.is_empty() || !self.contains(address, len) {
            return Err(SimulationError::InvalidMemoryAccess {
                start: address,
                end,
                min,
                max,
            });
        }
        usize::try_from(address - i64::from(self.base)).map_err(|_| {
            SimulationError::InvalidMemoryAccess {
                start: address,
                end,
                min,
                max,
            }
        })
    }

    fn log(&mut self, kind: AccessKind, offset: usize, cells: &[Cell]) {
        if let Some(log) = self.access_log.as_mut() {
            let address = self
                .base
                .saturating_add(u32::try_from(offset).unwrap_or(u32::MAX));
            log.push(MemoryAccess {
                kind,
                address,
                cells: cells.to_vec(),
            });
        }
    }
}

impl MemorySubsystem for SimpleRam {
    fn bounds(&self) -> (u32, u32) {
        let len = u32::try_from(self.cells.len()).unwrap_or(u32::MAX);
        (self.base, self.base.saturating_add(len.saturating_sub(1)))
    }

    fn read(&mut self, address: i64, len: usize) -> Result<Vec<Cell>, SimulationError> {
        let offset = self.offset(address, len)?;
        let mut values = Vec::with_capacity(len);
        for (index, cell) in self.cells[offset..offset + len].iter().enumerate() {
            let Some(value) = cell else {
                let address = self
                    .base
                    .saturating_add(u32::try_from(offset + index).unwrap_or(u32::MAX));
                return Err(SimulationError::UninitializedMemory { address });
            };
            values.push(*value);
        }
        self.log(AccessKind::Read, offset, &values);
        Ok(values)
    }

    fn write(&mut self, address: i64, data: &[Cell]) -> Result<(), SimulationError> {
        if data.is_empty() {
            return Ok(());
        }
        let offset = self.offset(address, data.len())?;
        let mask = Cell::MAX >> (Cell::BITS - self.cell_bits);
        let masked: Vec<Cell> = data.iter().map(|value| value & mask).collect();
        for (slot, value) in self.cells[offset..].iter_mut().zip(&masked) {
            *slot = Some(*value);
        }
        self.log(AccessKind::Write, offset, &masked);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessKind, SimpleRam};
    use crate::fault::SimulationError;
    use crate::memory::MemorySubsystem;

    #[test]
    fn uninitialized_read_is_reported() {
        let mut ram = SimpleRam::new(0, 16, 8);
        assert_eq!(
            ram.read(4, 2),
            Err(SimulationError::UninitializedMemory { address: 4 })
        );
        ram.write(4, &[1, 2]).unwrap();
        assert_eq!(ram.read(4, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn out_of_bounds_access_is_rejected() {
        let mut ram = SimpleRam::zeroed(0x100, 4, 8);
        assert_eq!(ram.bounds(), (0x100, 0x103));
        assert!(matches!(
            ram.read(0x102, 4),
            Err(SimulationError::InvalidMemoryAccess { .. })
        ));
        assert!(ram.write(-1, &[0]).is_err());
        assert!(ram.read_cell(0x103).is_ok());
    }

    #[test]
    fn writes_are_masked_to_cell_width() {
        let mut ram = SimpleRam::new(0, 4, 8);
        ram.write_cell(0, 0x1FF).unwrap();
        assert_eq!(ram.peek(0), Some(0xFF));
    }

    #[test]
    fn access_log_records_reads_and_writes() {
        let mut ram = SimpleRam::zeroed(0, 256, 16).with_access_log();
        ram.write_cell(0x20, 0xBEEF).unwrap();
        ram.read_cell(0x20).unwrap();
        let log = ram.access_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, AccessKind::Write);
        assert_eq!(log[1].kind, AccessKind::Read);
        assert_eq!(log[1].address, 0x20);
        assert_eq!(log[1].cells, vec![0xBEEF]);
    }
}
