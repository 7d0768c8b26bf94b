//! Arbiter routing accesses to attached devices by address range.

use super::{last_address, Cell, MemorySubsystem};
use crate::fault::SimulationError;

/// Ordered collection of devices; the first device whose bounds cover an
/// access serves it.
#[derive(Default)]
pub struct MemoryMap {
    devices: Vec<Box<dyn MemorySubsystem>>,
}

impl std::fmt::Debug for MemoryMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|device| device.bounds()))
            .finish()
    }
}

impl MemoryMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a device behind all previously attached ones.
    pub fn attach(&mut self, device: Box<dyn MemorySubsystem>) {
        self.devices.push(device);
    }

    /// Builder form of [`MemoryMap::attach`].
    #[must_use]
    pub fn with_device(mut self, device: Box<dyn MemorySubsystem>) -> Self {
        self.attach(device);
        self
    }

    /// Number of attached devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` when no device is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn route(
        &mut self,
        address: i64,
        len: usize,
    ) -> Result<&mut dyn MemorySubsystem, SimulationError> {
        match self
            .devices
            .iter_mut()
            .find(|device| device.contains(address, len))
        {
            Some(device) => Ok(device.as_mut()),
            None => Err(SimulationError::UnmappedAccess {
                start: address,
                end: last_address(address, len).unwrap_or(address),
            }),
        }
    }
}

impl MemorySubsystem for MemoryMap {
    fn bounds(&self) -> (u32, u32) {
        let min = self.devices.iter().map(|d| d.bounds().0).min();
        let max = self.devices.iter().map(|d| d.bounds().1).max();
        (min.unwrap_or(0), max.unwrap_or(0))
    }

    fn contains(&self, address: i64, len: usize) -> bool {
        self.devices
            .iter()
            .any(|device| device.contains(address, len))
    }

    fn read(&mut self, address: i64, len: usize) -> Result<Vec<Cell>, SimulationError> {
        self.route(address, len)?.read(address, len)
    }

    fn write(&mut self, address: i64, data: &[Cell]) -> Result<(), SimulationError> {
        self.route(address, data.len())?.write(address, data)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryMap;
    use crate::fault::SimulationError;
    use crate::memory::{MemorySubsystem, SimpleRam};

    fn two_banks() -> MemoryMap {
        MemoryMap::new()
            .with_device(Box::new(SimpleRam::zeroed(0x000, 0x100, 8)))
            .with_device(Box::new(SimpleRam::zeroed(0x200, 0x100, 8)))
    }

    #[test]
    fn accesses_route_to_covering_device() {
        let mut map = two_banks();
        map.write(0x210, &[7, 8]).unwrap();
        assert_eq!(map.read(0x210, 2).unwrap(), vec![7, 8]);
        assert_eq!(map.bounds(), (0x000, 0x2FF));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn gap_and_straddling_accesses_are_unmapped() {
        let mut map = two_banks();
        assert!(matches!(
            map.read(0x150, 1),
            Err(SimulationError::UnmappedAccess { .. })
        ));
        assert!(matches!(
            map.read(0xFE, 4),
            Err(SimulationError::UnmappedAccess { start: 0xFE, end: 0x101 })
        ));
    }
}
