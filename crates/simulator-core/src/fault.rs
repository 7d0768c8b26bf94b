use thiserror::Error;

use crate::bitfield::BitFieldError;

/// Fault classes used to group simulation errors for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Fetched word matched no registered format.
    Decode,
    /// Memory access outside a device or of uninitialized cells.
    Memory,
    /// Register or program-counter state violation.
    State,
    /// Execution budget exhausted.
    Limit,
    /// Field packing failed.
    Encoding,
}

/// Fatal conditions raised while decoding or executing instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// A fetched word matched no registered format's mask/match pair.
    #[error("data {encoding:#x} at address {address:#x} could not be decoded")]
    IllegalInstruction {
        /// Address the word was fetched from.
        address: u32,
        /// Raw fetched word.
        encoding: u32,
    },
    /// Access range lies outside the device it was routed to.
    #[error("memory access [{start},{end}] is outside of device bounds [{min:#x},{max:#x}]")]
    InvalidMemoryAccess {
        /// First accessed address.
        start: i64,
        /// Last accessed address.
        end: i64,
        /// Lowest device address.
        min: u32,
        /// Highest device address.
        max: u32,
    },
    /// Access range is not covered by any attached device.
    #[error("memory access [{start},{end}] is not mapped to any device")]
    UnmappedAccess {
        /// First accessed address.
        start: i64,
        /// Last accessed address.
        end: i64,
    },
    /// A cell was read before anything was written to it.
    #[error("reading uninitialized memory at address {address:#x}")]
    UninitializedMemory {
        /// Address of the uninitialized cell.
        address: u32,
    },
    /// A register was read before anything was written to it.
    #[error("reading uninitialized register {register}")]
    UninitializedRegister {
        /// Register number.
        register: u8,
    },
    /// Register number exceeds the register file.
    #[error("register {register} does not exist")]
    InvalidRegister {
        /// Register number.
        register: u8,
    },
    /// Program counter left the executable range.
    #[error("program counter {value} is not in the valid range [0,{max:#x}]")]
    InvalidPc {
        /// Rejected program counter value.
        value: i64,
        /// Highest valid program counter.
        max: u32,
    },
    /// The configured instruction limit was reached before end of execution.
    #[error("instruction limit of {limit} reached")]
    InstructionLimit {
        /// Configured limit.
        limit: u64,
    },
    /// Field packing failed while re-encoding or slicing.
    #[error(transparent)]
    BitField(#[from] BitFieldError),
}

impl SimulationError {
    /// Returns the reporting class for this error.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::IllegalInstruction { .. } => FaultClass::Decode,
            Self::InvalidMemoryAccess { .. }
            | Self::UnmappedAccess { .. }
            | Self::UninitializedMemory { .. } => FaultClass::Memory,
            Self::UninitializedRegister { .. }
            | Self::InvalidRegister { .. }
            | Self::InvalidPc { .. } => FaultClass::State,
            Self::InstructionLimit { .. } => FaultClass::Limit,
            Self::BitField(_) => FaultClass::Encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultClass, SimulationError};

    #[test]
    fn decode_miss_message_names_word_and_address() {
        let err = SimulationError::IllegalInstruction {
            address: 0x10,
            encoding: 0xFFFF_FFFF,
        };
        assert_eq!(
            err.to_string(),
            "data 0xffffffff at address 0x10 could not be decoded"
        );
        assert_eq!(err.class(), FaultClass::Decode);
    }

    #[test]
    fn class_mapping_groups_memory_faults() {
        assert_eq!(
            SimulationError::UninitializedMemory { address: 3 }.class(),
            FaultClass::Memory
        );
        assert_eq!(
            SimulationError::UnmappedAccess { start: -4, end: -1 }.class(),
            FaultClass::Memory
        );
        assert_eq!(
            SimulationError::InvalidPc { value: 256, max: 255 }.class(),
            FaultClass::State
        );
        assert_eq!(
            SimulationError::InstructionLimit { limit: 10 }.class(),
            FaultClass::Limit
        );
    }
}
