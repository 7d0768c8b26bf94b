use crate::api::MachineConfig;
use crate::bitfield::sign_extend;
use crate::fault::SimulationError;

/// Register file, program counter and end-of-execution flag of one hart.
///
/// Register values are stored sign-extended to the configured register
/// width; a register that was never written reads as an error. When the
/// zero register is enabled, register 0 always reads 0 and ignores writes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ExecutionState {
    registers: Vec<Option<i64>>,
    register_bits: u32,
    zero_register: bool,
    pc: u32,
    max_pc: u32,
    end_of_execution: bool,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::new(&MachineConfig::default())
    }
}

impl ExecutionState {
    /// Creates the reset state described by `config`.
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        let register_bits = config.register_bits.clamp(1, 64);
        let mut registers = vec![
            config
                .initial_register_value
                .map(|value| sign_extend(value, register_bits));
            config.register_count
        ];
        if config.zero_register {
            if let Some(r0) = registers.first_mut() {
                *r0 = Some(0);
            }
        }
        Self {
            registers,
            register_bits,
            zero_register: config.zero_register,
            pc: config.initial_pc,
            max_pc: config.max_pc,
            end_of_execution: false,
        }
    }

    /// Number of registers.
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Width of a register in bits.
    #[must_use]
    pub const fn register_bits(&self) -> u32 {
        self.register_bits
    }

    /// Raw register file; `None` marks a register that was never written.
    #[must_use]
    pub fn registers(&self) -> &[Option<i64>] {
        &self.registers
    }

    /// Reads register `nr`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidRegister`] for a register outside
    /// the file and [`SimulationError::UninitializedRegister`] for one that
    /// was never written.
    pub fn reg(&self, nr: u8) -> Result<i64, SimulationError> {
        match self.registers.get(usize::from(nr)) {
            None => Err(SimulationError::InvalidRegister { register: nr }),
            Some(None) => Err(SimulationError::UninitializedRegister { register: nr }),
            Some(Some(value)) => Ok(*value),
        }
    }

    /// Writes register `nr`, sign-extending `value` to the register width.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidRegister`] for a register outside
    /// the file.
    pub fn set_reg(&mut self, nr: u8, value: i64) -> Result<(), SimulationError> {
        let bits = self.register_bits;
        let zero_register = self.zero_register;
        let slot = self
            .registers
            .get_mut(usize::from(nr))
            .ok_or(SimulationError::InvalidRegister { register: nr })?;
        if !(zero_register && nr == 0) {
            *slot = Some(sign_extend(value, bits));
        }
        Ok(())
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Highest valid program counter.
    #[must_use]
    pub const fn max_pc(&self) -> u32 {
        self.max_pc
    }

    /// Moves the program counter to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidPc`] when `value` is negative or
    /// above the configured maximum.
    pub fn set_pc(&mut self, value: i64) -> Result<(), SimulationError> {
        match u32::try_from(value) {
            Ok(pc) if pc <= self.max_pc => {
                self.pc = pc;
                Ok(())
            }
            _ => Err(SimulationError::InvalidPc {
                value,
                max: self.max_pc,
            }),
        }
    }

    /// Advances the program counter by `cells`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ExecutionState::set_pc`].
    pub fn advance_pc(&mut self, cells: u32) -> Result<(), SimulationError> {
        self.set_pc(i64::from(self.pc) + i64::from(cells))
    }

    /// Returns `true` once a halting instruction has executed.
    #[must_use]
    pub const fn end_of_execution(&self) -> bool {
        self.end_of_execution
    }

    /// Marks the end of execution.
    pub fn halt(&mut self) {
        self.end_of_execution = true;
    }
}
