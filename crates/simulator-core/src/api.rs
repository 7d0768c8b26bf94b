//! Host-facing simulation API: machine configuration, the fetch-decode-execute
//! driver and its trace hooks.

use crate::decoder::Decoder;
use crate::fault::{FaultClass, SimulationError};
use crate::isa::{toy, IsaTable};
use crate::memory::{combine_cells, MemorySubsystem};
use crate::state::ExecutionState;

/// Default cap on executed instructions per [`Simulator::run`].
pub const DEFAULT_INSTRUCTION_LIMIT: u64 = 1_000_000;

/// Reset-time configuration of a simulated machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Size of the register file.
    pub register_count: usize,
    /// Register width; values are sign-extended to it.
    pub register_bits: u32,
    /// Register 0 reads zero and ignores writes.
    pub zero_register: bool,
    /// Program counter after reset.
    pub initial_pc: u32,
    /// Highest valid program counter.
    pub max_pc: u32,
    /// Value of every register after reset; `None` leaves them uninitialized.
    pub initial_register_value: Option<i64>,
    /// Instructions [`Simulator::run`] may execute before giving up.
    pub instruction_limit: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::riscv()
    }
}

impl MachineConfig {
    /// RV32 hart: 32 registers of 32 bits, `x0` hard-wired, reset at 0.
    #[must_use]
    pub const fn riscv() -> Self {
        Self {
            register_count: 32,
            register_bits: 32,
            zero_register: true,
            initial_pc: 0,
            max_pc: u32::MAX,
            initial_register_value: None,
            instruction_limit: Some(DEFAULT_INSTRUCTION_LIMIT),
        }
    }

    /// TOY machine: 16 registers of 16 bits, `R0` hard-wired, reset at `0x10`.
    #[must_use]
    pub const fn toy() -> Self {
        Self {
            register_count: toy::REGISTER_COUNT,
            register_bits: 16,
            zero_register: true,
            initial_pc: toy::PROGRAM_START,
            max_pc: 0xFF,
            initial_register_value: None,
            instruction_limit: Some(DEFAULT_INSTRUCTION_LIMIT),
        }
    }
}

/// Trace events emitted in execution order by [`Simulator::run_traced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// An instruction word was fetched and decoded.
    InstructionStart {
        /// Fetch address.
        pc: u32,
        /// Raw instruction word.
        encoding: u32,
    },
    /// An instruction finished executing.
    InstructionRetired {
        /// Address of the retired instruction.
        pc: u32,
        /// Program counter after execution.
        next_pc: u32,
    },
    /// A fault stopped execution.
    FaultRaised {
        /// Fault class.
        class: FaultClass,
        /// Program counter when the fault was observed.
        pc: u32,
    },
    /// A halting instruction ended the run.
    EndOfExecution {
        /// Program counter after the halting instruction.
        pc: u32,
        /// Instructions executed since reset.
        instructions: u64,
    },
}

/// Sink for trace events.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

struct NoTrace;

impl TraceSink for NoTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Result of a single [`Simulator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// One instruction executed.
    Retired {
        /// Address of the executed instruction.
        pc: u32,
        /// Program counter after execution.
        next_pc: u32,
    },
    /// Execution had already ended; nothing was fetched.
    Halted {
        /// Current program counter.
        pc: u32,
    },
}

/// Result of a completed [`Simulator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions executed during this run.
    pub instructions: u64,
    /// Program counter after the halting instruction.
    pub final_pc: u32,
}

/// Host-visible machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StateSnapshot {
    /// ISA table name.
    pub isa: String,
    /// Program counter.
    pub pc: u32,
    /// Register values; `None` marks never-written registers.
    pub registers: Vec<Option<i64>>,
    /// Instructions executed since reset.
    pub instructions: u64,
    /// Whether a halting instruction has executed.
    pub end_of_execution: bool,
}

/// Fetch-decode-execute driver over an ISA table and a memory device.
#[derive(Debug)]
pub struct Simulator<M: MemorySubsystem> {
    table: IsaTable,
    config: MachineConfig,
    state: ExecutionState,
    memory: M,
    instructions: u64,
}

impl<M: MemorySubsystem> Simulator<M> {
    /// Creates a simulator in reset state; the program is expected to be
    /// in `memory` already.
    #[must_use]
    pub fn new(table: IsaTable, config: MachineConfig, memory: M) -> Self {
        let state = ExecutionState::new(&config);
        Self {
            table,
            config,
            state,
            memory,
            instructions: 0,
        }
    }

    /// Active instruction table.
    #[must_use]
    pub const fn table(&self) -> &IsaTable {
        &self.table
    }

    /// Machine configuration.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Register file and program counter.
    #[must_use]
    pub const fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Mutable register file, e.g. to seed argument registers.
    pub fn state_mut(&mut self) -> &mut ExecutionState {
        &mut self.state
    }

    /// Memory device.
    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable memory device.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Instructions executed since reset.
    #[must_use]
    pub const fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Restores the reset state, keeping memory contents.
    pub fn reset(&mut self) {
        self.state = ExecutionState::new(&self.config);
        self.instructions = 0;
    }

    /// Captures registers, program counter and counters.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            isa: self.table.name().to_string(),
            pc: self.state.pc(),
            registers: self.state.registers().to_vec(),
            instructions: self.instructions,
            end_of_execution: self.state.end_of_execution(),
        }
    }

    /// Fetches the instruction word at the current program counter.
    ///
    /// # Errors
    ///
    /// Propagates memory faults.
    pub fn fetch(&mut self) -> Result<u32, SimulationError> {
        let cells = usize::try_from(self.table.instruction_cells()).unwrap_or(1);
        let raw = self.memory.read(i64::from(self.state.pc()), cells)?;
        let word = combine_cells(&raw, self.table.cell_bits(), self.table.byte_order());
        Ok(u32::try_from(word).unwrap_or(u32::MAX))
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Propagates fetch, decode and execute faults.
    pub fn step(&mut self) -> Result<StepOutcome, SimulationError> {
        self.step_traced(&mut NoTrace)
    }

    /// Executes one instruction, reporting to `sink`.
    ///
    /// # Errors
    ///
    /// Propagates fetch, decode and execute faults.
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> Result<StepOutcome, SimulationError> {
        let pc = self.state.pc();
        if self.state.end_of_execution() {
            return Ok(StepOutcome::Halted { pc });
        }
        match self.execute_one(sink) {
            Ok(next_pc) => Ok(StepOutcome::Retired { pc, next_pc }),
            Err(err) => {
                sink.on_event(TraceEvent::FaultRaised {
                    class: err.class(),
                    pc,
                });
                Err(err)
            }
        }
    }

    fn execute_one(&mut self, sink: &mut dyn TraceSink) -> Result<u32, SimulationError> {
        let pc = self.state.pc();
        let encoding = self.fetch()?;
        let instruction = Decoder::new(&self.table).decode(pc, encoding)?;
        sink.on_event(TraceEvent::InstructionStart { pc, encoding });
        instruction.execute(&mut self.state, &mut self.memory)?;
        self.instructions += 1;
        let next_pc = self.state.pc();
        sink.on_event(TraceEvent::InstructionRetired { pc, next_pc });
        Ok(next_pc)
    }

    /// Runs until a halting instruction executes.
    ///
    /// # Errors
    ///
    /// Propagates the first fault, or [`SimulationError::InstructionLimit`]
    /// once the configured limit is reached.
    pub fn run(&mut self) -> Result<RunOutcome, SimulationError> {
        self.run_traced(&mut NoTrace)
    }

    /// Runs until a halting instruction executes, reporting to `sink`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Simulator::run`].
    pub fn run_traced(&mut self, sink: &mut dyn TraceSink) -> Result<RunOutcome, SimulationError> {
        let start = self.instructions;
        while !self.state.end_of_execution() {
            if let Some(limit) = self.config.instruction_limit {
                if self.instructions - start >= limit {
                    return Err(SimulationError::InstructionLimit { limit });
                }
            }
            self.step_traced(sink)?;
        }
        sink.on_event(TraceEvent::EndOfExecution {
            pc: self.state.pc(),
            instructions: self.instructions,
        });
        Ok(RunOutcome {
            instructions: self.instructions - start,
            final_pc: self.state.pc(),
        })
    }
}
