//! Instruction formats, decoder and simulator for a RISC-V subset and the
//! TOY/S-TOY teaching ISA.

/// Fixed-width bit vectors for packing and unpacking encodings.
pub mod bitfield;
pub use bitfield::{sign_extend, BitField, BitFieldError};

/// Memory devices, RAM model and bounds-routed arbiter.
pub mod memory;
pub use memory::{
    combine_cells, split_cells, AccessKind, ByteOrder, Cell, MemoryAccess, MemoryMap,
    MemorySubsystem, SimpleRam,
};

/// Register file and program counter.
pub mod state;
pub use state::ExecutionState;

/// Instruction-format descriptions and ISA tables.
pub mod isa;
pub use isa::{
    BinaryOp, BranchCond, DispatchConflict, DisplayOptions, EncodingError, ExecFn, Fields, Format,
    ImmediateSyntax, InstDescription, Instruction, IsaTable,
};

/// Mask/match decode dispatch.
pub mod decoder;
pub use decoder::Decoder;

/// Fault taxonomy for decode and execution.
pub mod fault;
pub use fault::{FaultClass, SimulationError};

/// Machine configuration, simulator driver and trace hooks.
pub mod api;
pub use api::{
    MachineConfig, RunOutcome, Simulator, StateSnapshot, StepOutcome, TraceEvent, TraceSink,
    DEFAULT_INSTRUCTION_LIMIT,
};

/// Listing-style disassembly of memory images.
pub mod disasm;
pub use disasm::{disassemble, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use serde_json as _;
