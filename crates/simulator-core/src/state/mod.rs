//! Architectural state mutated by instruction execution.

/// Register file and program counter storage model.
pub mod registers;

pub use registers::ExecutionState;
