//! Sizing and cost constants for the accumulator machine.

/// Number of cells the VM's backing store guarantees, regardless of how
/// much of it a given program's memory map actually uses.
pub const MEMORY_SIZE: usize = 1000;

/// Number of scratch cells reserved past the last user variable, for the
/// multiplication/division/modulo subroutines.
pub const SCRATCH_CELLS: usize = 5;

/// Addresses below this bound are "near" memory and cost less to touch.
pub const NEAR_MEMORY_BOUND: usize = 3;

/// Step cost of `LOAD`/`STORE`/`ADD`/`SUB` on a near-memory address.
pub const COST_NEAR_MEMORY: u64 = 10;

/// Step cost of `LOAD`/`STORE`/`ADD`/`SUB` on a far-memory address, and of
/// `SCAN`/`PRINT` regardless of address.
pub const COST_FAR_MEMORY: u64 = 100;

/// Step cost of every register-only instruction (`ZERO`, `INC`, `DEC`,
/// `SHL`, `SHR`) and every jump (`JUMP`, `JZ`, `JG`, `JODD`).
pub const COST_CHEAP: u64 = 1;

/// Step cost of `HALT`.
pub const COST_HALT: u64 = 0;
