//! Long-running background jobs spawned by the binary.

pub mod overdue_sweep;
