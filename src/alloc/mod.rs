// Interference graph state plus the simplify/select allocation pipeline.
mod allocation;
mod interference;

pub use allocation::Allocator;
pub use allocation::BudgetOutcome;
pub use allocation::{Eliminated, ElimOrder, Elimination, SelectStep};
pub use interference::{GraphStats, InterferenceGraph, Process};
