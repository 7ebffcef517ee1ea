//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed connection and runs exactly one statement.
//! Transactions and logging belong to the caller (see `crate::records`).

mod correlation;
mod medication;
mod patient;
mod symptom;
mod vitals;

pub use correlation::*;
pub use medication::*;
pub use patient::*;
pub use symptom::*;
pub use vitals::*;
