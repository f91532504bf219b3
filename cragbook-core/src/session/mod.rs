//! Session lifecycle
//!
//! [`SessionState`] is the pure in-memory model: log, delete, reset.
//! [`SessionController`] is its single owner and drives the parts that touch
//! the backend (the reachability probe on start and the save on finish).

mod controller;
mod state;

pub use controller::{FinishOutcome, SessionController};
pub use state::{SaveGuard, SavingFlag, SessionState};
