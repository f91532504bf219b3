//! # cragbook-core
//!
//! Core library for cragbook - a personal climbing logbook.
//!
//! This library provides:
//! - Grade scales per discipline and gym
//! - The active session model (log, delete, finish)
//! - The persistence gateway and HTTP client for the climbing backend
//! - Stats aggregation (grade pyramid, hardest send, history summaries)
//! - Configuration, logging and the local draft store
//!
//! ## Flow
//!
//! The [`GradeRegistry`] supplies valid grades, user actions mutate the
//! [`SessionState`] owned by a [`SessionController`], and
//! [`analytics`] recomputes derived views from local climbs or fetched
//! history. Finishing a session hands it to the [`PersistenceGateway`]; the
//! session is only cleared once the backend accepts it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cragbook_core::{
//!     AscentType, ClimbInput, Config, Discipline, FinishOutcome, GradeRegistry, HttpBackend,
//!     PersistenceGateway, SessionController,
//! };
//!
//! # async fn run() -> cragbook_core::Result<()> {
//! let config = Config::load()?;
//! let registry = GradeRegistry::from_config(&config.grades.scales)?;
//! let gateway = PersistenceGateway::new(HttpBackend::new(&config.backend)?);
//!
//! let mut controller = SessionController::new(registry);
//! controller
//!     .start(gateway.backend(), "Mark", Discipline::Bouldering, "Stonegoat")
//!     .await?;
//! controller.log_climb(ClimbInput::new("Orange", AscentType::Send))?;
//!
//! if let FinishOutcome::Saved(payload) = controller.finish(&gateway, None).await? {
//!     println!("saved {}", payload.session_name);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use gateway::{Backend, HttpBackend, PersistenceGateway, SessionPayload};
pub use grades::{GradeRegistry, GradeScale};
pub use session::{FinishOutcome, SavingFlag, SessionController, SessionState};
pub use store::{DraftLock, LocalStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod grades;
pub mod logging;
pub mod session;
pub mod store;
pub mod types;
