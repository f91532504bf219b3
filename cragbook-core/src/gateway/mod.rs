//! Session persistence gateway
//!
//! The live session is the pending write; [`PersistenceGateway::save`] is the
//! commit. A save either lands on the backend as a whole or reports
//! [`Error::Save`](crate::Error::Save) and leaves the caller's session alone
//! so the user can retry. There is no automatic retry.
//!
//! ## Usage
//!
//! Point the client at the backend in `~/.config/cragbook/config.toml`:
//!
//! ```toml
//! [backend]
//! base_url = "http://127.0.0.1:5001"
//! timeout_secs = 30
//! ```

mod client;
mod payload;

pub use client::{Backend, HttpBackend};
pub use payload::{default_session_name, SessionPayload, WireClimb};

use crate::error::{Error, Result};
use crate::session::SessionState;

/// Turns a [`SessionState`] into a backend save
pub struct PersistenceGateway<B> {
    backend: B,
}

impl<B: Backend> PersistenceGateway<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Save `session` under `name` (or its derived name).
    ///
    /// Every failure, including timeouts and connection errors, comes back as
    /// [`Error::Save`]. Returns the payload that was accepted.
    pub async fn save(&self, session: &SessionState, name: Option<&str>) -> Result<SessionPayload> {
        let payload = SessionPayload::from_session(session, name);

        match self.backend.save_session(&payload).await {
            Ok(()) => {
                tracing::info!(
                    user = %payload.user_name,
                    session = %payload.session_name,
                    climbs = payload.climbs.len(),
                    "Session saved"
                );
                Ok(payload)
            }
            Err(e) => {
                tracing::warn!(session = %payload.session_name, error = %e, "Session save failed");
                Err(match e {
                    Error::Save(msg) => Error::Save(msg),
                    other => Error::Save(other.to_string()),
                })
            }
        }
    }
}
