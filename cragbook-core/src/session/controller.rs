//! Owner of the one active session

use crate::error::{Error, Result};
use crate::gateway::{Backend, PersistenceGateway, SessionPayload};
use crate::grades::GradeRegistry;
use crate::types::{ClimbId, ClimbInput, ClimbRecord, Discipline};

use super::state::SessionState;

/// What [`SessionController::finish`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The session had no climbs; it was closed without contacting the backend
    Discarded,
    /// The backend accepted the session
    Saved(SessionPayload),
}

/// Holds at most one [`SessionState`] and manages its lifecycle.
///
/// Mutations take `&mut self`, so a second finish cannot overlap the first
/// through this handle. The session's [`SavingFlag`](super::SavingFlag) guards
/// against overlap through any other path.
#[derive(Debug)]
pub struct SessionController {
    registry: GradeRegistry,
    active: Option<SessionState>,
}

impl SessionController {
    pub fn new(registry: GradeRegistry) -> Self {
        Self {
            registry,
            active: None,
        }
    }

    /// Controller resuming a previously stored session
    pub fn with_session(registry: GradeRegistry, session: SessionState) -> Self {
        Self {
            registry,
            active: Some(session),
        }
    }

    pub fn registry(&self) -> &GradeRegistry {
        &self.registry
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&SessionState> {
        self.active.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_saving())
    }

    /// Start a new session after checking that the backend is reachable.
    ///
    /// Input is validated before any network call. An active session that
    /// still holds climbs is never replaced; finish or discard it first.
    pub async fn start<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        user_name: &str,
        discipline: Discipline,
        gym: &str,
    ) -> Result<&SessionState> {
        if let Some(current) = &self.active {
            if !current.is_empty() {
                return Err(Error::Validation(format!(
                    "the current session still has {} unsaved climb(s); finish or discard it first",
                    current.len()
                )));
            }
        }

        let session = SessionState::start(user_name, discipline, gym)?;
        self.registry.scale(session.discipline(), session.gym())?;

        backend.fetch_stats(session.user_name()).await?;

        tracing::info!(
            user = %session.user_name(),
            discipline = %session.discipline(),
            gym = %session.gym(),
            "Session started"
        );
        Ok(self.active.insert(session))
    }

    /// Log a climb in the active session
    pub fn log_climb(&mut self, input: ClimbInput) -> Result<&ClimbRecord> {
        let registry = &self.registry;
        let session = self
            .active
            .as_mut()
            .ok_or_else(|| Error::Validation("no active session".to_string()))?;
        session.log_climb(registry, input)
    }

    /// Delete a climb from the active session; unknown ids are ignored
    pub fn delete_climb(&mut self, id: ClimbId) -> bool {
        self.active
            .as_mut()
            .map_or(false, |session| session.delete_climb(id))
    }

    /// Save the active session and close it.
    ///
    /// An empty session is closed without a network call. If the save fails
    /// the session and all its climbs stay exactly as they were.
    pub async fn finish<B: Backend>(
        &mut self,
        gateway: &PersistenceGateway<B>,
        name: Option<&str>,
    ) -> Result<FinishOutcome> {
        let session = self
            .active
            .as_ref()
            .ok_or_else(|| Error::Validation("no active session".to_string()))?;

        if session.is_empty() {
            tracing::info!(user = %session.user_name(), "Closing empty session");
            self.active = None;
            return Ok(FinishOutcome::Discarded);
        }

        let guard = session.saving_flag().try_engage()?;
        let saved = gateway.save(session, name).await;
        drop(guard);

        let payload = saved?;
        self.active = None;
        Ok(FinishOutcome::Saved(payload))
    }

    /// Close the active session without saving it
    pub fn discard(&mut self) -> Option<SessionState> {
        let discarded = self.active.take();
        if let Some(session) = &discarded {
            tracing::info!(user = %session.user_name(), climbs = session.len(), "Session discarded");
        }
        discarded
    }
}
