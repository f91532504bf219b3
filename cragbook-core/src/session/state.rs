//! In-memory state of the active climbing session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grades::GradeRegistry;
use crate::types::{ClimbId, ClimbInput, ClimbRecord, Discipline};

/// Shared "save in flight" flag.
///
/// Clones observe the same flag, so a UI can hold one and grey out its
/// finish button while the controller is waiting on the backend.
#[derive(Debug, Clone, Default)]
pub struct SavingFlag(Arc<AtomicBool>);

impl SavingFlag {
    pub fn is_saving(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark a save as started.
    ///
    /// Fails with [`Error::SaveInProgress`] if one is already running. The
    /// returned guard clears the flag when dropped, including when the save
    /// future is dropped mid-flight.
    pub fn try_engage(&self) -> Result<SaveGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SaveInProgress)?;
        Ok(SaveGuard {
            flag: Arc::clone(&self.0),
        })
    }
}

/// Clears the [`SavingFlag`] on drop
#[derive(Debug)]
pub struct SaveGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The active session: who is climbing, where, and what they have logged.
///
/// `climbs` is kept most-recent-first. Ids come from a counter owned by the
/// session and are never reused, even after deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    user_name: String,
    discipline: Discipline,
    gym: String,
    started_at: DateTime<Utc>,
    climbs: Vec<ClimbRecord>,
    next_id: u64,
    #[serde(skip)]
    saving: SavingFlag,
}

impl SessionState {
    /// Start a fresh, empty session.
    ///
    /// `user_name` and, for bouldering, `gym` are trimmed and must not be
    /// empty. The gym is dropped for disciplines that do not use one.
    pub fn start(user_name: &str, discipline: Discipline, gym: &str) -> Result<Self> {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(Error::Validation("user name must not be empty".to_string()));
        }

        let gym = if discipline.requires_gym() {
            let gym = gym.trim();
            if gym.is_empty() {
                return Err(Error::Validation(format!(
                    "{} sessions need a gym",
                    discipline.display_name()
                )));
            }
            gym.to_string()
        } else {
            String::new()
        };

        Ok(Self {
            user_name: user_name.to_string(),
            discipline,
            gym,
            started_at: Utc::now(),
            climbs: Vec::new(),
            next_id: 1,
            saving: SavingFlag::default(),
        })
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    /// Gym name; empty for sport climbing
    pub fn gym(&self) -> &str {
        &self.gym
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Logged climbs, most recent first
    pub fn climbs(&self) -> &[ClimbRecord] {
        &self.climbs
    }

    pub fn climb(&self, id: ClimbId) -> Option<&ClimbRecord> {
        self.climbs.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.climbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.climbs.is_empty()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_saving()
    }

    /// Handle onto this session's saving flag
    pub fn saving_flag(&self) -> SavingFlag {
        self.saving.clone()
    }

    /// Log a climb at the front of the list.
    ///
    /// The grade must belong to the scale of this session's discipline and
    /// gym; otherwise nothing changes and [`Error::UnknownGrade`] is returned.
    pub fn log_climb(&mut self, registry: &GradeRegistry, input: ClimbInput) -> Result<&ClimbRecord> {
        let scale = registry.scale(self.discipline, &self.gym)?;
        let grade = input.grade.trim();
        if !scale.contains(grade) {
            return Err(Error::UnknownGrade {
                grade: grade.to_string(),
                scale: scale.name().to_string(),
            });
        }

        let notes = input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let record = ClimbRecord {
            id: ClimbId(self.next_id),
            discipline: self.discipline,
            gym: self.gym.clone(),
            grade: grade.to_string(),
            ascent_type: input.ascent_type,
            notes,
            timestamp: Utc::now(),
        };
        self.next_id += 1;

        tracing::debug!(id = %record.id, grade = %record.grade, ascent = %record.ascent_type, "Logged climb");
        self.climbs.insert(0, record);
        Ok(&self.climbs[0])
    }

    /// Remove a climb by id.
    ///
    /// Unknown ids are ignored. Returns whether a climb was removed.
    pub fn delete_climb(&mut self, id: ClimbId) -> bool {
        let before = self.climbs.len();
        self.climbs.retain(|c| c.id != id);
        let removed = self.climbs.len() != before;
        if removed {
            tracing::debug!(id = %id, "Deleted climb");
        }
        removed
    }

    /// Drop all climbs and restart the clock, keeping user, discipline and gym
    pub fn reset(&mut self) {
        self.climbs.clear();
        self.started_at = Utc::now();
    }

    /// Repair a session read back from disk.
    ///
    /// Re-checks the same invariants as [`SessionState::start`] and moves the
    /// id counter past every stored id.
    pub(crate) fn validated(mut self) -> Result<Self> {
        if self.user_name.trim().is_empty() {
            return Err(Error::Validation(
                "stored session has no user name".to_string(),
            ));
        }
        if self.discipline.requires_gym() && self.gym.trim().is_empty() {
            return Err(Error::Validation("stored session has no gym".to_string()));
        }
        let max_id = self.climbs.iter().map(|c| c.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        Ok(self)
    }
}
