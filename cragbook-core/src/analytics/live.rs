//! Summary of the session in progress

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::grades::GradeRegistry;
use crate::session::SessionState;
use crate::types::{AscentType, GradePyramid};

use super::pyramid::{grade_pyramid, hardest_grade};

/// Derived view of the live session. Recomputed from scratch on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSummary {
    pub total_climbs: usize,
    pub sends: usize,
    pub flashes: usize,
    pub attempts: usize,
    pub hardest_send: Option<String>,
    pub pyramid: GradePyramid,
    pub elapsed: Duration,
}

impl LiveSummary {
    /// Summarise `session` as of now
    pub fn from_session(session: &SessionState, registry: &GradeRegistry) -> Result<Self> {
        Self::at(session, registry, Utc::now())
    }

    /// Summarise `session` as of `now`
    pub fn at(
        session: &SessionState,
        registry: &GradeRegistry,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let scale = registry.scale(session.discipline(), session.gym())?;
        let climbs = session.climbs();
        let count = |kind: AscentType| climbs.iter().filter(|c| c.ascent_type == kind).count();

        Ok(Self {
            total_climbs: climbs.len(),
            sends: count(AscentType::Send),
            flashes: count(AscentType::Flash),
            attempts: count(AscentType::Attempt),
            hardest_send: hardest_grade(climbs, scale)?.map(str::to_string),
            pyramid: grade_pyramid(climbs),
            elapsed: (now - session.started_at()).max(Duration::zero()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClimbInput, Discipline};

    #[test]
    fn test_live_summary() {
        let registry = GradeRegistry::builtin();
        let mut session = SessionState::start("Mark", Discipline::Bouldering, "Stonegoat").unwrap();
        for (grade, kind) in [
            ("Orange", AscentType::Send),
            ("Yellow", AscentType::Attempt),
            ("Red", AscentType::Flash),
            ("Orange", AscentType::Send),
        ] {
            session
                .log_climb(&registry, ClimbInput::new(grade, kind))
                .unwrap();
        }

        let now = session.started_at() + Duration::minutes(75);
        let summary = LiveSummary::at(&session, &registry, now).unwrap();

        assert_eq!(summary.total_climbs, 4);
        assert_eq!(summary.sends, 2);
        assert_eq!(summary.flashes, 1);
        assert_eq!(summary.attempts, 1);
        assert_eq!(summary.hardest_send.as_deref(), Some("Orange"));
        assert_eq!(summary.pyramid.get("Orange"), Some(&2));
        assert_eq!(summary.elapsed, Duration::minutes(75));
    }

    #[test]
    fn test_empty_session_summary() {
        let registry = GradeRegistry::builtin();
        let session = SessionState::start("Mark", Discipline::SportClimbing, "").unwrap();
        let summary = LiveSummary::from_session(&session, &registry).unwrap();
        assert_eq!(summary.total_climbs, 0);
        assert!(summary.hardest_send.is_none());
        assert!(summary.pyramid.is_empty());
    }
}
