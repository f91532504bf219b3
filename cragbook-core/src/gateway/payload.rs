//! Wire schema for `POST /api/session`

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::session::SessionState;
use crate::types::{AscentType, ClimbRecord, Discipline};

/// Body of `POST /api/session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user_name: String,
    pub session_name: String,
    pub climbs: Vec<WireClimb>,
}

/// One climb inside a [`SessionPayload`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireClimb {
    pub discipline: Discipline,
    pub grade: String,
    /// ISO-8601 UTC with millisecond precision
    pub timestamp: String,
    pub gym: String,
    pub ascent_type: AscentType,
    pub notes: Option<String>,
}

impl From<&ClimbRecord> for WireClimb {
    fn from(climb: &ClimbRecord) -> Self {
        Self {
            discipline: climb.discipline,
            grade: climb.grade.clone(),
            timestamp: climb.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            gym: climb.gym.clone(),
            ascent_type: climb.ascent_type,
            notes: climb.notes.clone(),
        }
    }
}

/// Name used when the user does not give one: `"{gym} - {discipline}"` for
/// bouldering, otherwise just the discipline.
pub fn default_session_name(discipline: Discipline, gym: &str) -> String {
    if discipline.requires_gym() && !gym.trim().is_empty() {
        format!("{} - {}", gym.trim(), discipline.display_name())
    } else {
        discipline.display_name().to_string()
    }
}

impl SessionPayload {
    /// Build the payload for a session.
    ///
    /// A blank `name` falls back to [`default_session_name`]. Climbs are sent
    /// in the order they were logged, oldest first.
    pub fn from_session(session: &SessionState, name: Option<&str>) -> Self {
        let session_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_session_name(session.discipline(), session.gym()));

        Self {
            user_name: session.user_name().to_string(),
            session_name,
            climbs: session.climbs().iter().rev().map(WireClimb::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::GradeRegistry;
    use crate::types::ClimbInput;

    #[test]
    fn test_default_session_name() {
        assert_eq!(
            default_session_name(Discipline::Bouldering, "Stonegoat"),
            "Stonegoat - Bouldering"
        );
        assert_eq!(
            default_session_name(Discipline::SportClimbing, ""),
            "Sport Climbing"
        );
    }

    #[test]
    fn test_payload_wire_keys() {
        let registry = GradeRegistry::builtin();
        let mut session = SessionState::start("Mark", Discipline::Bouldering, "Stonegoat").unwrap();
        session
            .log_climb(
                &registry,
                ClimbInput::new("Orange", AscentType::Send).with_notes("heel hook"),
            )
            .unwrap();

        let payload = SessionPayload::from_session(&session, None);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["userName"], "Mark");
        assert_eq!(json["sessionName"], "Stonegoat - Bouldering");
        let climb = &json["climbs"][0];
        assert_eq!(climb["Discipline"], "Bouldering");
        assert_eq!(climb["Grade"], "Orange");
        assert_eq!(climb["Gym"], "Stonegoat");
        assert_eq!(climb["AscentType"], "Send");
        assert_eq!(climb["Notes"], "heel hook");
        assert!(climb["Timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_payload_explicit_name_and_order() {
        let registry = GradeRegistry::builtin();
        let mut session = SessionState::start("Chloe", Discipline::SportClimbing, "").unwrap();
        for grade in ["6a", "6b", "6c"] {
            session
                .log_climb(&registry, ClimbInput::new(grade, AscentType::Send))
                .unwrap();
        }

        let payload = SessionPayload::from_session(&session, Some("  Tuesday lead  "));
        assert_eq!(payload.session_name, "Tuesday lead");
        let grades: Vec<_> = payload.climbs.iter().map(|c| c.grade.as_str()).collect();
        assert_eq!(grades, ["6a", "6b", "6c"]);
        assert!(payload.climbs.iter().all(|c| c.gym.is_empty()));

        let blank = SessionPayload::from_session(&session, Some("   "));
        assert_eq!(blank.session_name, "Sport Climbing");
    }
}
