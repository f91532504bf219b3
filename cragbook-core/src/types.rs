//! Core domain types for cragbook
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Discipline** | Climbing category: Bouldering or Sport Climbing |
//! | **Grade** | A difficulty label, totally ordered within its [`GradeScale`](crate::grades::GradeScale) |
//! | **Ascent** | How a climb went: Attempt, Send or Flash |
//! | **Climb** | One logged ascent event ([`ClimbRecord`]) |
//! | **Session** | A bounded period of climbing, saved to the backend as a unit |
//!
//! Climbs logged in the live session are [`ClimbRecord`]s. Climbs read back
//! from the backend are [`HistoricClimb`]s: the server stores fewer fields and
//! may omit the ascent type entirely.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder shown wherever a grade cannot be derived.
pub const NO_GRADE: &str = "N/A";

// ============================================
// Discipline
// ============================================

/// Climbing discipline. Each discipline has its own grade scales.
///
/// Serialized with the backend's labels (`"Bouldering"`, `"Sport Climbing"`);
/// snake_case spellings are accepted when reading config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Discipline {
    #[serde(rename = "Bouldering", alias = "bouldering")]
    Bouldering,
    #[serde(
        rename = "Sport Climbing",
        alias = "sport_climbing",
        alias = "SportClimbing"
    )]
    SportClimbing,
}

impl Discipline {
    /// Label used on the wire and in derived session names
    pub fn display_name(&self) -> &'static str {
        match self {
            Discipline::Bouldering => "Bouldering",
            Discipline::SportClimbing => "Sport Climbing",
        }
    }

    /// Short identifier used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Bouldering => "bouldering",
            Discipline::SportClimbing => "sport_climbing",
        }
    }

    /// Whether sessions in this discipline are tied to a gym's own scale
    pub fn requires_gym(&self) -> bool {
        matches!(self, Discipline::Bouldering)
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bouldering" | "Bouldering" | "boulder" => Ok(Discipline::Bouldering),
            "sport_climbing" | "Sport Climbing" | "SportClimbing" | "sport" => {
                Ok(Discipline::SportClimbing)
            }
            other => Err(format!("unknown discipline: {}", other)),
        }
    }
}

// ============================================
// Ascent Type
// ============================================

/// How a logged climb went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AscentType {
    #[serde(alias = "attempt")]
    Attempt,
    #[serde(alias = "send")]
    Send,
    #[serde(alias = "flash")]
    Flash,
}

impl AscentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AscentType::Attempt => "Attempt",
            AscentType::Send => "Send",
            AscentType::Flash => "Flash",
        }
    }

    /// Send and Flash complete the climb; an Attempt does not.
    pub fn counts_as_send(&self) -> bool {
        matches!(self, AscentType::Send | AscentType::Flash)
    }
}

impl std::fmt::Display for AscentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AscentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "attempt" | "Attempt" => Ok(AscentType::Attempt),
            "send" | "Send" => Ok(AscentType::Send),
            "flash" | "Flash" => Ok(AscentType::Flash),
            other => Err(format!("unknown ascent type: {}", other)),
        }
    }
}

// ============================================
// Climbs
// ============================================

/// Identifier of a climb within its session.
///
/// Assigned from a per-session counter, so ids grow in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClimbId(pub u64);

impl std::fmt::Display for ClimbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ClimbId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(ClimbId)
            .map_err(|_| format!("invalid climb id: {}", s))
    }
}

/// What the user enters when logging a climb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClimbInput {
    pub grade: String,
    pub ascent_type: AscentType,
    pub notes: Option<String>,
}

impl ClimbInput {
    pub fn new(grade: impl Into<String>, ascent_type: AscentType) -> Self {
        Self {
            grade: grade.into(),
            ascent_type,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// One logged ascent in the live session.
///
/// Records are never edited after creation; sessions only hand out shared
/// references and remove whole records on delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimbRecord {
    pub id: ClimbId,
    pub discipline: Discipline,
    /// Gym name for bouldering, empty otherwise
    pub gym: String,
    pub grade: String,
    pub ascent_type: AscentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Backend history
// ============================================

/// A climb as returned by `GET /api/sessions/{user}`.
///
/// The server has returned both database column names (`Grade`) and
/// snake_case keys (`grade`) over time, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricClimb {
    #[serde(alias = "Grade")]
    pub grade: String,
    #[serde(alias = "Discipline", default)]
    pub discipline: String,
    #[serde(alias = "AscentType", alias = "ascentType", default)]
    pub ascent_type: Option<String>,
    #[serde(alias = "Gym", default)]
    pub gym: Option<String>,
}

impl HistoricClimb {
    /// Parsed discipline, if the server sent a known one
    pub fn discipline(&self) -> Option<Discipline> {
        self.discipline.parse().ok()
    }

    /// Parsed ascent type, if present
    pub fn ascent(&self) -> Option<AscentType> {
        self.ascent_type.as_deref().and_then(|s| s.parse().ok())
    }

    /// Whether this climb counts toward "hardest" metrics.
    ///
    /// The backend only started storing ascent types late, so a missing
    /// value is treated as a completed climb.
    pub fn counts_as_send(&self) -> bool {
        self.ascent().map_or(true, |a| a.counts_as_send())
    }
}

/// A saved session as returned by `GET /api/sessions/{user}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricSession {
    pub session_name: String,
    /// `YYYY-MM-DD`; null when the server could not parse the stored date
    #[serde(default)]
    pub session_date: Option<NaiveDate>,
    #[serde(default)]
    pub climbs: Vec<HistoricClimb>,
}

/// Server-side headline stats from `GET /api/stats/{user}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStats {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default = "no_grade")]
    pub hardest_boulder: String,
    #[serde(default = "no_grade")]
    pub hardest_sport: String,
}

impl Default for BackendStats {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            hardest_boulder: no_grade(),
            hardest_sport: no_grade(),
        }
    }
}

fn no_grade() -> String {
    NO_GRADE.to_string()
}

/// Histogram of climb counts per grade label
pub type GradePyramid = BTreeMap<String, usize>;
