//! Summaries over saved session history.
//!
//! Input is whatever `GET /api/sessions/{user}` returned. The backend usually
//! sends newest first but does not promise it, so everything here re-sorts.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::grades::{GradeRegistry, GradeScale};
use crate::types::{Discipline, HistoricClimb, HistoricSession};

/// Number of sessions shown as "recent"
pub const RECENT_SESSIONS: usize = 3;

/// One line of the session history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryRow {
    pub date: Option<NaiveDate>,
    pub name: String,
    pub climb_count: usize,
}

/// Activity on one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub sessions: usize,
    pub climbs: usize,
}

/// Profile headline numbers computed from history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileStats {
    /// Distinct session names
    pub total_sessions: usize,
    pub hardest_boulder: Option<String>,
    pub hardest_sport: Option<String>,
    pub recent_sessions: Vec<SessionSummaryRow>,
}

/// Project sessions to summary rows, newest first.
///
/// Sessions without a date go last. Equal dates keep the backend's order.
pub fn session_summaries(sessions: &[HistoricSession]) -> Vec<SessionSummaryRow> {
    let mut rows: Vec<SessionSummaryRow> = sessions
        .iter()
        .map(|s| SessionSummaryRow {
            date: s.session_date,
            name: s.session_name.clone(),
            climb_count: s.climbs.len(),
        })
        .collect();
    // `Option` orders None first, so reversing the comparison puts it last.
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

/// Per-day session and climb counts, newest day first. Undated sessions are skipped.
pub fn daily_summaries(sessions: &[HistoricSession]) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();
    for session in sessions {
        let Some(date) = session.session_date else {
            continue;
        };
        let day = days.entry(date).or_insert(DailySummary {
            date,
            sessions: 0,
            climbs: 0,
        });
        day.sessions += 1;
        day.climbs += session.climbs.len();
    }
    days.into_values().rev().collect()
}

/// Headline stats for a climber's profile.
///
/// Hardest grades only consider completed climbs. History spans gyms with
/// different scales, so grades are compared by their relative position in
/// their own scale; grades no registered scale knows are skipped.
pub fn profile_stats(sessions: &[HistoricSession], registry: &GradeRegistry) -> ProfileStats {
    let total_sessions = sessions
        .iter()
        .map(|s| s.session_name.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut recent_sessions = session_summaries(sessions);
    recent_sessions.truncate(RECENT_SESSIONS);

    ProfileStats {
        total_sessions,
        hardest_boulder: hardest_in_history(sessions, registry, Discipline::Bouldering),
        hardest_sport: hardest_in_history(sessions, registry, Discipline::SportClimbing),
        recent_sessions,
    }
}

fn hardest_in_history(
    sessions: &[HistoricSession],
    registry: &GradeRegistry,
    discipline: Discipline,
) -> Option<String> {
    let mut best: Option<(f64, usize, &str)> = None;

    for climb in sessions.iter().flat_map(|s| s.climbs.iter()) {
        if climb.discipline() != Some(discipline) || !climb.counts_as_send() {
            continue;
        }
        let Some(scale) = scale_for(climb, registry, discipline) else {
            tracing::warn!(grade = %climb.grade, %discipline, "Skipping grade with no known scale");
            continue;
        };
        let Ok(ordinal) = scale.ordinal(&climb.grade) else {
            continue;
        };
        let relative = relative_position(ordinal, scale);
        let better = match best {
            None => true,
            Some((r, o, _)) => relative > r || (relative == r && ordinal > o),
        };
        if better {
            best = Some((relative, ordinal, climb.grade.as_str()));
        }
    }

    best.map(|(_, _, grade)| grade.to_string())
}

/// The climb's own gym scale when it has one, otherwise any scale of the
/// discipline that knows the grade.
fn scale_for<'r>(
    climb: &HistoricClimb,
    registry: &'r GradeRegistry,
    discipline: Discipline,
) -> Option<&'r GradeScale> {
    let gym = climb.gym.as_deref().unwrap_or("");
    registry
        .scale(discipline, gym)
        .ok()
        .filter(|scale| scale.contains(&climb.grade))
        .or_else(|| registry.scale_for_grade(discipline, &climb.grade))
}

fn relative_position(ordinal: usize, scale: &GradeScale) -> f64 {
    let steps = scale.grades().len().saturating_sub(1);
    if steps == 0 {
        1.0
    } else {
        ordinal as f64 / steps as f64
    }
}
