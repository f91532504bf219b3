//! Stats aggregation for cragbook
//!
//! Pure functions from climbs or saved sessions to derived metrics:
//! - Grade pyramid (climbs per grade) and its display ordering
//! - Hardest send against a grade scale
//! - Session history summaries, per-day activity and profile headlines
//! - Live summary of the session in progress
//!
//! Nothing here does I/O except [`Dashboard::load`], which only gathers the
//! inputs and degrades to defaults when the backend cannot be read.

pub mod dashboard;
pub mod history;
pub mod live;
pub mod pyramid;

pub use dashboard::{Dashboard, DashboardSection};
pub use history::{
    daily_summaries, profile_stats, session_summaries, DailySummary, ProfileStats,
    SessionSummaryRow, RECENT_SESSIONS,
};
pub use live::LiveSummary;
pub use pyramid::{
    grade_pyramid, hardest_grade, history_pyramid, ordered_pyramid, GradedClimb, PyramidRow,
};
