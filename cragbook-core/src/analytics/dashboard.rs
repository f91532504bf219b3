//! Logbook dashboard: server stats, history and pyramid in one view.
//!
//! Loading never fails. Each backend read that errors is replaced by an empty
//! default (`N/A`, zero counts, no sessions) and noted in
//! [`Dashboard::degraded`] so the view can say it is incomplete.

use crate::error::Error;
use crate::gateway::Backend;
use crate::grades::GradeScale;
use crate::types::{BackendStats, GradePyramid, HistoricSession};

use super::history::{session_summaries, SessionSummaryRow};
use super::pyramid::{history_pyramid, ordered_pyramid, PyramidRow};

/// Which backend read fell back to defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardSection {
    Stats,
    Sessions,
    Pyramid,
}

impl DashboardSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardSection::Stats => "stats",
            DashboardSection::Sessions => "sessions",
            DashboardSection::Pyramid => "grade pyramid",
        }
    }
}

/// Everything the logbook view shows for one climber
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub user_name: String,
    pub stats: BackendStats,
    pub sessions: Vec<HistoricSession>,
    pub pyramid: GradePyramid,
    /// Sections that could not be loaded
    pub degraded: Vec<DashboardSection>,
}

impl Dashboard {
    /// Fetch stats, sessions and pyramid concurrently.
    ///
    /// If only the pyramid read fails, the pyramid is rebuilt from the
    /// session history instead.
    pub async fn load<B: Backend + ?Sized>(backend: &B, user_name: &str) -> Self {
        let (stats, sessions, pyramid) = tokio::join!(
            backend.fetch_stats(user_name),
            backend.fetch_sessions(user_name),
            backend.fetch_grade_pyramid(user_name),
        );

        let mut dashboard = Dashboard {
            user_name: user_name.trim().to_string(),
            ..Default::default()
        };

        match stats {
            Ok(stats) => dashboard.stats = stats,
            Err(e) => dashboard.degrade(DashboardSection::Stats, &e),
        }
        match sessions {
            Ok(sessions) => dashboard.sessions = sessions,
            Err(e) => dashboard.degrade(DashboardSection::Sessions, &e),
        }
        match pyramid {
            Ok(pyramid) => dashboard.pyramid = pyramid,
            Err(e) => {
                dashboard.degrade(DashboardSection::Pyramid, &e);
                if !dashboard.is_degraded(DashboardSection::Sessions) {
                    dashboard.pyramid = history_pyramid(&dashboard.sessions);
                }
            }
        }

        dashboard
    }

    fn degrade(&mut self, section: DashboardSection, error: &Error) {
        tracing::warn!(
            user = %self.user_name,
            section = section.as_str(),
            error = %error,
            "Dashboard section unavailable, showing defaults"
        );
        self.degraded.push(section);
    }

    pub fn is_degraded(&self, section: DashboardSection) -> bool {
        self.degraded.contains(&section)
    }

    /// The `n` most recent sessions
    pub fn recent_sessions(&self, n: usize) -> Vec<SessionSummaryRow> {
        let mut rows = session_summaries(&self.sessions);
        rows.truncate(n);
        rows
    }

    /// Pyramid rows in `scale` order, hardest first
    pub fn pyramid_rows(&self, scale: &GradeScale) -> Vec<PyramidRow> {
        ordered_pyramid(&self.pyramid, scale)
    }
}
