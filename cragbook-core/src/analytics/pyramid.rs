//! Grade pyramid and hardest-send calculations.
//!
//! Every logged climb is one ascent event, so repeats of the same grade all
//! count, whatever their ascent type.

use crate::error::Result;
use crate::grades::GradeScale;
use crate::types::{ClimbRecord, GradePyramid, HistoricClimb, HistoricSession};

/// A climb that can be counted by grade
pub trait GradedClimb {
    fn grade(&self) -> &str;

    /// Whether the climb was completed (Send or Flash)
    fn counts_as_send(&self) -> bool;
}

impl GradedClimb for ClimbRecord {
    fn grade(&self) -> &str {
        &self.grade
    }

    fn counts_as_send(&self) -> bool {
        self.ascent_type.counts_as_send()
    }
}

impl GradedClimb for HistoricClimb {
    fn grade(&self) -> &str {
        &self.grade
    }

    fn counts_as_send(&self) -> bool {
        HistoricClimb::counts_as_send(self)
    }
}

/// Row of a pyramid laid out for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidRow {
    pub grade: String,
    pub count: usize,
}

/// Count climbs per grade label.
///
/// The result does not depend on the order of `climbs`.
pub fn grade_pyramid<'a, C, I>(climbs: I) -> GradePyramid
where
    C: GradedClimb + 'a,
    I: IntoIterator<Item = &'a C>,
{
    let mut pyramid = GradePyramid::new();
    for climb in climbs {
        *pyramid.entry(climb.grade().to_string()).or_default() += 1;
    }
    pyramid
}

/// Pyramid over every climb of every saved session
pub fn history_pyramid(sessions: &[HistoricSession]) -> GradePyramid {
    grade_pyramid(sessions.iter().flat_map(|s| s.climbs.iter()))
}

/// Hardest completed grade among `climbs`.
///
/// Attempts are ignored. Returns `Ok(None)` when nothing was sent and
/// [`Error::UnknownGrade`](crate::Error::UnknownGrade) if a sent grade is not
/// part of `scale`.
pub fn hardest_grade<'a, C, I>(climbs: I, scale: &GradeScale) -> Result<Option<&'a str>>
where
    C: GradedClimb + 'a,
    I: IntoIterator<Item = &'a C>,
{
    scale.hardest(
        climbs
            .into_iter()
            .filter(|c| c.counts_as_send())
            .map(|c| c.grade()),
    )
}

/// Lay out a pyramid in scale order, hardest grade first.
///
/// Grades with no climbs are skipped. Labels the scale does not know (old
/// server data, another gym's tapes) are appended after the scale, sorted.
pub fn ordered_pyramid(pyramid: &GradePyramid, scale: &GradeScale) -> Vec<PyramidRow> {
    let mut rows: Vec<PyramidRow> = scale
        .grades()
        .iter()
        .rev()
        .filter_map(|grade| {
            pyramid
                .get(grade)
                .filter(|&&count| count > 0)
                .map(|&count| PyramidRow {
                    grade: grade.clone(),
                    count,
                })
        })
        .collect();

    rows.extend(
        pyramid
            .iter()
            .filter(|(grade, count)| **count > 0 && !scale.contains(grade))
            .map(|(grade, count)| PyramidRow {
                grade: grade.clone(),
                count: *count,
            }),
    );
    rows
}
