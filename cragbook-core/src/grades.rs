//! Grade scales and the registry that resolves them
//!
//! A [`GradeScale`] is an ordered list of labels, easiest first. Difficulty
//! comparisons always go through a scale's ordinals: `"V10"` sorts above
//! `"V9"` and `"Blue"` above `"Red"` only because the scale says so.
//!
//! Bouldering gyms each set their own scale (colour tapes, numbers, V-grades),
//! so bouldering scales are keyed by gym. Sport climbing uses one French scale
//! regardless of gym.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::config::ScaleConfig;
use crate::error::{Error, Result};
use crate::types::Discipline;

const STONEGOAT: &[&str] = &[
    "Red",
    "Red/Orange",
    "Orange",
    "Orange/Yellow",
    "Yellow",
    "Yellow/Green",
    "Green",
    "Green/Blue",
    "Blue",
];

const NEWSTONE: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8"];

const V_SCALE: &[&str] = &[
    "V0", "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10",
];

const FRENCH_SPORT: &[&str] = &[
    "5a", "5b", "5c", "6a", "6a+", "6b", "6b+", "6c", "6c+", "7a", "7a+", "7b", "7b+", "7c",
    "7c+", "8a",
];

/// An ordered grade scale, easiest grade first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeScale {
    name: String,
    grades: Vec<String>,
}

impl GradeScale {
    /// Build a scale, rejecting empty scales and duplicate labels
    pub fn new(name: impl Into<String>, grades: Vec<String>) -> Result<Self> {
        let name = name.into();
        if grades.is_empty() {
            return Err(Error::Config(format!("grade scale {} has no grades", name)));
        }
        let mut seen = HashSet::new();
        for grade in &grades {
            if grade.trim().is_empty() {
                return Err(Error::Config(format!(
                    "grade scale {} contains an empty grade",
                    name
                )));
            }
            if !seen.insert(grade.as_str()) {
                return Err(Error::Config(format!(
                    "grade scale {} lists {:?} twice",
                    name, grade
                )));
            }
        }
        Ok(Self { name, grades })
    }

    fn from_static(name: &str, grades: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            grades: grades.iter().map(|g| g.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Labels in difficulty order, easiest first
    pub fn grades(&self) -> &[String] {
        &self.grades
    }

    pub fn contains(&self, grade: &str) -> bool {
        self.grades.iter().any(|g| g == grade)
    }

    /// Position of `grade` in the scale (0 = easiest)
    pub fn ordinal(&self, grade: &str) -> Result<usize> {
        self.grades
            .iter()
            .position(|g| g == grade)
            .ok_or_else(|| Error::UnknownGrade {
                grade: grade.to_string(),
                scale: self.name.clone(),
            })
    }

    /// Compare two grades by difficulty
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        Ok(self.ordinal(a)?.cmp(&self.ordinal(b)?))
    }

    /// Hardest grade among `grades`, or `None` if the iterator is empty.
    ///
    /// Fails on the first label that is not part of this scale.
    pub fn hardest<'a, I>(&self, grades: I) -> Result<Option<&'a str>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(usize, &'a str)> = None;
        for grade in grades {
            let ordinal = self.ordinal(grade)?;
            if best.map_or(true, |(b, _)| ordinal > b) {
                best = Some((ordinal, grade));
            }
        }
        Ok(best.map(|(_, g)| g))
    }
}

/// Lookup key for a scale: discipline plus normalised gym name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ScaleKey {
    discipline: Discipline,
    gym: Option<String>,
}

impl ScaleKey {
    fn new(discipline: Discipline, gym: &str) -> Self {
        let gym = if discipline.requires_gym() {
            Some(normalize_gym(gym))
        } else {
            None
        };
        Self { discipline, gym }
    }
}

fn normalize_gym(gym: &str) -> String {
    gym.trim().to_lowercase()
}

/// Static lookup from (discipline, gym) to a [`GradeScale`].
///
/// Gym names match case-insensitively after trimming. Sport climbing ignores
/// the gym. Unknown pairs are a configuration error, never an empty list.
#[derive(Debug, Clone)]
pub struct GradeRegistry {
    scales: BTreeMap<ScaleKey, GradeScale>,
}

impl Default for GradeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GradeRegistry {
    /// Registry containing only the built-in gym scales
    pub fn builtin() -> Self {
        let mut scales = BTreeMap::new();
        for (gym, grades) in [
            ("Stonegoat", STONEGOAT),
            ("Newstone", NEWSTONE),
            ("Brooklyn Boulders", V_SCALE),
        ] {
            scales.insert(
                ScaleKey::new(Discipline::Bouldering, gym),
                GradeScale::from_static(&format!("{} (Bouldering)", gym), grades),
            );
        }
        scales.insert(
            ScaleKey::new(Discipline::SportClimbing, ""),
            GradeScale::from_static("French (Sport Climbing)", FRENCH_SPORT),
        );
        Self { scales }
    }

    /// Built-in scales plus the ones from the config file.
    ///
    /// A configured scale replaces a built-in one with the same key.
    pub fn from_config(configured: &[ScaleConfig]) -> Result<Self> {
        let mut registry = Self::builtin();
        for scale in configured {
            registry.register(scale.discipline, scale.gym.as_deref(), scale.grades.clone())?;
        }
        Ok(registry)
    }

    /// Add or replace a scale
    pub fn register(
        &mut self,
        discipline: Discipline,
        gym: Option<&str>,
        grades: Vec<String>,
    ) -> Result<()> {
        let gym = gym.unwrap_or("").trim();
        if discipline.requires_gym() && gym.is_empty() {
            return Err(Error::Config(format!(
                "{} scales must name a gym",
                discipline.display_name()
            )));
        }
        let name = if discipline.requires_gym() {
            format!("{} ({})", gym, discipline.display_name())
        } else {
            format!("custom ({})", discipline.display_name())
        };
        let scale = GradeScale::new(name, grades)?;
        tracing::debug!(scale = %scale.name(), grades = scale.grades().len(), "Registered grade scale");
        self.scales.insert(ScaleKey::new(discipline, gym), scale);
        Ok(())
    }

    /// Scale for a discipline and gym
    pub fn scale(&self, discipline: Discipline, gym: &str) -> Result<&GradeScale> {
        self.scales
            .get(&ScaleKey::new(discipline, gym))
            .ok_or_else(|| {
                if discipline.requires_gym() && gym.trim().is_empty() {
                    Error::Config(format!("{} requires a gym", discipline.display_name()))
                } else {
                    Error::Config(format!(
                        "no grade scale for {} at {:?}",
                        discipline.display_name(),
                        gym.trim()
                    ))
                }
            })
    }

    /// Ordered grade labels for a discipline and gym
    pub fn grades_for(&self, discipline: Discipline, gym: &str) -> Result<&[String]> {
        Ok(self.scale(discipline, gym)?.grades())
    }

    /// First scale of `discipline` that knows `grade`.
    ///
    /// Used for server history, where climbs are not always tagged with a gym.
    pub fn scale_for_grade(&self, discipline: Discipline, grade: &str) -> Option<&GradeScale> {
        self.scales
            .iter()
            .filter(|(key, _)| key.discipline == discipline)
            .map(|(_, scale)| scale)
            .find(|scale| scale.contains(grade))
    }

    /// Gyms with a registered bouldering scale, in display form
    pub fn bouldering_gyms(&self) -> Vec<&str> {
        self.scales
            .iter()
            .filter(|(key, _)| key.discipline == Discipline::Bouldering)
            .filter_map(|(_, scale)| scale.name().strip_suffix(" (Bouldering)"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stonegoat_scale() {
        let registry = GradeRegistry::builtin();
        let grades = registry
            .grades_for(Discipline::Bouldering, "Stonegoat")
            .unwrap();
        assert_eq!(grades.first().map(String::as_str), Some("Red"));
        assert_eq!(grades.last().map(String::as_str), Some("Blue"));
    }

    #[test]
    fn test_gym_lookup_ignores_case_and_whitespace() {
        let registry = GradeRegistry::builtin();
        assert!(registry
            .scale(Discipline::Bouldering, "  stonegoat ")
            .is_ok());
    }

    #[test]
    fn test_sport_ignores_gym() {
        let registry = GradeRegistry::builtin();
        let a = registry.scale(Discipline::SportClimbing, "").unwrap();
        let b = registry
            .scale(Discipline::SportClimbing, "Anywhere")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.grades().len(), 16);
    }

    #[test]
    fn test_unknown_gym_is_config_error() {
        let registry = GradeRegistry::builtin();
        let err = registry
            .grades_for(Discipline::Bouldering, "Nowhere")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = registry.scale(Discipline::Bouldering, "").unwrap_err();
        assert!(err.to_string().contains("requires a gym"));
    }

    #[test]
    fn test_ordinal_comparison_not_lexical() {
        let registry = GradeRegistry::builtin();
        let v = registry
            .scale(Discipline::Bouldering, "Brooklyn Boulders")
            .unwrap();
        assert_eq!(v.compare("V10", "V9").unwrap(), Ordering::Greater);
        assert_eq!(v.compare("V2", "V2").unwrap(), Ordering::Equal);

        let sport = registry.scale(Discipline::SportClimbing, "").unwrap();
        assert_eq!(sport.compare("6a+", "6b").unwrap(), Ordering::Less);
    }

    #[test]
    fn test_unknown_grade_fails_comparison() {
        let registry = GradeRegistry::builtin();
        let scale = registry.scale(Discipline::Bouldering, "Stonegoat").unwrap();
        let err = scale.compare("V99", "Red").unwrap_err();
        assert!(matches!(err, Error::UnknownGrade { ref grade, .. } if grade == "V99"));
    }

    #[test]
    fn test_hardest() {
        let registry = GradeRegistry::builtin();
        let scale = registry.scale(Discipline::Bouldering, "Newstone").unwrap();
        assert_eq!(scale.hardest(["3", "8", "5"]).unwrap(), Some("8"));
        assert_eq!(scale.hardest(Vec::<&str>::new()).unwrap(), None);
        assert!(scale.hardest(["3", "9"]).is_err());
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut registry = GradeRegistry::builtin();
        registry
            .register(
                Discipline::Bouldering,
                Some("stonegoat"),
                vec!["Easy".to_string(), "Hard".to_string()],
            )
            .unwrap();
        let grades = registry
            .grades_for(Discipline::Bouldering, "Stonegoat")
            .unwrap();
        assert_eq!(grades, ["Easy".to_string(), "Hard".to_string()]);
    }

    #[test]
    fn test_register_rejects_bad_scales() {
        let mut registry = GradeRegistry::builtin();
        assert!(registry
            .register(Discipline::Bouldering, None, vec!["A".to_string()])
            .is_err());
        assert!(registry
            .register(Discipline::Bouldering, Some("Gym"), vec![])
            .is_err());
        assert!(registry
            .register(
                Discipline::Bouldering,
                Some("Gym"),
                vec!["A".to_string(), "A".to_string()]
            )
            .is_err());
    }

    #[test]
    fn test_scale_for_grade() {
        let registry = GradeRegistry::builtin();
        let scale = registry
            .scale_for_grade(Discipline::Bouldering, "Green/Blue")
            .unwrap();
        assert_eq!(scale.name(), "Stonegoat (Bouldering)");
        assert!(registry
            .scale_for_grade(Discipline::SportClimbing, "V4")
            .is_none());
    }

    #[test]
    fn test_bouldering_gyms() {
        let registry = GradeRegistry::builtin();
        let gyms = registry.bouldering_gyms();
        assert!(gyms.contains(&"Stonegoat"));
        assert!(gyms.contains(&"Brooklyn Boulders"));
        assert_eq!(gyms.len(), 3);
    }
}
