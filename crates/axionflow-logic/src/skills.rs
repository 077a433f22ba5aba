//! Skill proficiency and the hard skill filter used by the scorer.
//!
//! Workers hold a set of `(skill_id, proficiency)` pairs with proficiency on
//! a 1–5 scale. A task may name one required skill. A worker without it is
//! not a candidate at all; one with it scores `proficiency / 5`.
//!
//! ```
//! use axionflow_logic::skills::{skill_match, SkillLevel, SkillMatch};
//!
//! let skills = vec![SkillLevel::new("welding", 4)];
//! assert_eq!(skill_match(Some("welding"), &skills), SkillMatch::Qualified(0.8));
//! assert_eq!(skill_match(Some("forklift"), &skills), SkillMatch::Missing);
//! assert_eq!(skill_match(None, &skills), SkillMatch::Qualified(1.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::scoring::MAX_PROFICIENCY;

/// One skill a worker holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLevel {
    pub skill_id: String,
    /// 1 (novice) to 5 (expert).
    pub proficiency: u8,
}

impl SkillLevel {
    pub fn new(skill_id: impl Into<String>, proficiency: u8) -> Self {
        Self {
            skill_id: skill_id.into(),
            proficiency,
        }
    }

    /// Proficiency as a fraction of the top rating, capped at 1.0.
    pub fn normalized(&self) -> f32 {
        self.proficiency.min(MAX_PROFICIENCY) as f32 / MAX_PROFICIENCY as f32
    }
}

/// Outcome of checking a worker against a task's skill requirement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillMatch {
    /// Eligible, with the skill component of the score in `[0, 1]`.
    Qualified(f32),
    /// Lacks the required skill; excluded from consideration.
    Missing,
}

impl SkillMatch {
    pub fn score(self) -> Option<f32> {
        match self {
            SkillMatch::Qualified(s) => Some(s),
            SkillMatch::Missing => None,
        }
    }
}

/// Look up a worker's proficiency in one skill.
pub fn proficiency(skills: &[SkillLevel], skill_id: &str) -> Option<u8> {
    skills
        .iter()
        .find(|s| s.skill_id == skill_id)
        .map(|s| s.proficiency)
}

/// Check a worker's skills against an optional requirement.
///
/// With no requirement every worker qualifies at full score. If the worker
/// lists the skill twice, the first entry counts.
pub fn skill_match(required: Option<&str>, skills: &[SkillLevel]) -> SkillMatch {
    let Some(required) = required else {
        return SkillMatch::Qualified(1.0);
    };
    skills
        .iter()
        .find(|s| s.skill_id == required)
        .map(|s| SkillMatch::Qualified(s.normalized()))
        .unwrap_or(SkillMatch::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_requirement_is_full_score() {
        assert_eq!(skill_match(None, &[]), SkillMatch::Qualified(1.0));
    }

    #[test]
    fn test_proficiency_scales_linearly() {
        for p in 1..=5u8 {
            let skills = vec![SkillLevel::new("paint", p)];
            let m = skill_match(Some("paint"), &skills);
            assert_eq!(m, SkillMatch::Qualified(p as f32 / 5.0));
        }
    }

    #[test]
    fn test_missing_skill_excludes() {
        let skills = vec![SkillLevel::new("paint", 5)];
        assert_eq!(skill_match(Some("Welding"), &skills), SkillMatch::Missing);
        assert_eq!(skill_match(Some("Welding"), &skills).score(), None);
    }

    #[test]
    fn test_out_of_scale_proficiency_caps() {
        let skills = vec![SkillLevel::new("paint", 9)];
        assert_eq!(skill_match(Some("paint"), &skills), SkillMatch::Qualified(1.0));
    }

    #[test]
    fn test_first_entry_wins() {
        let skills = vec![SkillLevel::new("paint", 2), SkillLevel::new("paint", 5)];
        assert_eq!(proficiency(&skills, "paint"), Some(2));
        assert_eq!(skill_match(Some("paint"), &skills), SkillMatch::Qualified(0.4));
    }
}
