//! User preferences: daily limit, scoring weights, rescheduling mode, notifications.

use serde::{Deserialize, Serialize};

use crate::capacity::DEFAULT_DAILY_TASK_LIMIT;

/// Relative importance of the four soft-score factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub energy: f64,
    pub deadline: f64,
    pub workload: f64,
    pub day_preference: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            energy: 0.40,
            deadline: 0.30,
            workload: 0.20,
            day_preference: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.energy + self.deadline + self.workload + self.day_preference
    }

    /// Weights rescaled to sum to 1.0.
    ///
    /// Negative or non-finite entries count as zero; an all-zero set falls back
    /// to the defaults. Scores built from these stay within 0..=100.
    pub fn normalized(&self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let w = Self {
            energy: clean(self.energy),
            deadline: clean(self.deadline),
            workload: clean(self.workload),
            day_preference: clean(self.day_preference),
        };
        let total = w.sum();
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            energy: w.energy / total,
            deadline: w.deadline / total,
            workload: w.workload / total,
            day_preference: w.day_preference / total,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("energy", self.energy),
            ("deadline", self.deadline),
            ("workload", self.workload),
            ("day_preference", self.day_preference),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(format!("weight {name} must be a non-negative number, got {w}"));
            }
        }
        let total = self.sum();
        if (total - 1.0).abs() > 0.01 {
            return Err(format!("weights should sum to 1.0, got {total:.2}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReschedulingBehavior {
    /// Apply improvements immediately.
    Automatic,
    /// Return suggestions for the user to accept.
    #[default]
    AskPermission,
}

impl std::str::FromStr for ReschedulingBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "automatic" | "auto" => Ok(ReschedulingBehavior::Automatic),
            "ask_permission" | "ask" => Ok(ReschedulingBehavior::AskPermission),
            other => Err(format!("unknown rescheduling behavior: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub overload_warnings: bool,
    pub reschedule_suggestions: bool,
    pub pull_forward_suggestions: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            overload_warnings: true,
            reschedule_suggestions: true,
            pull_forward_suggestions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Base tasks per day before phase scaling.
    pub daily_task_limit: u32,
    pub weights: ScoringWeights,
    pub rescheduling_behavior: ReschedulingBehavior,
    pub notifications: NotificationSettings,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            daily_task_limit: DEFAULT_DAILY_TASK_LIMIT,
            weights: ScoringWeights::default(),
            rescheduling_behavior: ReschedulingBehavior::default(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl UserPreferences {
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_task_limit == 0 {
            return Err("daily_task_limit must be at least 1".to_string());
        }
        self.weights.validate().map_err(|e| format!("weights: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let p = UserPreferences::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.daily_task_limit, 4);
        assert_eq!(p.rescheduling_behavior, ReschedulingBehavior::AskPermission);
    }

    #[test]
    fn test_normalized_rescales_and_drops_bad_entries() {
        let w = ScoringWeights {
            energy: 2.0,
            deadline: 1.0,
            workload: -3.0,
            day_preference: f64::NAN,
        };
        assert!(w.validate().is_err());
        let n = w.normalized();
        assert!((n.sum() - 1.0).abs() < 1e-9);
        assert!((n.energy - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(n.workload, 0.0);

        let zero = ScoringWeights {
            energy: 0.0,
            deadline: 0.0,
            workload: 0.0,
            day_preference: 0.0,
        };
        assert_eq!(zero.normalized(), ScoringWeights::default());
    }

    #[test]
    fn test_validate_flags_wrong_sum() {
        let w = ScoringWeights {
            energy: 0.5,
            ..ScoringWeights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_behavior_wire_names() {
        let json = serde_json::to_string(&ReschedulingBehavior::AskPermission).unwrap();
        assert_eq!(json, "\"ask_permission\"");
        assert_eq!("automatic".parse::<ReschedulingBehavior>(), Ok(ReschedulingBehavior::Automatic));
        assert_eq!("ask-permission".parse::<ReschedulingBehavior>(), Ok(ReschedulingBehavior::AskPermission));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let p: UserPreferences = serde_json::from_str(r#"{"daily_task_limit":6}"#).unwrap();
        assert_eq!(p.daily_task_limit, 6);
        assert_eq!(p.weights, ScoringWeights::default());
    }
}
