use crate::error::{check_epsilon, AdStarError, Result};

/// Tuning of an [`AdStar`](crate::AdStar) search.
#[derive(Clone, Debug, PartialEq)]
pub struct AdStarConfig {
    /// Inflation used for the first episode, and again after significant graph changes.
    pub initial_epsilon: f64,
    /// Inflation at which the anytime loop stops improving.
    pub final_epsilon: f64,
    /// Amount ε is lowered by between episodes.
    pub epsilon_step: f64,
    /// When more states than this were invalidated since the last episode, ε is reset to
    /// `initial_epsilon` instead of being lowered.
    pub significant_change_threshold: usize,
    /// Upper bound on the expansions of a single path computation.
    pub max_expansions: Option<u64>,
}

impl Default for AdStarConfig {
    fn default() -> Self {
        AdStarConfig {
            initial_epsilon: 2.5,
            final_epsilon: 1.0,
            epsilon_step: 0.5,
            significant_change_threshold: usize::MAX,
            max_expansions: None,
        }
    }
}

impl AdStarConfig {
    /// Configuration for a single optimal search: ε stays at 1.
    pub fn optimal() -> Self {
        AdStarConfig {
            initial_epsilon: 1.0,
            ..AdStarConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_epsilon(self.initial_epsilon)?;
        check_epsilon(self.final_epsilon)?;
        if self.final_epsilon > self.initial_epsilon {
            return Err(AdStarError::InvalidConfig(format!(
                "final epsilon {} exceeds initial epsilon {}",
                self.final_epsilon, self.initial_epsilon
            )));
        }
        if !(self.epsilon_step.is_finite() && self.epsilon_step > 0.0) {
            return Err(AdStarError::InvalidConfig(format!(
                "epsilon step must be finite and positive, got {}",
                self.epsilon_step
            )));
        }
        if self.max_expansions == Some(0) {
            return Err(AdStarError::InvalidConfig(
                "expansion budget must allow at least one expansion".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AdStarConfig::default().validate(), Ok(()));
        assert_eq!(AdStarConfig::optimal().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_schedules() {
        let config = AdStarConfig {
            initial_epsilon: 0.5,
            ..AdStarConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(AdStarError::InvalidEpsilon { epsilon: 0.5 })
        );

        let config = AdStarConfig {
            initial_epsilon: 1.5,
            final_epsilon: 2.0,
            ..AdStarConfig::default()
        };
        assert!(matches!(config.validate(), Err(AdStarError::InvalidConfig(_))));

        let config = AdStarConfig {
            epsilon_step: 0.0,
            ..AdStarConfig::default()
        };
        assert!(matches!(config.validate(), Err(AdStarError::InvalidConfig(_))));

        let config = AdStarConfig {
            final_epsilon: f64::NAN,
            ..AdStarConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AdStarError::InvalidEpsilon { .. })
        ));
    }
}
