//! Preprocessor configuration.
use serde::Deserialize;
use thiserror::Error;

use flprep_macros::DocDefault;

/// Configurable parameters used during preprocessing.
#[derive(DocDefault, Clone, Debug, Eq, PartialEq)]
pub struct PreprocessorConfig {
    /// Number of threads used to propagate long occurrence lists, 1 disables the thread pool.
    /// (Default: 1)
    pub threads: usize,

    /// Minimal occurrence list length that is split across threads. (Default: 256)
    pub fanout_grain: usize,
}

/// An invalid configuration value.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("threads must be at least 1")]
    ZeroThreads,
    #[error("fanout_grain must be at least 1")]
    ZeroFanoutGrain,
}

impl PreprocessorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.fanout_grain == 0 {
            return Err(ConfigError::ZeroFanoutGrain);
        }
        Ok(())
    }
}

/// A partial configuration, as read from configuration files or command line options.
#[derive(Deserialize, Default, Clone, Debug, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PreprocessorConfigUpdate {
    pub threads: Option<usize>,
    pub fanout_grain: Option<usize>,
}

impl PreprocessorConfigUpdate {
    pub fn new() -> PreprocessorConfigUpdate {
        PreprocessorConfigUpdate::default()
    }

    /// Values set in `other` take precedence.
    pub fn merge(&mut self, other: PreprocessorConfigUpdate) {
        if other.threads.is_some() {
            self.threads = other.threads;
        }
        if other.fanout_grain.is_some() {
            self.fanout_grain = other.fanout_grain;
        }
    }

    /// Overwrite the values present in this update.
    ///
    /// Leaves `config` unchanged when the result would be invalid.
    pub fn apply(&self, config: &mut PreprocessorConfig) -> Result<(), ConfigError> {
        let mut updated = config.clone();
        if let Some(threads) = self.threads {
            updated.threads = threads;
        }
        if let Some(fanout_grain) = self.fanout_grain {
            updated.fanout_grain = fanout_grain;
        }
        updated.validate()?;
        *config = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_doc_comments() {
        let config = PreprocessorConfig::default();
        assert_eq!(config.threads, 1);
        assert_eq!(config.fanout_grain, 256);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn help_lists_options() {
        let help = PreprocessorConfig::help();
        assert!(help.contains("threads:"));
        assert!(help.contains("fanout_grain:"));
        assert!(help.contains("(Default: 256)"));
    }

    #[test]
    fn later_updates_take_precedence() {
        let mut update = PreprocessorConfigUpdate::new();
        update.merge(toml::from_str("threads = 4\nfanout_grain = 64").unwrap());
        update.merge(toml::from_str("threads=2").unwrap());

        let mut config = PreprocessorConfig::default();
        update.apply(&mut config).unwrap();

        assert_eq!(
            config,
            PreprocessorConfig {
                threads: 2,
                fanout_grain: 64,
            }
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = PreprocessorConfig::default();

        let update: PreprocessorConfigUpdate = toml::from_str("threads = 0").unwrap();
        assert_eq!(update.apply(&mut config), Err(ConfigError::ZeroThreads));

        let update: PreprocessorConfigUpdate = toml::from_str("fanout_grain = 0").unwrap();
        assert_eq!(update.apply(&mut config), Err(ConfigError::ZeroFanoutGrain));

        assert_eq!(config, PreprocessorConfig::default());

        assert!(toml::from_str::<PreprocessorConfigUpdate>("thread = 2").is_err());
    }
}
