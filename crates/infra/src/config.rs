//! Configuration loading and representation.

use anyhow::Context;

const LIFECYCLE_BATCH_SIZE: &str = "VOTEBASIS_LIFECYCLE_BATCH_SIZE";

/// Infrastructure settings, read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfraConfig {
    /// Contests handled per batch by the lifecycle job.
    pub lifecycle_batch_size: usize,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            lifecycle_batch_size: 100,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(LIFECYCLE_BATCH_SIZE) {
            let size: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{LIFECYCLE_BATCH_SIZE} must be a number, got '{raw}'"))?;
            anyhow::ensure!(size > 0, "{LIFECYCLE_BATCH_SIZE} must be at least 1");
            config.lifecycle_batch_size = size;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = InfraConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, InfraConfig::default());
    }

    #[test]
    fn reads_batch_size() {
        let config = InfraConfig::from_lookup(|key| {
            (key == LIFECYCLE_BATCH_SIZE).then(|| " 25 ".to_string())
        })
        .unwrap();
        assert_eq!(config.lifecycle_batch_size, 25);
    }

    #[test]
    fn rejects_invalid_batch_size() {
        let err = InfraConfig::from_lookup(|_| Some("many".to_string())).unwrap_err();
        assert!(err.to_string().contains(LIFECYCLE_BATCH_SIZE));

        assert!(InfraConfig::from_lookup(|_| Some("0".to_string())).is_err());
    }
}
