//! Registry configuration.

/// Configuration for a [`Registry`](crate::Registry).
///
/// Every component defined by a registry copies this configuration when it is
/// defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Check after every `add` that the entity actually carries the
    /// component's shape. Costs one map lookup per add.
    pub strict_validation: bool,
}

impl RegistryConfig {
    /// Create a config with strict validation switched explicitly.
    #[must_use]
    pub const fn new(strict_validation: bool) -> Self {
        Self { strict_validation }
    }

    /// Override strict validation.
    #[must_use]
    pub const fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }
}

impl Default for RegistryConfig {
    /// Strict in debug builds, off in release builds.
    fn default() -> Self {
        Self::new(cfg!(debug_assertions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_follows_build_profile() {
        assert_eq!(
            RegistryConfig::default().strict_validation,
            cfg!(debug_assertions)
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = RegistryConfig::new(false).with_strict_validation(true);
        assert!(config.strict_validation);
    }
}
