//! Index configuration

use crate::error::IndexError;
use serde::{Deserialize, Serialize};

/// Default name of the bus the local messaging engine belongs to
pub const DEFAULT_LOCAL_BUS: &str = "DefaultBus";

/// Configuration shared by the destination indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Bus of the local messaging engine; its name map exists from construction
    pub local_bus: String,
    /// Initial capacity of the primary map
    pub initial_capacity: usize,
}

impl IndexConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With local bus name
    #[inline]
    #[must_use]
    pub fn with_local_bus(mut self, bus: impl Into<String>) -> Self {
        self.local_bus = bus.into();
        self
    }

    /// With initial primary map capacity
    #[inline]
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Parse from TOML and validate
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(input: &str) -> Result<Self, IndexError> {
        let config: Self = toml::from_str(input).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values
    ///
    /// # Errors
    /// Returns [`IndexError::Config`] if the local bus name is empty.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.local_bus.trim().is_empty() {
            return Err(IndexError::Config("local_bus must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            local_bus: DEFAULT_LOCAL_BUS.to_string(),
            initial_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IndexConfig::new();
        assert_eq!(config.local_bus, "DefaultBus");
        assert_eq!(config.initial_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder() {
        let config = IndexConfig::new()
            .with_local_bus("BusA")
            .with_initial_capacity(8);
        assert_eq!(config.local_bus, "BusA");
        assert_eq!(config.initial_capacity, 8);
    }

    #[test]
    fn from_toml_partial() {
        let config = IndexConfig::from_toml_str("local_bus = \"Payments\"\n").unwrap();
        assert_eq!(config.local_bus, "Payments");
        assert_eq!(config.initial_capacity, 64);
    }

    #[test]
    fn from_toml_rejects_empty_bus() {
        let err = IndexConfig::from_toml_str("local_bus = \"  \"\n").unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn from_toml_rejects_garbage() {
        assert!(IndexConfig::from_toml_str("initial_capacity = \"many\"").is_err());
    }
}
