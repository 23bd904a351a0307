//! External engine configuration
//!
//! The engine never loads configuration files itself; it receives an
//! already-bound [`EngineConfig`] and passes it through to contributions
//! unmodified. Named sections bind on demand to typed structs, the way
//! each module expects its own settings shape.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Already-bound external configuration passed through the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(flatten)]
    sections: HashMap<String, serde_json::Value>,
}

impl EngineConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a configuration from a raw JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::configuration(format!("cannot bind engine configuration: {e}")))
    }

    /// Add a named section from a typed value
    pub fn with_section<T: Serialize>(
        mut self,
        name: impl Into<String>,
        section: &T,
    ) -> Result<Self, CoreError> {
        let value = serde_json::to_value(section)?;
        self.sections.insert(name.into(), value);
        Ok(self)
    }

    /// Check whether a named section exists
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Bind a named section to a typed struct
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T, CoreError> {
        let value = self
            .sections
            .get(name)
            .ok_or_else(|| CoreError::configuration(format!("missing configuration section '{name}'")))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            CoreError::configuration(format!("cannot bind configuration section '{name}': {e}"))
        })
    }

    /// Bind a named section if present
    pub fn try_section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, CoreError> {
        if !self.has_section(name) {
            return Ok(None);
        }
        self.section(name).map(Some)
    }

    /// Names of the bound sections
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct CacheSettings {
        capacity: usize,
        eager: bool,
    }

    #[test]
    fn test_section_binds_to_typed_struct() {
        let config = EngineConfig::new()
            .with_section(
                "cache",
                &CacheSettings {
                    capacity: 128,
                    eager: true,
                },
            )
            .unwrap();

        let settings: CacheSettings = config.section("cache").unwrap();
        assert_eq!(
            settings,
            CacheSettings {
                capacity: 128,
                eager: true,
            }
        );
        assert!(config.has_section("cache"));
    }

    #[test]
    fn test_missing_section_is_a_configuration_error() {
        let config = EngineConfig::new();
        let error = config.section::<CacheSettings>("cache").unwrap_err();
        assert!(matches!(error, CoreError::Configuration { .. }));
        assert!(config.try_section::<CacheSettings>("cache").unwrap().is_none());
    }

    #[test]
    fn test_from_value_accepts_raw_sections() {
        let config = EngineConfig::from_value(serde_json::json!({
            "cache": { "capacity": 8, "eager": false }
        }))
        .unwrap();

        let settings: CacheSettings = config.section("cache").unwrap();
        assert_eq!(settings.capacity, 8);
    }
}
