//! # Config Registry
//!
//! Maps a config `type` name to the factory that builds the matching config
//! record from a TOML table.
//!
//! Plugins register themselves by name with
//! [`ConfigRegistry::register_subclass`]; loaders hand the registry a table
//! with a `type` key and get back the typed config.
//!
//! ```
//! use xiaoai_teleop::registry::ConfigRegistry;
//!
//! #[derive(Debug, PartialEq)]
//! struct Named(String);
//!
//! let mut registry = ConfigRegistry::new();
//! registry.register_subclass("named", |value| {
//!     let name = value.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
//!     Ok(Named(name))
//! })?;
//!
//! let table: toml::Value = toml::from_str("type = 'named'\nname = 'arm'")?;
//! assert_eq!(registry.build(table)?, Named("arm".to_string()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::de::Error as _;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, XiaoaiError};

/// Key holding the registered name in a config table.
pub const TYPE_KEY: &str = "type";

/// Builds a config record from its TOML table.
pub type ConfigFactory<T> = fn(toml::Value) -> Result<T>;

/// Registry of config factories keyed by `type` name.
pub struct ConfigRegistry<T> {
    factories: BTreeMap<&'static str, ConfigFactory<T>>,
}

impl<T> std::fmt::Debug for ConfigRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl<T> Default for ConfigRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConfigRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRegistration` if `name` is already taken.
    pub fn register_subclass(
        &mut self,
        name: &'static str,
        factory: ConfigFactory<T>,
    ) -> Result<()> {
        if self.factories.contains_key(name) {
            return Err(XiaoaiError::DuplicateRegistration(name.to_string()));
        }
        debug!("Registered config type '{}'", name);
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Builds a config from a TOML table, dispatching on its `type` key.
    ///
    /// # Errors
    ///
    /// - `Config`: the value is not a table or has no string `type` key
    /// - `UnknownType`: the `type` name is not registered
    /// - whatever the factory returns
    pub fn build(&self, value: toml::Value) -> Result<T> {
        let name = value
            .get(TYPE_KEY)
            .and_then(toml::Value::as_str)
            .ok_or_else(|| {
                XiaoaiError::Config(toml::de::Error::custom(format!(
                    "missing string '{}' key",
                    TYPE_KEY
                )))
            })?
            .to_string();

        let factory = self.factories.get(name.as_str()).ok_or_else(|| XiaoaiError::UnknownType {
            name: name.clone(),
            registered: self.names().join(", "),
        })?;

        factory(value)
    }
}
