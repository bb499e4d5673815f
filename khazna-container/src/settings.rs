//! Container settings.
//!
//! Settings can be built in code through [`ContainerBuilder`] or
//! deserialized from any serde format:
//!
//! ```
//! use khazna_container::settings::ContainerSettings;
//!
//! let settings: ContainerSettings = serde_json::from_str(r#"{ "namespaces": ["bank"] }"#).unwrap();
//! assert_eq!(settings.namespaces, vec!["bank".to_string()]);
//! assert_eq!(settings.proxy_factory, "proxyFactory");
//! ```
//!
//! [`ContainerBuilder`]: crate::container::ContainerBuilder

use serde::Deserialize;

use crate::proxy::TransactionalProxyFactory;

/// How the container discovers types and where it finds its proxy factory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Namespaces scanned through the compile-time registration table.
    ///
    /// No namespaces means no scanning; only explicit registrations are used.
    pub namespaces: Vec<String>,

    /// Registry key of the proxy factory.
    pub proxy_factory: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            proxy_factory: TransactionalProxyFactory::NAME.to_string(),
        }
    }
}
