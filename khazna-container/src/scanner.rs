//! Type discovery.
//!
//! There is no runtime reflection to walk a namespace with, so discovery
//! reads a registration table built at compile time instead: types submit
//! a [`ServiceEntry`] through [`inventory`], and [`InventoryScanner`]
//! selects the entries whose type lives under the requested namespace.
//!
//! ```rust,ignore
//! #[derive(Default)]
//! struct JdbcAccountDao;
//!
//! impl Component for JdbcAccountDao {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>().name("accountDao").build()
//!     }
//! }
//!
//! khazna_container::register_service!(JdbcAccountDao);
//! ```

use std::any::type_name;

use tracing::{debug, instrument};

use crate::descriptor::TypeDescriptor;
use crate::error::ScanError;

/// A compile-time registration, collected by [`inventory`].
pub struct ServiceEntry {
    describe: fn() -> TypeDescriptor,
}

impl ServiceEntry {
    pub const fn new(describe: fn() -> TypeDescriptor) -> Self {
        Self { describe }
    }

    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }
}

inventory::collect!(ServiceEntry);

/// Submits a [`Component`](crate::descriptor::Component) to the
/// compile-time registration table read by [`InventoryScanner`].
#[macro_export]
macro_rules! register_service {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::scanner::ServiceEntry::new(
                <$ty as $crate::descriptor::Component>::descriptor
            )
        }
    };
}

/// Discovers the service types of a namespace.
pub trait TypeScanner: Send + Sync {
    /// Returns a descriptor for every service type under `namespace`.
    ///
    /// # Errors
    /// [`ScanError`] if the namespace cannot be enumerated.
    fn scan(&self, namespace: &str) -> Result<Vec<TypeDescriptor>, ScanError>;

    /// Human-readable name for error messages.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// Scans the entries submitted with [`register_service!`] or `#[derive(Service)]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryScanner;

impl TypeScanner for InventoryScanner {
    #[instrument(skip(self), name = "inventory_scan")]
    fn scan(&self, namespace: &str) -> Result<Vec<TypeDescriptor>, ScanError> {
        validate_namespace(namespace).map_err(|reason| ScanError {
            namespace: namespace.to_string(),
            scanner: self.name().to_string(),
            reason,
        })?;

        let mut found = Vec::new();
        for entry in inventory::iter::<ServiceEntry> {
            let descriptor = entry.describe();
            if in_namespace(descriptor.type_name(), namespace) {
                found.push(descriptor);
            }
        }

        debug!(found = found.len(), "Scanned namespace");
        Ok(found)
    }
}

/// Returns `true` if `type_name` lives in `namespace` or below it.
///
/// The empty namespace contains every type.
///
/// ```
/// use khazna_container::scanner::in_namespace;
///
/// assert!(in_namespace("bank::dao::JdbcAccountDao", "bank"));
/// assert!(in_namespace("bank::dao::JdbcAccountDao", "bank::dao"));
/// assert!(!in_namespace("banking::Teller", "bank"));
/// ```
pub fn in_namespace(type_name: &str, namespace: &str) -> bool {
    if namespace.is_empty() {
        return true;
    }
    match type_name.strip_prefix(namespace) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Checks that `namespace` is empty or a well-formed Rust path.
pub(crate) fn validate_namespace(namespace: &str) -> Result<(), String> {
    if namespace.is_empty() {
        return Ok(());
    }

    for segment in namespace.split("::") {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return Err("empty path segment".to_string());
        };
        if !(first.is_alphabetic() || first == '_') {
            return Err(format!("segment {segment:?} does not start an identifier"));
        }
        if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || *c == '_')) {
            return Err(format!("segment {segment:?} contains {bad:?}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Component;

    #[derive(Default)]
    struct Teller;

    impl Component for Teller {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Self>().name("teller").build()
        }
    }

    crate::register_service!(Teller);

    #[test]
    fn namespace_matching() {
        assert!(in_namespace("bank::Teller", ""));
        assert!(in_namespace("bank::Teller", "bank::Teller"));
        assert!(!in_namespace("bank::Teller", "bank::Tell"));
        assert!(!in_namespace("bank::Teller", "vault"));
    }

    #[test]
    fn namespace_validation() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("bank").is_ok());
        assert!(validate_namespace("bank::_private::v2").is_ok());
        assert!(validate_namespace("bank::").is_err());
        assert!(validate_namespace("::bank").is_err());
        assert!(validate_namespace("bank.dao").is_err());
        assert!(validate_namespace("2fa").is_err());
    }

    #[test]
    fn inventory_scanner_finds_submitted_types() {
        let found = InventoryScanner.scan(module_path!()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bean_name().as_str(), "teller");
    }

    #[test]
    fn inventory_scanner_filters_by_namespace() {
        let found = InventoryScanner.scan("no_such_crate").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn inventory_scanner_rejects_malformed_namespace() {
        let err = InventoryScanner.scan("bank::").unwrap_err();
        assert_eq!(err.namespace, "bank::");
        assert!(err.scanner.contains("InventoryScanner"));
    }

    #[test]
    fn stock_proxy_factory_is_submitted() {
        let found = InventoryScanner.scan("khazna_container::proxy").unwrap();
        assert!(found.iter().any(|d| d.bean_name().as_str() == "proxyFactory"));
    }
}
