//! # The Container: heart of Khazna
//!
//! Discovers service types, constructs them, wires their fields and wraps
//! transactional ones, then freezes the result behind a name-keyed lookup.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> scan ─> instantiate ─> inject ─> proxy ──> Container
//!                                                                           │
//!                                                                      lookup(name)
//! ```
//!
//! # Examples
//! ```rust
//! use khazna_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait AccountDao: Send + Sync {
//!     fn balance(&self, account: &str) -> i64;
//! }
//!
//! #[derive(Default)]
//! struct JdbcAccountDao;
//!
//! impl AccountDao for JdbcAccountDao {
//!     fn balance(&self, _account: &str) -> i64 { 100 }
//! }
//!
//! impl Component for JdbcAccountDao {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .name("AccountDao")
//!             .implements::<dyn AccountDao>(|dao| dao)
//!             .build()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct TransferService {
//!     account_dao: Autowired<dyn AccountDao>,
//! }
//!
//! impl Component for TransferService {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .field(Field::<Self, dyn AccountDao>::new("account_dao", |this, dao| {
//!                 this.account_dao.set(dao)
//!             }))
//!             .build()
//!     }
//! }
//!
//! let container = Container::builder()
//!     .register::<JdbcAccountDao>()
//!     .register::<TransferService>()
//!     .build()
//!     .expect("Failed to build container");
//!
//! let service: Arc<TransferService> = container.lookup_as("TransferService").unwrap();
//! assert_eq!(service.account_dao.get().unwrap().balance("alice"), 100);
//! ```

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use crate::bean::Bean;
use crate::descriptor::{Component, TypeDescriptor};
use crate::error::Result;
use crate::inject::inject_all;
use crate::instantiate::instantiate_all;
use crate::provider::{Provider, ProviderRegistry, RegistrationTable};
use crate::proxy::substitute_proxies;
use crate::registry::BeanRegistry;
use crate::scanner::{InventoryScanner, TypeScanner};
use crate::settings::ContainerSettings;

// ============================================================
// ContainerBuilder
// ============================================================

/// Configures and builds a [`Container`].
///
/// Scanned types come first, in namespace order; explicit registrations
/// follow, in the order they were made. When two types share a name, the
/// later one wins.
pub struct ContainerBuilder {
    settings: ContainerSettings,
    scanners: Vec<Box<dyn TypeScanner>>,
    table: RegistrationTable,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            scanners: Vec::new(),
            table: RegistrationTable::new(),
        }
    }

    /// Replaces the settings. Earlier `scan` and `proxy_factory` calls are discarded.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds a namespace to scan, such as `"my_app::services"`.
    ///
    /// The empty namespace selects every submitted type.
    pub fn scan(mut self, namespace: impl Into<String>) -> Self {
        self.settings.namespaces.push(namespace.into());
        self
    }

    /// Adds a scanner. Without one, namespaces go through [`InventoryScanner`].
    pub fn scanner(mut self, scanner: impl TypeScanner + 'static) -> Self {
        self.scanners.push(Box::new(scanner));
        self
    }

    /// Sets the registry key the proxy factory is resolved under.
    pub fn proxy_factory(mut self, key: impl Into<String>) -> Self {
        self.settings.proxy_factory = key.into();
        self
    }

    // ── Explicit registration ──

    /// Registers `T` regardless of the scanned namespaces.
    pub fn register<T: Component>(mut self) -> Self {
        self.table.register_descriptor(T::descriptor());
        self
    }

    /// Registers a hand-built descriptor.
    pub fn with_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.table.register_descriptor(descriptor);
        self
    }

    /// Add a [`Provider`] module.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self);
        self
    }

    // ── Build ──

    /// Runs scan, instantiation, injection and proxy substitution, in that
    /// order, and freezes the result.
    ///
    /// # Errors
    /// - [`KhaznaError::Scan`](crate::error::KhaznaError::Scan) if a namespace
    ///   cannot be enumerated.
    /// - [`KhaznaError::Proxy`](crate::error::KhaznaError::Proxy) if a
    ///   transactional bean exists and the proxy factory is missing or fails.
    ///
    /// Constructor and setter failures are logged, not returned.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(
            namespaces = ?self.settings.namespaces,
            explicit = self.table.len(),
            "Building container"
        );

        let proxy_factory = self.settings.proxy_factory.clone();
        let descriptors = self.discover()?;
        let mut registry = BeanRegistry::new();

        instantiate_all(descriptors, &mut registry);
        inject_all(&registry);
        substitute_proxies(&mut registry, &proxy_factory)?;

        info!(beans = registry.len(), "Container built successfully");
        Ok(Container {
            registry: Arc::new(registry),
        })
    }

    /// Scanned descriptors, then explicit ones, each type at most once.
    fn discover(self) -> Result<Vec<TypeDescriptor>> {
        let default_scanner: [Box<dyn TypeScanner>; 1] = [Box::new(InventoryScanner)];
        let scanners = if self.scanners.is_empty() {
            &default_scanner[..]
        } else {
            &self.scanners[..]
        };

        let mut candidates = Vec::new();
        for namespace in &self.settings.namespaces {
            for scanner in scanners {
                let found = scanner.scan(namespace)?;
                debug!(
                    namespace = namespace.as_str(),
                    scanner = scanner.name(),
                    found = found.len(),
                    "Scanned"
                );
                candidates.extend(found);
            }
        }
        candidates.extend(self.table.into_descriptors());

        let mut seen: HashSet<TypeId> = HashSet::new();
        let discovered: Vec<TypeDescriptor> = candidates
            .into_iter()
            .filter(|d| {
                let first = seen.insert(d.type_id());
                if !first {
                    trace!(type_name = d.type_name(), "Duplicate type, keeping first");
                }
                first
            })
            .collect();

        info!(types = discovered.len(), "Discovery complete");
        Ok(discovered)
    }
}

impl ProviderRegistry for ContainerBuilder {
    fn register_descriptor(&mut self, descriptor: TypeDescriptor) {
        self.table.register_descriptor(descriptor);
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("settings", &self.settings)
            .field("scanners", &self.scanners.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("explicit", &self.table.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Frozen, thread-safe bean registry.
///
/// Created by [`ContainerBuilder::build()`]. Cloning is cheap and every
/// clone reads the same beans.
#[derive(Clone)]
pub struct Container {
    registry: Arc<BeanRegistry>,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Returns the bean registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Bean> {
        trace!(name, "Lookup");
        let found = self.registry.get(name).cloned();
        if found.is_none() {
            debug!(
                name,
                suggestions = ?self.registry.suggestions(name),
                "Lookup miss"
            );
        }
        found
    }

    /// Returns the `T` view of the bean registered under `name`.
    ///
    /// ```rust,ignore
    /// let service: Arc<dyn TransferService> = container.lookup_as("transferService").unwrap();
    /// ```
    pub fn lookup_as<T: ?Sized + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.lookup(name)?.get::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Number of registered beans.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// All bean names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Renders every bean as `[kind] name (type)`.
    pub fn describe(&self) -> String {
        self.registry.describe()
    }

    /// Read-only access to the underlying registry.
    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::autowired::Autowired;
    pub use crate::bean::{Bean, BeanKind};
    pub use crate::descriptor::{Component, Field, TypeDescriptor};
    pub use crate::error::{BoxError, KhaznaError};
    pub use crate::key::BeanName;
    pub use crate::provider::{Provider, ProviderRegistry};
    pub use crate::proxy::{
        Interface, ProxyFactory, TransactionManager, Transactional, TransactionalProxyFactory,
    };
    pub use crate::scanner::{InventoryScanner, TypeScanner};
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
