//! Provider trait: a module of related service registrations.
//!
//! Providers group explicit registrations by domain, for types that are
//! not submitted to the compile-time table or that live outside every
//! scanned namespace. Explicit registrations are always included,
//! whatever namespaces the container scans.
//!
//! # Examples
//! ```rust,ignore
//! struct BankProvider;
//!
//! impl Provider for BankProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register::<JdbcAccountDao>();
//!         registry.register::<TransferServiceImpl>();
//!     }
//! }
//! ```

use tracing::trace;

use crate::descriptor::{Component, TypeDescriptor};

/// A module that registers related services into a container builder.
pub trait Provider: Send + Sync {
    /// Register descriptors. Called once during container construction.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Optional: human-readable name for log lines.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The part of the builder API that providers see.
pub trait ProviderRegistry {
    fn register_descriptor(&mut self, descriptor: TypeDescriptor);
}

impl dyn ProviderRegistry + '_ {
    /// Registers `T` with the descriptor its [`Component`] impl produces.
    pub fn register<T: Component>(&mut self) {
        self.register_descriptor(T::descriptor());
    }
}

/// Descriptors registered explicitly, in registration order.
#[derive(Debug, Default, Clone)]
pub struct RegistrationTable {
    descriptors: Vec<TypeDescriptor>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.descriptors
    }

    pub(crate) fn into_descriptors(self) -> Vec<TypeDescriptor> {
        self.descriptors
    }
}

impl ProviderRegistry for RegistrationTable {
    fn register_descriptor(&mut self, descriptor: TypeDescriptor) {
        trace!(type_name = descriptor.type_name(), "Explicit registration");
        self.descriptors.push(descriptor);
    }
}
