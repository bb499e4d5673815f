//! Type-erased registry values.
//!
//! A [`Bean`] is what the registry stores under a name. It carries the
//! descriptor of the type it was built from and a set of typed views:
//! the concrete type plus every capability interface the descriptor
//! declares. Callers pick the view they need with [`Bean::get`].

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::descriptor::TypeDescriptor;
use crate::error::ProxyError;
use crate::proxy::TransactionManager;

/// A constructed instance, erased to `Any`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// How a bean came to be in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanKind {
    /// The instance built by the constructor.
    Instance,
    /// A wrapper implementing the type's capability interfaces.
    InterfaceProxy,
    /// A `Transactional<T>` wrapper around the concrete type.
    SubclassProxy,
}

impl BeanKind {
    /// Returns `true` for both wrapper kinds.
    #[inline]
    pub fn is_proxy(&self) -> bool {
        !matches!(self, BeanKind::Instance)
    }
}

impl fmt::Display for BeanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanKind::Instance => write!(f, "Instance"),
            BeanKind::InterfaceProxy => write!(f, "InterfaceProxy"),
            BeanKind::SubclassProxy => write!(f, "SubclassProxy"),
        }
    }
}

/// One typed face of a bean: an `Arc<X>` stored behind `Any`.
pub struct View {
    type_id: TypeId,
    type_name: &'static str,
    handle: Box<dyn Any + Send + Sync>,
}

impl View {
    /// Wraps a handle so it can be recovered later as `Arc<X>`.
    pub fn of<X: ?Sized + Send + Sync + 'static>(handle: Arc<X>) -> Self {
        Self {
            type_id: TypeId::of::<X>(),
            type_name: type_name::<X>(),
            handle: Box::new(handle),
        }
    }

    /// Name of the type this view exposes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn get<X: ?Sized + 'static>(&self) -> Option<Arc<X>> {
        if self.type_id != TypeId::of::<X>() {
            return None;
        }
        self.handle.downcast_ref::<Arc<X>>().cloned()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View({})", self.type_name)
    }
}

/// A registry value: an instance or a wrapper around one.
#[derive(Clone)]
pub struct Bean {
    descriptor: Arc<TypeDescriptor>,
    kind: BeanKind,
    target: Instance,
    views: Arc<[View]>,
}

impl Bean {
    /// Builds a plain bean exposing every view its descriptor declares.
    pub(crate) fn instance(descriptor: Arc<TypeDescriptor>, target: Instance) -> Self {
        let views: Vec<View> = descriptor.views_of(&target);
        Self {
            descriptor,
            kind: BeanKind::Instance,
            target,
            views: views.into(),
        }
    }

    /// The descriptor of the type this bean was built from.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Fully qualified name of the registered type.
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    pub fn kind(&self) -> BeanKind {
        self.kind
    }

    #[inline]
    pub fn is_proxy(&self) -> bool {
        self.kind.is_proxy()
    }

    /// Returns the view of type `T`, if the bean exposes one.
    ///
    /// `T` is either a concrete type (`JdbcAccountDao`,
    /// `Transactional<JdbcAccountDao>`) or a trait object
    /// (`dyn AccountDao`) declared on the descriptor.
    pub fn get<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        let found = self.views.iter().find_map(View::get::<T>);
        if found.is_none() {
            trace!(
                bean = self.type_name(),
                requested = type_name::<T>(),
                "Bean does not expose view"
            );
        }
        found
    }

    /// Returns `true` if [`get::<T>()`](Bean::get) would succeed.
    pub fn exposes<T: ?Sized + 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.views.iter().any(|v| v.type_id == id)
    }

    /// Names of every view this bean exposes.
    pub fn view_names(&self) -> Vec<&'static str> {
        self.views.iter().map(View::type_name).collect()
    }

    pub(crate) fn target(&self) -> &Instance {
        &self.target
    }

    /// Wraps this bean through every interceptable interface its type declares.
    ///
    /// The result exposes only the wrappers. Interfaces without an
    /// interception hook are dropped from the wrapper, since exposing them
    /// would hand out the raw target.
    ///
    /// # Errors
    /// [`ProxyError::Unsupported`] if no declared interface can be intercepted.
    pub fn wrap_interfaces(&self, manager: Arc<dyn TransactionManager>) -> Result<Bean, ProxyError> {
        let views = self.descriptor.interface_wrappers(&self.target, &manager);
        if views.is_empty() {
            return Err(ProxyError::Unsupported {
                bean: self.type_name(),
                strategy: "interface",
            });
        }
        Ok(self.wrapped(BeanKind::InterfaceProxy, views))
    }

    /// Wraps this bean as `Transactional<T>` around its concrete type.
    ///
    /// # Errors
    /// [`ProxyError::Unsupported`] if the target is not of the descriptor's type.
    pub fn wrap_subclass(&self, manager: Arc<dyn TransactionManager>) -> Result<Bean, ProxyError> {
        let view = self
            .descriptor
            .subclass_wrapper(&self.target, manager)
            .ok_or(ProxyError::Unsupported {
                bean: self.type_name(),
                strategy: "subclass",
            })?;
        Ok(self.wrapped(BeanKind::SubclassProxy, vec![view]))
    }

    fn wrapped(&self, kind: BeanKind, views: Vec<View>) -> Bean {
        Bean {
            descriptor: self.descriptor.clone(),
            kind,
            target: self.target.clone(),
            views: views.into(),
        }
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("type", &self.type_name())
            .field("kind", &self.kind)
            .field("views", &self.view_names())
            .finish()
    }
}
