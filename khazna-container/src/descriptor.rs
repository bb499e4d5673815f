//! Type descriptors: the marker facts and wiring metadata of a registered type.
//!
//! A [`TypeDescriptor`] is what the scanner produces and what every bean
//! keeps a reference to. It records
//! - the type's identity and optional explicit name,
//! - whether it is transactional,
//! - how to construct it,
//! - which capability interfaces it implements and how to cast into them,
//! - which fields receive dependencies, and through which setter.
//!
//! # Examples
//! ```
//! use khazna_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait AccountDao: Send + Sync {}
//!
//! #[derive(Default)]
//! struct JdbcAccountDao;
//! impl AccountDao for JdbcAccountDao {}
//!
//! #[derive(Default)]
//! struct TransferService {
//!     account_dao: Autowired<dyn AccountDao>,
//! }
//!
//! let dao = TypeDescriptor::builder::<JdbcAccountDao>()
//!     .name("AccountDao")
//!     .implements::<dyn AccountDao>(|dao| dao)
//!     .build();
//!
//! let service = TypeDescriptor::builder::<TransferService>()
//!     .field(Field::<TransferService, dyn AccountDao>::new("account_dao", |this, dao| {
//!         this.account_dao.set(dao)
//!     }))
//!     .build();
//!
//! assert_eq!(dao.bean_name().as_str(), "AccountDao");
//! assert_eq!(service.fields()[0].key().as_str(), "AccountDao");
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bean::{Bean, Instance, View};
use crate::error::{BoxError, InjectionFault};
use crate::key::BeanName;
use crate::proxy::{Interface, TransactionManager, Transactional};

/// A type that can describe itself to the container.
///
/// Usually implemented by `#[derive(Service)]`.
pub trait Component: Send + Sync + Sized + 'static {
    fn descriptor() -> TypeDescriptor;
}

type Constructor = Arc<dyn Fn() -> Result<Instance, BoxError> + Send + Sync>;
type Caster = Arc<dyn Fn(&Instance) -> Option<View> + Send + Sync>;
type Wrapper = Arc<dyn Fn(&Instance, Arc<dyn TransactionManager>) -> Option<View> + Send + Sync>;
type Injector = Arc<dyn Fn(&Instance, Option<&Bean>) -> Result<(), InjectionFault> + Send + Sync>;

/// Marker facts and wiring metadata for one registered type.
#[derive(Clone)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
    transactional: bool,
    constructor: Constructor,
    concrete: Caster,
    subclass: Wrapper,
    interfaces: Vec<InterfaceBinding>,
    fields: Vec<FieldBinding>,
}

impl TypeDescriptor {
    /// Starts a descriptor for a type constructed with `Default`.
    pub fn builder<T: Default + Send + Sync + 'static>() -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new(Arc::new(|| -> Result<Instance, BoxError> {
            Ok(Arc::new(T::default()))
        }))
    }

    /// Starts a descriptor for a type with a fallible constructor.
    ///
    /// A constructor error is an instantiation failure: the type is
    /// logged and left out of the registry.
    pub fn with_constructor<T: Send + Sync + 'static>(
        constructor: fn() -> Result<T, BoxError>,
    ) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder::new(Arc::new(move || -> Result<Instance, BoxError> {
            Ok(Arc::new(constructor()?))
        }))
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, as reported by [`std::any::type_name`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Explicit name from the service marker, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The registry key this type is stored under.
    pub fn bean_name(&self) -> BeanName {
        BeanName::for_type(self.name(), self.type_name)
    }

    #[inline]
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Returns `true` if the type declares at least one capability interface.
    #[inline]
    pub fn has_interfaces(&self) -> bool {
        !self.interfaces.is_empty()
    }

    /// Returns `true` if at least one declared interface can be intercepted.
    ///
    /// Only these get interface-based proxies; a transactional type
    /// without one is proxied by wrapping its concrete type.
    #[inline]
    pub fn has_intercepted_interfaces(&self) -> bool {
        self.interfaces.iter().any(InterfaceBinding::is_intercepted)
    }

    pub fn interfaces(&self) -> &[InterfaceBinding] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldBinding] {
        &self.fields
    }

    pub(crate) fn construct(&self) -> Result<Instance, BoxError> {
        (self.constructor)()
    }

    pub(crate) fn views_of(&self, target: &Instance) -> Vec<View> {
        let mut views = Vec::with_capacity(self.interfaces.len() + 1);
        views.extend((self.concrete)(target));
        views.extend(self.interfaces.iter().filter_map(|i| (i.view)(target)));
        views
    }

    pub(crate) fn interface_wrappers(
        &self,
        target: &Instance,
        manager: &Arc<dyn TransactionManager>,
    ) -> Vec<View> {
        self.interfaces
            .iter()
            .filter_map(|i| i.wrap.as_ref())
            .filter_map(|wrap| wrap(target, manager.clone()))
            .collect()
    }

    pub(crate) fn subclass_wrapper(
        &self,
        target: &Instance,
        manager: Arc<dyn TransactionManager>,
    ) -> Option<View> {
        (self.subclass)(target, manager)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type", &self.type_name)
            .field("name", &self.name)
            .field("transactional", &self.transactional)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builds a [`TypeDescriptor`] for `T`.
pub struct TypeDescriptorBuilder<T> {
    name: Option<String>,
    transactional: bool,
    constructor: Constructor,
    interfaces: Vec<InterfaceBinding>,
    fields: Vec<FieldBinding>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    fn new(constructor: Constructor) -> Self {
        Self {
            name: None,
            transactional: false,
            constructor,
            interfaces: Vec::new(),
            fields: Vec::new(),
            _type: PhantomData,
        }
    }

    /// Sets the explicit registry name. An empty name is ignored.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    /// Marks the type for transactional proxying.
    pub fn transactional(mut self) -> Self {
        self.transactional = true;
        self
    }

    /// Declares a capability interface, reachable as `Arc<I>`.
    ///
    /// `cast` is almost always `|this| this`; it exists because the
    /// unsizing coercion to `dyn Trait` can only be written where both
    /// types are concrete.
    pub fn implements<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.interfaces.push(InterfaceBinding {
            type_name: type_name::<I>(),
            view: Arc::new(move |target: &Instance| {
                let this = target.clone().downcast::<T>().ok()?;
                Some(View::of::<I>(cast(this)))
            }),
            wrap: None,
        });
        self
    }

    /// Declares a capability interface that transactional proxies intercept.
    ///
    /// Like [`implements`](Self::implements), and the interface-based
    /// wrapper for this type will expose `I` through [`Interface::proxy`].
    pub fn implements_intercepted<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Interface,
    {
        self.interfaces.push(InterfaceBinding {
            type_name: type_name::<I>(),
            view: Arc::new(move |target: &Instance| {
                let this = target.clone().downcast::<T>().ok()?;
                Some(View::of::<I>(cast(this)))
            }),
            wrap: Some(Arc::new(move |target: &Instance, manager| {
                let this = target.clone().downcast::<T>().ok()?;
                Some(View::of::<I>(I::proxy(cast(this), manager)))
            })),
        });
        self
    }

    /// Declares a dependency field.
    pub fn field<D>(mut self, field: Field<T, D>) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.fields.push(field.into_binding());
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: self.name,
            transactional: self.transactional,
            constructor: self.constructor,
            concrete: Arc::new(|target: &Instance| {
                let this = target.clone().downcast::<T>().ok()?;
                Some(View::of::<T>(this))
            }),
            subclass: Arc::new(|target: &Instance, manager| {
                let this = target.clone().downcast::<T>().ok()?;
                Some(View::of::<Transactional<T>>(Arc::new(Transactional::new(this, manager))))
            }),
            interfaces: self.interfaces,
            fields: self.fields,
        }
    }
}

/// A capability interface declared on a descriptor.
#[derive(Clone)]
pub struct InterfaceBinding {
    type_name: &'static str,
    view: Caster,
    wrap: Option<Wrapper>,
}

impl InterfaceBinding {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if interface-based proxies can intercept this interface.
    pub fn is_intercepted(&self) -> bool {
        self.wrap.is_some()
    }
}

impl fmt::Debug for InterfaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceBinding")
            .field("type", &self.type_name)
            .field("intercepted", &self.is_intercepted())
            .finish()
    }
}

enum Setter<T, D: ?Sized> {
    Plain(fn(&T, Option<Arc<D>>)),
    Fallible(fn(&T, Option<Arc<D>>) -> Result<(), BoxError>),
}

/// A dependency field of `T` whose declared type is `D`.
///
/// The field resolves the registry key derived from `D`'s simple name,
/// unless [`named`](Field::named) overrides it.
pub struct Field<T, D: ?Sized> {
    name: &'static str,
    key: Option<String>,
    required: bool,
    setter: Setter<T, D>,
}

impl<T: Send + Sync + 'static, D: ?Sized + Send + Sync + 'static> Field<T, D> {
    /// A required field wired through an infallible setter.
    pub fn new(name: &'static str, setter: fn(&T, Option<Arc<D>>)) -> Self {
        Self {
            name,
            key: None,
            required: true,
            setter: Setter::Plain(setter),
        }
    }

    /// A required field wired through a setter that may fail.
    pub fn fallible(
        name: &'static str,
        setter: fn(&T, Option<Arc<D>>) -> Result<(), BoxError>,
    ) -> Self {
        Self {
            name,
            key: None,
            required: true,
            setter: Setter::Fallible(setter),
        }
    }

    /// Resolves `key` instead of the declared type's simple name.
    pub fn named(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.key = (!key.is_empty()).then_some(key);
        self
    }

    /// A field marked but not required is never looked up or set.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn into_binding(self) -> FieldBinding {
        let declared_type = type_name::<D>();
        let key = match self.key {
            Some(key) => BeanName::new(key),
            None => BeanName::for_dependency(declared_type),
        };
        let setter = self.setter;

        FieldBinding {
            name: self.name,
            declared_type,
            key,
            required: self.required,
            inject: Arc::new(move |target: &Instance, value: Option<&Bean>| -> Result<(), InjectionFault> {
                let this = target
                    .clone()
                    .downcast::<T>()
                    .map_err(|_| InjectionFault::TargetMismatch {
                        expected: type_name::<T>(),
                    })?;

                let dependency = match value {
                    None => None,
                    Some(bean) => Some(bean.get::<D>().ok_or_else(|| {
                        InjectionFault::TypeMismatch {
                            expected: type_name::<D>(),
                            found: bean.type_name(),
                        }
                    })?),
                };

                match &setter {
                    Setter::Plain(set) => {
                        set(&*this, dependency);
                        Ok(())
                    }
                    Setter::Fallible(set) => set(&*this, dependency).map_err(InjectionFault::Setter),
                }
            }),
        }
    }
}

/// A dependency field declared on a descriptor, with its setter bound.
#[derive(Clone)]
pub struct FieldBinding {
    name: &'static str,
    declared_type: &'static str,
    key: BeanName,
    required: bool,
    inject: Injector,
}

impl FieldBinding {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    /// The registry key this field resolves.
    pub fn key(&self) -> &BeanName {
        &self.key
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Invokes the setter on `target` with `value`, cast to the declared type.
    pub(crate) fn inject(&self, target: &Instance, value: Option<&Bean>) -> Result<(), InjectionFault> {
        (self.inject)(target, value)
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("key", &self.key)
            .field("required", &self.required)
            .finish()
    }
}
