//! Transactional proxies and the proxy-substitution phase.
//!
//! After injection completes, every bean whose type is marked
//! transactional is handed to the [`ProxyFactory`] registered under the
//! configured key (default `"proxyFactory"`). The factory returns a
//! wrapper that replaces the bean under the same key.
//!
//! Two wrapping strategies exist:
//! - **interface-based**, when the type declares at least one intercepted
//!   capability interface: each such trait gets a `Transactional<dyn Trait>`
//!   that implements the trait by delegation, via [`Interface::proxy`];
//! - **subclass-based** otherwise, including types whose interfaces were
//!   all declared with plain `implements`: the type is wrapped as
//!   `Transactional<T>` and callers go through [`Transactional::invoke`].
//!
//! Beans wired during injection keep the pre-proxy instance. Only lookups
//! after initialization see the wrapper.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::autowired::Autowired;
use crate::bean::{Bean, BeanKind};
use crate::descriptor::{Component, Field, TypeDescriptor};
use crate::error::{BoxError, ProxyError, TransactionError};
use crate::registry::BeanRegistry;

/// Begin/commit/rollback hooks run around intercepted calls.
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Result<(), BoxError>;
    fn commit(&self) -> Result<(), BoxError>;
    fn rollback(&self) -> Result<(), BoxError>;
}

/// A capability interface that interface-based proxies can intercept.
///
/// Implemented on the trait object type, next to an implementation of
/// the trait for `Transactional<dyn Trait>`:
///
/// ```
/// use khazna_container::prelude::*;
/// use std::sync::Arc;
///
/// trait TransferService: Send + Sync {
///     fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), BoxError>;
/// }
///
/// impl TransferService for Transactional<dyn TransferService> {
///     fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), BoxError> {
///         self.invoke(|svc| svc.transfer(from, to, amount))
///     }
/// }
///
/// impl Interface for dyn TransferService {
///     fn proxy(target: Arc<Self>, manager: Arc<dyn TransactionManager>) -> Arc<Self> {
///         Arc::new(Transactional::new(target, manager))
///     }
/// }
/// ```
pub trait Interface: Send + Sync + 'static {
    fn proxy(target: Arc<Self>, manager: Arc<dyn TransactionManager>) -> Arc<Self>;
}

/// A wrapper that runs every delegated call inside a transaction.
pub struct Transactional<T: ?Sized> {
    target: Arc<T>,
    manager: Arc<dyn TransactionManager>,
}

impl<T: ?Sized> Transactional<T> {
    pub fn new(target: Arc<T>, manager: Arc<dyn TransactionManager>) -> Self {
        Self { target, manager }
    }

    /// The wrapped instance.
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    /// Runs `op` against the target between `begin` and `commit`.
    ///
    /// If `op` fails, or the commit does, the transaction is rolled back
    /// and the error is returned. A rollback failure is only logged; the
    /// error the caller sees is the one that caused the rollback.
    pub fn invoke<R, E>(&self, op: impl FnOnce(&T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<TransactionError>,
    {
        self.manager
            .begin()
            .map_err(|e| E::from(TransactionError::Begin(e)))?;

        let outcome = op(&*self.target).and_then(|value| {
            self.manager
                .commit()
                .map(|()| value)
                .map_err(|e| E::from(TransactionError::Commit(e)))
        });

        if outcome.is_err() {
            if let Err(rollback) = self.manager.rollback() {
                warn!(error = %rollback, "Rollback failed");
            }
        }
        outcome
    }
}

impl<T: ?Sized> fmt::Debug for Transactional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transactional")
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

/// Builds interception wrappers for transactional beans.
///
/// Resolved from the registry during proxy substitution, so it is
/// registered like any other bean and must declare
/// `.implements::<dyn ProxyFactory>(..)`.
pub trait ProxyFactory: Send + Sync {
    /// Wraps `target` through the capability interfaces its type declares.
    fn interface_proxy(&self, target: &Bean) -> Result<Bean, ProxyError>;

    /// Wraps `target` as `Transactional<T>` around its concrete type.
    fn subclass_proxy(&self, target: &Bean) -> Result<Bean, ProxyError>;
}

/// The stock [`ProxyFactory`], registered as `"proxyFactory"`.
///
/// Its wrappers delegate to the [`TransactionManager`] wired into it
/// under the key `"TransactionManager"`.
#[derive(Default)]
pub struct TransactionalProxyFactory {
    transaction_manager: Autowired<dyn TransactionManager>,
}

impl TransactionalProxyFactory {
    /// Registry key of the stock factory.
    pub const NAME: &'static str = "proxyFactory";

    /// Wires the manager the wrappers delegate to.
    pub fn set_transaction_manager(&self, manager: Option<Arc<dyn TransactionManager>>) {
        self.transaction_manager.set(manager);
    }

    fn manager(&self) -> Result<Arc<dyn TransactionManager>, ProxyError> {
        self.transaction_manager
            .get()
            .ok_or(ProxyError::MissingTransactionManager {
                factory: std::any::type_name::<Self>(),
            })
    }
}

impl ProxyFactory for TransactionalProxyFactory {
    fn interface_proxy(&self, target: &Bean) -> Result<Bean, ProxyError> {
        target.wrap_interfaces(self.manager()?)
    }

    fn subclass_proxy(&self, target: &Bean) -> Result<Bean, ProxyError> {
        target.wrap_subclass(self.manager()?)
    }
}

impl Component for TransactionalProxyFactory {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::builder::<Self>()
            .name(Self::NAME)
            .implements::<dyn ProxyFactory>(|factory| factory)
            .field(Field::<Self, dyn TransactionManager>::new(
                "transaction_manager",
                |this, manager| this.set_transaction_manager(manager),
            ))
            .build()
    }
}

crate::register_service!(TransactionalProxyFactory);

/// Replaces every transactional bean with a wrapper from the proxy factory.
///
/// The factory is resolved once, and only if at least one bean needs it.
/// Returns the number of beans substituted.
#[instrument(skip(registry), name = "proxy_substitution")]
pub(crate) fn substitute_proxies(
    registry: &mut BeanRegistry,
    factory_key: &str,
) -> Result<usize, ProxyError> {
    let mut pending: Vec<_> = registry
        .iter()
        .filter(|(_, bean)| bean.descriptor().is_transactional())
        .map(|(key, bean)| (key.clone(), bean.clone()))
        .collect();

    if pending.is_empty() {
        debug!("No transactional beans, skipping proxy factory");
        return Ok(0);
    }
    pending.sort_by(|a, b| a.0.cmp(&b.0));

    let factory = resolve_factory(registry, factory_key, pending[0].0.as_str())?;

    for (key, bean) in &pending {
        let wrapped = if bean.descriptor().has_intercepted_interfaces() {
            factory.interface_proxy(bean)?
        } else {
            factory.subclass_proxy(bean)?
        };

        debug!(
            key = %key,
            kind = %wrapped.kind(),
            target = bean.type_name(),
            "Substituted proxy"
        );
        registry.substitute(key.clone(), wrapped);
    }

    info!(substituted = pending.len(), "Proxy substitution complete");
    Ok(pending.len())
}

fn resolve_factory(
    registry: &BeanRegistry,
    factory_key: &str,
    required_by: &str,
) -> Result<Arc<dyn ProxyFactory>, ProxyError> {
    let bean = registry
        .get(factory_key)
        .ok_or_else(|| ProxyError::FactoryNotRegistered {
            key: factory_key.to_string(),
            required_by: required_by.to_string(),
            suggestions: registry.suggestions(factory_key),
        })?;

    if bean.kind() != BeanKind::Instance {
        debug!(key = factory_key, kind = %bean.kind(), "Proxy factory is itself proxied");
    }

    bean.get::<dyn ProxyFactory>()
        .ok_or_else(|| ProxyError::NotAProxyFactory {
            key: factory_key.to_string(),
            found: bean.type_name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::BeanName;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<&'static str>>,
        fail_commit: bool,
    }

    impl Journal {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().clone()
        }
    }

    impl TransactionManager for Journal {
        fn begin(&self) -> Result<(), BoxError> {
            self.events.lock().push("begin");
            Ok(())
        }
        fn commit(&self) -> Result<(), BoxError> {
            self.events.lock().push("commit");
            if self.fail_commit {
                return Err("disk full".into());
            }
            Ok(())
        }
        fn rollback(&self) -> Result<(), BoxError> {
            self.events.lock().push("rollback");
            Ok(())
        }
    }

    struct Account {
        balance: i64,
    }

    #[test]
    fn invoke_commits_on_success() {
        let journal = Arc::new(Journal::default());
        let proxy = Transactional::new(Arc::new(Account { balance: 10 }), journal.clone());

        let balance = proxy.invoke(|a| Ok::<_, BoxError>(a.balance)).unwrap();
        assert_eq!(balance, 10);
        assert_eq!(journal.events(), vec!["begin", "commit"]);
    }

    #[test]
    fn invoke_rolls_back_and_reraises() {
        let journal = Arc::new(Journal::default());
        let proxy = Transactional::new(Arc::new(Account { balance: 10 }), journal.clone());

        let err = proxy
            .invoke(|_| Err::<(), BoxError>("insufficient funds".into()))
            .unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds");
        assert_eq!(journal.events(), vec!["begin", "rollback"]);
    }

    #[test]
    fn failed_commit_rolls_back() {
        let journal = Arc::new(Journal {
            fail_commit: true,
            ..Default::default()
        });
        let proxy = Transactional::new(Arc::new(Account { balance: 10 }), journal.clone());

        let err = proxy.invoke(|a| Ok::<_, BoxError>(a.balance)).unwrap_err();
        assert!(err.to_string().contains("commit"));
        assert_eq!(journal.events(), vec!["begin", "commit", "rollback"]);
    }

    #[test]
    fn factory_without_manager_refuses() {
        let factory = TransactionalProxyFactory::default();
        assert!(matches!(
            factory.manager(),
            Err(ProxyError::MissingTransactionManager { .. })
        ));
    }

    #[test]
    fn stock_factory_descriptor() {
        let descriptor = TransactionalProxyFactory::descriptor();
        assert_eq!(descriptor.bean_name().as_str(), "proxyFactory");
        assert_eq!(descriptor.fields()[0].key().as_str(), "TransactionManager");
        assert!(!descriptor.is_transactional());
    }

    #[test]
    fn no_transactional_beans_needs_no_factory() {
        let mut registry = BeanRegistry::new();
        let substituted = substitute_proxies(&mut registry, "proxyFactory").unwrap();
        assert_eq!(substituted, 0);
    }

    #[test]
    fn plain_interfaces_fall_back_to_subclass_proxy() {
        trait Report: Send + Sync {}

        #[derive(Default)]
        struct Audit;
        impl Report for Audit {}

        let journal = Arc::new(Journal::default());
        let factory = TransactionalProxyFactory::default();
        factory.set_transaction_manager(Some(journal.clone() as Arc<dyn TransactionManager>));

        let factory_descriptor = Arc::new(
            TypeDescriptor::builder::<TransactionalProxyFactory>()
                .implements::<dyn ProxyFactory>(|f| f)
                .build(),
        );
        let audit_descriptor = Arc::new(
            TypeDescriptor::builder::<Audit>()
                .transactional()
                .implements::<dyn Report>(|a| a)
                .build(),
        );
        let audit_target = audit_descriptor.construct().unwrap();

        let mut registry = BeanRegistry::new();
        registry.register(
            BeanName::from("proxyFactory"),
            Bean::instance(factory_descriptor, Arc::new(factory)),
        );
        registry.register(BeanName::from("audit"), Bean::instance(audit_descriptor, audit_target));

        assert_eq!(substitute_proxies(&mut registry, "proxyFactory").unwrap(), 1);

        let audit = registry.get("audit").unwrap();
        assert_eq!(audit.kind(), BeanKind::SubclassProxy);
        assert!(!audit.exposes::<dyn Report>());

        let proxy = audit.get::<Transactional<Audit>>().unwrap();
        proxy.invoke(|_| Ok::<_, BoxError>(())).unwrap();
        assert_eq!(journal.events(), vec!["begin", "commit"]);
    }

    #[test]
    fn missing_factory_is_fatal() {
        #[derive(Default)]
        struct Ledger;

        let descriptor = Arc::new(TypeDescriptor::builder::<Ledger>().transactional().build());
        let target = descriptor.construct().unwrap();
        let mut registry = BeanRegistry::new();
        registry.register(BeanName::from("ledger"), Bean::instance(descriptor, target));

        let err = substitute_proxies(&mut registry, "proxyFactory").unwrap_err();
        assert!(matches!(err, ProxyError::FactoryNotRegistered { ref required_by, .. } if required_by == "ledger"));
    }
}
