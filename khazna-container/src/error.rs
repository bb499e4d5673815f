//! Error types for Khazna container operations.
//!
//! Only [`ScanError`] and [`ProxyError`] ever escape
//! [`ContainerBuilder::build()`](crate::container::ContainerBuilder::build).
//! Instantiation and injection failures are logged and swallowed; their
//! types exist so the log lines carry the same detail.

use std::fmt;

/// Boxed error for user-supplied constructors, setters and transaction managers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Khazna operations.
#[derive(Debug, thiserror::Error)]
pub enum KhaznaError {
    /// A namespace could not be enumerated.
    #[error("{}", .0)]
    Scan(ScanError),

    /// A registered type could not be constructed.
    ///
    /// The build itself never returns this or [`KhaznaError::Injection`]:
    /// both failures are logged and skipped. The variants let callers that
    /// run their own constructors or setters report the same detail.
    #[error("{}", .0)]
    Instantiation(InstantiationError),

    /// A dependency could not be wired into a field.
    #[error("{}", .0)]
    Injection(InjectionError),

    /// The proxy collaborator was missing or refused to wrap a bean.
    #[error("{}", .0)]
    Proxy(ProxyError),

    /// The process-wide container was already installed.
    #[error("Global container is already initialized")]
    AlreadyInitialized,
}

impl From<ScanError> for KhaznaError {
    fn from(err: ScanError) -> Self {
        KhaznaError::Scan(err)
    }
}

impl From<ProxyError> for KhaznaError {
    fn from(err: ProxyError) -> Self {
        KhaznaError::Proxy(err)
    }
}

/// Error when a namespace cannot be enumerated.
#[derive(Debug)]
pub struct ScanError {
    /// The namespace that was requested
    pub namespace: String,
    /// Scanner that failed
    pub scanner: String,
    /// Why enumeration failed
    pub reason: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot scan namespace {:?} with {}: {}",
            self.namespace, self.scanner, self.reason
        )?;
        write!(
            f,
            "\n  Hint: namespaces are Rust path prefixes such as \"my_app::services\""
        )
    }
}

/// Error when a registered type cannot be constructed.
#[derive(Debug)]
pub struct InstantiationError {
    /// Fully qualified type name
    pub type_name: &'static str,
    /// What the constructor reported
    pub source: BoxError,
}

impl fmt::Display for InstantiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to instantiate {}: {}", self.type_name, self.source)?;
        write!(f, "\n  The type is left out of the registry")
    }
}

/// What went wrong while wiring one field.
#[derive(Debug, thiserror::Error)]
pub enum InjectionFault {
    /// The bean being wired is not of the type its descriptor names.
    #[error("bean does not expose its own type {expected}")]
    TargetMismatch { expected: &'static str },

    /// The registry value under the key does not expose the declared type.
    #[error("value under key is a {found}, which does not expose {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The setter returned an error.
    #[error("setter failed: {0}")]
    Setter(#[source] BoxError),

    /// The setter panicked.
    #[error("setter panicked: {0}")]
    Panicked(String),
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Error when a dependency cannot be wired into a field.
#[derive(Debug)]
pub struct InjectionError {
    /// Registry key of the bean being wired
    pub bean: String,
    /// Field name
    pub field: &'static str,
    /// Registry key the field resolves
    pub key: String,
    /// The failure itself
    pub fault: InjectionFault,
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to inject {:?} into {}.{}: {}",
            self.key, self.bean, self.field, self.fault
        )?;
        write!(f, "\n  The field is left unset")
    }
}

/// Error when proxy substitution cannot complete.
#[derive(Debug)]
pub enum ProxyError {
    /// No bean is registered under the proxy factory key.
    FactoryNotRegistered {
        key: String,
        required_by: String,
        suggestions: Vec<String>,
    },

    /// The bean under the proxy factory key does not implement `ProxyFactory`.
    NotAProxyFactory { key: String, found: &'static str },

    /// The proxy factory has no transaction manager wired.
    MissingTransactionManager { factory: &'static str },

    /// The bean cannot be wrapped with the requested strategy.
    Unsupported {
        bean: &'static str,
        strategy: &'static str,
    },
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::FactoryNotRegistered {
                key,
                required_by,
                suggestions,
            } => {
                write!(f, "Proxy factory not registered: {key:?}")?;
                write!(f, "\n  Required by: {required_by}")?;
                if !suggestions.is_empty() {
                    write!(f, "\n  Did you mean one of:")?;
                    for suggestion in suggestions {
                        write!(f, "\n    - {suggestion}")?;
                    }
                }
                write!(
                    f,
                    "\n  Hint: register TransactionalProxyFactory or point .proxy_factory() at your own"
                )
            }
            ProxyError::NotAProxyFactory { key, found } => {
                write!(f, "Bean {key:?} ({found}) does not implement ProxyFactory")?;
                write!(f, "\n  Hint: declare .implements::<dyn ProxyFactory>() on its descriptor")
            }
            ProxyError::MissingTransactionManager { factory } => {
                write!(f, "{factory} has no transaction manager wired")?;
                write!(
                    f,
                    "\n  Hint: register a TransactionManager bean under the key \"TransactionManager\""
                )
            }
            ProxyError::Unsupported { bean, strategy } => {
                write!(f, "Cannot build {strategy} wrapper for {bean}")
            }
        }
    }
}

impl std::error::Error for ProxyError {}
impl std::error::Error for ScanError {}

impl std::error::Error for InstantiationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl std::error::Error for InjectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.fault)
    }
}

/// Error raised by a transactional wrapper around the delegated call.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] BoxError),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] BoxError),
}

/// Convenient Result type for Khazna operations.
pub type Result<T> = std::result::Result<T, KhaznaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_display() {
        let err = KhaznaError::Scan(ScanError {
            namespace: "bank::".to_string(),
            scanner: "InventoryScanner".to_string(),
            reason: "empty path segment".to_string(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("bank::"));
        assert!(msg.contains("empty path segment"));
        assert!(msg.contains("Hint"));
    }

    #[test]
    fn factory_not_registered_display() {
        let err = KhaznaError::Proxy(ProxyError::FactoryNotRegistered {
            key: "proxyFactory".to_string(),
            required_by: "transferService".to_string(),
            suggestions: vec!["ProxyFactory".to_string()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("transferService"));
        assert!(msg.contains("- ProxyFactory"));
    }

    #[test]
    fn injection_error_display() {
        let err = InjectionError {
            bean: "transferService".to_string(),
            field: "account_dao",
            key: "AccountDao".to_string(),
            fault: InjectionFault::TypeMismatch {
                expected: "dyn bank::AccountDao",
                found: "bank::Clock",
            },
        };

        let msg = format!("{}", KhaznaError::Injection(err));
        assert!(msg.contains("transferService.account_dao"));
        assert!(msg.contains("bank::Clock"));
        assert!(msg.contains("left unset"));
    }

    #[test]
    fn panic_payloads_render() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");

        let payload = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*payload), "code 7");
    }

    #[test]
    fn instantiation_error_keeps_source() {
        let err = InstantiationError {
            type_name: "bank::Pool",
            source: "no database url".into(),
        };

        let msg = format!("{err}");
        assert!(msg.contains("bank::Pool"));
        assert!(msg.contains("no database url"));
    }
}
