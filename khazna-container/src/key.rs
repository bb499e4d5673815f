//! Registry keys.
//!
//! [`BeanName`] is the logical name a bean is stored and looked up under.
//! Keys are plain strings: dependencies resolve by name, not by type
//! identity.

use std::borrow::Borrow;
use std::fmt;

use khazna_support::rendering::simple_type_name;

/// The logical name of a bean in the registry.
///
/// # Examples
/// ```
/// use khazna_container::key::BeanName;
///
/// // Explicit marker name wins
/// let key = BeanName::for_type(Some("accountDao"), "bank::JdbcAccountDao");
/// assert_eq!(key.as_str(), "accountDao");
///
/// // Otherwise the simple type name
/// let key = BeanName::for_type(None, "bank::JdbcAccountDao");
/// assert_eq!(key.as_str(), "JdbcAccountDao");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeanName(String);

impl BeanName {
    /// Wraps a name as-is.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derives the registry key of a registered type.
    ///
    /// An explicit non-empty marker name is used verbatim; an absent or
    /// empty one falls back to the unqualified type name.
    pub fn for_type(explicit: Option<&str>, type_name: &str) -> Self {
        match explicit {
            Some(name) if !name.is_empty() => Self(name.to_string()),
            _ => Self(simple_type_name(type_name)),
        }
    }

    /// Derives the key a dependency field resolves, from its declared type.
    ///
    /// ```
    /// use khazna_container::key::BeanName;
    ///
    /// let key = BeanName::for_dependency("dyn bank::AccountDao + core::marker::Send");
    /// assert_eq!(key.as_str(), "AccountDao");
    /// ```
    pub fn for_dependency(declared_type: &str) -> Self {
        Self(simple_type_name(declared_type))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BeanName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BeanName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BeanName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for BeanName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for BeanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
