//! Bean registry: the name-keyed store behind the container.
//!
//! The registry is mutated only while the container is being built
//! (registration, then proxy substitution) and is read-only once wrapped
//! in a [`Container`](crate::container::Container). Entries are never
//! removed; a second write under the same name replaces the first.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use khazna_support::rendering::{BeanRow, render_bean_table, suggest_similar};
use tracing::{debug, trace, warn};

use crate::bean::Bean;
use crate::key::BeanName;

/// How many "did you mean?" names to offer on a miss.
const MAX_SUGGESTIONS: usize = 3;

/// Maps bean names to beans.
#[derive(Debug, Default)]
pub struct BeanRegistry {
    beans: HashMap<BeanName, Bean>,
}

impl BeanRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a bean, replacing any bean already stored under `key`.
    ///
    /// Returns the replaced bean.
    pub(crate) fn register(&mut self, key: BeanName, bean: Bean) -> Option<Bean> {
        debug!(key = %key, type_name = bean.type_name(), "Registered bean");
        match self.beans.entry(key) {
            Entry::Occupied(mut slot) => {
                warn!(
                    key = %slot.key(),
                    new = bean.type_name(),
                    replaced = slot.get().type_name(),
                    "Bean name already taken, last registration wins"
                );
                Some(slot.insert(bean))
            }
            Entry::Vacant(slot) => {
                slot.insert(bean);
                None
            }
        }
    }

    /// Stores a wrapper in place of the bean under `key`.
    pub(crate) fn substitute(&mut self, key: BeanName, wrapper: Bean) {
        trace!(key = %key, kind = %wrapper.kind(), "Substituting bean");
        self.beans.insert(key, wrapper);
    }

    /// Looks up a bean by name.
    pub fn get(&self, name: &str) -> Option<&Bean> {
        self.beans.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }

    /// Returns the number of registered beans.
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// Returns true if no beans are registered.
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.beans.keys().map(BeanName::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BeanName, &Bean)> {
        self.beans.iter()
    }

    /// Registered names that look like `name`, for error messages.
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        suggest_similar(name, &self.names(), MAX_SUGGESTIONS)
    }

    /// Renders the registry as a table of name, kind and type.
    pub fn describe(&self) -> String {
        let rows: Vec<BeanRow> = self
            .beans
            .iter()
            .map(|(key, bean)| BeanRow {
                key: key.to_string(),
                kind: bean.kind().to_string(),
                type_name: bean.type_name().to_string(),
            })
            .collect();
        render_bean_table(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use std::sync::Arc;

    #[derive(Default)]
    struct JdbcAccountDao;

    #[derive(Default)]
    struct MemoryAccountDao;

    fn bean<T: Default + Send + Sync + 'static>() -> Bean {
        let descriptor = Arc::new(TypeDescriptor::builder::<T>().build());
        let target = descriptor.construct().unwrap();
        Bean::instance(descriptor, target)
    }

    #[test]
    fn register_and_get() {
        let mut reg = BeanRegistry::new();
        assert!(reg.register(BeanName::from("accountDao"), bean::<JdbcAccountDao>()).is_none());
        assert!(reg.get("accountDao").is_some());
        assert!(reg.contains("accountDao"));
        assert!(reg.get("AccountDao").is_none());
    }

    #[test]
    fn last_write_wins() {
        let mut reg = BeanRegistry::new();
        reg.register(BeanName::from("accountDao"), bean::<JdbcAccountDao>());
        let replaced = reg.register(BeanName::from("accountDao"), bean::<MemoryAccountDao>());

        assert!(replaced.unwrap().get::<JdbcAccountDao>().is_some());
        assert_eq!(reg.len(), 1);
        assert!(reg.get("accountDao").unwrap().get::<MemoryAccountDao>().is_some());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn overwrite_warning_names_both_types() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut reg = BeanRegistry::new();
            reg.register(BeanName::from("accountDao"), bean::<JdbcAccountDao>());
            reg.register(BeanName::from("accountDao"), bean::<MemoryAccountDao>());
        });

        let output = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(output.contains("last registration wins"));
        assert!(output.contains("key=accountDao"));
        assert!(output.contains("MemoryAccountDao"));
        assert!(output.contains("JdbcAccountDao"));
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = BeanRegistry::new();
        reg.register(BeanName::from("b"), bean::<JdbcAccountDao>());
        reg.register(BeanName::from("a"), bean::<MemoryAccountDao>());
        assert_eq!(reg.names(), vec!["a", "b"]);
    }

    #[test]
    fn suggestions_for_case_mismatch() {
        let mut reg = BeanRegistry::new();
        reg.register(BeanName::from("accountDao"), bean::<JdbcAccountDao>());
        assert_eq!(reg.suggestions("AccountDao"), vec!["accountDao".to_string()]);
    }

    #[test]
    fn describe_lists_every_bean() {
        let mut reg = BeanRegistry::new();
        reg.register(BeanName::from("accountDao"), bean::<JdbcAccountDao>());
        let table = reg.describe();
        assert!(table.contains("[Instance] accountDao"));
        assert!(table.contains("JdbcAccountDao"));
    }
}
