use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use khazna::prelude::*;

mod clocks {
    use khazna::prelude::*;

    pub trait Printer: Send + Sync {}

    #[derive(Default, Service)]
    pub struct SystemClock;

    #[derive(Default, Service)]
    pub struct Report {
        #[autowired]
        pub stamp: Autowired<SystemClock>,

        #[autowired(required = false)]
        pub backup: Autowired<SystemClock>,

        #[autowired]
        pub printer: Autowired<dyn Printer>,

        pub title: String,
    }
}

mod failing {
    use khazna::prelude::*;

    #[derive(Service)]
    #[service(constructor = "Pool::connect")]
    pub struct Pool;

    impl Pool {
        fn connect() -> Result<Self, BoxError> {
            Err("no database url".into())
        }
    }

    #[derive(Default, Service)]
    pub struct Cache;
}

mod greeters {
    use khazna::prelude::*;

    pub trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Default, Service)]
    #[service(name = "greeter", implements(Greeter))]
    pub struct English;

    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }
}

mod overrides {
    use super::greeters::Greeter;
    use khazna::prelude::*;

    #[derive(Default, Service)]
    #[service(name = "greeter", implements(Greeter))]
    pub struct Persian;

    impl Greeter for Persian {
        fn greet(&self) -> &'static str {
            "salam"
        }
    }
}

#[test]
fn default_key_is_simple_type_name() {
    let container = Container::builder().scan("derive::clocks").build().unwrap();
    assert_eq!(container.names(), vec!["Report", "SystemClock"]);
}

#[test]
fn required_optional_and_absent_fields() {
    let container = Container::builder().scan("derive::clocks").build().unwrap();

    let clock: Arc<clocks::SystemClock> = container.lookup_as("SystemClock").unwrap();
    let report: Arc<clocks::Report> = container.lookup_as("Report").unwrap();

    assert!(Arc::ptr_eq(&report.stamp.get().unwrap(), &clock));
    assert!(!report.backup.is_wired());
    // no "Printer" bean: the setter ran with nothing to set
    assert!(!report.printer.is_wired());
    assert!(report.title.is_empty());
}

#[test]
fn failed_constructor_leaves_type_out() {
    let container = Container::builder().scan("derive::failing").build().unwrap();
    assert!(container.contains("Cache"));
    assert!(!container.contains("Pool"));
    assert_eq!(container.len(), 1);
}

#[test]
fn explicit_registration_overrides_scanned_name() {
    let container = Container::builder()
        .scan("derive::greeters")
        .register::<overrides::Persian>()
        .build()
        .unwrap();

    let greeter: Arc<dyn greeters::Greeter> = container.lookup_as("greeter").unwrap();
    assert_eq!(greeter.greet(), "salam");
    assert_eq!(container.len(), 1);
}

#[test]
fn scanned_and_registered_type_counts_once() {
    let container = Container::builder()
        .scan("derive::greeters")
        .register::<greeters::English>()
        .build()
        .unwrap();
    assert_eq!(container.len(), 1);
}

#[test]
fn derived_descriptor_metadata() {
    let descriptor = <clocks::Report as Component>::descriptor();
    let fields: Vec<_> = descriptor
        .fields()
        .iter()
        .map(|f| (f.name(), f.key().as_str().to_string(), f.is_required()))
        .collect();

    assert_eq!(
        fields,
        vec![
            ("stamp", "SystemClock".to_string(), true),
            ("backup", "SystemClock".to_string(), false),
            ("printer", "Printer".to_string(), true),
        ]
    );
    assert!(!descriptor.is_transactional());

    let english = <greeters::English as Component>::descriptor();
    assert_eq!(english.bean_name().as_str(), "greeter");
    assert!(!english.interfaces()[0].is_intercepted());
}

static PROVIDED: AtomicUsize = AtomicUsize::new(0);

struct GreeterProvider;

impl Provider for GreeterProvider {
    fn register(&self, registry: &mut dyn ProviderRegistry) {
        PROVIDED.fetch_add(1, Ordering::SeqCst);
        registry.register::<greeters::English>();
    }
}

#[test]
fn provider_registrations_are_included() {
    let container = Container::builder().add_provider(&GreeterProvider).build().unwrap();

    assert_eq!(PROVIDED.load(Ordering::SeqCst), 1);
    assert_eq!(container.lookup_as::<dyn greeters::Greeter>("greeter").unwrap().greet(), "hello");
    assert!(container.describe().contains("[Instance] greeter"));
}
