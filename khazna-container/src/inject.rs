//! Injection phase: wire every declared field from the registry.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, info, instrument, trace, warn};

use crate::bean::Bean;
use crate::descriptor::FieldBinding;
use crate::error::{InjectionError, InjectionFault, panic_message};
use crate::key::BeanName;
use crate::registry::BeanRegistry;

/// Counts reported by [`inject_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InjectionReport {
    pub wired: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Invokes the setter of every required field with the registry's current
/// value for the field's key.
///
/// An absent value is passed as `None`. Fields not marked required are
/// skipped without a lookup. A failing setter is logged and the
/// remaining fields are still wired.
#[instrument(skip_all, name = "inject", fields(beans = registry.len()))]
pub(crate) fn inject_all(registry: &BeanRegistry) -> InjectionReport {
    let mut report = InjectionReport::default();

    let mut beans: Vec<(&BeanName, &Bean)> = registry.iter().collect();
    beans.sort_by(|a, b| a.0.cmp(b.0));

    for (key, bean) in beans {
        for field in bean.descriptor().fields() {
            if !field.is_required() {
                trace!(bean = %key, field = field.name(), "Optional field, not wired");
                report.skipped += 1;
                continue;
            }

            match inject_field(registry, bean, field) {
                Ok(()) => report.wired += 1,
                Err(fault) => {
                    let err = InjectionError {
                        bean: key.to_string(),
                        field: field.name(),
                        key: field.key().to_string(),
                        fault,
                    };
                    warn!(error = %err, "Injection failed");
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        wired = report.wired,
        skipped = report.skipped,
        failed = report.failed,
        "Injection complete"
    );
    report
}

fn inject_field(registry: &BeanRegistry, bean: &Bean, field: &FieldBinding) -> Result<(), InjectionFault> {
    let value = registry.get(field.key().as_str());
    debug!(
        field = field.name(),
        key = %field.key(),
        present = value.is_some(),
        "Wiring field"
    );

    catch_unwind(AssertUnwindSafe(|| field.inject(bean.target(), value)))
        .unwrap_or_else(|payload| Err(InjectionFault::Panicked(panic_message(&*payload))))
}
