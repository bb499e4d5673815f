//! Instantiation phase: construct every scanned type and register it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::bean::{Bean, Instance};
use crate::descriptor::TypeDescriptor;
use crate::error::{InstantiationError, panic_message};
use crate::registry::BeanRegistry;

/// Constructs each descriptor's type and registers it under its bean name.
///
/// A type whose constructor fails or panics is logged and left out; the
/// remaining types are still registered. Returns the number of beans
/// constructed.
#[instrument(skip_all, name = "instantiate", fields(types = descriptors.len()))]
pub(crate) fn instantiate_all(descriptors: Vec<TypeDescriptor>, registry: &mut BeanRegistry) -> usize {
    let mut constructed = 0;

    for descriptor in descriptors {
        let descriptor = Arc::new(descriptor);
        match construct(&descriptor) {
            Ok(target) => {
                registry.register(descriptor.bean_name(), Bean::instance(descriptor, target));
                constructed += 1;
            }
            Err(err) => warn!(error = %err, "Skipping type"),
        }
    }

    info!(constructed, "Instantiation complete");
    constructed
}

fn construct(descriptor: &TypeDescriptor) -> Result<Instance, InstantiationError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| descriptor.construct()));
    let source = match outcome {
        Ok(Ok(target)) => return Ok(target),
        Ok(Err(source)) => source,
        Err(payload) => format!("constructor panicked: {}", panic_message(&*payload)).into(),
    };
    Err(InstantiationError {
        type_name: descriptor.type_name(),
        source,
    })
}
