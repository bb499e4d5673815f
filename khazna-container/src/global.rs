//! The process-wide container.
//!
//! Opt-in: nothing in the crate reads the global container. Applications
//! that want a single well-known instance install it once at startup.
//!
//! ```rust,ignore
//! khazna::global::init_global(Container::builder().scan("bank"))?;
//! let service = khazna::global::lookup("transferService");
//! ```

use once_cell::sync::OnceCell;
use tracing::info;

use crate::bean::Bean;
use crate::container::{Container, ContainerBuilder};
use crate::error::{KhaznaError, Result};

static GLOBAL_CONTAINER: OnceCell<Container> = OnceCell::new();

/// Builds `builder` and installs the result as the global container.
///
/// # Errors
/// [`KhaznaError::AlreadyInitialized`] if a container is already installed,
/// or whatever [`ContainerBuilder::build`] returns.
pub fn init_global(builder: ContainerBuilder) -> Result<&'static Container> {
    if GLOBAL_CONTAINER.get().is_some() {
        return Err(KhaznaError::AlreadyInitialized);
    }
    let container = builder.build()?;
    GLOBAL_CONTAINER
        .set(container)
        .map_err(|_| KhaznaError::AlreadyInitialized)?;
    info!("Global container installed");
    global().ok_or(KhaznaError::AlreadyInitialized)
}

/// Returns the global container, building it with `init` on first use.
pub fn get_or_init_global(init: impl FnOnce() -> ContainerBuilder) -> Result<&'static Container> {
    GLOBAL_CONTAINER.get_or_try_init(|| init().build())
}

/// The global container, if one was installed.
pub fn global() -> Option<&'static Container> {
    GLOBAL_CONTAINER.get()
}

/// Looks up `name` in the global container.
///
/// Absent if no container is installed.
pub fn lookup(name: &str) -> Option<Bean> {
    global()?.lookup(name)
}
