//! Core container implementation for Khazna.

pub mod autowired;
pub mod bean;
pub mod container;
pub mod descriptor;
pub mod error;
pub mod global;
mod inject;
mod instantiate;
pub mod key;
pub mod provider;
pub mod proxy;
pub mod registry;
pub mod scanner;
pub mod settings;

pub use container::prelude;
pub use error::{KhaznaError, Result};
pub use key::BeanName;
pub use scanner::ServiceEntry;

#[doc(hidden)]
pub use inventory;
