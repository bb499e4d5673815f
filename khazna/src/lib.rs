//! # Khazna: a name-keyed IoC container for Rust
//!
//! Service types are discovered by namespace, constructed, wired through
//! their `#[autowired]` fields and, when marked transactional, replaced by
//! a wrapper that runs every call inside a transaction. The result is a
//! frozen [`Container`] answering `lookup(name)`.
//!
//! ```rust,ignore
//! use khazna::prelude::*;
//!
//! let container = Container::builder()
//!     .scan("bank")
//!     .register::<TransactionalProxyFactory>()
//!     .build()?;
//!
//! let transfers: Arc<dyn TransferService> = container.lookup_as("transferService").unwrap();
//! ```

pub use khazna_container::*;
pub use khazna_derive::*;
pub use khazna_support::*;

pub mod prelude {
    pub use khazna_container::prelude::*;
    pub use khazna_derive::Service;
}
