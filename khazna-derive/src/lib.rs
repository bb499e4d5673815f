//! Derive macros for Khazna.
//!
//! Re-exported by the `khazna` crate; depend on that instead.

pub use khazna_macros::Service;
