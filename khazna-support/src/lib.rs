//! # Khazna Support
//!
//! Shared utilities for the Khazna container crates.
//!
//! This crate provides:
//! - Simple-name derivation used for registry keys
//! - Text rendering for diagnostics and lookup-miss suggestions

pub mod rendering;
