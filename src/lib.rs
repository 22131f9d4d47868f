//! fact-catalog crate
//!
//! This crate is an implementation detail of the `catalog` tool. This crate's API is fluid and may change without warning
//! and in a semver-incompatible way.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod catalog;

#[doc(hidden)]
pub mod codehost;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod config;

#[doc(hidden)]
pub mod drift;

#[doc(hidden)]
pub mod facts;

#[doc(hidden)]
pub mod model;

#[doc(hidden)]
pub mod owner;

#[doc(hidden)]
pub mod reconcile;

#[doc(hidden)]
pub mod state;
