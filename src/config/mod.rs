// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] defines the TOML shape and the validated [`Config`] value.
//! - [`loader`] reads a file into the raw shape.
//! - [`validate`] turns the raw shape into a [`Config`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{Config, RawConfig};
