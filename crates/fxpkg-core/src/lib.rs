//! Core data types for fxpkg.
//!
//! This crate defines the types that describe a package recipe and the
//! environment it is resolved in: versions and ranges, the condition and
//! dependency-spec mini-language, variants, build-argument rules, compiled
//! recipes, the recipe repository, host facts and configuration.
//!
//! This crate is intentionally free of resolution logic and network I/O.

pub mod args;
pub mod condition;
pub mod config;
pub mod dependency;
pub mod host;
pub mod manifest;
pub mod recipe;
pub mod repository;
pub mod request;
pub mod spec;
pub mod variant;
pub mod version;
