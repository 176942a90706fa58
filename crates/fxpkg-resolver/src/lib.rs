//! The variant resolver: turns a recipe, a request and host facts into a
//! configuration, its active dependency constraints, build arguments and a
//! fetch descriptor. Also builds dependency trees across a repository.

pub mod conflict;
pub mod constraint;
pub mod fetch;
pub mod graph;
pub mod resolver;

pub use resolver::{configure, resolve, Configuration, Configured, Resolution};
