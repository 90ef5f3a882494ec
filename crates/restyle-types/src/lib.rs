//! Foundation types for restyle.
//!
//! Shared by every crate in the workspace: the error enum and `Result`
//! alias, the resolver configuration, and the case-insensitive [`Ident`]
//! used for tag, attribute, property and media names.

pub mod config;
pub mod error;
pub mod ident;

pub use config::{ResolverConfig, StatePolicy};
pub use error::{RestyleError, Result};
pub use ident::Ident;
