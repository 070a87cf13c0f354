//! `custody-core`: identifiers and error primitives shared by every crate.
//!
//! No infrastructure concerns live here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::UserId;
