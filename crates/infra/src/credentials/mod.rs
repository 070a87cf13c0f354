//! Credential store backends.
//!
//! The trait and the in-memory backend live in `custody-auth`; this module
//! adds the Postgres one.

pub mod postgres;

pub use postgres::PostgresCredentialStore;
