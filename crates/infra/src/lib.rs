//! Infrastructure layer: durable storage for staff accounts.

pub mod credentials;

pub use credentials::PostgresCredentialStore;
