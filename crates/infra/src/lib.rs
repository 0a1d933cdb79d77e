//! Infrastructure layer: store adapters for credentials and tasks.
//!
//! In-memory stores are always available. Postgres stores are compiled with
//! the `postgres` feature.

pub mod credentials;
pub mod tasks;

#[cfg(feature = "postgres")]
pub mod schema;

pub use credentials::InMemoryCredentialStore;
pub use tasks::InMemoryTaskStore;

#[cfg(feature = "postgres")]
pub use credentials::PostgresCredentialStore;
#[cfg(feature = "postgres")]
pub use tasks::PostgresTaskStore;
