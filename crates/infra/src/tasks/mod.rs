//! Task store adapters.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryTaskStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTaskStore;
