//! `UserDirectory` implementations.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserDirectory;
pub use postgres::PostgresUserDirectory;
