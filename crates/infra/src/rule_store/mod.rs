//! `RuleStore` implementations.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryRuleStore;
pub use postgres::PostgresRuleStore;
