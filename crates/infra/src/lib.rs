//! Infrastructure layer: configuration, rule/user persistence, document backend clients.

pub mod config;
pub mod db;
pub mod documents;
pub mod rule_store;
pub mod users;
