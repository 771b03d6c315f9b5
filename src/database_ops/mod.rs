pub mod db;
pub mod placeholders;
pub mod schema;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;
