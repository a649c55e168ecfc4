//! Integration tests for the certmerge reconciliation engine

mod config_integration;
mod convergence;
mod merge_scenarios;
mod properties;
mod resolution;
mod sled_store;
mod support;
