//! Infrastructure layer: stores, application services, config, demo data.

pub mod config;
pub mod seed;
pub mod services;
pub mod store;

mod integration_tests;
