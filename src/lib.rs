// Library for tests to access modules

pub mod aggregation;
pub mod auto_snapshot;
pub mod comparison;
pub mod config;
pub mod error;
pub mod listing;
pub mod models;
pub mod poller;
pub mod routes;
pub mod sheet;
pub mod snapshot_repo;
pub mod validation;
