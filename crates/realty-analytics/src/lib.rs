//! Team and agent performance analytics for a real-estate CRM.

pub mod analytics;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod pipeline;
pub mod seed;
pub mod store;
pub mod telemetry;
