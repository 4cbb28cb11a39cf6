//! # Traffic Manager API Library
//!
//! Backend for a Meta Ads traffic-management dashboard: connected ad
//! accounts, campaign and daily metric sync, automatic sync orchestration and
//! token-addressed public reports.

pub mod auth;
pub mod config;
pub mod connectors;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod normalization;
pub mod notifier;
pub mod repositories;
pub mod scheduler;
pub mod server;
pub mod sync_executor;
pub mod telemetry;
pub use migration;
