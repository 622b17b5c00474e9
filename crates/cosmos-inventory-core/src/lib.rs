pub mod clients;
pub mod config;
pub mod context;
pub mod continuation;
pub mod dialects;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod providers;
pub mod registry;
pub mod router;
pub mod sqlite;
pub mod telemetry;
pub(crate) mod task_context;
