pub mod apis;
pub mod calendar;
pub mod class_info;
pub mod combine;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod parser;
pub mod session;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
