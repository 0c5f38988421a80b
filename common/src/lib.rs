pub mod command;
pub mod config;
pub mod error_inject;
pub mod models;
