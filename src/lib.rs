//! Lightframe - media page lifecycle toolkit
//!
//! The library crate holds the portfolio pages built on the player crate,
//! their data loaders and configuration, and the scripted sessions the CLI
//! runs. It is exposed for integration testing.

pub mod config;
pub mod fetch;
pub mod models;
pub mod pages;
pub mod session;
