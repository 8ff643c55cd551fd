//! Desk console library
//!
//! This library exposes the core functionality of the desk console for
//! testing and for the `deskconsole` binary.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
