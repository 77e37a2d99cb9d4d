//! cinebot - movie lookup chat bot
//!
//! This library crate exposes the core functionality for integration testing.

pub mod bot;
pub mod config;
pub mod enrich;
pub mod metadata;
pub mod reply;
