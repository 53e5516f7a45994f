//! Telesonarr - Telegram front-end for a Sonarr media library
//!
//! This library crate exposes the core functionality for integration testing.

pub mod bot;
pub mod config;
pub mod format;
pub mod sonarr;
pub mod telegram;
pub mod transport;
