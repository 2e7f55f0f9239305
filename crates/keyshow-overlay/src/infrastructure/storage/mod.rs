//! Storage infrastructure: settings file persistence.
//!
//! The `config` sub-module reads and writes the TOML settings file, supplies
//! defaults when it does not exist yet, and exposes the live settings to the
//! display coordinator through [`config::SettingsHandle`].

pub mod config;
