//! Storage Layer

pub mod config;

pub use config::SettingsStore;
