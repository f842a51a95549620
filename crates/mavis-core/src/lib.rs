//! Core MAVIS library (markdown rendering, transcript markup, config).

pub mod config;
pub mod markdown;
pub mod transcript;
