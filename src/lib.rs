pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod record;
