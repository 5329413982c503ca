pub mod clear;
pub mod common;
pub mod completions;
pub mod config;
pub mod detect;
pub mod diff;
pub mod export;
pub mod list;
pub mod resolve;
pub mod stats;
