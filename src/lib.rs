//! hlsforged - HLS stream downloader and MP4 remuxer
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod manifest;
pub mod pipeline;
pub mod reaper;
pub mod server;
pub mod state;
