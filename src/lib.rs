//! Reelsmith - Prompt-to-Video Pipeline
//!
//! Turns a short text prompt into a narrated, captioned stock-footage video
//! with background music, a logo overlay, a thumbnail and an optional dub,
//! assembled with ffmpeg and tracked as a background job.

pub mod assembly;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod media;
pub mod segment;
pub mod server;
pub mod services;
pub mod thumbnail;
