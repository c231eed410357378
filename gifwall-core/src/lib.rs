//! # Gifwall Core
//!
//! Core types and utilities shared across the gifwall engine.
//!
//! This crate provides the fundamental building blocks used by the codec
//! and render crates:
//! - Error handling and decode status codes
//! - A little-endian byte reader for structural parsing
//! - ARGB raster buffer abstractions
//! - Size-keyed buffer pool implementations
//! - A replay-latest watch channel for state propagation

pub mod error;
pub mod pool;
pub mod raster;
pub mod reader;
pub mod watch;

pub use error::{Error, Result, Status};
pub use pool::{FramePool, ScratchPool, SharedPools};
pub use raster::PixelBuffer;
pub use reader::ByteReader;
pub use watch::{StateChannel, Subscriber};
