//! SpeedLog Core - Throughput Sampler
//!
//! This crate samples cumulative network counters on a fixed cadence,
//! classifies each instantaneous rate into a speed bucket, and hands out
//! read-and-reset reports of the resulting histogram.

mod bridge;
mod engine;
mod error;
mod source;
mod storage;

#[cfg(test)]
mod testing;

pub use bridge::*;
pub use engine::*;
pub use error::*;
pub use source::*;
pub use storage::*;
