//! Speed engine
//!
//! - Rate sampling from cumulative counters
//! - Non-uniform speed buckets and histogram
//! - Guarded state with read-and-reset reporting
//! - Cancellable periodic sampling task

mod buckets;
mod monitor;
mod sampler;
mod state;

pub use buckets::*;
pub use monitor::*;
pub use sampler::*;
pub use state::*;
