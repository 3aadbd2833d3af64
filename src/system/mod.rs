pub mod cleanup;
pub mod platform;
pub mod probe;
pub mod progress;
pub mod reclaim;
pub mod sampler;
pub mod snapshot;
pub mod trim;
