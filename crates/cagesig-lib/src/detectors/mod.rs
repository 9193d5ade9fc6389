pub mod artifacts;
pub mod runs;
pub mod spikes;
