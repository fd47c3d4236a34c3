#![forbid(unsafe_code)]

pub mod grading;
pub mod model;
pub mod score;
pub mod seed;
pub mod sequencer;
pub mod time;

pub use seed::SeedSource;
pub use sequencer::Sequencer;
pub use time::Clock;
