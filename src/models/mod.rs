pub mod stats;
pub mod ticker;
