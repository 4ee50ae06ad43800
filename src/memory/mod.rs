pub mod codec;
pub mod stats;
pub mod types;
