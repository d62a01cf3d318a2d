pub mod constraints;
pub mod device_store;
pub mod ladder;
pub mod quota;
pub mod recency;
pub mod recommendations;
pub mod scoring;
pub mod stats;
