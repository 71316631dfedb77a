pub mod config;
pub mod provider;
pub mod types;
pub mod visualizer;
