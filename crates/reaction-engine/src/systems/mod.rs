pub mod builder;
pub mod choreography;
pub mod effects;
pub mod render;
pub mod transport;
