pub mod context;
pub mod pool;
pub mod scene;
