pub mod pool;
pub mod schema;

pub use pool::{PoolError, PoolManager};
