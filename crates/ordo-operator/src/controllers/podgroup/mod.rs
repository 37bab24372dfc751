mod engine;
mod manager;

pub use self::engine::*;
pub use self::manager::*;
