pub mod normalize;
pub mod retention;
pub mod types;

pub use types::*;
