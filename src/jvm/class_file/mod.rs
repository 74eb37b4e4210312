mod attribute;
mod constants;
mod constants_pool;

pub use attribute::*;
pub use constants::*;
pub use constants_pool::*;
