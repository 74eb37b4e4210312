mod inbound;
mod offset_vec;

pub use inbound::*;
pub use offset_vec::*;
