//! WebSocket message types.

mod base;
mod market_data;
mod trading;

pub use base::*;
pub use market_data::*;
pub use trading::*;
