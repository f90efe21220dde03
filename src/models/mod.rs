//! Data models for service responses

mod call;
mod room;

pub use call::*;
pub use room::*;
