pub mod api;
pub mod catalog;
pub mod session;

mod messages;

pub use messages::*;
