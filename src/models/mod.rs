//! Request, response and upstream payload types.

pub mod auth;
pub mod source;

pub use auth::*;
pub use source::*;
