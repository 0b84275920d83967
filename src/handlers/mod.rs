//! HTTP request handlers

pub mod admin;
pub mod catalog;
pub mod feedback;
pub mod middleware;
pub mod rate_limit;

pub use admin::*;
pub use catalog::*;
pub use feedback::*;
