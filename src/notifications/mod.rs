//! Notifications module
//!
//! Provides:
//! - Teams connector webhook delivery

mod teams;

pub use teams::*;
