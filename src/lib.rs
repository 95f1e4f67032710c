//! Teams Notify - CI build notifications for Microsoft Teams
//!
//! A library for turning a finished CI build into a Teams card with:
//! - Build, author and commit facts, plus user-supplied custom facts
//! - Links to the repository, commit diff, tag list and failed pipeline
//! - Optional step logs fetched from the CI server on failure
//! - Single-shot delivery to a connector webhook

pub mod card;
pub mod config;
pub mod error;
pub mod logs;
pub mod notifications;
pub mod pipeline;
pub mod plugin;

#[cfg(test)]
mod test_support;

pub use card::{Action, Fact, MessageCard, ThemeColor};
pub use error::{LogFetchError, NotifyError};
pub use plugin::Plugin;
