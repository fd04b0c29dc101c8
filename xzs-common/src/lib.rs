//! # XZstudio Common Library
//!
//! Shared code for the XZstudio planner including:
//! - Topic candidate data model (TopicCandidate and its three kinds)
//! - REST request/response types for the topic backend
//! - Configuration loading and resolution
//! - Error types

pub mod api;
pub mod config;
pub mod error;
pub mod topic;

pub use error::{Error, Result};
pub use topic::{TopicCandidate, TopicKind, TopicType};
