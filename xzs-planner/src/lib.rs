//! # XZstudio Planner
//!
//! Client side of the food-video topic planner:
//! - REST client for the topic backend ([`client`])
//! - Topic browsing view with favorites, skip and discovery ([`browse`])
//! - Address derivation and back/forward history ([`address`])
//! - Five-step production workflow session and step components ([`workflow`])
//! - Cooking tutorial data ([`recipes`]) and theme preferences ([`theme`])

pub mod address;
pub mod browse;
pub mod client;
pub mod error;
pub mod recipes;
pub mod theme;
pub mod workflow;

#[cfg(test)]
mod test_support;

pub use crate::error::{PlannerError, Result};
pub use crate::workflow::{SessionState, StepId, StepOutput, WorkflowSession};
