//! Test Helper Utilities
//!
//! Shared utilities for testing xzs-planner against an in-process backend

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::{archaeological_topic, famous_topic, movie_pool, movie_topic};
pub use mock_backend::{default_materials, MockBackend, MockState};
