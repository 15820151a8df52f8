//! Shared test utilities for mailsift integration tests.
//!
//! This module provides:
//! - Builders for raw messages and JSON config files
//! - Scripted fakes for the AI collaborators and the mail transport
//! - `TestHarness` wiring an isolated database into the pipeline

#![allow(unused_imports)]

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
