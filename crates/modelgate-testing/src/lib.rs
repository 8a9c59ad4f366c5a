//! Testing infrastructure for modelgate integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `TestWorld`: isolated data directory, config and gateway construction
//! - `scripted`: backend and model with scripted outputs
//! - `provisioner`: provisioner that counts loads and injects delays/failures
//! - `clock`: manually advanced clock for day-rollover tests
//! - `fixtures`: model directories and manifests on disk

pub mod clock;
pub mod fixtures;
pub mod provisioner;
pub mod scripted;
pub mod world;

pub use clock::ManualClock;
pub use provisioner::StubProvisioner;
pub use scripted::{ScriptedBackend, ScriptedModel};
pub use world::{CliResult, TestWorld};
