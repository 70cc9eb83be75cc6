//! Locomotor character controller library
//!
//! Exposes the simulation, controller and input adapters for the CLI, for tests
//! and for embedding in a training harness.

pub mod config;
pub mod game;
