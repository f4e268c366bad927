//! Testing infrastructure for gerrymander integration tests.
//!
//! - `FakeRemote`: a scripted stand-in for `ssh host gerrit ...`
//! - `TestWorld`: isolated config + cache for running the CLI binary
//! - `fixtures`: sample server output

pub mod fixtures;
pub mod remote;
pub mod world;

pub use remote::FakeRemote;
pub use world::{CliResult, TestWorld};
