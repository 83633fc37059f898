//! Deployment module

pub mod builder;
pub mod fsm;
pub mod git;
pub mod orchestrator;
pub mod runner;

pub use fsm::{ReleaseFsm, ReleasePath, ReleaseState};
pub use orchestrator::{ReleaseOrchestrator, ReleaseReport};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
