//! Changeset Approver library.
//!
//! Auto-approves a CodePipeline manual approval when the change set action
//! it guards reports no changes. The binary entrypoint is in `main.rs`;
//! everything it runs lives here so it can be tested without AWS.

pub mod config;
pub mod decision;
pub mod error;
pub mod gate;
pub mod notification;
pub mod pipeline;
pub mod poller;

pub use config::{GateConfig, PollConfig};
pub use error::{ErrorKind, GateError};
pub use gate::{ApprovalGate, InvocationReport, Outcome};
