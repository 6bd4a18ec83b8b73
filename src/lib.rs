//! Dependency-graph footprint builder and command-stream reconstruction core for Vulkan trace
//! replay.
//!
//! This crate answers one question about a captured stream of Vulkan commands: for any given
//! sub-command, which earlier sub-commands produced the data it reads, and which of *those* are
//! themselves still needed. It builds that answer in four coupled stages:
//!
//! - [`interval`] and [`memory_binding`] give the byte-range algebra everything else is built on.
//! - [`resource_model`] defines the closed set of abstract variables (handles, labels, bound
//!   data, descriptors, ...) a command can read, write, or modify.
//! - [`footprint`] walks a command stream and emits one [`dependency::Behavior`] per sub-command.
//! - [`dependency`] runs the backward liveness scan over the emitted behaviors.
//! - [`queue_exec`] defers those behaviors to actual submission order at queue-submit time.
//! - [`splitter`] patches a command stream so a tool can inject mid-stream without breaking
//!   render pass or pipeline state.
//! - [`priming`] reconstructs image contents a replay needs but the trace never uploaded.
//!
//! ```
//! use footgraph::prelude::*;
//! ```

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;

pub mod error;
pub mod interval;
pub mod memory_binding;
pub mod resource_model;
pub mod dependency;
pub mod queue_exec;
pub mod footprint;
pub mod splitter;
pub mod priming;
pub mod state;
pub mod config;

pub use error::Error;