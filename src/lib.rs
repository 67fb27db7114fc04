//! Stackrank: answer search sessions with lazy AI re-ranking.
//!
//! A session submits a query to an answer-search backend, shows the answers
//! in the backend's relevance order, and on request asks the backend to
//! re-rank the same answers. The ranking is fetched at most once per query
//! and never survives into the next one.
//!
//! # Architecture
//!
//! - **Gateway**: [`stackrank_gateway`] talks to the backend over HTTP
//! - **Merger**: [`merger`] turns answers plus an optional ranking into
//!   display order
//! - **Session**: [`session`] is the synchronous state machine with a
//!   generation counter that discards stale completions
//! - **Driver**: [`driver`] runs a session against a gateway and publishes
//!   snapshots
//! - **Capability**: [`capability`] probes once whether ranking is available
//! - **Host**: [`host`] exposes the driver as a JSON line protocol

pub mod capability;
pub mod config;
pub mod driver;
pub mod error;
pub mod host;
pub mod merger;
pub mod present;
pub mod session;
pub mod stackrank_dirs;

pub use capability::{Capability, CapabilityProbe};
pub use config::StackrankConfig;
pub use driver::SessionDriver;
pub use error::{Result, StackrankError};
pub use merger::{DisplayEntry, ViewMode};
pub use session::{SearchSession, SessionSnapshot, ViewError};
