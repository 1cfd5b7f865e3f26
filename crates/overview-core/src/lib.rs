//! Round phases, transient effects, snapshot building and validation for
//! the match overview.
//!
//! A match-log parser hands this crate one ordered batch of
//! [`MatchEvent`]s per tick. The [`SnapshotBuilder`] folds each batch into
//! an immutable [`Snapshot`]; the [`SnapshotStream`] guards the renderer
//! side against anything that breaks the snapshot contract.
//!
//! # Modules
//!
//! - [`builder`] -- Per-tick event folding into published snapshots.
//! - [`config`] -- Configuration loading from `overview-config.yaml` into
//!   strongly-typed structs.
//! - [`continuity`] -- Rules between two consecutive snapshots.
//! - [`error`] -- Validation error types.
//! - [`geometry`] -- Map projection, convex hulls and polygon checks.
//! - [`ledger`] -- Creation and expiry of transient effects.
//! - [`logging`] -- `tracing` subscriber setup.
//! - [`phase`] -- Round phase transition table and round timer.
//! - [`stream`] -- Consumer-side snapshot sequence guard.
//! - [`validate`] -- Invariants of a single snapshot.
//!
//! [`MatchEvent`]: overview_types::MatchEvent
//! [`Snapshot`]: overview_types::Snapshot
//! [`SnapshotBuilder`]: builder::SnapshotBuilder
//! [`SnapshotStream`]: stream::SnapshotStream

pub mod builder;
pub mod config;
pub mod continuity;
pub mod error;
pub mod geometry;
pub mod ledger;
pub mod logging;
pub mod phase;
pub mod stream;
pub mod validate;

pub use builder::{BuilderError, SnapshotBuilder};
pub use config::{ConfigError, OverviewConfig};
pub use continuity::check_continuity;
pub use error::{ContinuityViolation, SchemaViolation, StaleEffect, TransitionViolation};
pub use stream::{SnapshotStream, StreamError};
pub use validate::validate_snapshot;
