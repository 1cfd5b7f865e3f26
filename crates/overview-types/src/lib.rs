//! Per-tick snapshot schema for the match overview.
//!
//! This crate is the contract between the match-log parser, the snapshot
//! builder and any renderer. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the overview UI.
//!
//! # Modules
//!
//! - [`ids`] -- Participant and transient-entity identifiers
//! - [`enums`] -- Round phases, teams, equipment, detonation kinds
//! - [`geometry`] -- World and overview coordinate values
//! - [`structs`] -- The [`Snapshot`] aggregate and everything it owns
//! - [`events`] -- Raw match events consumed by the builder

pub mod enums;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EquipmentType, GrenadeEventKind, Phase, Team};
pub use events::{MatchEvent, PlayerFrame};
pub use geometry::{Point2, Vector3};
pub use ids::{EffectId, EntityHandle, SteamId};
pub use structs::{
    Bomb, FireArea, GrenadeEffect, GrenadeEvent, GrenadeProjectile, KillfeedEntry,
    KillfeedParticipant, MatchHeader, Player, Shot, Snapshot, TeamState, Timer,
};
