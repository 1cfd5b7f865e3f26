//! Input events delivered by the match-log parser.
//!
//! The parser decodes the recorded match and hands the builder one ordered
//! batch of [`MatchEvent`]s per tick. Positions arrive in world space; the
//! builder projects them into the overview frame.

use serde::{Deserialize, Serialize};

use crate::enums::{EquipmentType, GrenadeEventKind, Phase, Team};
use crate::geometry::Vector3;
use crate::ids::{EntityHandle, SteamId};

/// Per-tick state of a participant as read from the match log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrame {
    /// Participant identity.
    pub steam_id: SteamId,
    /// Display name.
    pub name: String,
    /// Team affiliation.
    pub team: Team,
    /// World position.
    pub position: Vector3,
    /// Horizontal heading in degrees.
    pub view_direction: f32,
    /// Carried equipment in slot order.
    pub inventory: Vec<EquipmentType>,
    /// Hit points.
    pub health: u16,
    /// Armor points.
    pub armor: u16,
    /// Money.
    pub money: u32,
    /// Kill counter.
    pub kills: u16,
    /// Death counter.
    pub deaths: u16,
    /// Assist counter.
    pub assists: u16,
    /// Whether the participant is alive.
    pub is_alive: bool,
    /// Whether the participant wears a helmet.
    pub has_helmet: bool,
    /// Whether the participant carries a defuse kit.
    pub has_defuse_kit: bool,
}

/// One raw domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Fresh per-tick state for a participant. Adds the participant to the
    /// roster the first time it is seen.
    PlayerUpdated(Box<PlayerFrame>),
    /// A participant left the server and leaves the roster.
    PlayerDisconnected {
        /// Who left.
        player: SteamId,
    },
    /// A participant was eliminated.
    PlayerKilled {
        /// The killer, `None` for world damage.
        killer: Option<SteamId>,
        /// The victim.
        victim: SteamId,
        /// Weapon used.
        weapon: EquipmentType,
    },
    /// A flashbang blinded a participant.
    PlayerFlashed {
        /// Who was flashed.
        player: SteamId,
        /// Total flash duration applied.
        duration_ms: u64,
    },
    /// A participant fired a weapon.
    WeaponFired {
        /// Who fired.
        shooter: SteamId,
        /// Weapon used.
        weapon: EquipmentType,
    },
    /// A grenade left a participant's hand.
    GrenadeThrown {
        /// Parser entity of the projectile.
        entity: EntityHandle,
        /// Which grenade.
        grenade: EquipmentType,
        /// World position at release.
        position: Vector3,
    },
    /// A grenade in flight moved.
    GrenadeMoved {
        /// Parser entity of the projectile.
        entity: EntityHandle,
        /// New world position.
        position: Vector3,
    },
    /// A grenade detonated.
    GrenadeDetonated {
        /// Parser entity of the projectile.
        entity: EntityHandle,
        /// What kind of detonation.
        kind: GrenadeEventKind,
        /// Which grenade.
        grenade: EquipmentType,
        /// World position of the detonation.
        position: Vector3,
        /// Who threw it, if known.
        thrower: Option<SteamId>,
    },
    /// A grenade was destroyed in flight or left play without detonating.
    GrenadeRemoved {
        /// Parser entity of the projectile.
        entity: EntityHandle,
    },
    /// Current burning fire points of an inferno. Starts the fire area the
    /// first time the entity is seen.
    InfernoUpdated {
        /// Parser entity of the inferno.
        entity: EntityHandle,
        /// World positions of the individual fires.
        fires: Vec<Vector3>,
    },
    /// An inferno burned out.
    InfernoExpired {
        /// Parser entity of the inferno.
        entity: EntityHandle,
    },
    /// A participant picked up the bomb.
    BombPickedUp {
        /// The new carrier.
        player: SteamId,
    },
    /// The carrier dropped the bomb.
    BombDropped {
        /// The previous carrier.
        player: SteamId,
        /// World position where it landed.
        position: Vector3,
    },
    /// The bomb was planted.
    BombPlanted {
        /// The planter.
        player: SteamId,
        /// World position of the plant.
        position: Vector3,
    },
    /// The bomb was defused.
    BombDefused {
        /// The defuser.
        player: SteamId,
    },
    /// The bomb exploded.
    BombExploded,
    /// A participant started defusing.
    DefuseStarted {
        /// The defuser.
        player: SteamId,
    },
    /// A participant stopped defusing without finishing.
    DefuseAborted {
        /// The defuser.
        player: SteamId,
    },
    /// The round moved to a new phase.
    RoundPhaseChanged {
        /// The new phase.
        phase: Phase,
    },
    /// Name or score of a side changed.
    TeamUpdated {
        /// Which side.
        side: Team,
        /// Clan name.
        clan_name: String,
        /// Rounds won.
        score: u8,
    },
}

impl MatchEvent {
    /// Short event name for logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlayerUpdated(_) => "player_updated",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::PlayerKilled { .. } => "player_killed",
            Self::PlayerFlashed { .. } => "player_flashed",
            Self::WeaponFired { .. } => "weapon_fired",
            Self::GrenadeThrown { .. } => "grenade_thrown",
            Self::GrenadeMoved { .. } => "grenade_moved",
            Self::GrenadeDetonated { .. } => "grenade_detonated",
            Self::GrenadeRemoved { .. } => "grenade_removed",
            Self::InfernoUpdated { .. } => "inferno_updated",
            Self::InfernoExpired { .. } => "inferno_expired",
            Self::BombPickedUp { .. } => "bomb_picked_up",
            Self::BombDropped { .. } => "bomb_dropped",
            Self::BombPlanted { .. } => "bomb_planted",
            Self::BombDefused { .. } => "bomb_defused",
            Self::BombExploded => "bomb_exploded",
            Self::DefuseStarted { .. } => "defuse_started",
            Self::DefuseAborted { .. } => "defuse_aborted",
            Self::RoundPhaseChanged { .. } => "round_phase_changed",
            Self::TeamUpdated { .. } => "team_updated",
        }
    }
}
