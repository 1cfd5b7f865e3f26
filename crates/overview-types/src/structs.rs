//! The per-tick snapshot aggregate and everything it owns.
//!
//! A [`Snapshot`] is built exactly once per tick and is immutable after
//! it is handed to a renderer. Nothing in one snapshot aliases data in
//! another; every collection is owned by value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EquipmentType, GrenadeEventKind, Phase, Team};
use crate::geometry::{Point2, Vector3};
use crate::ids::{EffectId, SteamId};

// ---------------------------------------------------------------------------
// Match header
// ---------------------------------------------------------------------------

/// Describes the match a stream of snapshots belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchHeader {
    /// Map name as reported by the match log (e.g. `de_dust2`).
    pub map_name: String,
    /// Server ticks per second.
    pub tick_rate: u32,
    /// When the match was recorded.
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// State of one roster member for a single tick.
///
/// Identity is [`SteamId`]. Once a participant dies its `position` is frozen
/// at `last_alive_position` (the renderer draws a ghost marker there) and
/// its flash state is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Stable identity for the whole match.
    pub steam_id: SteamId,
    /// Display name.
    pub name: String,
    /// Team affiliation.
    pub team: Team,
    /// Projected overview position.
    pub position: Point2,
    /// Projected position at the last tick the participant was alive.
    pub last_alive_position: Point2,
    /// Horizontal heading in degrees.
    pub view_direction: f32,
    /// Total flash duration applied by the most recent flashbang.
    pub flash_duration_ms: u64,
    /// Flash time still remaining.
    pub flash_time_remaining_ms: u64,
    /// Carried equipment in slot order. Duplicates are allowed.
    pub inventory: Vec<EquipmentType>,
    /// Hit points.
    pub health: u16,
    /// Armor points.
    pub armor: u16,
    /// Money available for buying.
    pub money: u32,
    /// Kill counter.
    pub kills: u16,
    /// Death counter.
    pub deaths: u16,
    /// Assist counter.
    pub assists: u16,
    /// Whether the participant is alive.
    pub is_alive: bool,
    /// Whether the participant is currently defusing the bomb.
    pub is_defusing: bool,
    /// Whether the participant wears a helmet.
    pub has_helmet: bool,
    /// Whether the participant carries a defuse kit.
    pub has_defuse_kit: bool,
    /// Whether the participant carries the bomb.
    pub has_bomb: bool,
}

/// Name and score of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TeamState {
    /// Which side this slot describes.
    pub side: Team,
    /// Clan name, empty if the match log has none.
    pub clan_name: String,
    /// Rounds won.
    pub score: u8,
}

impl TeamState {
    /// An unnamed side with zero score.
    pub const fn new(side: Team) -> Self {
        Self {
            side,
            clan_name: String::new(),
            score: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Bomb and timer
// ---------------------------------------------------------------------------

/// The single bomb object of the match.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Bomb {
    /// Projected overview position.
    pub position: Point2,
    /// Whether a participant carries the bomb.
    pub is_being_carried: bool,
    /// The carrying participant. `Some` exactly when `is_being_carried`.
    pub carrier: Option<SteamId>,
}

/// Remaining time in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Timer {
    /// Current round phase.
    pub phase: Phase,
    /// Time left in the phase, clamped at zero.
    pub time_remaining_ms: u64,
}

// ---------------------------------------------------------------------------
// Transient effects
// ---------------------------------------------------------------------------

/// A grenade in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GrenadeProjectile {
    /// Stable key across snapshots.
    pub id: EffectId,
    /// World position, including height.
    pub position: Vector3,
    /// Which grenade was thrown.
    pub grenade: EquipmentType,
}

/// Ground coverage of one burning molotov or incendiary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FireArea {
    /// Stable key across snapshots.
    pub id: EffectId,
    /// Convex hull of the burning area in overview coordinates.
    pub hull: Vec<Point2>,
}

/// Immutable record of a grenade detonation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GrenadeEvent {
    /// What happened.
    pub kind: GrenadeEventKind,
    /// Which grenade detonated.
    pub grenade: EquipmentType,
    /// World position of the detonation.
    pub position: Vector3,
    /// Who threw it, if known.
    pub thrower: Option<SteamId>,
}

/// A fading visual drawn for a detonation.
///
/// Holds the detonation record and an owned lifetime counter. The
/// counter drops by one per tick; the effect is gone from the first
/// snapshot in which it would reach zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GrenadeEffect {
    id: EffectId,
    event: GrenadeEvent,
    lifetime: u32,
}

impl GrenadeEffect {
    /// Wrap a detonation with its initial lifetime in ticks.
    pub const fn new(id: EffectId, event: GrenadeEvent, lifetime: u32) -> Self {
        Self {
            id,
            event,
            lifetime,
        }
    }

    /// Stable key across snapshots.
    pub const fn id(&self) -> EffectId {
        self.id
    }

    /// The detonation this effect visualizes.
    pub const fn event(&self) -> &GrenadeEvent {
        &self.event
    }

    /// Ticks left, including the current one.
    pub const fn lifetime(&self) -> u32 {
        self.lifetime
    }

    /// The same effect one tick later, or `None` once the lifetime is used up.
    pub const fn decayed(self) -> Option<Self> {
        match self.lifetime.checked_sub(1) {
            Some(0) | None => None,
            Some(lifetime) => Some(Self { lifetime, ..self }),
        }
    }
}

/// A weapon shot, valid only for the tick it was fired on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Shot {
    /// Key of the marker; never reused by a later tick.
    pub id: EffectId,
    /// Who fired.
    pub shooter: SteamId,
    /// Projected position of the shooter.
    pub position: Point2,
    /// Shooter heading in degrees.
    pub view_direction: f32,
    /// Whether the shot came from a precision rifle.
    pub is_precision_shot: bool,
}

/// One side of a killfeed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct KillfeedParticipant {
    /// Participant identity.
    pub steam_id: SteamId,
    /// Display name at the time of the kill.
    pub name: String,
    /// Team at the time of the kill.
    pub team: Team,
}

/// One killfeed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct KillfeedEntry {
    /// Stable key across snapshots.
    pub id: EffectId,
    /// Tick the kill happened on.
    pub tick: u64,
    /// The killer. `None` for world damage.
    pub killer: Option<KillfeedParticipant>,
    /// The victim.
    pub victim: KillfeedParticipant,
    /// Weapon label.
    pub weapon: String,
}

// ---------------------------------------------------------------------------
// Snapshot aggregate
// ---------------------------------------------------------------------------

/// Everything the renderer draws for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Tick counter of the source event stream.
    pub tick: u64,
    /// Roster members, living and dead, in roster order.
    pub players: Vec<Player>,
    /// Grenades in flight.
    pub grenade_projectiles: Vec<GrenadeProjectile>,
    /// Burning ground areas.
    pub fire_areas: Vec<FireArea>,
    /// Fading detonation visuals.
    pub grenade_effects: Vec<GrenadeEffect>,
    /// Shots fired on this tick.
    pub shots: Vec<Shot>,
    /// Recent kills, oldest first.
    pub killfeed: Vec<KillfeedEntry>,
    /// The bomb.
    pub bomb: Bomb,
    /// Attacking side.
    pub team_terrorists: TeamState,
    /// Defending side.
    pub team_counter_terrorists: TeamState,
    /// Round phase and remaining time.
    pub timer: Timer,
}

impl Snapshot {
    /// Look up a participant by identity.
    pub fn player(&self, steam_id: SteamId) -> Option<&Player> {
        self.players.iter().find(|p| p.steam_id == steam_id)
    }

    /// Participants flagged as carrying the bomb.
    pub fn bomb_carriers(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.has_bomb)
    }

    /// Number of living participants.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive).count()
    }

    /// The team slot for a playing side.
    pub const fn team_state(&self, side: Team) -> Option<&TeamState> {
        match side {
            Team::Terrorists => Some(&self.team_terrorists),
            Team::CounterTerrorists => Some(&self.team_counter_terrorists),
            Team::Unassigned | Team::Spectators => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detonation() -> GrenadeEvent {
        GrenadeEvent {
            kind: GrenadeEventKind::HeExplode,
            grenade: EquipmentType::He,
            position: Vector3::new(100.0, 200.0, 8.0),
            thrower: None,
        }
    }

    #[test]
    fn effect_decays_one_tick_at_a_time() {
        let effect = GrenadeEffect::new(EffectId::new(), detonation(), 3);
        let next = effect.decayed();
        assert_eq!(next.map(|e| e.lifetime()), Some(2));
        let last = next.and_then(GrenadeEffect::decayed);
        assert_eq!(last.map(|e| e.lifetime()), Some(1));
        assert!(last.and_then(GrenadeEffect::decayed).is_none());
    }

    #[test]
    fn decayed_keeps_identity_and_event() {
        let effect = GrenadeEffect::new(EffectId::new(), detonation(), 5);
        let next = effect.decayed();
        assert_eq!(next.map(|e| e.id()), Some(effect.id()));
        assert_eq!(next.map(|e| *e.event()), Some(detonation()));
    }

    #[test]
    fn zero_lifetime_never_decays_into_presence() {
        let effect = GrenadeEffect::new(EffectId::new(), detonation(), 0);
        assert!(effect.decayed().is_none());
    }
}
