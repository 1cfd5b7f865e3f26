//! Error types for snapshot validation.
//!
//! None of these are repaired in place. A snapshot that fails a check is
//! rejected and the builder has to emit a corrected one for that tick.

use overview_types::{EffectId, Phase, SteamId, Team};

use crate::geometry::PolygonDefect;

/// The transient collection an effect id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectKind {
    /// Grenade in flight.
    Projectile,
    /// Burning ground area.
    FireArea,
    /// Fading detonation visual.
    GrenadeEffect,
    /// Shot marker.
    Shot,
    /// Killfeed line.
    Killfeed,
}

impl core::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Projectile => write!(f, "grenade projectile"),
            Self::FireArea => write!(f, "fire area"),
            Self::GrenadeEffect => write!(f, "grenade effect"),
            Self::Shot => write!(f, "shot"),
            Self::Killfeed => write!(f, "killfeed entry"),
        }
    }
}

/// A grenade effect that is still present although its lifetime is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stale grenade effect {id} with lifetime {lifetime}")]
pub struct StaleEffect {
    /// The effect.
    pub id: EffectId,
    /// Its remaining lifetime (always 0 today).
    pub lifetime: u32,
}

/// A phase change outside the allowed transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid phase transition {from} -> {to}")]
pub struct TransitionViolation {
    /// Phase before the change.
    pub from: Phase,
    /// Requested phase.
    pub to: Phase,
}

/// A structural invariant broken inside a single snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaViolation {
    /// Two roster entries share an identity.
    #[error("duplicate participant {steam_id}")]
    DuplicateParticipant {
        /// The repeated identity.
        steam_id: SteamId,
    },

    /// An effect references a participant that is not on the roster.
    #[error("{kind} references unknown participant {steam_id}")]
    UnknownParticipant {
        /// The missing identity.
        steam_id: SteamId,
        /// The referencing collection.
        kind: EffectKind,
    },

    /// More than one participant is flagged as carrying the bomb.
    #[error("participants {first} and {second} both carry the bomb")]
    MultipleBombCarriers {
        /// First flagged participant.
        first: SteamId,
        /// Second flagged participant.
        second: SteamId,
    },

    /// Participant flags disagree with the bomb record.
    #[error(
        "bomb carrier mismatch: flagged participant {flagged:?}, bomb carrier {carrier:?}, carried={is_being_carried}"
    )]
    BombCarrierMismatch {
        /// Participant flagged with `has_bomb`, if any.
        flagged: Option<SteamId>,
        /// Carrier recorded on the bomb.
        carrier: Option<SteamId>,
        /// The bomb's carried flag.
        is_being_carried: bool,
    },

    /// A carried bomb is not where its carrier is.
    #[error("carried bomb is away from its carrier {carrier}")]
    BombAwayFromCarrier {
        /// The carrier.
        carrier: SteamId,
    },

    /// A dead participant still has flash time remaining.
    #[error("dead participant {steam_id} has {remaining_ms}ms of flash remaining")]
    DeadParticipantFlashed {
        /// The participant.
        steam_id: SteamId,
        /// Flash time still recorded.
        remaining_ms: u64,
    },

    /// A dead participant is not at its last alive position.
    #[error("dead participant {steam_id} moved away from its last alive position")]
    DeadParticipantMoved {
        /// The participant.
        steam_id: SteamId,
    },

    /// Remaining flash time exceeds the applied flash duration.
    #[error("participant {steam_id} has {remaining_ms}ms flash remaining of a {duration_ms}ms flash")]
    FlashExceedsDuration {
        /// The participant.
        steam_id: SteamId,
        /// Remaining flash time.
        remaining_ms: u64,
        /// Applied flash duration.
        duration_ms: u64,
    },

    /// A team slot holds the wrong side.
    #[error("team slot for {slot:?} holds {side:?}")]
    TeamSlotMismatch {
        /// The slot's expected side.
        slot: Team,
        /// The side stored in it.
        side: Team,
    },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in {context}")]
    NonFiniteCoordinate {
        /// Where the coordinate was found.
        context: String,
    },

    /// A fire area polygon is not a simple convex hull.
    #[error("malformed fire area {id}: {defect}")]
    MalformedPolygon {
        /// The fire area.
        id: EffectId,
        /// What is wrong with it.
        defect: PolygonDefect,
    },

    /// An effect id appears twice in one collection.
    #[error("duplicate {kind} id {id}")]
    DuplicateEffect {
        /// The collection.
        kind: EffectKind,
        /// The repeated id.
        id: EffectId,
    },

    /// A killfeed line claims a tick later than the snapshot.
    #[error("killfeed entry {id} from tick {entry_tick} is newer than snapshot tick {tick}")]
    KillfeedFromFuture {
        /// The line.
        id: EffectId,
        /// Tick recorded on the line.
        entry_tick: u64,
        /// Snapshot tick.
        tick: u64,
    },

    /// A grenade effect outlived its lifetime.
    #[error(transparent)]
    Stale(#[from] StaleEffect),
}

/// A rule between two consecutive snapshots is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContinuityViolation {
    /// Ticks must strictly increase.
    #[error("tick {next} does not follow tick {prev}")]
    TickNotIncreasing {
        /// Previous snapshot tick.
        prev: u64,
        /// Next snapshot tick.
        next: u64,
    },

    /// A tick is missing between two snapshots.
    #[error("tick {next} skips ahead of tick {prev}")]
    TickSkipped {
        /// Previous snapshot tick.
        prev: u64,
        /// Next snapshot tick.
        next: u64,
    },

    /// The phase changed outside the transition table.
    #[error(transparent)]
    Transition(#[from] TransitionViolation),

    /// Remaining time grew without a phase change.
    #[error("{phase} timer increased from {prev_ms}ms to {next_ms}ms")]
    TimerIncreased {
        /// The unchanged phase.
        phase: Phase,
        /// Previous remaining time.
        prev_ms: u64,
        /// Next remaining time.
        next_ms: u64,
    },

    /// A grenade effect did not lose exactly one tick of lifetime.
    #[error("grenade effect {id} lifetime went from {prev} to {next}")]
    LifetimeNotDecremented {
        /// The effect.
        id: EffectId,
        /// Previous lifetime.
        prev: u32,
        /// Next lifetime.
        next: u32,
    },

    /// A grenade effect whose lifetime ran out is still present.
    #[error("grenade effect {id} is present after its lifetime ran out")]
    ExpiredEffectPresent {
        /// The effect.
        id: EffectId,
    },

    /// A shot marker survived into the next tick.
    #[error("shot {id} persisted past the tick it was fired on")]
    ShotPersisted {
        /// The shot.
        id: EffectId,
    },

    /// A killfeed line changed after it was published.
    #[error("killfeed entry {id} was modified")]
    KillfeedEntryMutated {
        /// The line.
        id: EffectId,
    },

    /// Killfeed lines were removed from the middle or reordered.
    #[error("killfeed is not append-only at entry {id}")]
    KillfeedNotAppendOnly {
        /// First line out of place.
        id: EffectId,
    },

    /// A retired effect or killfeed line came back.
    #[error("{kind} {id} re-appeared after it was retired")]
    Reappeared {
        /// The collection.
        kind: EffectKind,
        /// The id.
        id: EffectId,
    },
}
