//! Consumer-side guard over a sequence of published snapshots.
//!
//! [`SnapshotStream`] sits in front of a renderer. Each incoming snapshot
//! is validated on its own, checked against the last accepted one, and
//! checked against every effect id that has already left the screen. A
//! rejected snapshot is not stored; the stream keeps the last good one and
//! the producer is expected to re-emit a corrected snapshot.
//!
//! Retired ids are remembered one by one for a horizon of ticks. Past it
//! they fold into a watermark: effect ids are time-ordered, so an id that
//! was not live in the previous snapshot and sorts at or below the
//! watermark must be an old one coming back.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use overview_types::{EffectId, Snapshot};
use tracing::{debug, warn};

use crate::continuity::check_continuity;
use crate::error::{ContinuityViolation, EffectKind, SchemaViolation};
use crate::validate::validate_snapshot;

/// Why a snapshot was not accepted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    /// The snapshot is inconsistent on its own.
    #[error("invalid snapshot: {source}")]
    Schema {
        /// The broken invariant.
        #[from]
        source: SchemaViolation,
    },

    /// The snapshot cannot follow the last accepted one.
    #[error("discontinuous snapshot: {source}")]
    Continuity {
        /// The broken rule.
        #[from]
        source: ContinuityViolation,
    },
}

/// Every effect id of a snapshot, tagged by collection.
fn effect_ids(snapshot: &Snapshot) -> BTreeSet<(EffectKind, EffectId)> {
    let projectiles = snapshot
        .grenade_projectiles
        .iter()
        .map(|p| (EffectKind::Projectile, p.id));
    let fires = snapshot
        .fire_areas
        .iter()
        .map(|a| (EffectKind::FireArea, a.id));
    let effects = snapshot
        .grenade_effects
        .iter()
        .map(|e| (EffectKind::GrenadeEffect, e.id()));
    let shots = snapshot.shots.iter().map(|s| (EffectKind::Shot, s.id));
    let killfeed = snapshot
        .killfeed
        .iter()
        .map(|e| (EffectKind::Killfeed, e.id));

    projectiles
        .chain(fires)
        .chain(effects)
        .chain(shots)
        .chain(killfeed)
        .collect()
}

/// Ticks a retired id is tracked individually before it is folded into
/// the watermark. Ten seconds at 64 tick.
pub const DEFAULT_RETIRED_HORIZON_TICKS: u64 = 640;

/// Accepts snapshots in order and remembers what has been retired.
#[derive(Debug)]
pub struct SnapshotStream {
    last: Option<Arc<Snapshot>>,
    live: BTreeSet<(EffectKind, EffectId)>,
    /// Recently retired ids and the tick they disappeared on.
    retired: BTreeMap<(EffectKind, EffectId), u64>,
    /// Highest id folded out of `retired`.
    watermark: Option<EffectId>,
    horizon_ticks: u64,
}

impl Default for SnapshotStream {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStream {
    /// An empty stream.
    pub const fn new() -> Self {
        Self::with_horizon(DEFAULT_RETIRED_HORIZON_TICKS)
    }

    /// An empty stream that tracks retired ids individually for
    /// `horizon_ticks` ticks.
    pub const fn with_horizon(horizon_ticks: u64) -> Self {
        Self {
            last: None,
            live: BTreeSet::new(),
            retired: BTreeMap::new(),
            watermark: None,
            horizon_ticks,
        }
    }

    /// The last accepted snapshot.
    pub const fn last(&self) -> Option<&Arc<Snapshot>> {
        self.last.as_ref()
    }

    /// Whether an effect id was seen and has since disappeared.
    pub fn is_retired(&self, kind: EffectKind, id: EffectId) -> bool {
        self.retired.contains_key(&(kind, id))
            || (!self.live.contains(&(kind, id)) && self.below_watermark(id))
    }

    /// Number of retired ids still tracked individually.
    pub fn tracked_retired(&self) -> usize {
        self.retired.len()
    }

    fn below_watermark(&self, id: EffectId) -> bool {
        self.watermark.is_some_and(|mark| id <= mark)
    }

    /// First id in `live` that was already retired.
    fn reappeared(
        &self,
        live: &BTreeSet<(EffectKind, EffectId)>,
    ) -> Option<(EffectKind, EffectId)> {
        let previous: BTreeSet<EffectId> = self.live.iter().map(|&(_, id)| id).collect();
        live.iter().copied().find(|key| {
            self.retired.contains_key(key)
                || (!previous.contains(&key.1) && self.below_watermark(key.1))
        })
    }

    /// Fold ids retired more than the horizon ago into the watermark.
    fn fold_retired(&mut self, tick: u64) {
        let horizon = self.horizon_ticks;
        let mut watermark = self.watermark;
        self.retired.retain(|&(_, id), retired_at| {
            let keep = tick.saturating_sub(*retired_at) < horizon;
            if !keep {
                watermark = watermark.max(Some(id));
            }
            keep
        });
        self.watermark = watermark;
    }

    /// Check and accept the next snapshot.
    ///
    /// Grenade effects whose lifetime already reached zero are dropped with
    /// a warning rather than rejected; the returned snapshot is then a
    /// filtered copy and the input is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] if the snapshot fails validation, does not
    /// follow the last accepted snapshot, or brings back a retired id. The
    /// stream state is unchanged in that case.
    pub fn accept(&mut self, snapshot: Arc<Snapshot>) -> Result<Arc<Snapshot>, StreamError> {
        let snapshot = drop_stale_effects(snapshot);
        validate_snapshot(&snapshot)?;
        if let Some(prev) = &self.last {
            check_continuity(prev, &snapshot)?;
        }

        let live = effect_ids(&snapshot);
        if let Some((kind, id)) = self.reappeared(&live) {
            return Err(ContinuityViolation::Reappeared { kind, id }.into());
        }

        let tick = snapshot.tick;
        let gone: Vec<_> = self.live.difference(&live).copied().collect();
        if !gone.is_empty() {
            debug!(tick, retired = gone.len(), "Effects retired");
        }
        self.retired.extend(gone.into_iter().map(|key| (key, tick)));
        self.fold_retired(tick);
        self.live = live;
        self.last = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

fn drop_stale_effects(snapshot: Arc<Snapshot>) -> Arc<Snapshot> {
    if snapshot.grenade_effects.iter().all(|e| e.lifetime() > 0) {
        return snapshot;
    }
    let tick = snapshot.tick;
    let mut fresh = Snapshot::clone(&snapshot);
    fresh.grenade_effects.retain(|effect| {
        let keep = effect.lifetime() > 0;
        if !keep {
            warn!(tick, id = %effect.id(), "Dropping stale grenade effect");
        }
        keep
    });
    Arc::new(fresh)
}

#[cfg(test)]
mod tests {
    use overview_types::{
        Bomb, EquipmentType, GrenadeEffect, GrenadeEvent, GrenadeEventKind, GrenadeProjectile,
        KillfeedEntry, KillfeedParticipant, Phase, SteamId, Team, TeamState, Timer, Vector3,
    };
    use uuid::Uuid;

    use super::*;

    fn snapshot(tick: u64) -> Snapshot {
        Snapshot {
            tick,
            players: Vec::new(),
            grenade_projectiles: Vec::new(),
            fire_areas: Vec::new(),
            grenade_effects: Vec::new(),
            shots: Vec::new(),
            killfeed: Vec::new(),
            bomb: Bomb::default(),
            team_terrorists: TeamState::new(Team::Terrorists),
            team_counter_terrorists: TeamState::new(Team::CounterTerrorists),
            timer: Timer {
                phase: Phase::Regular,
                time_remaining_ms: 60_000,
            },
        }
    }

    fn flash(lifetime: u32) -> GrenadeEffect {
        GrenadeEffect::new(
            EffectId::new(),
            GrenadeEvent {
                kind: GrenadeEventKind::FlashExplode,
                grenade: EquipmentType::Flash,
                position: Vector3::new(0.0, 0.0, 0.0),
                thrower: None,
            },
            lifetime,
        )
    }

    fn kill(tick: u64) -> KillfeedEntry {
        KillfeedEntry {
            id: EffectId::new(),
            tick,
            killer: None,
            victim: KillfeedParticipant {
                steam_id: SteamId(4),
                name: "victim".to_owned(),
                team: Team::Terrorists,
            },
            weapon: "World".to_owned(),
        }
    }

    #[test]
    fn accepts_a_valid_sequence() {
        let mut stream = SnapshotStream::new();
        assert!(stream.accept(Arc::new(snapshot(1))).is_ok());
        assert!(stream.accept(Arc::new(snapshot(2))).is_ok());
        assert_eq!(stream.last().map(|s| s.tick), Some(2));
    }

    #[test]
    fn rejection_keeps_last_snapshot() {
        let mut stream = SnapshotStream::new();
        assert!(stream.accept(Arc::new(snapshot(5))).is_ok());
        let result = stream.accept(Arc::new(snapshot(4)));
        assert!(matches!(result, Err(StreamError::Continuity { .. })));
        assert_eq!(stream.last().map(|s| s.tick), Some(5));
        assert!(stream.accept(Arc::new(snapshot(6))).is_ok());
    }

    #[test]
    fn stale_effect_is_dropped_not_rejected() {
        let mut stream = SnapshotStream::new();
        let mut first = snapshot(1);
        let live = flash(3);
        first.grenade_effects = vec![live, flash(0)];
        let input = Arc::new(first);

        let accepted = stream.accept(Arc::clone(&input)).ok();
        assert_eq!(
            accepted.map(|s| s.grenade_effects.clone()),
            Some(vec![live])
        );
        // The published snapshot itself is never modified.
        assert_eq!(input.grenade_effects.len(), 2);
    }

    #[test]
    fn retired_killfeed_entry_cannot_return() {
        let entry = kill(1);
        let mut stream = SnapshotStream::new();

        let mut with_entry = snapshot(1);
        with_entry.killfeed = vec![entry.clone()];
        assert!(stream.accept(Arc::new(with_entry.clone())).is_ok());
        assert!(stream.accept(Arc::new(snapshot(2))).is_ok());
        assert!(stream.is_retired(EffectKind::Killfeed, entry.id));

        with_entry.tick = 3;
        assert_eq!(
            stream.accept(Arc::new(with_entry)).err(),
            Some(StreamError::Continuity {
                source: ContinuityViolation::Reappeared {
                    kind: EffectKind::Killfeed,
                    id: entry.id,
                },
            })
        );
    }

    #[test]
    fn folded_ids_still_cannot_return() {
        let mut stream = SnapshotStream::with_horizon(2);
        let old = KillfeedEntry {
            id: EffectId::from(Uuid::from_u128(10)),
            ..kill(1)
        };

        let mut with_old = snapshot(1);
        with_old.killfeed = vec![old.clone()];
        assert!(stream.accept(Arc::new(with_old)).is_ok());
        for tick in 2..=4 {
            assert!(stream.accept(Arc::new(snapshot(tick))).is_ok());
        }
        assert_eq!(stream.tracked_retired(), 0);
        assert!(stream.is_retired(EffectKind::Killfeed, old.id));

        let mut returning = snapshot(5);
        returning.killfeed = vec![old.clone()];
        assert!(matches!(
            stream.accept(Arc::new(returning)),
            Err(StreamError::Continuity {
                source: ContinuityViolation::Reappeared { .. },
            })
        ));

        let newer = KillfeedEntry {
            id: EffectId::from(Uuid::from_u128(11)),
            ..kill(5)
        };
        let mut fresh = snapshot(5);
        fresh.killfeed = vec![newer.clone()];
        assert!(stream.accept(Arc::new(fresh)).is_ok());
        assert!(!stream.is_retired(EffectKind::Killfeed, newer.id));
    }

    #[test]
    fn ids_carried_into_another_collection_are_not_reappearances() {
        let mut stream = SnapshotStream::with_horizon(1);
        let id = EffectId::from(Uuid::from_u128(3));
        let mut first = snapshot(1);
        first.killfeed = vec![KillfeedEntry { id, ..kill(1) }];
        assert!(stream.accept(Arc::new(first)).is_ok());

        // The projectile's id sorts below the watermark once the killfeed
        // line folds, and it keeps that id when it detonates.
        let reused = EffectId::from(Uuid::from_u128(2));
        for tick in 2..=3 {
            let mut thrown = snapshot(tick);
            thrown.grenade_projectiles = vec![GrenadeProjectile {
                id: reused,
                position: Vector3::default(),
                grenade: EquipmentType::Flash,
            }];
            assert!(stream.accept(Arc::new(thrown)).is_ok());
        }
        assert_eq!(stream.tracked_retired(), 0);

        let mut popped = snapshot(4);
        let effect = flash(3);
        popped.grenade_effects = vec![GrenadeEffect::new(reused, *effect.event(), 3)];
        assert!(stream.accept(Arc::new(popped)).is_ok());
        assert!(stream.is_retired(EffectKind::Projectile, reused));
    }

    #[test]
    fn schema_violation_is_reported() {
        let mut stream = SnapshotStream::new();
        let mut broken = snapshot(1);
        broken.bomb.is_being_carried = true;
        assert!(matches!(
            stream.accept(Arc::new(broken)),
            Err(StreamError::Schema { .. })
        ));
        assert!(stream.last().is_none());
    }
}
