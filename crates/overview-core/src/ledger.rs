//! Transient effect ledger: the builder-side bookkeeping for everything
//! that is created by one event and retired by a rule.
//!
//! | Effect | Created by | Retired when |
//! |--------|------------|--------------|
//! | Grenade projectile | throw | detonation, removal |
//! | Fire area | first inferno update | inferno expiry, fires burnt out |
//! | Grenade effect | detonation | lifetime reaches zero |
//! | Shot | weapon fire | start of the next tick |
//! | Killfeed line | kill | retention window or capacity |
//!
//! Each entity gets an [`EffectId`] once and keeps it for as long as it
//! lives, so renderers can interpolate and fade the same object across
//! snapshots.

use std::collections::{BTreeMap, VecDeque};

use overview_types::{
    EffectId, EntityHandle, EquipmentType, FireArea, GrenadeEffect, GrenadeEvent,
    GrenadeProjectile, KillfeedEntry, Point2, Shot, SteamId, Vector3,
};
use tracing::debug;

use crate::config::{EffectsConfig, MapProjection};
use crate::geometry::{convex_hull, padded_hull, project};

/// A burning inferno and the hull of its latest fires.
#[derive(Debug, Clone, PartialEq)]
struct Inferno {
    id: EffectId,
    hull: Vec<Point2>,
}

/// All transient effects alive at the current tick.
#[derive(Debug, Clone)]
pub struct EffectLedger {
    config: EffectsConfig,
    projection: MapProjection,
    projectiles: BTreeMap<EntityHandle, GrenadeProjectile>,
    infernos: BTreeMap<EntityHandle, Inferno>,
    grenade_effects: Vec<GrenadeEffect>,
    shots: Vec<Shot>,
    killfeed: VecDeque<KillfeedEntry>,
}

impl EffectLedger {
    /// Create an empty ledger projecting fire areas with `projection`.
    pub const fn new(config: EffectsConfig, projection: MapProjection) -> Self {
        Self {
            config,
            projection,
            projectiles: BTreeMap::new(),
            infernos: BTreeMap::new(),
            grenade_effects: Vec::new(),
            shots: Vec::new(),
            killfeed: VecDeque::new(),
        }
    }

    /// Age the ledger by one snapshot before applying the events of `tick`.
    ///
    /// Shots from the previous tick are dropped, every grenade effect loses
    /// one tick of lifetime (and disappears at zero), and killfeed lines
    /// older than the retention window expire.
    pub fn begin_tick(&mut self, tick: u64) {
        self.shots.clear();

        let before = self.grenade_effects.len();
        self.grenade_effects = std::mem::take(&mut self.grenade_effects)
            .into_iter()
            .filter_map(GrenadeEffect::decayed)
            .collect();
        let expired = before.saturating_sub(self.grenade_effects.len());
        if expired > 0 {
            debug!(tick, expired, "Grenade effects expired");
        }

        let retention = self.config.killfeed_retention_ticks;
        while self
            .killfeed
            .front()
            .is_some_and(|entry| tick.saturating_sub(entry.tick) >= retention)
        {
            self.killfeed.pop_front();
        }
    }

    /// Start tracking a thrown grenade.
    pub fn throw_grenade(
        &mut self,
        entity: EntityHandle,
        grenade: EquipmentType,
        position: Vector3,
    ) -> EffectId {
        let projectile = self
            .projectiles
            .entry(entity)
            .or_insert_with(|| GrenadeProjectile {
                id: EffectId::new(),
                position,
                grenade,
            });
        projectile.position = position;
        projectile.grenade = grenade;
        projectile.id
    }

    /// Move a grenade in flight. Returns `false` for an unknown entity.
    pub fn move_grenade(&mut self, entity: EntityHandle, position: Vector3) -> bool {
        let Some(projectile) = self.projectiles.get_mut(&entity) else {
            return false;
        };
        projectile.position = position;
        true
    }

    /// Stop tracking a grenade that left play without detonating.
    pub fn remove_grenade(&mut self, entity: EntityHandle) -> Option<GrenadeProjectile> {
        self.projectiles.remove(&entity)
    }

    /// Retire the projectile and start the detonation visual.
    ///
    /// The visual reuses the projectile's id when the grenade was tracked
    /// in flight. Returns `None` when the configured lifetime for this
    /// detonation kind is zero.
    pub fn detonate(&mut self, entity: EntityHandle, event: GrenadeEvent) -> Option<EffectId> {
        let id = self
            .projectiles
            .remove(&entity)
            .map_or_else(EffectId::new, |projectile| projectile.id);
        let lifetime = self.config.lifetime_for(event.kind);
        if lifetime == 0 {
            return None;
        }
        self.grenade_effects
            .push(GrenadeEffect::new(id, event, lifetime));
        Some(id)
    }

    /// Recompute an inferno's hull from its current fires, starting it if
    /// unseen.
    ///
    /// Fires that do not span an area on their own (a lone fire, or fires
    /// on one line) are widened to fire cells first. An update without any
    /// burning fire retires the inferno and returns `None`.
    pub fn update_inferno(
        &mut self,
        entity: EntityHandle,
        fires: &[Vector3],
    ) -> Option<EffectId> {
        let projected: Vec<Point2> = fires
            .iter()
            .map(|fire| project(&self.projection, *fire))
            .collect();
        let mut hull = convex_hull(&projected);
        if hull.len() < 3 {
            let radius = f64::from(self.config.fire_cell_radius) / self.projection.scale;
            hull = padded_hull(&projected, radius);
        }
        if hull.len() < 3 {
            if let Some(id) = self.expire_inferno(entity) {
                debug!(%id, "Inferno burnt out");
            }
            return None;
        }

        let inferno = self.infernos.entry(entity).or_insert_with(|| Inferno {
            id: EffectId::new(),
            hull: Vec::new(),
        });
        inferno.hull = hull;
        Some(inferno.id)
    }

    /// Stop tracking an inferno that burned out.
    pub fn expire_inferno(&mut self, entity: EntityHandle) -> Option<EffectId> {
        self.infernos.remove(&entity).map(|inferno| inferno.id)
    }

    /// Record a shot for the current tick.
    pub fn record_shot(&mut self, shot: Shot) {
        self.shots.push(shot);
    }

    /// Drop this tick's shots by a participant who left the roster.
    pub fn discard_shots_from(&mut self, shooter: SteamId) {
        self.shots.retain(|shot| shot.shooter != shooter);
    }

    /// Append a killfeed line, dropping the oldest past capacity.
    pub fn record_kill(&mut self, entry: KillfeedEntry) {
        self.killfeed.push_back(entry);
        while self.killfeed.len() > self.config.killfeed_capacity {
            self.killfeed.pop_front();
        }
    }

    /// Forget grenades and fires; called when a new round starts.
    pub fn clear_world_effects(&mut self) {
        self.projectiles.clear();
        self.infernos.clear();
    }

    /// Grenades currently in flight.
    pub fn projectiles(&self) -> Vec<GrenadeProjectile> {
        self.projectiles.values().copied().collect()
    }

    /// Burning areas.
    pub fn fire_areas(&self) -> Vec<FireArea> {
        self.infernos
            .values()
            .map(|inferno| FireArea {
                id: inferno.id,
                hull: inferno.hull.clone(),
            })
            .collect()
    }

    /// Grenade visuals still fading.
    pub fn grenade_effects(&self) -> Vec<GrenadeEffect> {
        self.grenade_effects.clone()
    }

    /// Shots fired this tick.
    pub fn shots(&self) -> Vec<Shot> {
        self.shots.clone()
    }

    /// Retained killfeed lines, oldest first.
    pub fn killfeed(&self) -> Vec<KillfeedEntry> {
        self.killfeed.iter().cloned().collect()
    }
}
