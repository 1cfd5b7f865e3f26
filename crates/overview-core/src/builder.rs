//! Snapshot builder: folds each tick's match events into a [`Snapshot`].
//!
//! The builder owns the running match state (roster, bomb, team slots,
//! round timer and the [`EffectLedger`]). Each call to
//! [`SnapshotBuilder::process_tick`] works on a copy of that state:
//!
//! 1. **Age** -- drop last tick's shots, decay grenade effects, expire
//!    killfeed lines, count flash time down from the tick each flash hit.
//! 2. **Apply** -- fold the tick's events in order.
//! 3. **Check** -- the phase may change at most once per published
//!    snapshot, and the assembled snapshot must pass
//!    [`validate_snapshot`].
//! 4. **Commit** -- only then does the copy replace the builder's state.
//!
//! A rejected tick therefore leaves the builder exactly where it was, and
//! the caller may retry the same tick. After the first published snapshot
//! every tick must be published in turn; gaps are rejected.

use std::collections::BTreeMap;
use std::sync::Arc;

use overview_types::{
    Bomb, EffectId, GrenadeEvent, KillfeedEntry, KillfeedParticipant, MatchEvent, MatchHeader,
    Phase, Player, PlayerFrame, Point2, Shot, Snapshot, SteamId, Team, TeamState,
};
use tracing::{debug, info, warn};

use crate::config::{MapProjection, OverviewConfig};
use crate::error::{SchemaViolation, TransitionViolation};
use crate::geometry::project;
use crate::ledger::EffectLedger;
use crate::phase::{RoundTimer, check_transition, ticks_to_ms};
use crate::validate::validate_snapshot;

/// Errors that can occur while building a snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderError {
    /// Ticks must be processed in strictly increasing order.
    #[error("tick {tick} does not follow the last published tick {last}")]
    TickOutOfOrder {
        /// Last published tick.
        last: u64,
        /// Rejected tick.
        tick: u64,
    },

    /// Ticks may not be left out once publishing has started.
    #[error("tick {tick} skips ahead of the expected tick {expected}")]
    TickSkipped {
        /// The tick that must come next.
        expected: u64,
        /// Rejected tick.
        tick: u64,
    },

    /// An event names a participant that is not on the roster.
    #[error("{event} references unknown participant {steam_id}")]
    UnknownParticipant {
        /// The missing identity.
        steam_id: SteamId,
        /// Name of the offending event.
        event: &'static str,
    },

    /// The tick moves the round through a forbidden phase change.
    #[error("phase transition rejected: {source}")]
    Transition {
        /// The rejected transition.
        #[from]
        source: TransitionViolation,
    },

    /// The assembled snapshot breaks a structural invariant.
    #[error("snapshot rejected: {source}")]
    Schema {
        /// The broken invariant.
        #[from]
        source: SchemaViolation,
    },
}

/// Mutable match state between two published snapshots.
#[derive(Debug, Clone)]
struct MatchState {
    roster: Vec<Player>,
    bomb: Bomb,
    team_terrorists: TeamState,
    team_counter_terrorists: TeamState,
    timer: RoundTimer,
    ledger: EffectLedger,
    /// Tick each running flash started on, by participant.
    flashes: BTreeMap<SteamId, u64>,
    /// Set once the first snapshot is published. Until then phase events
    /// resynchronize the timer instead of being checked against the table.
    synced: bool,
}

/// Turns per-tick event batches into published snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    header: MatchHeader,
    projection: MapProjection,
    tick_rate: u32,
    last_tick: Option<u64>,
    state: MatchState,
}

impl SnapshotBuilder {
    /// Create a builder for one match.
    ///
    /// The header's tick rate wins over the configured one unless it is
    /// zero. The map projection is looked up by the header's map name.
    pub fn new(config: &OverviewConfig, header: MatchHeader) -> Self {
        let tick_rate = if header.tick_rate > 0 {
            header.tick_rate
        } else {
            config.timing.tick_rate
        };
        let projection = config.projection_for(&header.map_name);
        info!(
            map = %header.map_name,
            tick_rate,
            recorded_at = %header.recorded_at,
            "Snapshot builder created"
        );
        Self {
            header,
            projection,
            tick_rate,
            last_tick: None,
            state: MatchState {
                roster: Vec::new(),
                bomb: Bomb::default(),
                team_terrorists: TeamState::new(Team::Terrorists),
                team_counter_terrorists: TeamState::new(Team::CounterTerrorists),
                timer: RoundTimer::new(&config.timing, tick_rate, Phase::Warmup, 0),
                ledger: EffectLedger::new(config.effects.clone(), projection),
                flashes: BTreeMap::new(),
                synced: false,
            },
        }
    }

    /// The match this builder belongs to.
    pub const fn header(&self) -> &MatchHeader {
        &self.header
    }

    /// Tick rate used for timers and flash countdowns.
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Last tick a snapshot was published for.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Fold one tick's events and publish the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError`] if the tick is out of order, an event names
    /// an unknown participant, the phase changes illegally, or the
    /// snapshot fails validation. The builder state is unchanged in every
    /// error case.
    pub fn process_tick(
        &mut self,
        tick: u64,
        events: &[MatchEvent],
    ) -> Result<Arc<Snapshot>, BuilderError> {
        match self.build(tick, events) {
            Ok((state, snapshot)) => {
                self.state = state;
                self.last_tick = Some(tick);
                debug!(
                    tick,
                    events = events.len(),
                    players = snapshot.players.len(),
                    phase = %snapshot.timer.phase,
                    "Snapshot published"
                );
                Ok(Arc::new(snapshot))
            }
            Err(err) => {
                warn!(tick, %err, "Tick rejected");
                Err(err)
            }
        }
    }

    fn build(
        &self,
        tick: u64,
        events: &[MatchEvent],
    ) -> Result<(MatchState, Snapshot), BuilderError> {
        match self.last_tick {
            Some(last) if tick <= last => {
                return Err(BuilderError::TickOutOfOrder { last, tick });
            }
            Some(last) if tick != last.saturating_add(1) => {
                return Err(BuilderError::TickSkipped {
                    expected: last.saturating_add(1),
                    tick,
                });
            }
            _ => {}
        }

        let mut state = self.state.clone();
        state.begin_tick(tick, self.tick_rate);

        let phase_before = state.timer.phase();
        let mut apply = TickContext {
            tick,
            projection: &self.projection,
            state: &mut state,
        };
        for event in events {
            apply.event(event)?;
        }

        let phase_after = state.timer.phase();
        if state.synced && phase_before != phase_after {
            check_transition(phase_before, phase_after)?;
        }

        let snapshot = state.snapshot(tick);
        validate_snapshot(&snapshot)?;
        state.synced = true;
        Ok((state, snapshot))
    }
}

impl MatchState {
    fn begin_tick(&mut self, tick: u64, tick_rate: u32) {
        if !self.synced {
            // Count the opening phase from the first tick we see.
            self.timer.restart(self.timer.phase(), tick);
        }
        self.ledger.begin_tick(tick);

        let roster = &mut self.roster;
        self.flashes.retain(|steam_id, flashed_at| {
            let Some(player) = roster
                .iter_mut()
                .find(|p| p.steam_id == *steam_id && p.is_alive)
            else {
                return false;
            };
            let elapsed_ms = ticks_to_ms(tick.saturating_sub(*flashed_at), tick_rate);
            player.flash_time_remaining_ms = player.flash_duration_ms.saturating_sub(elapsed_ms);
            player.flash_time_remaining_ms > 0
        });
    }

    fn snapshot(&self, tick: u64) -> Snapshot {
        Snapshot {
            tick,
            players: self.roster.clone(),
            grenade_projectiles: self.ledger.projectiles(),
            fire_areas: self.ledger.fire_areas(),
            grenade_effects: self.ledger.grenade_effects(),
            shots: self.ledger.shots(),
            killfeed: self.ledger.killfeed(),
            bomb: self.bomb,
            team_terrorists: self.team_terrorists.clone(),
            team_counter_terrorists: self.team_counter_terrorists.clone(),
            timer: self.timer.timer_at(tick),
        }
    }

    fn player_mut(&mut self, steam_id: SteamId) -> Option<&mut Player> {
        self.roster.iter_mut().find(|p| p.steam_id == steam_id)
    }

    fn require(
        &mut self,
        steam_id: SteamId,
        event: &'static str,
    ) -> Result<&mut Player, BuilderError> {
        self.player_mut(steam_id)
            .ok_or(BuilderError::UnknownParticipant { steam_id, event })
    }

    fn participant(
        &self,
        steam_id: SteamId,
        event: &'static str,
    ) -> Result<KillfeedParticipant, BuilderError> {
        self.roster
            .iter()
            .find(|p| p.steam_id == steam_id)
            .map(|p| KillfeedParticipant {
                steam_id,
                name: p.name.clone(),
                team: p.team,
            })
            .ok_or(BuilderError::UnknownParticipant { steam_id, event })
    }

    /// Put the bomb on the ground at `position`, clearing every carrier flag.
    fn drop_bomb(&mut self, position: Point2) {
        for player in &mut self.roster {
            player.has_bomb = false;
        }
        self.bomb = Bomb {
            position,
            is_being_carried: false,
            carrier: None,
        };
    }

    /// Kill a participant in place. A carried bomb falls where they died.
    fn kill(&mut self, steam_id: SteamId, event: &'static str) -> Result<(), BuilderError> {
        let player = self.require(steam_id, event)?;
        let had_bomb = player.has_bomb;
        let position = player.last_alive_position;
        freeze_dead(player);
        if had_bomb {
            self.drop_bomb(position);
        }
        Ok(())
    }

    fn enter_phase(&mut self, phase: Phase, tick: u64) -> Result<(), TransitionViolation> {
        let from = self.timer.phase();
        if phase == from {
            return Ok(());
        }
        if self.synced {
            self.timer.transition(phase, tick)?;
        } else {
            self.timer.restart(phase, tick);
        }
        info!(tick, %from, to = %phase, "Round phase changed");

        if phase == Phase::Freezetime {
            self.ledger.clear_world_effects();
            self.stop_defusing();
        }
        Ok(())
    }

    fn stop_defusing(&mut self) {
        for player in &mut self.roster {
            player.is_defusing = false;
        }
    }
}

/// Dead participants stay where they fell, unflashed and idle.
const fn freeze_dead(player: &mut Player) {
    player.is_alive = false;
    player.position = player.last_alive_position;
    player.flash_time_remaining_ms = 0;
    player.is_defusing = false;
}

/// Applies events of one tick to a state copy.
struct TickContext<'a> {
    tick: u64,
    projection: &'a MapProjection,
    state: &'a mut MatchState,
}

impl TickContext<'_> {
    #[allow(clippy::too_many_lines)]
    fn event(&mut self, event: &MatchEvent) -> Result<(), BuilderError> {
        let tick = self.tick;
        let name = event.name();
        match event {
            MatchEvent::PlayerUpdated(frame) => self.update_player(frame),
            MatchEvent::PlayerDisconnected { player } => {
                let steam_id = *player;
                let index = self
                    .state
                    .roster
                    .iter()
                    .position(|p| p.steam_id == steam_id)
                    .ok_or(BuilderError::UnknownParticipant {
                        steam_id,
                        event: name,
                    })?;
                let left = self.state.roster.remove(index);
                if left.has_bomb {
                    self.state.drop_bomb(left.position);
                }
                self.state.ledger.discard_shots_from(steam_id);
                info!(tick, %steam_id, name = %left.name, "Participant disconnected");
            }
            MatchEvent::PlayerKilled {
                killer,
                victim,
                weapon,
            } => {
                let killer = killer
                    .map(|id| self.state.participant(id, name))
                    .transpose()?;
                let victim_entry = self.state.participant(*victim, name)?;
                self.state.kill(*victim, name)?;
                info!(
                    tick,
                    killer = ?killer.as_ref().map(|k| k.steam_id),
                    victim = %victim,
                    weapon = weapon.label(),
                    "Participant killed"
                );
                self.state.ledger.record_kill(KillfeedEntry {
                    id: EffectId::new(),
                    tick,
                    killer,
                    victim: victim_entry,
                    weapon: weapon.label().to_owned(),
                });
            }
            MatchEvent::PlayerFlashed {
                player,
                duration_ms,
            } => {
                let flashed = self.state.require(*player, name)?;
                if flashed.is_alive {
                    flashed.flash_duration_ms = *duration_ms;
                    flashed.flash_time_remaining_ms = *duration_ms;
                    self.state.flashes.insert(*player, tick);
                } else {
                    debug!(tick, steam_id = %player, "Ignoring flash on dead participant");
                }
            }
            MatchEvent::WeaponFired { shooter, weapon } => {
                let player = self.state.require(*shooter, name)?;
                if player.is_alive && weapon.leaves_shot_marker() {
                    let shot = Shot {
                        id: EffectId::new(),
                        shooter: *shooter,
                        position: player.position,
                        view_direction: player.view_direction,
                        is_precision_shot: weapon.is_precision_rifle(),
                    };
                    self.state.ledger.record_shot(shot);
                }
            }
            MatchEvent::GrenadeThrown {
                entity,
                grenade,
                position,
            } => {
                let id = self.state.ledger.throw_grenade(*entity, *grenade, *position);
                debug!(tick, %id, grenade = grenade.label(), "Grenade thrown");
            }
            MatchEvent::GrenadeMoved { entity, position } => {
                if !self.state.ledger.move_grenade(*entity, *position) {
                    debug!(tick, entity = entity.0, "Move for untracked grenade");
                }
            }
            MatchEvent::GrenadeDetonated {
                entity,
                kind,
                grenade,
                position,
                thrower,
            } => {
                let detonation = GrenadeEvent {
                    kind: *kind,
                    grenade: *grenade,
                    position: *position,
                    thrower: *thrower,
                };
                if let Some(id) = self.state.ledger.detonate(*entity, detonation) {
                    debug!(tick, %id, ?kind, "Grenade detonated");
                }
            }
            MatchEvent::GrenadeRemoved { entity } => {
                self.state.ledger.remove_grenade(*entity);
            }
            MatchEvent::InfernoUpdated { entity, fires } => {
                self.state.ledger.update_inferno(*entity, fires);
            }
            MatchEvent::InfernoExpired { entity } => {
                if let Some(id) = self.state.ledger.expire_inferno(*entity) {
                    debug!(tick, %id, "Inferno expired");
                }
            }
            MatchEvent::BombPickedUp { player } => {
                let position = self.state.require(*player, name)?.position;
                self.state.drop_bomb(position);
                if let Some(carrier) = self.state.player_mut(*player) {
                    carrier.has_bomb = true;
                }
                self.state.bomb = Bomb {
                    position,
                    is_being_carried: true,
                    carrier: Some(*player),
                };
            }
            MatchEvent::BombDropped { player, position } => {
                self.state.require(*player, name)?;
                self.state.drop_bomb(project(self.projection, *position));
            }
            MatchEvent::BombPlanted { player, position } => {
                self.state.require(*player, name)?;
                self.state.drop_bomb(project(self.projection, *position));
                self.state.enter_phase(Phase::Planted, tick)?;
                info!(tick, planter = %player, "Bomb planted");
            }
            MatchEvent::BombDefused { player } => {
                self.state.require(*player, name)?;
                self.state.stop_defusing();
                info!(tick, defuser = %player, "Bomb defused");
            }
            MatchEvent::BombExploded => {
                self.state.stop_defusing();
                info!(tick, "Bomb exploded");
            }
            MatchEvent::DefuseStarted { player } => {
                let defuser = self.state.require(*player, name)?;
                defuser.is_defusing = defuser.is_alive;
            }
            MatchEvent::DefuseAborted { player } => {
                self.state.require(*player, name)?.is_defusing = false;
            }
            MatchEvent::RoundPhaseChanged { phase } => {
                self.state.enter_phase(*phase, tick)?;
            }
            MatchEvent::TeamUpdated {
                side,
                clan_name,
                score,
            } => {
                let slot = match side {
                    Team::Terrorists => &mut self.state.team_terrorists,
                    Team::CounterTerrorists => &mut self.state.team_counter_terrorists,
                    Team::Unassigned | Team::Spectators => {
                        warn!(tick, ?side, "Team update for a non-playing side ignored");
                        return Ok(());
                    }
                };
                slot.clan_name.clone_from(clan_name);
                slot.score = *score;
            }
        }
        Ok(())
    }

    fn update_player(&mut self, frame: &PlayerFrame) {
        let position = project(self.projection, frame.position);
        let steam_id = frame.steam_id;

        if self.state.player_mut(steam_id).is_none() {
            info!(tick = self.tick, %steam_id, name = %frame.name, "Participant joined");
            self.state.roster.push(Player {
                steam_id,
                name: frame.name.clone(),
                team: frame.team,
                position,
                last_alive_position: position,
                view_direction: frame.view_direction,
                flash_duration_ms: 0,
                flash_time_remaining_ms: 0,
                inventory: Vec::new(),
                health: 0,
                armor: 0,
                money: 0,
                kills: 0,
                deaths: 0,
                assists: 0,
                is_alive: frame.is_alive,
                is_defusing: false,
                has_helmet: false,
                has_defuse_kit: false,
                has_bomb: false,
            });
        }

        let mut dropped_at = None;
        let mut carried_to = None;
        if let Some(player) = self.state.player_mut(steam_id) {
            player.name.clone_from(&frame.name);
            player.team = frame.team;
            player.view_direction = frame.view_direction;
            player.inventory.clone_from(&frame.inventory);
            player.health = frame.health;
            player.armor = frame.armor;
            player.money = frame.money;
            player.kills = frame.kills;
            player.deaths = frame.deaths;
            player.assists = frame.assists;
            player.has_helmet = frame.has_helmet;
            player.has_defuse_kit = frame.has_defuse_kit;

            if frame.is_alive {
                player.is_alive = true;
                player.position = position;
                player.last_alive_position = position;
                if player.has_bomb {
                    carried_to = Some(position);
                }
            } else {
                if player.has_bomb {
                    dropped_at = Some(player.last_alive_position);
                }
                freeze_dead(player);
            }
        }
        if let Some(position) = dropped_at {
            self.state.drop_bomb(position);
        }
        if let Some(position) = carried_to {
            self.state.bomb.position = position;
        }
    }
}
