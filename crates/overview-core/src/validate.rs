//! Structural validation of a single snapshot.
//!
//! [`validate_snapshot`] is run by the builder before a snapshot is
//! published and by [`SnapshotStream`] before one is handed to a
//! renderer. It reports the first broken invariant and never modifies the
//! snapshot.
//!
//! [`SnapshotStream`]: crate::stream::SnapshotStream

use std::collections::BTreeSet;

use overview_types::{EffectId, Player, Snapshot, SteamId, Team};

use crate::error::{EffectKind, SchemaViolation, StaleEffect};
use crate::geometry::polygon_defect;

/// Check every in-snapshot invariant.
///
/// # Errors
///
/// Returns the first [`SchemaViolation`] found.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), SchemaViolation> {
    validate_teams(snapshot)?;
    let roster = validate_players(&snapshot.players)?;
    validate_bomb(snapshot)?;
    validate_effects(snapshot, &roster)?;
    Ok(())
}

fn validate_teams(snapshot: &Snapshot) -> Result<(), SchemaViolation> {
    for (slot, state) in [
        (Team::Terrorists, &snapshot.team_terrorists),
        (Team::CounterTerrorists, &snapshot.team_counter_terrorists),
    ] {
        if state.side != slot {
            return Err(SchemaViolation::TeamSlotMismatch {
                slot,
                side: state.side,
            });
        }
    }
    Ok(())
}

fn validate_players(players: &[Player]) -> Result<BTreeSet<SteamId>, SchemaViolation> {
    let mut roster = BTreeSet::new();
    for player in players {
        let steam_id = player.steam_id;
        if !roster.insert(steam_id) {
            return Err(SchemaViolation::DuplicateParticipant { steam_id });
        }
        if !player.position.is_finite() || !player.last_alive_position.is_finite() {
            return Err(SchemaViolation::NonFiniteCoordinate {
                context: format!("participant {steam_id}"),
            });
        }
        if player.flash_time_remaining_ms > player.flash_duration_ms {
            return Err(SchemaViolation::FlashExceedsDuration {
                steam_id,
                remaining_ms: player.flash_time_remaining_ms,
                duration_ms: player.flash_duration_ms,
            });
        }
        if !player.is_alive {
            if player.flash_time_remaining_ms != 0 {
                return Err(SchemaViolation::DeadParticipantFlashed {
                    steam_id,
                    remaining_ms: player.flash_time_remaining_ms,
                });
            }
            if player.position != player.last_alive_position {
                return Err(SchemaViolation::DeadParticipantMoved { steam_id });
            }
        }
    }
    Ok(roster)
}

fn validate_bomb(snapshot: &Snapshot) -> Result<(), SchemaViolation> {
    let bomb = &snapshot.bomb;
    if !bomb.position.is_finite() {
        return Err(SchemaViolation::NonFiniteCoordinate {
            context: "bomb".to_owned(),
        });
    }

    let mut carriers = snapshot.bomb_carriers().map(|p| p.steam_id);
    let flagged = carriers.next();
    if let (Some(first), Some(second)) = (flagged, carriers.next()) {
        return Err(SchemaViolation::MultipleBombCarriers { first, second });
    }

    let consistent = bomb.is_being_carried == bomb.carrier.is_some() && flagged == bomb.carrier;
    if !consistent {
        return Err(SchemaViolation::BombCarrierMismatch {
            flagged,
            carrier: bomb.carrier,
            is_being_carried: bomb.is_being_carried,
        });
    }

    let away = bomb.carrier.and_then(|carrier| {
        snapshot
            .player(carrier)
            .filter(|p| p.position != bomb.position)
            .map(|_| carrier)
    });
    match away {
        Some(carrier) => Err(SchemaViolation::BombAwayFromCarrier { carrier }),
        None => Ok(()),
    }
}

/// Tracks ids seen in one collection.
struct UniqueIds {
    kind: EffectKind,
    seen: BTreeSet<EffectId>,
}

impl UniqueIds {
    const fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            seen: BTreeSet::new(),
        }
    }

    fn insert(&mut self, id: EffectId) -> Result<(), SchemaViolation> {
        if self.seen.insert(id) {
            Ok(())
        } else {
            Err(SchemaViolation::DuplicateEffect {
                kind: self.kind,
                id,
            })
        }
    }
}

fn validate_effects(
    snapshot: &Snapshot,
    roster: &BTreeSet<SteamId>,
) -> Result<(), SchemaViolation> {
    let mut ids = UniqueIds::new(EffectKind::Projectile);
    for projectile in &snapshot.grenade_projectiles {
        ids.insert(projectile.id)?;
        if !projectile.position.is_finite() {
            return Err(SchemaViolation::NonFiniteCoordinate {
                context: format!("grenade projectile {}", projectile.id),
            });
        }
    }

    let mut ids = UniqueIds::new(EffectKind::FireArea);
    for area in &snapshot.fire_areas {
        ids.insert(area.id)?;
        if let Some(defect) = polygon_defect(&area.hull) {
            return Err(SchemaViolation::MalformedPolygon {
                id: area.id,
                defect,
            });
        }
    }

    let mut ids = UniqueIds::new(EffectKind::GrenadeEffect);
    for effect in &snapshot.grenade_effects {
        ids.insert(effect.id())?;
        if effect.lifetime() == 0 {
            return Err(StaleEffect {
                id: effect.id(),
                lifetime: effect.lifetime(),
            }
            .into());
        }
        if !effect.event().position.is_finite() {
            return Err(SchemaViolation::NonFiniteCoordinate {
                context: format!("grenade effect {}", effect.id()),
            });
        }
    }

    let mut ids = UniqueIds::new(EffectKind::Shot);
    for shot in &snapshot.shots {
        ids.insert(shot.id)?;
        if !roster.contains(&shot.shooter) {
            return Err(SchemaViolation::UnknownParticipant {
                steam_id: shot.shooter,
                kind: EffectKind::Shot,
            });
        }
        if !shot.position.is_finite() {
            return Err(SchemaViolation::NonFiniteCoordinate {
                context: format!("shot {}", shot.id),
            });
        }
    }

    let mut ids = UniqueIds::new(EffectKind::Killfeed);
    for entry in &snapshot.killfeed {
        ids.insert(entry.id)?;
        if entry.tick > snapshot.tick {
            return Err(SchemaViolation::KillfeedFromFuture {
                id: entry.id,
                entry_tick: entry.tick,
                tick: snapshot.tick,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use overview_types::{
        Bomb, EquipmentType, FireArea, GrenadeEffect, GrenadeEvent, GrenadeEventKind, Phase,
        Point2, Shot, TeamState, Timer, Vector3,
    };

    use super::*;
    use crate::geometry::PolygonDefect;

    fn player(id: u64, team: Team) -> Player {
        Player {
            steam_id: SteamId(id),
            name: format!("player-{id}"),
            team,
            position: Point2::new(10.0, 20.0),
            last_alive_position: Point2::new(10.0, 20.0),
            view_direction: 90.0,
            flash_duration_ms: 0,
            flash_time_remaining_ms: 0,
            inventory: vec![EquipmentType::Knife],
            health: 100,
            armor: 0,
            money: 800,
            kills: 0,
            deaths: 0,
            assists: 0,
            is_alive: true,
            is_defusing: false,
            has_helmet: false,
            has_defuse_kit: false,
            has_bomb: false,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            tick: 100,
            players: vec![player(1, Team::Terrorists), player(2, Team::CounterTerrorists)],
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
                time_remaining_ms: 45_000,
            },
        }
    }

    fn effect(lifetime: u32) -> GrenadeEffect {
        GrenadeEffect::new(
            EffectId::new(),
            GrenadeEvent {
                kind: GrenadeEventKind::SmokeStart,
                grenade: EquipmentType::Smoke,
                position: Vector3::new(0.0, 0.0, 0.0),
                thrower: None,
            },
            lifetime,
        )
    }

    #[test]
    fn consistent_snapshot_passes() {
        assert_eq!(validate_snapshot(&snapshot()), Ok(()));
    }

    #[test]
    fn duplicate_participant_is_rejected() {
        let mut snap = snapshot();
        snap.players.push(player(1, Team::Terrorists));
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::DuplicateParticipant {
                steam_id: SteamId(1)
            })
        );
    }

    #[test]
    fn carried_bomb_must_match_flagged_participant() {
        let mut snap = snapshot();
        if let Some(p) = snap.players.first_mut() {
            p.has_bomb = true;
        }
        snap.bomb = Bomb {
            position: Point2::new(10.0, 20.0),
            is_being_carried: true,
            carrier: Some(SteamId(1)),
        };
        assert_eq!(validate_snapshot(&snap), Ok(()));

        snap.bomb.carrier = Some(SteamId(2));
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::BombCarrierMismatch { .. })
        ));

        snap.bomb.carrier = None;
        snap.bomb.is_being_carried = false;
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::BombCarrierMismatch { .. })
        ));
    }

    #[test]
    fn carried_bomb_sits_with_its_carrier() {
        let mut snap = snapshot();
        if let Some(p) = snap.players.first_mut() {
            p.has_bomb = true;
        }
        snap.bomb = Bomb {
            position: Point2::new(0.0, 0.0),
            is_being_carried: true,
            carrier: Some(SteamId(1)),
        };
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::BombAwayFromCarrier {
                carrier: SteamId(1)
            })
        );
    }

    #[test]
    fn two_carriers_are_rejected() {
        let mut snap = snapshot();
        for p in &mut snap.players {
            p.has_bomb = true;
        }
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::MultipleBombCarriers {
                first: SteamId(1),
                second: SteamId(2),
            })
        );
    }

    #[test]
    fn dead_participant_rules() {
        let mut snap = snapshot();
        if let Some(p) = snap.players.first_mut() {
            p.is_alive = false;
            p.flash_duration_ms = 2_000;
            p.flash_time_remaining_ms = 500;
        }
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::DeadParticipantFlashed { .. })
        ));

        if let Some(p) = snap.players.first_mut() {
            p.flash_time_remaining_ms = 0;
            p.position = Point2::new(11.0, 20.0);
        }
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::DeadParticipantMoved {
                steam_id: SteamId(1)
            })
        );
    }

    #[test]
    fn flash_remaining_cannot_exceed_duration() {
        let mut snap = snapshot();
        if let Some(p) = snap.players.first_mut() {
            p.flash_duration_ms = 1_000;
            p.flash_time_remaining_ms = 1_001;
        }
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::FlashExceedsDuration { .. })
        ));
    }

    #[test]
    fn swapped_team_slots_are_rejected() {
        let mut snap = snapshot();
        snap.team_terrorists.side = Team::CounterTerrorists;
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::TeamSlotMismatch {
                slot: Team::Terrorists,
                side: Team::CounterTerrorists,
            })
        );
    }

    #[test]
    fn malformed_fire_area_is_rejected() {
        let mut snap = snapshot();
        let id = EffectId::new();
        snap.fire_areas.push(FireArea {
            id,
            hull: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)],
        });
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::MalformedPolygon {
                id,
                defect: PolygonDefect::TooFewPoints { count: 2 },
            })
        );
    }

    #[test]
    fn zero_lifetime_effect_is_stale() {
        let mut snap = snapshot();
        let stale = effect(0);
        snap.grenade_effects.push(effect(3));
        snap.grenade_effects.push(stale);
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::Stale(StaleEffect {
                id: stale.id(),
                lifetime: 0,
            }))
        );
    }

    #[test]
    fn duplicate_effect_ids_are_rejected() {
        let mut snap = snapshot();
        let smoke = effect(5);
        snap.grenade_effects.push(smoke);
        snap.grenade_effects.push(smoke);
        assert_eq!(
            validate_snapshot(&snap),
            Err(SchemaViolation::DuplicateEffect {
                kind: EffectKind::GrenadeEffect,
                id: smoke.id(),
            })
        );
    }

    #[test]
    fn shot_from_unknown_participant_is_rejected() {
        let mut snap = snapshot();
        snap.shots.push(Shot {
            id: EffectId::new(),
            shooter: SteamId(99),
            position: Point2::new(0.0, 0.0),
            view_direction: 0.0,
            is_precision_shot: true,
        });
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::UnknownParticipant { .. })
        ));
    }

    #[test]
    fn non_finite_player_position_is_rejected() {
        let mut snap = snapshot();
        if let Some(p) = snap.players.last_mut() {
            p.position = Point2::new(f64::INFINITY, 0.0);
        }
        assert!(matches!(
            validate_snapshot(&snap),
            Err(SchemaViolation::NonFiniteCoordinate { .. })
        ));
    }
}
