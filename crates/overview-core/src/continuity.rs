//! Rules between two consecutive snapshots.
//!
//! A single snapshot can be internally consistent and still be wrong
//! relative to its predecessor: a timer that jumps up, an effect that
//! skipped a decrement, a shot marker that stuck around. These checks only
//! look at the pair; ids retired further back are tracked by
//! [`SnapshotStream`].
//!
//! [`SnapshotStream`]: crate::stream::SnapshotStream

use std::collections::{BTreeMap, BTreeSet};

use overview_types::{EffectId, Snapshot};

use crate::error::ContinuityViolation;
use crate::phase::check_transition;

/// Check that `next` may directly follow `prev`, one tick later.
///
/// # Errors
///
/// Returns the first [`ContinuityViolation`] found.
pub fn check_continuity(prev: &Snapshot, next: &Snapshot) -> Result<(), ContinuityViolation> {
    if next.tick <= prev.tick {
        return Err(ContinuityViolation::TickNotIncreasing {
            prev: prev.tick,
            next: next.tick,
        });
    }
    if next.tick != prev.tick.saturating_add(1) {
        return Err(ContinuityViolation::TickSkipped {
            prev: prev.tick,
            next: next.tick,
        });
    }
    check_timer(prev, next)?;
    check_grenade_effects(prev, next)?;
    check_shots(prev, next)?;
    check_killfeed(prev, next)?;
    Ok(())
}

fn check_timer(prev: &Snapshot, next: &Snapshot) -> Result<(), ContinuityViolation> {
    let (before, after) = (prev.timer, next.timer);
    if before.phase != after.phase {
        check_transition(before.phase, after.phase)?;
    } else if after.time_remaining_ms > before.time_remaining_ms {
        return Err(ContinuityViolation::TimerIncreased {
            phase: after.phase,
            prev_ms: before.time_remaining_ms,
            next_ms: after.time_remaining_ms,
        });
    }
    Ok(())
}

fn check_grenade_effects(prev: &Snapshot, next: &Snapshot) -> Result<(), ContinuityViolation> {
    let previous: BTreeMap<EffectId, u32> = prev
        .grenade_effects
        .iter()
        .map(|e| (e.id(), e.lifetime()))
        .collect();

    for effect in &next.grenade_effects {
        let Some(&before) = previous.get(&effect.id()) else {
            continue;
        };
        if before <= 1 {
            return Err(ContinuityViolation::ExpiredEffectPresent { id: effect.id() });
        }
        if before.checked_sub(1) != Some(effect.lifetime()) {
            return Err(ContinuityViolation::LifetimeNotDecremented {
                id: effect.id(),
                prev: before,
                next: effect.lifetime(),
            });
        }
    }
    Ok(())
}

fn check_shots(prev: &Snapshot, next: &Snapshot) -> Result<(), ContinuityViolation> {
    let previous: BTreeSet<EffectId> = prev.shots.iter().map(|s| s.id).collect();
    match next.shots.iter().find(|s| previous.contains(&s.id)) {
        Some(shot) => Err(ContinuityViolation::ShotPersisted { id: shot.id }),
        None => Ok(()),
    }
}

/// The next killfeed must be a suffix of the previous one followed by new
/// lines: entries only expire from the front and only arrive at the back.
fn check_killfeed(prev: &Snapshot, next: &Snapshot) -> Result<(), ContinuityViolation> {
    let next_ids: BTreeSet<EffectId> = next.killfeed.iter().map(|e| e.id).collect();
    let first_kept = prev
        .killfeed
        .iter()
        .position(|e| next_ids.contains(&e.id))
        .unwrap_or(prev.killfeed.len());

    let mut upcoming = next.killfeed.iter();
    for kept in prev.killfeed.iter().skip(first_kept) {
        match upcoming.next() {
            Some(entry) if entry == kept => {}
            Some(entry) if entry.id == kept.id => {
                return Err(ContinuityViolation::KillfeedEntryMutated { id: entry.id });
            }
            _ => {
                return Err(ContinuityViolation::KillfeedNotAppendOnly { id: kept.id });
            }
        }
    }

    let previous_ids: BTreeSet<EffectId> = prev.killfeed.iter().map(|e| e.id).collect();
    match upcoming.find(|e| previous_ids.contains(&e.id)) {
        Some(entry) => Err(ContinuityViolation::KillfeedNotAppendOnly { id: entry.id }),
        None => Ok(()),
    }
}
