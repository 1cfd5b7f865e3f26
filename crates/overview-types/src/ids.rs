//! Identifier types for participants and transient entities.
//!
//! Participants are keyed by their 64-bit Steam id, which the match log
//! carries and which stays stable for the whole match. Transient entities
//! (grenades, fire areas, shots, killfeed lines) are keyed by an
//! [`EffectId`] that the builder allocates the first time it sees the
//! entity and threads through every later snapshot, so a renderer can
//! match the same physical effect across ticks.
//!
//! [`EntityHandle`] is the raw entity index reported by the match-log
//! parser. It may be recycled by the game engine and is never exposed in a
//! snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stable key of a transient entity (projectile, fire area, grenade effect,
/// shot marker or killfeed line) across successive snapshots.
///
/// Backed by a UUID v7, so ids compare in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EffectId(pub Uuid);

impl EffectId {
    /// Allocate a fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EffectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EffectId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// 64-bit Steam identifier of a match participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SteamId(pub u64);

impl SteamId {
    /// Return the raw 64-bit value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for SteamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SteamId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Entity handle reported by the match-log parser for an in-game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_ids_are_unique() {
        let first = EffectId::new();
        let second = EffectId::new();
        assert_ne!(first, second);
        assert_ne!(first.into_inner(), Uuid::nil());
    }

    #[test]
    fn effect_ids_order_by_creation() {
        let earlier = EffectId::from(Uuid::from_u128(1));
        let later = EffectId::from(Uuid::from_u128(2));
        assert!(earlier < later);
        assert!(EffectId::new() > earlier);
    }

    #[test]
    fn effect_id_roundtrip_serde() {
        let original = EffectId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<EffectId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn steam_id_serializes_as_plain_number() {
        let id = SteamId(76_561_198_000_000_001);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "76561198000000001");
        assert_eq!(id.to_string(), "76561198000000001");
    }
}
