//! Enumeration types for the overview schema.
//!
//! Round phases, team sides, equipment and grenade detonation kinds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Round phase
// ---------------------------------------------------------------------------

/// The current stage of a round.
///
/// [`Phase::Warmup`] and [`Phase::Halftime`] mean no live round is in
/// progress. The remaining four phases describe one round from the buy
/// period to the post-round restart delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Buy period at the start of a round; players cannot move.
    Freezetime,
    /// The round is live and the bomb has not been planted.
    Regular,
    /// The bomb is planted and the bomb timer is running.
    Planted,
    /// The round has ended; waiting for the next round to start.
    Restart,
    /// Pre-match warmup.
    Warmup,
    /// Side switch between halves.
    Halftime,
}

impl Phase {
    /// Whether this phase belongs to a round in progress.
    pub const fn is_live_round(self) -> bool {
        matches!(
            self,
            Self::Freezetime | Self::Regular | Self::Planted | Self::Restart
        )
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Freezetime => "freezetime",
            Self::Regular => "regular",
            Self::Planted => "planted",
            Self::Restart => "restart",
            Self::Warmup => "warmup",
            Self::Halftime => "halftime",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Team affiliation of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Team {
    /// Connected but not yet assigned.
    Unassigned,
    /// Watching, not playing.
    Spectators,
    /// Attacking side.
    Terrorists,
    /// Defending side.
    CounterTerrorists,
}

impl Team {
    /// Whether the team is one of the two playing sides.
    pub const fn is_playing_side(self) -> bool {
        matches!(self, Self::Terrorists | Self::CounterTerrorists)
    }

    /// The opposing playing side, if any.
    pub const fn opponent(self) -> Option<Self> {
        match self {
            Self::Terrorists => Some(Self::CounterTerrorists),
            Self::CounterTerrorists => Some(Self::Terrorists),
            Self::Unassigned | Self::Spectators => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// An item that can appear in a participant's inventory, in a kill, or as
/// a thrown grenade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EquipmentType {
    /// Item the parser could not classify.
    Unknown,

    // --- Pistols ---
    /// P2000 pistol.
    P2000,
    /// Glock-18 pistol.
    Glock,
    /// P250 pistol.
    P250,
    /// Desert Eagle pistol.
    Deagle,
    /// Five-SeveN pistol.
    FiveSeven,
    /// Dual Berettas.
    DualBerettas,
    /// Tec-9 pistol.
    Tec9,
    /// CZ75-Auto pistol.
    Cz,
    /// USP-S pistol.
    Usp,
    /// R8 Revolver.
    Revolver,

    // --- SMGs ---
    /// MP7.
    Mp7,
    /// MP9.
    Mp9,
    /// PP-Bizon.
    Bizon,
    /// MAC-10.
    Mac10,
    /// UMP-45.
    Ump,
    /// P90.
    P90,
    /// MP5-SD.
    Mp5,

    // --- Heavy ---
    /// Sawed-Off shotgun.
    SawedOff,
    /// Nova shotgun.
    Nova,
    /// MAG-7 shotgun.
    Mag7,
    /// XM1014 shotgun.
    Xm1014,
    /// M249 machine gun.
    M249,
    /// Negev machine gun.
    Negev,

    // --- Rifles ---
    /// Galil AR.
    Galil,
    /// FAMAS.
    Famas,
    /// AK-47.
    Ak47,
    /// M4A4.
    M4a4,
    /// M4A1-S.
    M4a1,
    /// SSG 08 scout rifle.
    Ssg08,
    /// SG 553.
    Sg553,
    /// AUG.
    Aug,
    /// AWP sniper rifle.
    Awp,
    /// SCAR-20 auto-sniper.
    Scar20,
    /// G3SG1 auto-sniper.
    G3sg1,

    // --- Equipment ---
    /// Zeus x27 taser.
    Zeus,
    /// Kevlar vest.
    Kevlar,
    /// Kevlar vest with helmet.
    Helmet,
    /// The C4 bomb.
    Bomb,
    /// Any knife.
    Knife,
    /// Defuse kit.
    DefuseKit,
    /// Environmental damage (fall damage, map triggers).
    World,

    // --- Grenades ---
    /// Decoy grenade.
    Decoy,
    /// Molotov cocktail.
    Molotov,
    /// Incendiary grenade.
    Incendiary,
    /// Flashbang.
    Flash,
    /// Smoke grenade.
    Smoke,
    /// High-explosive grenade.
    He,
}

impl EquipmentType {
    /// Whether the item is a throwable grenade.
    pub const fn is_grenade(self) -> bool {
        matches!(
            self,
            Self::Decoy | Self::Molotov | Self::Incendiary | Self::Flash | Self::Smoke | Self::He
        )
    }

    /// Whether the item burns the ground on detonation.
    pub const fn is_fire_grenade(self) -> bool {
        matches!(self, Self::Molotov | Self::Incendiary)
    }

    /// Whether firing the item leaves a shot marker. Grenades, the knife,
    /// the bomb and non-weapon items do not.
    pub const fn leaves_shot_marker(self) -> bool {
        !self.is_grenade()
            && !matches!(
                self,
                Self::Unknown
                    | Self::Kevlar
                    | Self::Helmet
                    | Self::Bomb
                    | Self::Knife
                    | Self::DefuseKit
                    | Self::World
            )
    }

    /// Whether shots from this weapon are drawn with the precision marker.
    pub const fn is_precision_rifle(self) -> bool {
        matches!(self, Self::Awp | Self::Ssg08)
    }

    /// Label shown on the killfeed.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::P2000 => "P2000",
            Self::Glock => "Glock-18",
            Self::P250 => "P250",
            Self::Deagle => "Desert Eagle",
            Self::FiveSeven => "Five-SeveN",
            Self::DualBerettas => "Dual Berettas",
            Self::Tec9 => "Tec-9",
            Self::Cz => "CZ75-Auto",
            Self::Usp => "USP-S",
            Self::Revolver => "R8 Revolver",
            Self::Mp7 => "MP7",
            Self::Mp9 => "MP9",
            Self::Bizon => "PP-Bizon",
            Self::Mac10 => "MAC-10",
            Self::Ump => "UMP-45",
            Self::P90 => "P90",
            Self::Mp5 => "MP5-SD",
            Self::SawedOff => "Sawed-Off",
            Self::Nova => "Nova",
            Self::Mag7 => "MAG-7",
            Self::Xm1014 => "XM1014",
            Self::M249 => "M249",
            Self::Negev => "Negev",
            Self::Galil => "Galil AR",
            Self::Famas => "FAMAS",
            Self::Ak47 => "AK-47",
            Self::M4a4 => "M4A4",
            Self::M4a1 => "M4A1-S",
            Self::Ssg08 => "SSG 08",
            Self::Sg553 => "SG 553",
            Self::Aug => "AUG",
            Self::Awp => "AWP",
            Self::Scar20 => "SCAR-20",
            Self::G3sg1 => "G3SG1",
            Self::Zeus => "Zeus x27",
            Self::Kevlar => "Kevlar Vest",
            Self::Helmet => "Kevlar + Helmet",
            Self::Bomb => "C4",
            Self::Knife => "Knife",
            Self::DefuseKit => "Defuse Kit",
            Self::World => "World",
            Self::Decoy => "Decoy Grenade",
            Self::Molotov => "Molotov",
            Self::Incendiary => "Incendiary Grenade",
            Self::Flash => "Flashbang",
            Self::Smoke => "Smoke Grenade",
            Self::He => "HE Grenade",
        }
    }
}

// ---------------------------------------------------------------------------
// Grenade detonation
// ---------------------------------------------------------------------------

/// The kind of detonation a grenade visual effect was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum GrenadeEventKind {
    /// An HE grenade exploded.
    HeExplode,
    /// A flashbang exploded.
    FlashExplode,
    /// A smoke grenade started emitting smoke.
    SmokeStart,
    /// A decoy started firing fake shots.
    DecoyStart,
    /// A molotov or incendiary hit the ground and ignited.
    FireStart,
}
