pub const RANK_NAMES: [&str; 10] = [
    "Street Rat",
    "Hoodlum",
    "Peddler",
    "Hustler",
    "Bagman",
    "Enforcer",
    "Shot Caller",
    "Block Boss",
    "Underlord",
    "Baron",
];

pub const TIERS_PER_RANK: i64 = 5;

// XP needed to clear each tier, indexed rank * 5 + (tier - 1).
pub const XP_PER_TIER: [i64; 50] = [
    0, 200, 200, 200, 200, // Street Rat I-V
    400, 400, 400, 400, 400, // Hoodlum I-V
    625, 625, 625, 625, 625, // Peddler I-V
    825, 825, 825, 825, 825, // Hustler I-V
    1025, 1025, 1025, 1025, 1025, // Bagman I-V
    1050, 1050, 1050, 1050, 1050, // Enforcer I-V
    1450, 1450, 1450, 1450, 1450, // Shot Caller I-V
    1675, 1675, 1675, 1675, 1675, // Block Boss I-V
    1875, 1875, 1875, 1875, 1875, // Underlord I-V
    2075, 2075, 2075, 2075, 2075, // Baron I-V
];

pub fn rank_name(rank: i64) -> Option<&'static str> {
    usize::try_from(rank)
        .ok()
        .and_then(|index| RANK_NAMES.get(index).copied())
}

pub fn is_valid_tier(tier: i64) -> bool {
    (1..=TIERS_PER_RANK).contains(&tier)
}

/// Cumulative XP required to reach the start of the given rank and tier.
pub fn total_xp(rank: i64, tier: i64) -> Option<i64> {
    rank_name(rank)?;
    if !is_valid_tier(tier) {
        return None;
    }
    let upto = (rank * TIERS_PER_RANK + (tier - 1)) as usize;
    Some(XP_PER_TIER[..upto].iter().sum())
}
