/// Rank given to missing or unrecognised tiers
pub const UNRANKED_TIER: u32 = 99;

/// Map a business tier to a priority rank (lower = preferred)
///
/// Matching is case-insensitive and ignores surrounding whitespace:
/// gold → 0, silver → 1, bronze → 2, anything else → 99.
#[inline]
pub fn tier_rank(tier: Option<&str>) -> u32 {
    let Some(tier) = tier else {
        return UNRANKED_TIER;
    };

    match tier.trim().to_ascii_lowercase().as_str() {
        "gold" => 0,
        "silver" => 1,
        "bronze" => 2,
        _ => UNRANKED_TIER,
    }
}
