//! Size-tiered compaction planning.
//!
//! SSTables are grouped into size tiers; when any tier accumulates at
//! least the configured threshold of tables, those tables are merged into
//! one (see [`crate::sstable::merge`]) and atomically swapped into the
//! engine's reader set.
//!
//! | Tier | File size `s` |
//! |------|----------------------|
//! | 0 | `s < 10 MiB` |
//! | 1 | `10 MiB <= s < 50 MiB` |
//! | 2 | `50 MiB <= s < 250 MiB` |
//! | 3 | `250 MiB <= s < 1 GiB` |
//! | 4 | `s >= 1 GiB` |
//!
//! When several tiers qualify at once, the lowest (smallest) one is
//! selected.

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------


// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use tracing::debug;

const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

/// Number of size tiers.
pub(crate) const TIER_COUNT: usize = 5;

/// Default number of same-tier tables that triggers a compaction.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 4;

/// Maps an SSTable file size to its tier.
pub(crate) fn tier_for_size(bytes: u64) -> usize {
    if bytes < 10 * MIB {
        0
    } else if bytes < 50 * MIB {
        1
    } else if bytes < 250 * MIB {
        2
    } else if bytes < GIB {
        3
    } else {
        4
    }
}

/// A selected compaction: which tier triggered and which members of the
/// reader set to merge.
#[derive(Debug)]
pub(crate) struct CompactionPlan {
    /// The tier that met the threshold.
    pub(crate) tier: usize,

    /// Indices into the reader set, preserving set order — oldest
    /// positions first. The caller derives merge recency from this order.
    pub(crate) inputs: Vec<usize>,
}

/// Buckets the reader set (given as per-reader file sizes, oldest first)
/// into tiers and returns a plan for the lowest tier holding at least
/// `threshold` members, or `None` when no tier qualifies.
pub(crate) fn plan(sizes: &[u64], threshold: usize) -> Option<CompactionPlan> {
    // Merging fewer than two tables is a no-op rewrite.
    let threshold = threshold.max(2);

    let mut tiers: [Vec<usize>; TIER_COUNT] = std::array::from_fn(|_| Vec::new());
    for (idx, &size) in sizes.iter().enumerate() {
        tiers[tier_for_size(size)].push(idx);
    }

    for (tier, members) in tiers.iter().enumerate() {
        if members.len() >= threshold {
            return Some(CompactionPlan {
                tier,
                inputs: members.clone(),
            });
        }
    }

    debug!(
        sstable_count = sizes.len(),
        threshold, "compaction: no tier met the threshold"
    );
    None
}
