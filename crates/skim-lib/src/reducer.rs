//! Candidate reduction
//!
//! Raw hits of one query strand are grouped by target read and clustered by
//! estimated offset. Each cluster is scored by how much of the geometrically
//! possible overlap its hashes cover; clusters passing the threshold become
//! [`Candidate`]s. When a strand yields more candidates than the per-read
//! cap, a two-round selection keeps the best by coverage and by support.

use std::cmp::Reverse;
use std::ops::Range;

use crate::config::SkimConfiguration;
use crate::constants::OFFSET_DRIFT_TOLERANCE;
use crate::deny_list::DenyList;
use crate::read_pool::{ReadId, ReadPool};
use crate::scanner::RawHit;

/// An accepted overlap between a query strand and a target read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Target read
    pub target_read_id: ReadId,
    /// Mean estimated offset of the cluster (query position minus target position)
    pub offset: i32,
    /// Share of the possible overlap covered by hashes, 0 to 100
    pub percent_overlap: u8,
    /// Hits in the cluster
    pub supporting_hashes: u32,
    /// Survived the per-read cap and goes to the output
    pub selected: bool,
}

/// Everything one query strand produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// Accepted candidates in target order, selected or not
    pub candidates: Vec<Candidate>,
    /// Clusters below the required percentage
    pub below_threshold: u64,
    /// Clusters rejected by the deny list
    pub denied: u64,
}

impl Reduction {
    /// Candidates that go to the output
    pub fn selected(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.selected)
    }

    /// Accepted candidates dropped by the per-read cap
    pub fn num_truncated(&self) -> usize {
        self.candidates.iter().filter(|c| !c.selected).count()
    }
}

/// Score of one offset cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterScore {
    /// Mean offset, truncated toward zero
    pub offset: i32,
    /// Covered share of the possible overlap, 0 to 100
    pub percent_overlap: u8,
    /// Number of hits
    pub supporting_hashes: u32,
}

/// Turns raw hits into candidates
pub struct CandidateReducer<'a, P: ?Sized> {
    pool: &'a P,
    deny_list: Option<&'a DenyList>,
    bases_per_hash: usize,
    percent_required: u8,
    max_hits_per_read: usize,
}

impl<'a, P: ReadPool + ?Sized> CandidateReducer<'a, P> {
    /// Create a reducer
    pub fn new(pool: &'a P, deny_list: Option<&'a DenyList>, config: &SkimConfiguration) -> Self {
        Self {
            pool,
            deny_list,
            bases_per_hash: config.bases_per_hash,
            percent_required: config.percent_required,
            max_hits_per_read: config.max_hits_per_read,
        }
    }

    /// Reduce the raw hits of one query strand
    pub fn reduce(&self, query: ReadId, mut hits: Vec<RawHit>) -> Reduction {
        let mut reduction = Reduction::default();
        if hits.is_empty() {
            return reduction;
        }

        hits.sort_unstable_by_key(|h| {
            (h.target_read_id, h.estimated_offset, h.query_hash_position)
        });
        let query_len = self.pool.clipped_len(query);

        for cluster in offset_clusters(&hits) {
            let cluster = &hits[cluster];
            let target = cluster[0].target_read_id;
            let target_len = self.pool.clipped_len(target);

            let score = score_cluster(cluster, query_len, target_len, self.bases_per_hash);
            let Some(score) = score else {
                reduction.below_threshold += 1;
                continue;
            };
            if score.percent_overlap < self.percent_required {
                reduction.below_threshold += 1;
                continue;
            }
            if self.deny_list.is_some_and(|deny| deny.contains(query, target)) {
                reduction.denied += 1;
                continue;
            }

            reduction.candidates.push(Candidate {
                target_read_id: target,
                offset: score.offset,
                percent_overlap: score.percent_overlap,
                supporting_hashes: score.supporting_hashes,
                selected: false,
            });
        }

        select_top_candidates(&mut reduction.candidates, self.max_hits_per_read);
        reduction
    }
}

/// Split hits sorted by (target, offset, position) into clusters
///
/// A cluster holds hits of one target whose consecutive offsets differ by at
/// most [`OFFSET_DRIFT_TOLERANCE`].
pub fn offset_clusters(hits: &[RawHit]) -> Vec<Range<usize>> {
    let mut clusters = Vec::new();
    let mut begin = 0;
    for i in 1..=hits.len() {
        let split = i == hits.len()
            || hits[i].target_read_id != hits[i - 1].target_read_id
            || hits[i].estimated_offset - hits[i - 1].estimated_offset > OFFSET_DRIFT_TOLERANCE;
        if split {
            if begin < i {
                clusters.push(begin..i);
            }
            begin = i;
        }
    }
    clusters
}

/// Length of the geometrically possible overlap of a query and a target
///
/// In query coordinates the target occupies `[offset, offset + target_len)`,
/// so the overlap runs from `max(0, offset)` to
/// `min(query_len, offset + target_len)`. Zero when the reads cannot overlap.
pub fn max_overlap_length(offset: i32, query_len: usize, target_len: usize) -> usize {
    let offset = offset as i64;
    let start = offset.max(0);
    let end = (query_len as i64).min(offset + target_len as i64);
    (end - start).max(0) as usize
}

/// Score a non-empty cluster; `None` if its offset admits no overlap
///
/// The leftmost hash position is moved back by `bases_per_hash - 1` to the
/// start of its window, then `percent = 100 * (max_pos - min_pos) / max_overlap`
/// in integer arithmetic, capped at 100. The overlap is the longest one the
/// mean offset allows, not an aligned length.
pub fn score_cluster(
    cluster: &[RawHit],
    query_len: usize,
    target_len: usize,
    bases_per_hash: usize,
) -> Option<ClusterScore> {
    let first = cluster.first()?;
    let mut min_pos = first.query_hash_position;
    let mut max_pos = first.query_hash_position;
    let mut offset_sum: i64 = 0;
    for hit in cluster {
        min_pos = min_pos.min(hit.query_hash_position);
        max_pos = max_pos.max(hit.query_hash_position);
        offset_sum += hit.estimated_offset as i64;
    }

    let offset = (offset_sum / cluster.len() as i64) as i32;
    let max_overlap = max_overlap_length(offset, query_len, target_len);
    if max_overlap == 0 {
        return None;
    }

    let window_start = (min_pos as usize).saturating_sub(bases_per_hash - 1);
    let span = max_pos as usize - window_start;
    let percent = (100 * span / max_overlap).min(100);

    Some(ClusterScore {
        offset,
        percent_overlap: percent as u8,
        supporting_hashes: cluster.len() as u32,
    })
}

/// Mark at most `max_hits` candidates as selected
///
/// Everything is selected when the cap is not exceeded. Otherwise the first
/// half of the budget goes to the best percent overlap (support breaks
/// ties), the rest to the best support among the remaining candidates
/// (percent breaks ties). Remaining ties go to the earlier candidate, that
/// is the lower target id.
pub fn select_top_candidates(candidates: &mut [Candidate], max_hits: usize) {
    if candidates.len() <= max_hits {
        for candidate in candidates.iter_mut() {
            candidate.selected = true;
        }
        return;
    }

    for candidate in candidates.iter_mut() {
        candidate.selected = false;
    }

    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by_key(|&i| {
        let c = &candidates[i];
        (Reverse(c.percent_overlap), Reverse(c.supporting_hashes), i)
    });
    let by_percent = max_hits / 2;
    for &i in order.iter().take(by_percent) {
        candidates[i].selected = true;
    }

    order.sort_by_key(|&i| {
        let c = &candidates[i];
        (Reverse(c.supporting_hashes), Reverse(c.percent_overlap), i)
    });
    let mut remaining = max_hits - by_percent;
    for &i in &order {
        if remaining == 0 {
            break;
        }
        if !candidates[i].selected {
            candidates[i].selected = true;
            remaining -= 1;
        }
    }
}
