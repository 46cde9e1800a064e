//! Show-name matching against calendar entries and catalog cells.
//!
//! Matching runs in four tiers and the first tier that produces a hit wins
//! across the whole candidate set: abbreviation, exact, substring, fuzzy.

use crate::constants::abbreviation_for;
use crate::error::{FinalsError, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum MatchTier {
    Abbreviation,
    Exact,
    Substring,
    Fuzzy,
}

/// Case-folded, trimmed form used by every tier
pub fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ratcliff/Obershelp similarity in [0, 1]: `2 * M / T`, where `M` counts the
/// characters in matching blocks and `T` is the combined length.
///
/// Reordered words still score well ("gillingham dtc" vs "dtc gillingham" is 0.714).
pub fn similarity(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Sum of the matching-block sizes: take the longest common block, then
/// recurse on the pieces to its left and to its right.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]`; ties go to the
/// block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // run[j + 1]: length of the common run ending at a[i], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            curr[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best_size {
                best_size = curr[j + 1];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_size)
}

fn abbreviation_match(target: &str, candidate: &str) -> bool {
    let target_abbr = abbreviation_for(target);
    let candidate_abbr = abbreviation_for(candidate);

    if let Some(t) = target_abbr {
        if t == candidate || Some(t) == candidate_abbr {
            return true;
        }
    }
    matches!(candidate_abbr, Some(c) if c == target)
}

#[derive(Debug, Clone)]
pub struct NameMatcher {
    threshold: f64,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_FUZZY_THRESHOLD)
    }
}

impl NameMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The best tier at which `candidate` matches `target`, if any.
    pub fn tier(&self, target: &str, candidate: &str) -> Option<MatchTier> {
        let target = canonical(target);
        let candidate = canonical(candidate);
        if target.is_empty() || candidate.is_empty() {
            return None;
        }

        if abbreviation_match(&target, &candidate) {
            Some(MatchTier::Abbreviation)
        } else if target == candidate {
            Some(MatchTier::Exact)
        } else if target.contains(&candidate) || candidate.contains(&target) {
            Some(MatchTier::Substring)
        } else if similarity(&target, &candidate) >= self.threshold {
            Some(MatchTier::Fuzzy)
        } else {
            None
        }
    }

    pub fn is_match(&self, target: &str, candidate: &str) -> bool {
        self.tier(target, candidate).is_some()
    }

    /// Pick the candidate matching at the best tier; ties go to the earliest candidate.
    pub fn find<'a, T, F>(
        &self,
        target: &str,
        candidates: &'a [T],
        name_of: F,
    ) -> Result<(&'a T, MatchTier)>
    where
        F: Fn(&T) -> &str,
    {
        if target.trim().is_empty() {
            return Err(FinalsError::InvalidInput(
                "show name must not be empty".to_string(),
            ));
        }

        let mut best: Option<(&'a T, MatchTier)> = None;
        for candidate in candidates {
            if let Some(tier) = self.tier(target, name_of(candidate)) {
                if best.map_or(true, |(_, b)| tier < b) {
                    best = Some((candidate, tier));
                }
            }
        }

        match best {
            Some((candidate, tier)) => {
                debug!(target_name = %target, matched = %name_of(candidate), ?tier, "name matched");
                Ok((candidate, tier))
            }
            None => Err(FinalsError::NotFound(format!(
                "no match for '{}' among {} candidates",
                target,
                candidates.len()
            ))),
        }
    }
}
