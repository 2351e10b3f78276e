//! Similarity checks for validating search candidates.
//!
//! A candidate returned by a catalog search is only accepted when both the
//! textual ratio and the duration agreement pass; either failing is a match
//! rejection, not an error.

/// Similarity ratio between two strings in `[0.0, 1.0]`.
///
/// Case-insensitive. Computed as `2 * M / T` where `M` is the total number of
/// characters covered by recursively-found longest matching blocks and `T` is
/// the combined length of both strings. Identical strings score 1.0, strings
/// with no characters in common score 0.0.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.to_lowercase().chars().collect();
    let b_chars: Vec<char> = b.to_lowercase().chars().collect();

    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_chars(&a_chars, 0, a_chars.len(), &b_chars, 0, b_chars.len());
    2.0 * matched as f64 / total as f64
}

/// Whether a source/candidate track pair should be considered text-similar.
///
/// The comparison is inclusive: a ratio exactly at the threshold is accepted.
pub fn texts_agree(a: &str, b: &str, threshold: f64) -> bool {
    text_similarity(a, b) >= threshold
}

/// Whether two track durations agree within `tolerance_secs`.
///
/// Missing or zero durations count as agreement: when duration metadata is
/// unavailable the textual match alone has to suffice.
pub fn durations_agree(d1_ms: Option<u64>, d2_ms: Option<u64>, tolerance_secs: u64) -> bool {
    match (d1_ms, d2_ms) {
        (Some(d1), Some(d2)) if d1 > 0 && d2 > 0 => {
            d1.abs_diff(d2) <= tolerance_secs * 1000
        }
        _ => true,
    }
}

/// Total characters covered by longest matching blocks between
/// `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Finds the longest common substring of the two ranges, then recurses into
/// the pieces to its left and right, so crossing matches are never counted
/// twice.
fn matching_chars(
    a: &[char],
    a_lo: usize,
    a_hi: usize,
    b: &[char],
    b_lo: usize,
    b_hi: usize,
) -> usize {
    let (i, j, size) = longest_match(a, a_lo, a_hi, b, b_lo, b_hi);
    if size == 0 {
        return 0;
    }

    size + matching_chars(a, a_lo, i, b, b_lo, j)
        + matching_chars(a, i + size, a_hi, b, j + size, b_hi)
}

/// Longest common substring between `a[a_lo..a_hi]` and `b[b_lo..b_hi]`,
/// returned as `(start_in_a, start_in_b, length)`.
fn longest_match(
    a: &[char],
    a_lo: usize,
    a_hi: usize,
    b: &[char],
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let mut best = (a_lo, b_lo, 0usize);

    // lengths[j] = length of the match ending at a[i], b[j - 1]
    let mut lengths = vec![0usize; b_hi.saturating_sub(b_lo) + 1];

    for i in a_lo..a_hi {
        let mut new_lengths = vec![0usize; lengths.len()];
        for j in b_lo..b_hi {
            if a[i] == b[j] {
                let k = lengths[j - b_lo] + 1;
                new_lengths[j - b_lo + 1] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            }
        }
        lengths = new_lengths;
    }

    best
}
