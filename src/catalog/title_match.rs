use std::collections::HashMap;

/// Minimum similarity (0..100) for a free-text title to count as a match.
pub const MATCH_CUTOFF: f64 = 70.0;

const SEQUEL_SUFFIXES: [[&str; 3]; 2] = [["I", "II", "III"], ["1", "2", "3"]];
const SEQUEL_PENALTY: f64 = 5.0;

/// Similarity between a student-written course title and a catalog module
/// name, 0..100. Dice coefficient over character bigrams, with a penalty
/// when the candidate looks like a sequel of the queried title so that
/// "Analysis I" does not match "Analysis II" ahead of the exact course.
pub fn similarity_score(queried: &str, candidate: &str) -> f64 {
    let mut score = bigram_dice(queried, candidate) * 100.0;

    for group in &SEQUEL_SUFFIXES {
        for (i, suffix) in group[..group.len() - 1].iter().enumerate() {
            if candidate.ends_with(suffix) {
                if group[i + 1..].iter().any(|later| queried.ends_with(later)) {
                    score -= SEQUEL_PENALTY;
                }
                break;
            }
        }
    }
    score
}

fn bigram_dice(a: &str, b: &str) -> f64 {
    let a_bigrams = bigrams(a);
    let b_bigrams = bigrams(b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return if a.trim().eq_ignore_ascii_case(b.trim()) {
            1.0
        } else {
            0.0
        };
    }

    let mut counts: HashMap<(char, char), usize> = HashMap::new();
    for bigram in &a_bigrams {
        *counts.entry(*bigram).or_default() += 1;
    }
    let mut overlap = 0usize;
    for bigram in &b_bigrams {
        if let Some(count) = counts.get_mut(bigram) {
            if *count > 0 {
                *count -= 1;
                overlap += 1;
            }
        }
    }

    2.0 * overlap as f64 / (a_bigrams.len() + b_bigrams.len()) as f64
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}
