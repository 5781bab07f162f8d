use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Leading decimal number, the way a lenient float reader sees it
fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("leading number regex")
    })
}

/// Read the model's confidence reply.
///
/// Accepts the leading number of the reply ("0.82", "0.8 - both cover
/// tokio"). Returns `None` for anything unparseable or outside [0, 1].
pub fn parse_confidence(text: &str) -> Option<f32> {
    let caps = leading_number().captures(text)?;
    let value: f32 = caps.get(1)?.as_str().parse().ok()?;
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Some(value)
    } else {
        None
    }
}

/// One `i,j,score` line from a batch reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchPair {
    pub first: usize,
    pub second: usize,
    pub score: f32,
}

/// Parse a batch similarity reply.
///
/// Each line is `i,j,score` with 0-based indices into a list of `item_count`
/// entries; `none` means no pairs. Lines that do not parse, point outside the
/// list, pair an entry with itself, or score below `min_score` are skipped one
/// by one. Scores above 1 are capped. A pair listed twice keeps its highest
/// score.
pub fn parse_batch_pairs(text: &str, item_count: usize, min_score: f32) -> Vec<BatchPair> {
    let mut pairs: Vec<BatchPair> = Vec::new();
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();

    for raw in text.lines() {
        let line = raw
            .trim()
            .trim_start_matches(['-', '*'])
            .trim()
            .trim_matches('`');
        if line.is_empty() || line.eq_ignore_ascii_case("none") {
            continue;
        }

        let Some(pair) = parse_pair_line(line, item_count) else {
            log::debug!("Skipping batch reply line {:?}", raw);
            continue;
        };
        if pair.score < min_score {
            log::debug!(
                "Skipping pair {},{} below batch threshold ({:.2} < {:.2})",
                pair.first,
                pair.second,
                pair.score,
                min_score
            );
            continue;
        }

        let key = (pair.first.min(pair.second), pair.first.max(pair.second));
        match seen.get(&key) {
            Some(&idx) => {
                if pair.score > pairs[idx].score {
                    pairs[idx].score = pair.score;
                }
            }
            None => {
                seen.insert(key, pairs.len());
                pairs.push(pair);
            }
        }
    }

    pairs
}

fn parse_pair_line(line: &str, item_count: usize) -> Option<BatchPair> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    // Trailing separators ("0,1,0.9,") are noise, not a fourth field
    let last = fields.iter().rposition(|field| !field.is_empty())?;
    let &[first, second, score] = &fields[..=last] else {
        return None;
    };
    let first: usize = first.parse().ok()?;
    let second: usize = second.parse().ok()?;
    let score: f32 = score.parse().ok()?;

    if first >= item_count || second >= item_count || first == second {
        return None;
    }
    if !score.is_finite() || score < 0.0 {
        return None;
    }

    Some(BatchPair {
        first,
        second,
        score: score.min(1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn confidence_plain_number() {
        assert_eq!(parse_confidence("0.75"), Some(0.75));
        assert_eq!(parse_confidence("  1\n"), Some(1.0));
        assert_eq!(parse_confidence("0"), Some(0.0));
        assert_eq!(parse_confidence(".5"), Some(0.5));
    }

    #[test]
    fn confidence_takes_leading_number() {
        assert_eq!(parse_confidence("0.6 (both pages cover rust)"), Some(0.6));
    }

    #[test]
    fn confidence_out_of_range_is_rejected() {
        assert_eq!(parse_confidence("1.5"), None);
        assert_eq!(parse_confidence("-0.1"), None);
        assert_eq!(parse_confidence("1e3"), None);
    }

    #[test]
    fn confidence_garbage_is_rejected() {
        assert_eq!(parse_confidence(""), None);
        assert_eq!(parse_confidence("High similarity"), None);
        assert_eq!(parse_confidence("NaN"), None);
    }

    #[test]
    fn batch_parses_valid_lines() {
        let pairs = parse_batch_pairs("0,1,0.9\n2,3,0.45\n", 4, 0.4);
        assert_eq!(
            pairs,
            vec![
                BatchPair {
                    first: 0,
                    second: 1,
                    score: 0.9
                },
                BatchPair {
                    first: 2,
                    second: 3,
                    score: 0.45
                },
            ]
        );
    }

    #[test]
    fn batch_none_means_no_pairs() {
        assert!(parse_batch_pairs("none", 3, 0.4).is_empty());
        assert!(parse_batch_pairs("NONE\n", 3, 0.4).is_empty());
    }

    #[test]
    fn batch_skips_bad_lines_individually() {
        let reply = "Here are the pairs:\n0,1,0.8\n0,9,0.9\n1,1,0.9\n1,2,abc\n1,2\n0,2,0.3\n- 1,2,1.7\n";
        let pairs = parse_batch_pairs(reply, 3, 0.4);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].first, pairs[0].second), (0, 1));
        assert_eq!((pairs[1].first, pairs[1].second, pairs[1].score), (1, 2, 1.0));
    }

    #[test]
    fn batch_ignores_trailing_separators() {
        let pairs = parse_batch_pairs("0,1,0.9,\n1,2,0.6, ,\n0,2,0.5,extra\n", 3, 0.4);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].first, pairs[0].second, pairs[0].score), (0, 1, 0.9));
        assert_eq!((pairs[1].first, pairs[1].second, pairs[1].score), (1, 2, 0.6));
    }

    #[test]
    fn batch_duplicate_pair_keeps_best_score() {
        let pairs = parse_batch_pairs("0,1,0.5\n1,0,0.7\n", 2, 0.4);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].score, 0.7);
    }
}
