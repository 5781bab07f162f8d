use std::collections::HashSet;
use url::Url;

/// Locality contribution when both pages live on the same host
pub const LOCALITY_SAME_HOST: f32 = 0.8;

/// Locality contribution when only the root domain matches
pub const LOCALITY_SAME_ROOT: f32 = 0.5;

/// Collection overlap: `|A ∩ B| / max(|A|, |B|)`, 0 when either side is empty.
pub fn taxonomy_score(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let shared = set_a.intersection(&set_b).count();
    if shared == 0 {
        return 0.0;
    }

    shared as f32 / set_a.len().max(set_b.len()) as f32
}

/// URL proximity. Unparseable or host-less URLs score 0.
pub fn locality_score(url_a: &str, url_b: &str) -> f32 {
    let (Some(host_a), Some(host_b)) = (host_of(url_a), host_of(url_b)) else {
        return 0.0;
    };

    if host_a == host_b {
        LOCALITY_SAME_HOST
    } else if root_domain(&host_a) == root_domain(&host_b) {
        LOCALITY_SAME_ROOT
    } else {
        0.0
    }
}

/// Last two dot-separated labels of a hostname.
///
/// Plain string heuristic, no public suffix list: `news.bbc.co.uk` yields
/// `co.uk`.
pub fn root_domain(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    match host.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &host[idx + 1..],
        None => host,
    }
}

fn host_of(raw: &str) -> Option<String> {
    let parsed = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Unparseable URL {:?}: {}", raw, e);
            return None;
        }
    };
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn taxonomy_is_zero_without_collections() {
        assert_eq!(taxonomy_score(&[], &ids(&["c1"])), 0.0);
        assert_eq!(taxonomy_score(&ids(&["c1"]), &[]), 0.0);
    }

    #[test]
    fn taxonomy_divides_by_larger_set() {
        assert_eq!(taxonomy_score(&ids(&["c1"]), &ids(&["c1"])), 1.0);
        assert_eq!(taxonomy_score(&ids(&["c1", "c2"]), &ids(&["c1"])), 0.5);
        assert_eq!(
            taxonomy_score(&ids(&["c1", "c2", "c3", "c4"]), &ids(&["c2", "c3"])),
            0.5
        );
        assert_eq!(taxonomy_score(&ids(&["c1"]), &ids(&["c2"])), 0.0);
    }

    #[test]
    fn taxonomy_ignores_duplicate_memberships() {
        assert_eq!(taxonomy_score(&ids(&["c1", "c1"]), &ids(&["c1"])), 1.0);
    }

    #[test]
    fn locality_same_host() {
        assert_eq!(
            locality_score("https://docs.rs/tokio", "http://docs.rs/serde"),
            LOCALITY_SAME_HOST
        );
    }

    #[test]
    fn locality_same_root_domain() {
        assert_eq!(
            locality_score("https://blog.example.com/a", "https://shop.example.com/b"),
            LOCALITY_SAME_ROOT
        );
    }

    #[test]
    fn locality_unrelated_or_broken() {
        assert_eq!(locality_score("https://a.org", "https://b.org"), 0.0);
        assert_eq!(locality_score("not a url", "https://b.org"), 0.0);
        assert_eq!(locality_score("", ""), 0.0);
        assert_eq!(locality_score("about:blank", "about:blank"), 0.0);
    }

    #[test]
    fn root_domain_takes_last_two_labels() {
        assert_eq!(root_domain("a.b.example.com"), "example.com");
        assert_eq!(root_domain("example.com"), "example.com");
        assert_eq!(root_domain("localhost"), "localhost");
        assert_eq!(root_domain("news.bbc.co.uk"), "co.uk");
    }
}
