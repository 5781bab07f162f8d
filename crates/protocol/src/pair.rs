use sha2::{Digest, Sha256};

/// Unordered pair of item ids, stored in sorted order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_string(), b.to_string())
        } else {
            Self(b.to_string(), a.to_string())
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }
}

/// Stable connection id for an unordered pair.
///
/// `connection_id(a, b) == connection_id(b, a)`, so concurrent writers of the
/// same pair collapse onto one record.
pub fn connection_id(a: &str, b: &str) -> String {
    let key = PairKey::new(a, b);
    let mut hasher = Sha256::new();
    hasher.update(key.first().as_bytes());
    // NUL never appears in ids; keeps ("ab","c") apart from ("a","bc")
    hasher.update([0u8]);
    hasher.update(key.second().as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(5 + 32);
    id.push_str("conn_");
    for byte in &digest[..16] {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

pub fn same_pair(left: (&str, &str), right: (&str, &str)) -> bool {
    (left.0 == right.0 && left.1 == right.1) || (left.0 == right.1 && left.1 == right.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_is_order_independent() {
        assert_eq!(connection_id("w1", "w2"), connection_id("w2", "w1"));
        assert_ne!(connection_id("w1", "w2"), connection_id("w1", "w3"));
        assert_ne!(connection_id("ab", "c"), connection_id("a", "bc"));
        assert!(connection_id("w1", "w2").starts_with("conn_"));
    }

    #[test]
    fn pair_key_sorts_endpoints() {
        let key = PairKey::new("z", "a");
        assert_eq!(key.first(), "a");
        assert_eq!(key.second(), "z");
        assert_eq!(key, PairKey::new("a", "z"));
    }

    #[test]
    fn same_pair_ignores_order() {
        assert!(same_pair(("a", "b"), ("b", "a")));
        assert!(!same_pair(("a", "b"), ("a", "c")));
    }
}
