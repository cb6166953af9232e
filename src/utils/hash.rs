//! Content hashing utilities.

use xxhash_rust::xxh3::Xxh3;

/// Hash a set of records independent of their order.
///
/// Records are sorted and each is framed by its length, so `["ab", "c"]`
/// and `["a", "bc"]` hash differently.
pub fn unordered_hash<I, R>(records: I) -> u64
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
{
    let mut records: Vec<R> = records.into_iter().collect();
    records.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));

    let mut hasher = Xxh3::new();
    for record in &records {
        let bytes = record.as_ref();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_hash_ignores_order() {
        assert_eq!(
            unordered_hash(["A>B", "B>C"]),
            unordered_hash(["B>C", "A>B"])
        );
    }

    #[test]
    fn test_unordered_hash_frames_records() {
        assert_ne!(unordered_hash(["ab", "c"]), unordered_hash(["a", "bc"]));
        assert_ne!(unordered_hash(["x"]), unordered_hash(["x", ""]));
    }
}
