//! Random 12-byte session/link id generation.

use rand::RngCore;

use crate::header::UNIQUE_LEN;

/// Generate a random 12-byte id that is non-zero and for which `taken`
/// returns `false`. Retries on collision; in practice this loops once.
pub fn generate_unique(mut taken: impl FnMut(&[u8; UNIQUE_LEN]) -> bool) -> [u8; UNIQUE_LEN] {
    loop {
        let mut candidate = [0u8; UNIQUE_LEN];
        rand::rng().fill_bytes(&mut candidate);
        if candidate == [0u8; UNIQUE_LEN] {
            continue;
        }
        if !taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn never_generates_all_zero() {
        for _ in 0..1000 {
            let id = generate_unique(|_| false);
            assert_ne!(id, [0u8; UNIQUE_LEN]);
        }
    }

    #[test]
    fn avoids_ids_rejected_by_the_taken_predicate() {
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = generate_unique(|candidate| seen.contains(candidate));
            assert!(seen.insert(id));
        }
    }
}
