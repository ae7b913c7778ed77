// Identifier Allocator - Collision-free names for hoisted helpers
//
// Names are `<prefix>_<suffix>` with a random alphanumeric suffix. One
// allocator lives for exactly one generation pass. A repeated name is never
// renamed: generated code refers to it by value, so it is reported instead.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Characters the random suffix is drawn from
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix (62^10 possible suffixes per prefix)
pub const SUFFIX_LENGTH: usize = 10;

/// Prefix used when the caller's prefix has no usable characters
pub const DEFAULT_PREFIX: &str = "invent";

/// An identifier was produced twice in one pass
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier '{0}' was already issued in this pass")]
pub struct IdentifierCollision(pub String);

/// Per-pass generator of distinct identifiers
#[derive(Clone)]
pub struct IdentifierAllocator {
    rng: StdRng,
    issued: HashSet<String>,
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierAllocator {
    /// Allocator with an entropy-seeded suffix stream
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            issued: HashSet::new(),
        }
    }

    /// Allocator with a fixed suffix stream (reproducible output)
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }

    /// Produce a new identifier starting with `prefix`
    pub fn allocate(&mut self, prefix: &str) -> Result<String, IdentifierCollision> {
        let suffix: String = (0..SUFFIX_LENGTH)
            .map(|_| SUFFIX_ALPHABET[self.rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        let name = format!("{}_{}", sanitize_prefix(prefix), suffix);

        if !self.issued.insert(name.clone()) {
            return Err(IdentifierCollision(name));
        }
        Ok(name)
    }

    /// Number of names handed out so far
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match cleaned.chars().next() {
        None => DEFAULT_PREFIX.to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    #[test]
    fn test_thousand_allocations_are_distinct() {
        let mut allocator = IdentifierAllocator::new();
        let names: HashSet<String> = (0..1000).map(|_| allocator.allocate("x").unwrap()).collect();
        assert_eq!(names.len(), 1000);
        assert_eq!(allocator.issued_count(), 1000);
    }

    #[test]
    fn test_names_are_identifiers() {
        let mut allocator = IdentifierAllocator::seeded(7);
        let name = allocator.allocate("summarize").unwrap();

        assert!(name.starts_with("summarize_"));
        assert_eq!(name.len(), "summarize_".len() + SUFFIX_LENGTH);
        assert!(is_identifier(&name));
        assert_eq!(allocator.issued_count(), 1);
    }

    #[test]
    fn test_prefix_sanitization() {
        let mut allocator = IdentifierAllocator::seeded(1);
        assert!(allocator.allocate("").unwrap().starts_with("invent_"));
        assert!(allocator.allocate("when button-1!").unwrap().starts_with("whenbutton1_"));
        let digit = allocator.allocate("9lives").unwrap();
        assert!(digit.starts_with("_9lives_"));
        assert!(is_identifier(&digit));
    }

    #[test]
    fn test_seeded_allocators_repeat() {
        let mut a = IdentifierAllocator::seeded(42);
        let mut b = IdentifierAllocator::seeded(42);
        for _ in 0..5 {
            assert_eq!(a.allocate("subscribe").unwrap(), b.allocate("subscribe").unwrap());
        }
    }
}
