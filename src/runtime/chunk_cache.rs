use std::collections::HashMap;

use log::debug;
use sha2::{Digest, Sha256};

use crate::frontend::{self, Chunk, SyntaxError};

/// Parsed chunks keyed by the SHA-256 of chunk name and source.
#[derive(Debug, Default)]
pub struct ChunkCache {
    chunks: HashMap<[u8; 32], Chunk>,
    hits: usize,
    misses: usize,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached parse of `source`, parsing and storing it on a miss.
    /// Sources that fail to parse are not cached.
    pub fn get_or_parse(&mut self, source: &str, chunk_name: &str) -> Result<Chunk, SyntaxError> {
        let key = chunk_key(source, chunk_name);
        if let Some(chunk) = self.chunks.get(&key) {
            self.hits += 1;
            debug!("chunk cache hit: {}", chunk_name);
            return Ok(chunk.clone());
        }

        self.misses += 1;
        debug!("chunk cache miss: {}", chunk_name);
        let chunk = frontend::parse_chunk(source, chunk_name)?;
        self.chunks.insert(key, chunk.clone());
        Ok(chunk)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

fn chunk_key(source: &str, chunk_name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chunk_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_source_hits() {
        let mut cache = ChunkCache::new();
        cache.get_or_parse("return 1", "a").unwrap();
        cache.get_or_parse("return 1", "a").unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_name_is_part_of_key() {
        let mut cache = ChunkCache::new();
        cache.get_or_parse("return 1", "a").unwrap();
        cache.get_or_parse("return 1", "b").unwrap();
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_syntax_errors_are_not_cached() {
        let mut cache = ChunkCache::new();
        assert!(cache.get_or_parse("return +", "a").is_err());
        assert!(cache.is_empty());
    }
}
