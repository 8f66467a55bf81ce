//! Per-run memoization of loop-point resolution
//!
//! The same source often appears several times in one compilation (and across
//! the compilations of one run). Results are keyed by base source id because
//! alternate mixes share their timing. Failures are not cached.

use crate::error::Result;
use crate::metadata::base_source_id;
use crate::resolver::{LoopPointResolver, ResolvedLoopInterval};
use std::collections::HashMap;

/// Memoizing wrapper around [`LoopPointResolver`]
#[derive(Debug)]
pub struct ResolutionCache<'a> {
    resolver: LoopPointResolver<'a>,
    resolved: HashMap<String, ResolvedLoopInterval>,
    hits: usize,
}

impl<'a> ResolutionCache<'a> {
    pub fn new(resolver: LoopPointResolver<'a>) -> Self {
        Self {
            resolver,
            resolved: HashMap::new(),
            hits: 0,
        }
    }

    /// Resolve `id`, reusing an earlier result for the same base id
    pub fn resolve(&mut self, id: &str) -> Result<ResolvedLoopInterval> {
        let key = base_source_id(id);
        if let Some(interval) = self.resolved.get(key) {
            self.hits += 1;
            return Ok(*interval);
        }

        let interval = self.resolver.resolve(id)?;
        self.resolved.insert(key.to_string(), interval);
        Ok(interval)
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Number of distinct base ids resolved so far
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
