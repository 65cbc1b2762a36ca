//! Memoized cascade design
//!
//! Design is a pure function of (type, order, cutoff, sample rate), so
//! entries never need invalidating; a changed tuple is simply a new key.

use std::collections::HashMap;

use super::biquad::Cascade;
use super::butterworth::design;
use crate::error::Result;
use crate::model::FilterType;

/// Cache key; frequencies are compared bit-for-bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CascadeKey {
    pub filter_type: FilterType,
    pub order: usize,
    cutoff_bits: u64,
    sample_rate_bits: u64,
}

impl CascadeKey {
    pub fn new(filter_type: FilterType, order: usize, cutoff_hz: f64, sample_rate_hz: f64) -> Self {
        Self {
            filter_type,
            order,
            cutoff_bits: cutoff_hz.to_bits(),
            sample_rate_bits: sample_rate_hz.to_bits(),
        }
    }

    pub fn cutoff_hz(&self) -> f64 {
        f64::from_bits(self.cutoff_bits)
    }

    pub fn sample_rate_hz(&self) -> f64 {
        f64::from_bits(self.sample_rate_bits)
    }
}

/// Designed cascades keyed by their design inputs
#[derive(Debug, Default)]
pub struct CascadeCache {
    entries: HashMap<CascadeKey, Cascade>,
    hits: u64,
    misses: u64,
}

impl CascadeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached cascade or design and remember it. Failed designs are not cached.
    pub fn design(
        &mut self,
        filter_type: FilterType,
        order: usize,
        cutoff_hz: f64,
        sample_rate_hz: f64,
    ) -> Result<Cascade> {
        let key = CascadeKey::new(filter_type, order, cutoff_hz, sample_rate_hz);
        if let Some(cascade) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(cascade.clone());
        }

        let cascade = design(filter_type, order, cutoff_hz, sample_rate_hz)?;
        self.misses += 1;
        self.entries.insert(key, cascade.clone());
        Ok(cascade)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lookup_hits() {
        let mut cache = CascadeCache::new();
        let first = cache.design(FilterType::Lowpass, 4, 1000.0, 48000.0).unwrap();
        let second = cache.design(FilterType::Lowpass, 4, 1000.0, 48000.0).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_any_key_change_is_a_new_entry() {
        let mut cache = CascadeCache::new();
        cache.design(FilterType::Lowpass, 4, 1000.0, 48000.0).unwrap();
        cache.design(FilterType::Highpass, 4, 1000.0, 48000.0).unwrap();
        cache.design(FilterType::Lowpass, 6, 1000.0, 48000.0).unwrap();
        cache.design(FilterType::Lowpass, 4, 1001.0, 48000.0).unwrap();
        cache.design(FilterType::Lowpass, 4, 1000.0, 44100.0).unwrap();

        assert_eq!(cache.len(), 5);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_failed_design_not_cached() {
        let mut cache = CascadeCache::new();
        assert!(cache.design(FilterType::Lowpass, 3, 1000.0, 48000.0).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_round_trips_frequencies() {
        let key = CascadeKey::new(FilterType::Highpass, 2, 123.5, 96000.0);
        assert_eq!(key.cutoff_hz(), 123.5);
        assert_eq!(key.sample_rate_hz(), 96000.0);
    }

    #[test]
    fn test_clear() {
        let mut cache = CascadeCache::new();
        cache.design(FilterType::Lowpass, 2, 500.0, 48000.0).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }
}
