// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// A point-in-time snapshot of cache counters.
///
/// `hits` and `misses` count in-process lookups. A remote hit is an in-process miss that
/// was answered by the remote tier; it is also counted in `remote_hits`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CacheStats {
    /// In-process lookups that found a live entry.
    pub hits: u64,
    /// In-process lookups that found nothing or an expired entry.
    pub misses: u64,
    /// `hits / (hits + misses)`, or `0.0` before the first lookup.
    pub hit_rate: f64,
    /// Number of in-process entries.
    pub size: usize,
    /// Live in-process keys, oldest insertion first.
    pub keys: Vec<String>,
    /// Lookups answered by the remote tier.
    pub remote_hits: u64,
    /// Producer invocations.
    pub loads: u64,
}

#[expect(clippy::cast_precision_loss, reason = "a ratio does not need every bit of the counters")]
pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits.saturating_add(misses);
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}
