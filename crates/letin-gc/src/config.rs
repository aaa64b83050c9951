use crate::error::GcError;

/// Tuning knobs for the stop-the-world collector.
///
/// Unlike `fgc`'s concurrent mark-compact config (heap regions, TLABs, NUMA,
/// generational ratios), this collector has exactly one knob that matters for
/// correctness — how much to allocate before triggering a collection — plus a
/// couple of observability toggles. The `from_env`/`validate` shape is kept from
/// the teacher's config module even though the field list is much smaller.
#[derive(Debug, Clone, PartialEq)]
pub struct GcConfig {
    /// Trigger a collection once this many bytes have been allocated since the
    /// last cycle. `0` disables automatic collection (tests that want to call
    /// `collect()` explicitly set this).
    pub collect_threshold_bytes: usize,
    /// Upper bound on live heap size; exceeding it after a collection reports
    /// `OUT_OF_MEMORY` to the running program rather than growing unbounded.
    pub max_heap_bytes: usize,
    /// Emit `tracing` events for each collection cycle's phases.
    pub verbose: bool,
    /// Keep a running [`crate::stats::GcStats`] snapshot.
    pub stats_enabled: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            collect_threshold_bytes: 4 * 1024 * 1024,
            max_heap_bytes: 1024 * 1024 * 1024,
            verbose: false,
            stats_enabled: true,
        }
    }
}

impl GcConfig {
    pub fn validate(&self) -> Result<(), GcError> {
        if self.max_heap_bytes == 0 {
            return Err(GcError::InvalidConfig {
                field: "max_heap_bytes",
                constraint: "nonzero",
                value: self.max_heap_bytes.to_string(),
            });
        }
        if self.collect_threshold_bytes > self.max_heap_bytes {
            return Err(GcError::InvalidConfig {
                field: "collect_threshold_bytes",
                constraint: "<= max_heap_bytes",
                value: self.collect_threshold_bytes.to_string(),
            });
        }
        Ok(())
    }

    /// Overlay `LETIN_GC_COLLECT_THRESHOLD`, `LETIN_GC_MAX_HEAP`, `LETIN_GC_VERBOSE`
    /// onto the defaults, the way `letin-run` wires environment-driven overrides
    /// for every other ambient setting.
    pub fn from_env() -> Self {
        let mut cfg = GcConfig::default();
        if let Ok(v) = std::env::var("LETIN_GC_COLLECT_THRESHOLD") {
            if let Ok(n) = v.parse() {
                cfg.collect_threshold_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("LETIN_GC_MAX_HEAP") {
            if let Ok(n) = v.parse() {
                cfg.max_heap_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("LETIN_GC_VERBOSE") {
            cfg.verbose = v == "1" || v.eq_ignore_ascii_case("true");
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GcConfig::default().validate().unwrap();
    }

    #[test]
    fn threshold_above_max_heap_is_rejected() {
        let cfg = GcConfig { collect_threshold_bytes: 10, max_heap_bytes: 5, ..GcConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
