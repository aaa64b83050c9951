use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Informational GC counters, exposed for host-side introspection. Never
/// load-bearing for correctness — the collector works identically whether or not
/// anyone reads these.
#[derive(Default)]
pub struct GcStats {
    cycles_run: AtomicU64,
    objects_freed: AtomicU64,
    bytes_freed: AtomicU64,
    live_objects: AtomicUsize,
    last_pause: AtomicU64,
}

impl GcStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_cycle(&self, objects_freed: u64, bytes_freed: u64, live_objects: usize, pause: Duration) {
        self.cycles_run.fetch_add(1, Ordering::Relaxed);
        self.objects_freed.fetch_add(objects_freed, Ordering::Relaxed);
        self.bytes_freed.fetch_add(bytes_freed, Ordering::Relaxed);
        self.live_objects.store(live_objects, Ordering::Relaxed);
        self.last_pause.store(pause.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run.load(Ordering::Relaxed)
    }

    pub fn objects_freed(&self) -> u64 {
        self.objects_freed.load(Ordering::Relaxed)
    }

    pub fn bytes_freed(&self) -> u64 {
        self.bytes_freed.load(Ordering::Relaxed)
    }

    pub fn live_objects(&self) -> usize {
        self.live_objects.load(Ordering::Relaxed)
    }

    pub fn last_pause_micros(&self) -> u64 {
        self.last_pause.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_across_cycles() {
        let stats = GcStats::new();
        stats.record_cycle(3, 96, 10, Duration::from_micros(50));
        stats.record_cycle(2, 64, 8, Duration::from_micros(30));
        assert_eq!(stats.cycles_run(), 2);
        assert_eq!(stats.objects_freed(), 5);
        assert_eq!(stats.bytes_freed(), 160);
        assert_eq!(stats.live_objects(), 8);
        assert_eq!(stats.last_pause_micros(), 30);
    }
}
