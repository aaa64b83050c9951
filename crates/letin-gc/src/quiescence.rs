use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Cooperative stop-the-world coordination.
///
/// The original collector stops mutator threads with `SIGUSR1`/`SIGUSR2` and a
/// per-thread signal handler spinning on a shared `is_continuing` flag (§4.4).
/// Signal-based suspension has no safe, portable idiom in Rust; this is the
/// standard polling-safepoint substitute (the same shape as `fgc`'s
/// `SafepointManager`, but parked on a `Condvar` instead of busy-sleeping): a
/// mutator thread calls [`Quiescence::poll`] at loop back-edges and calls, and
/// blocks there for the duration of a collection.
pub struct Quiescence {
    collect_requested: AtomicBool,
    registered: AtomicUsize,
    parked: AtomicUsize,
    gate: Mutex<()>,
    cv: Condvar,
}

impl Quiescence {
    pub fn new() -> Self {
        Quiescence {
            collect_requested: AtomicBool::new(false),
            registered: AtomicUsize::new(0),
            parked: AtomicUsize::new(0),
            gate: Mutex::new(()),
            cv: Condvar::new(),
        }
    }

    pub fn register_thread(&self) {
        self.registered.fetch_add(1, Ordering::SeqCst);
    }

    /// Must be called by a thread that is about to exit, never while parked.
    pub fn unregister_thread(&self) {
        self.registered.fetch_sub(1, Ordering::SeqCst);
        // A stop-the-world request waiting on `parked == registered` may now be
        // satisfied purely by this thread disappearing.
        let guard = self.gate.lock();
        self.cv.notify_all();
        drop(guard);
    }

    /// Call at a safepoint (loop back-edge, call boundary). Blocks here for the
    /// duration of any in-progress collection, then returns.
    pub fn poll(&self) {
        if !self.collect_requested.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.gate.lock();
        self.parked.fetch_add(1, Ordering::SeqCst);
        self.cv.notify_all();
        while self.collect_requested.load(Ordering::Acquire) {
            self.cv.wait(&mut guard);
        }
        self.parked.fetch_sub(1, Ordering::SeqCst);
    }

    /// Request a stop-the-world pause and block until every registered thread is
    /// parked in [`poll`]. Returns a guard; dropping it resumes the world.
    pub fn stop_world(&self) -> StopTheWorldGuard<'_> {
        self.collect_requested.store(true, Ordering::Release);
        let mut guard = self.gate.lock();
        while self.parked.load(Ordering::SeqCst) < self.registered.load(Ordering::SeqCst) {
            self.cv.wait(&mut guard);
        }
        drop(guard);
        StopTheWorldGuard { quiescence: self }
    }
}

impl Default for Quiescence {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StopTheWorldGuard<'a> {
    quiescence: &'a Quiescence,
}

impl Drop for StopTheWorldGuard<'_> {
    fn drop(&mut self) {
        let guard = self.quiescence.gate.lock();
        self.quiescence.collect_requested.store(false, Ordering::Release);
        self.quiescence.cv.notify_all();
        drop(guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn stop_world_waits_for_every_registered_thread_to_park() {
        let q = Arc::new(Quiescence::new());
        q.register_thread();
        q.register_thread();

        let q2 = q.clone();
        let parked_first = Arc::new(AtomicBool::new(false));
        let parked_first2 = parked_first.clone();
        let handle = thread::spawn(move || {
            // Simulate a mutator thread reaching a safepoint shortly after a stop
            // is requested.
            thread::sleep(Duration::from_millis(20));
            parked_first2.store(true, Ordering::SeqCst);
            q2.poll();
        });

        let guard = q.stop_world();
        assert!(parked_first.load(Ordering::SeqCst));
        drop(guard);
        handle.join().unwrap();
    }

    #[test]
    fn unregistering_a_thread_can_unblock_a_pending_stop() {
        let q = Arc::new(Quiescence::new());
        q.register_thread();
        q.register_thread();

        let q2 = q.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            q2.unregister_thread();
        });

        let _guard = q.stop_world();
        handle.join().unwrap();
    }
}
