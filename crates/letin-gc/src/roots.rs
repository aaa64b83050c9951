use letin_value::Ref;

/// A source of GC roots: a running thread's registers and stack, or a
/// `letin-eval` memoization cache's live entries. Implemented outside this crate
/// (`letin-vm`, `letin-eval`) and registered with the collector so that marking
/// never has to know what a "thread context" or "memoization cache" is (§4.4).
pub trait GcRoots: Send + Sync {
    /// Append every [`Ref`] this source currently considers reachable to `out`.
    /// Called with the collector's stop-the-world guarantee in effect: the root
    /// source must not be mutated concurrently while this runs.
    fn collect_roots(&self, out: &mut Vec<Ref>);
}

/// A fork-safety participant, registered at one of the `FORK_HANDLER_PRIO_*`
/// priorities (`letin_value::consts`). `pre_fork` runs in ascending priority order
/// and should acquire whatever lock protects this participant's state; `post_fork`
/// runs in descending order and should release it, leaving both parent and child
/// with a consistent snapshot (§4.4, §5).
pub trait ForkHandler: Send + Sync {
    fn pre_fork(&self);
    fn post_fork(&self);
}
