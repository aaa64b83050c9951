//! Stop-the-world, non-moving, mark-and-sweep garbage collection for the letin
//! virtual machine (§4.4).
//!
//! Roots are supplied by whoever owns them — a `letin-vm` thread context, a
//! `letin-eval` memoization cache — through the [`GcRoots`] trait, so this crate
//! has no dependency on either. Mutator threads cooperate with collection by
//! calling [`GarbageCollector::poll`] at safepoints instead of being preempted by
//! a signal, which is this crate's idiomatic-Rust substitute for the original's
//! `SIGUSR1`/`SIGUSR2` quiescence protocol.

mod collector;
mod config;
mod error;
mod header;
mod quiescence;
mod roots;
mod stats;

pub use collector::GarbageCollector;
pub use config::GcConfig;
pub use error::{GcError, Result};
pub use quiescence::Quiescence;
pub use roots::{ForkHandler, GcRoots};
pub use stats::GcStats;
