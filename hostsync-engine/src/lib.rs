//! # hostsync-engine
//!
//! Change detection and crash-safe rewriting of a managed hosts file.
//!
//! [`Reconciler::reconcile`] is the single entrypoint: it compares the
//! observed host set against the set applied last cycle and, only when
//! membership actually changed, merges the observed entries with the
//! preserved pre-daemon baseline and replaces the target file in one
//! temp-file-then-rename write. An unchanged cycle touches no files.

pub mod baseline;
pub mod error;
pub mod preview;
pub mod reconciler;
mod writer;

pub use error::EngineError;
pub use reconciler::{ManagedSet, ReconcileOutcome, Reconciler};
