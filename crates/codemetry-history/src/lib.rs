//! Git-backed commit history provider.
//!
//! Implements [`CommitHistoryProvider`] on top of git2, extracting per-commit
//! file changes with line counts, author info, and timestamps. All
//! version-control process details live behind this one collaborator so the
//! engine stays testable with synthetic fixtures.

pub mod provider;

pub use provider::GitHistoryProvider;

#[doc(no_inline)]
pub use codemetry_core::CommitHistoryProvider;
