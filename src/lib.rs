//! # commitgate - Pre-commit Check Runner
//!
//! commitgate runs the formatters, linters and content scanners a C/C++
//! project expects before a commit, in parallel, and writes one report.
//!
//! ## Features
//!
//! - **Scoped Selection**: Staged files, edited files, or the whole tree
//! - **Two Phases**: In-place formatters first, then analyzers and scanners
//! - **Fault Isolation**: A broken check becomes a `Script Error`, never a crash
//! - **Stable Report**: Markdown summary table plus per-check details
//!
//! ## Quick Start
//!
//! ```bash
//! # Check what is staged
//! commitgate
//!
//! # Check every tracked file
//! commitgate --check-git-tree
//! ```
//!
//! ## Module Organization
//!
//! - [`selection`] - Git-backed file selection
//! - [`probe`] - Tool discovery on the search path
//! - [`checker`] - Checks, results and the parallel aggregator
//! - [`gate`] - The two-phase run
//! - [`report`] - Report rendering

/// Checks, their results, and the parallel aggregator.
pub mod checker;

/// Configuration file parsing (`commitgate.toml`).
pub mod config;

/// Check-level error taxonomy.
pub mod error;

/// Two-phase gate run.
pub mod gate;

/// External tool discovery.
pub mod probe;

/// Report rendering and persistence.
pub mod report;

/// File selection from the git index and work tree.
pub mod selection;

/// Terminal UI utilities (tables).
pub mod ui;
