//! Common types and utilities for the enumlint analyzer.
//!
//! This crate provides foundational types used across all enumlint crates:
//! - Source spans (`Span`)
//! - Position/Range types and the `LineMap` for line/column conversion
//! - Diagnostics with structured property maps
//! - Analyzer limits and thresholds
//! - Cooperative cancellation

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Location, Position, Range};

// Diagnostics shared by the checker, the code fixes and the CLI reporter
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, format_message};

// Centralized limits and thresholds
pub mod limits;

pub mod cancellation;
pub use cancellation::CancellationToken;

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;
#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod diagnostics_tests;
