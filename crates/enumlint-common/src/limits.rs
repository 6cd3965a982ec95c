//! Centralized limits and thresholds for the analyzer.
//!
//! Keeping these in one place prevents the parser, the evaluator and the
//! fix-all loop from growing their own inconsistent copies.

/// Maximum nesting depth for parsed expressions.
///
/// The parser bails out with a diagnostic and an error node past this depth
/// so pathological inputs such as `((((((...))))))` cannot overflow the stack.
pub const MAX_EXPRESSION_DEPTH: u32 = 256;

/// Maximum depth for constant evaluation.
///
/// Bounds recursion through member and const references:
///
/// ```text
/// const int A = B + 1;
/// const int B = C + 1;
/// // ... hundreds of links ...
/// ```
///
/// Cycles are detected separately; this guards very long acyclic chains.
pub const MAX_EVALUATION_DEPTH: u32 = 512;

/// Maximum number of single-fix passes `fix_all` runs over one file.
///
/// Every pass fixes exactly one member and re-runs detection. A pass moves
/// the first collision of an enum forward, so an enum settles within one pass
/// per member; one that does not (`A = C, B = 1, C = 1`, where `A` follows
/// every fix of `C`) is restored and skipped. This cap bounds the whole file.
pub const MAX_FIX_ALL_PASSES: u32 = 10_000;

/// Maximum source file size, in bytes, the CLI will read.
///
/// Spans are `u32` byte offsets.
pub const MAX_SOURCE_FILE_BYTES: u64 = u32::MAX as u64;
