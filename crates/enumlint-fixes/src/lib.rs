//! Fixes for duplicate enum values.
//!
//! - `plan` - computes the `max + 1` edit for one flagged member
//! - `code_fix` - the diagnostic-driven code fix provider
//! - `apply` - applying text changes and the fix-all loop

pub mod error;
pub use error::FixError;

pub mod plan;
pub use plan::{FixKind, FixPlan, plan_fix, plan_for_finding};

pub mod code_fix;
pub use code_fix::{
    CodeFixFileChange, CodeFixInfo, CodeFixPosition, CodeFixProvider, CodeFixTextChange,
    FIX_ALL_DESCRIPTION, FIX_DESCRIPTION, FIX_ID, FIX_NAME,
};

pub mod apply;
pub use apply::{
    AppliedFix, FailedFix, FixAllResult, apply_text_changes, fix_all, fix_all_in_project,
};

#[cfg(test)]
#[path = "tests/plan_tests.rs"]
mod plan_tests;
#[cfg(test)]
#[path = "tests/code_fix_tests.rs"]
mod code_fix_tests;
