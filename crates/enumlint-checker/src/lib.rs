//! Duplicate enum value analysis.
//!
//! - `evaluator` - `ConstantEvaluator` trait, `SemanticModel` and `ProjectIndex`
//! - `detector` - `OptInMarker` gate and `find_duplicate`
//! - `rule` - the immutable `RuleDescriptor`
//! - `checker` - runs the detector over a file and emits diagnostics

pub mod evaluator;
pub use evaluator::{ConstantEvaluator, EvalError, ProjectIndex, SemanticModel};

pub mod detector;
pub use detector::{DuplicateFinding, OptInMarker, find_duplicate, member_values};

pub mod rule;
pub use rule::{DEFAULT_RULE_ID, MAX_VALUE_PROPERTY, MEMBER_NAME_PROPERTY, RuleDescriptor};

pub mod checker;
pub use checker::{Checker, FileCheck};

#[cfg(test)]
#[path = "tests/evaluator_tests.rs"]
mod evaluator_tests;
#[cfg(test)]
#[path = "tests/marker_tests.rs"]
mod marker_tests;
