//! Recursive, cycle-safe validation of instance graphs.
//!
//! - [`Validator`] - walks an instance graph and produces one [`ValidationRecord`] per
//!   distinct instance
//! - [`RuleSet`] / [`Rule`] - per-member predicates supplied by the domain model
//! - [`ValidationRecord`], [`Finding`], [`FieldValidationRecord`], [`Diagnostic`] - results
//!
//! Validation findings are data, not errors: `validate` returns `Ok` with an invalid record
//! when rules fail, and `Err` only for programmer errors, rule faults and cancellation.

pub mod engine;
pub mod record;
pub mod rules;

pub use engine::{ValidationMemo, Validator};
pub use record::{
    Diagnostic, FieldValidationRecord, Finding, ValidationRecord, WeakValidationRecord,
};
pub use rules::{Rule, RuleSet};
