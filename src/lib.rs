//! # reweave-core
//!
//! Builders and validators for record graphs that refer back to themselves.
//!
//! ## Overview
//!
//! reweave-core constructs instances of user-defined record types through a fluent builder
//! protocol and recursively validates the constructed instances. Both the builder graph and the
//! instance graph may contain **cycles**: a node may be reachable from itself through a chain of
//! nested references. Both engines terminate on such graphs and preserve their shape.
//!
//! ### Key Features
//!
//! - **Identity memoization**: one output per distinct node *identity*, never per path
//! - **Cycle preservation**: a builder cycle becomes a genuine instance reference cycle
//! - **Cycle-transparent validity**: a cycle on its own never makes a graph invalid
//! - **Data-driven members**: records describe themselves with a [`record::Schema`] table
//! - **Cooperative async**: deferred member values, periodic yields and cancellation
//!
//! ## Architecture
//!
//! - **[`identity`]**: [`identity::IdentityMemo`], the reference-identity keyed memo both
//!   engines share
//! - **[`record`]**: the [`record::Record`] / [`record::Member`] capability interface and the
//!   [`record::Instance`] handle
//! - **[`builder`]**: [`builder::Builder`] recipes and the [`builder::BuildEngine`]
//! - **[`validation`]**: [`validation::Validator`], rules and validation records
//! - **[`config`]**: engine tuning, loadable from TOML
//!
//! ## The Memo Invariant
//!
//! Every traversal inserts a node's output into the memo **before** visiting the node's
//! children, and threads a single memo through the whole walk. A child that loops back to an
//! ancestor finds the ancestor's registered, still incomplete output and returns it. Builders
//! thereby produce the same instance for every path to one builder; validators produce one
//! shared record per instance.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reweave_core::{
//!     builder::{BuildEngine, Builder},
//!     record::{Instance, Member, Record, Schema},
//!     validation::{Diagnostic, RuleSet, Validator},
//!     ReweaveError,
//! };
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
//! enum NodeMember { Weight, Next }
//!
//! impl Member for NodeMember {
//!     const ALL: &'static [Self] = &[NodeMember::Weight, NodeMember::Next];
//!     fn name(&self) -> &'static str {
//!         match self { NodeMember::Weight => "weight", NodeMember::Next => "next" }
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Node { weight: i64, next: Option<Instance<Node>> }
//!
//! static SCHEMA: once_cell::sync::Lazy<Schema<Node>> = once_cell::sync::Lazy::new(|| {
//!     Schema::<Node>::builder("Node")
//!         .scalar(NodeMember::Weight, |n, v| { n.weight = v; Ok(()) }, |n| Some(n.weight))
//!         .nested(NodeMember::Next, |n, next| n.next = next, |n| n.next.clone())
//!         .finish()
//! });
//!
//! impl Record for Node {
//!     type Member = NodeMember;
//!     type Value = i64;
//!     fn schema() -> &'static Schema<Self> { &SCHEMA }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ReweaveError> {
//!     let a = Builder::<Node>::new().with_value(NodeMember::Weight, 3);
//!     let b = Builder::<Node>::new().with_value(NodeMember::Weight, -1);
//!     a.set_nested(NodeMember::Next, &b);
//!     b.set_nested(NodeMember::Next, &a);
//!
//!     let instance = BuildEngine::default().build(&a).await?;
//!
//!     let rules = RuleSet::<Node>::new().predicate(
//!         NodeMember::Weight,
//!         Diagnostic::message("weight must not be negative"),
//!         |w| *w >= 0,
//!     );
//!     let record = Validator::new(rules).validate(&instance).await?;
//!     assert!(!record.is_valid());
//!     println!("{record}"); // next.weight: weight must not be negative (value: -1)
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! All fallible operations return [`ReweaveError`]. Validation findings are *not* errors:
//! they are returned inside an `Ok` [`validation::ValidationRecord`]. `Err` signals a
//! programmer error (an undeclared or mis-kinded member, an absent root), a fault raised by a
//! rule or a deferred value source, or cancellation.
//!
//! ## Concurrency
//!
//! Instances, builders and records are `Rc`-based handles; the engines' futures are therefore
//! `!Send` and run on a current-thread runtime or a `tokio::task::LocalSet`. Siblings are
//! visited strictly in member order; the validator takes all nested members before any scalar
//! rule. A memo must not be shared by two traversals running at the same time.

pub mod builder;
pub mod config;
pub mod error;
pub mod identity;
pub mod record;
#[cfg(test)]
mod tests;
mod traversal;
pub mod validation;

pub use error::*;
