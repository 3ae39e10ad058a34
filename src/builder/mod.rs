//! Fluent builders and the engine that materializes them.
//!
//! - [`Builder`] - shared, mutable recipe for one record instance
//! - [`Slot`] - per-member recipe: a value, a nested builder, or a deferred [`ValueSource`]
//! - [`BuildEngine`] - walks a builder graph and produces the instance graph
//!
//! ## Cycles and sharing
//!
//! The engine keeps a [`BuildMemo`] from builder identity to the instance created for it. An
//! instance is registered before any of its members are populated, so a nested builder that
//! refers back to an ancestor resolves to the ancestor's (still incomplete) instance instead of
//! recursing. Two members that name the same builder receive the same instance.
//!
//! ```rust
//! use reweave_core::{builder::{BuildEngine, Builder}, record::Record};
//!
//! # async fn example<R: Record>(nested: R::Member) -> Result<(), reweave_core::ReweaveError> {
//! let a = Builder::<R>::new();
//! let b = Builder::<R>::new().with_nested(nested, &a);
//! a.set_nested(nested, &b);
//!
//! let instance = BuildEngine::default().build(&a).await?;
//! let back = instance.nested(nested)?.and_then(|b| b.nested(nested).ok().flatten());
//! assert!(back.is_some_and(|back| back.ptr_eq(&instance)));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod node;

pub use engine::{BuildEngine, BuildMemo};
pub use node::{Builder, Slot, ValueSource};
