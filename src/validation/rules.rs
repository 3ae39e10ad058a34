use std::{collections::BTreeMap, fmt};

use crate::{
    error::ReweaveError,
    record::{Member, Record},
    validation::Diagnostic,
};

/// A per-member predicate.
///
/// `Ok(None)` passes, `Ok(Some(_))` is a finding recorded by the validator, and `Err(_)` is a
/// fault in the rule itself. Faults are propagated to the caller of `validate` unchanged.
pub trait Rule<R: Record> {
    fn check(&self, value: &R::Value) -> Result<Option<Diagnostic>, ReweaveError>;
}

struct FnRule<F>(F);

impl<R, F> Rule<R> for FnRule<F>
where
    R: Record,
    F: Fn(&R::Value) -> Result<Option<Diagnostic>, ReweaveError>,
{
    fn check(&self, value: &R::Value) -> Result<Option<Diagnostic>, ReweaveError> {
        (self.0)(value)
    }
}

struct PredicateRule<F> {
    diagnostic: Diagnostic,
    pred: F,
}

impl<R, F> Rule<R> for PredicateRule<F>
where
    R: Record,
    F: Fn(&R::Value) -> bool,
{
    fn check(&self, value: &R::Value) -> Result<Option<Diagnostic>, ReweaveError> {
        Ok((!(self.pred)(value)).then(|| self.diagnostic.clone()))
    }
}

/// Rules keyed by member. At most one rule per member; inserting again replaces it.
pub struct RuleSet<R: Record> {
    rules: BTreeMap<R::Member, Box<dyn Rule<R>>>,
}

impl<R: Record> Default for RuleSet<R> {
    fn default() -> Self {
        RuleSet {
            rules: BTreeMap::default(),
        }
    }
}

impl<R: Record> fmt::Debug for RuleSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.rules.keys().map(|member| member.name()))
            .finish()
    }
}

impl<R: Record> RuleSet<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member: R::Member, rule: impl Rule<R> + 'static) {
        if self.rules.insert(member, Box::new(rule)).is_some() {
            tracing::debug!("[RuleSet::insert] replaced rule for '{}'", member.name());
        }
    }

    /// Adds a rule from a closure with the full [Rule] contract.
    pub fn rule<F>(mut self, member: R::Member, check: F) -> Self
    where
        F: Fn(&R::Value) -> Result<Option<Diagnostic>, ReweaveError> + 'static,
    {
        self.insert(member, FnRule(check));
        self
    }

    /// Adds a rule that reports `diagnostic` whenever `pred` returns false.
    pub fn predicate<F>(mut self, member: R::Member, diagnostic: Diagnostic, pred: F) -> Self
    where
        F: Fn(&R::Value) -> bool + 'static,
    {
        self.insert(member, PredicateRule { diagnostic, pred });
        self
    }

    pub fn get(&self, member: R::Member) -> Option<&dyn Rule<R>> {
        self.rules.get(&member).map(|rule| rule.as_ref())
    }

    pub fn members(&self) -> impl Iterator<Item = R::Member> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
