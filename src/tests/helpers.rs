//! Shared test fixtures: a small self-referential record type and its rules.

use once_cell::sync::Lazy;

use crate::{
    error::ReweaveError,
    record::{Instance, Member, Record, Schema},
    validation::{Diagnostic, RuleSet},
};

/// Initialize logging for tests
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleMember {
    Value,
    AnotherValue,
    NestedObject,
    Partner,
    /// Enumerated but given no access in the schema.
    Undeclared,
}

impl Member for SampleMember {
    const ALL: &'static [Self] = &[
        SampleMember::Value,
        SampleMember::AnotherValue,
        SampleMember::NestedObject,
        SampleMember::Partner,
        SampleMember::Undeclared,
    ];

    fn name(&self) -> &'static str {
        match self {
            SampleMember::Value => "value",
            SampleMember::AnotherValue => "anotherValue",
            SampleMember::NestedObject => "nestedObject",
            SampleMember::Partner => "partner",
            SampleMember::Undeclared => "undeclared",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Int(i64),
    Text(String),
}

impl From<i32> for SampleValue {
    fn from(value: i32) -> Self {
        SampleValue::Int(value.into())
    }
}

impl From<i64> for SampleValue {
    fn from(value: i64) -> Self {
        SampleValue::Int(value)
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        SampleValue::Text(value.to_string())
    }
}

#[derive(Default)]
pub struct Sample {
    pub value: i64,
    pub another_value: String,
    pub nested_object: Option<Instance<Sample>>,
    pub partner: Option<Instance<Sample>>,
}

fn kind_error(member: SampleMember, expected: &str) -> ReweaveError {
    ReweaveError::MemberKind {
        record: "Sample".to_string(),
        member: member.name().to_string(),
        expected: expected.to_string(),
    }
}

static SAMPLE_SCHEMA: Lazy<Schema<Sample>> = Lazy::new(|| {
    Schema::<Sample>::builder("Sample")
        .scalar(
            SampleMember::Value,
            |record, value| match value {
                SampleValue::Int(n) => {
                    record.value = n;
                    Ok(())
                }
                SampleValue::Text(_) => Err(kind_error(SampleMember::Value, "integer")),
            },
            |record| Some(SampleValue::Int(record.value)),
        )
        .scalar(
            SampleMember::AnotherValue,
            |record, value| match value {
                SampleValue::Text(text) => {
                    record.another_value = text;
                    Ok(())
                }
                SampleValue::Int(_) => Err(kind_error(SampleMember::AnotherValue, "text")),
            },
            |record| Some(SampleValue::Text(record.another_value.clone())),
        )
        .nested(
            SampleMember::NestedObject,
            |record, nested| record.nested_object = nested,
            |record| record.nested_object.clone(),
        )
        .nested(
            SampleMember::Partner,
            |record, nested| record.partner = nested,
            |record| record.partner.clone(),
        )
        .finish()
});

impl Record for Sample {
    type Member = SampleMember;
    type Value = SampleValue;

    fn schema() -> &'static Schema<Self> {
        &SAMPLE_SCHEMA
    }
}

/// `value` must be non-negative, `anotherValue` at least five characters long.
pub fn sample_rules() -> RuleSet<Sample> {
    RuleSet::<Sample>::new()
        .predicate(
            SampleMember::Value,
            Diagnostic::code("non_negative", "must not be negative"),
            |value| matches!(value, SampleValue::Int(n) if *n >= 0),
        )
        .predicate(
            SampleMember::AnotherValue,
            Diagnostic::code("min_length", "must be at least 5 characters"),
            |value| matches!(value, SampleValue::Text(text) if text.chars().count() >= 5),
        )
}

/// Breaks every nested edge reachable from `root` so cyclic instance graphs are released.
pub fn unlink(root: &Instance<Sample>) {
    let mut pending = vec![root.clone()];
    while let Some(instance) = pending.pop() {
        let (nested, partner) = {
            let mut record = instance.borrow_mut();
            (record.nested_object.take(), record.partner.take())
        };
        pending.extend(nested);
        pending.extend(partner);
    }
}
