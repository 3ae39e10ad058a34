//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use once_cell::sync::Lazy;
use reweave_core::{
    builder::Builder,
    record::{Instance, Member, Record, Schema},
    validation::{Diagnostic, RuleSet},
    ReweaveError,
};
use serde_json::json;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmployeeField {
    Name,
    Age,
    Manager,
    Mentor,
}

impl Member for EmployeeField {
    const ALL: &'static [Self] = &[
        EmployeeField::Name,
        EmployeeField::Age,
        EmployeeField::Manager,
        EmployeeField::Mentor,
    ];

    fn name(&self) -> &'static str {
        match self {
            EmployeeField::Name => "name",
            EmployeeField::Age => "age",
            EmployeeField::Manager => "manager",
            EmployeeField::Mentor => "mentor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Number(i64),
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Text(value.to_string())
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Number(value)
    }
}

#[derive(Default)]
pub struct Employee {
    pub name: String,
    pub age: i64,
    pub manager: Option<Instance<Employee>>,
    pub mentor: Option<Instance<Employee>>,
}

fn wrong_kind(field: EmployeeField, expected: &str) -> ReweaveError {
    ReweaveError::MemberKind {
        record: "Employee".to_string(),
        member: field.name().to_string(),
        expected: expected.to_string(),
    }
}

static EMPLOYEE_SCHEMA: Lazy<Schema<Employee>> = Lazy::new(|| {
    Schema::<Employee>::builder("Employee")
        .scalar(
            EmployeeField::Name,
            |employee, value| match value {
                Field::Text(name) => {
                    employee.name = name;
                    Ok(())
                }
                Field::Number(_) => Err(wrong_kind(EmployeeField::Name, "text")),
            },
            |employee| Some(Field::Text(employee.name.clone())),
        )
        .scalar(
            EmployeeField::Age,
            |employee, value| match value {
                Field::Number(age) => {
                    employee.age = age;
                    Ok(())
                }
                Field::Text(_) => Err(wrong_kind(EmployeeField::Age, "number")),
            },
            |employee| Some(Field::Number(employee.age)),
        )
        .nested(
            EmployeeField::Manager,
            |employee, manager| employee.manager = manager,
            |employee| employee.manager.clone(),
        )
        .nested(
            EmployeeField::Mentor,
            |employee, mentor| employee.mentor = mentor,
            |employee| employee.mentor.clone(),
        )
        .finish()
});

impl Record for Employee {
    type Member = EmployeeField;
    type Value = Field;

    fn schema() -> &'static Schema<Self> {
        &EMPLOYEE_SCHEMA
    }
}

#[allow(dead_code)]
pub fn employee(name: &str, age: i64) -> Builder<Employee> {
    Builder::new()
        .with_value(EmployeeField::Name, name)
        .with_value(EmployeeField::Age, age)
}

/// Names must be non-blank; ages between 16 and 100.
#[allow(dead_code)]
pub fn employee_rules() -> RuleSet<Employee> {
    RuleSet::<Employee>::new()
        .predicate(
            EmployeeField::Name,
            Diagnostic::code("blank_name", "name must not be blank"),
            |value| matches!(value, Field::Text(name) if !name.trim().is_empty()),
        )
        .rule(EmployeeField::Age, |value| match value {
            Field::Number(age) if (16..=100).contains(age) => Ok(None),
            Field::Number(age) => Ok(Some(Diagnostic::detail(
                json!({"rule": "age_range", "min": 16, "max": 100, "actual": age}),
            ))),
            Field::Text(_) => Err(ReweaveError::rule("age", "age stored as text")),
        })
}

/// Clears every manager/mentor edge reachable from `root` so cyclic graphs are released.
#[allow(dead_code)]
pub fn release(root: &Instance<Employee>) {
    let mut pending = vec![root.clone()];
    while let Some(instance) = pending.pop() {
        let mut employee = instance.borrow_mut();
        pending.extend(employee.manager.take());
        pending.extend(employee.mentor.take());
    }
}
