//! Validation results.
//!
//! A [`ValidationRecord`] is produced per distinct instance. It maps member keys to
//! [`Finding`]s and is valid exactly when it is empty. Records are shared handles: a record
//! handed out while still being populated (the back-edge case of a cyclic walk) catches up
//! with its owner once the walk unwinds.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    identity::{Identity, NodeId},
    record::{Member, Record},
};

/// Free-form payload describing why a member failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Message(String),
    Code { code: String, message: String },
    Detail(serde_json::Value),
}

impl Diagnostic {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Code {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn detail(detail: serde_json::Value) -> Self {
        Self::Detail(detail)
    }

    pub fn as_code(&self) -> Option<&str> {
        match self {
            Self::Code { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            Self::Code { code, message } => write!(f, "[{code}] {message}"),
            Self::Detail(detail) => write!(f, "{detail}"),
        }
    }
}

/// One failed member: what went wrong, where, and the value that triggered it.
pub struct FieldValidationRecord<R: Record> {
    diagnostic: Diagnostic,
    member: R::Member,
    value: R::Value,
}

impl<R: Record> FieldValidationRecord<R> {
    pub fn new(diagnostic: Diagnostic, member: R::Member, value: R::Value) -> Self {
        FieldValidationRecord {
            diagnostic,
            member,
            value,
        }
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub fn member(&self) -> R::Member {
        self.member
    }

    pub fn value(&self) -> &R::Value {
        &self.value
    }
}

impl<R: Record> Clone for FieldValidationRecord<R> {
    fn clone(&self) -> Self {
        FieldValidationRecord {
            diagnostic: self.diagnostic.clone(),
            member: self.member,
            value: self.value.clone(),
        }
    }
}

impl<R: Record> PartialEq for FieldValidationRecord<R> {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
            && self.diagnostic == other.diagnostic
            && self.value == other.value
    }
}

impl<R: Record> fmt::Debug for FieldValidationRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidationRecord")
            .field("diagnostic", &self.diagnostic)
            .field("member", &self.member)
            .field("value", &self.value)
            .finish()
    }
}

pub enum Finding<R: Record> {
    Field(FieldValidationRecord<R>),
    Nested(ValidationRecord<R>),
    /// Back-edge to a record that was still being populated when the edge was recorded.
    ///
    /// Held weakly: the ancestor already reaches this record through strong `Nested` links,
    /// so a cyclic record graph is released as soon as its root is dropped.
    Ancestor(WeakValidationRecord<R>),
}

impl<R: Record> Clone for Finding<R> {
    fn clone(&self) -> Self {
        match self {
            Finding::Field(field) => Finding::Field(field.clone()),
            Finding::Nested(record) => Finding::Nested(record.clone()),
            Finding::Ancestor(weak) => Finding::Ancestor(weak.clone()),
        }
    }
}

impl<R: Record> fmt::Debug for Finding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Field(field) => write!(f, "Field({field:?})"),
            Finding::Nested(record) => write!(f, "Nested({:?})", record),
            Finding::Ancestor(weak) => write!(f, "Ancestor({weak:?})"),
        }
    }
}

impl<R: Record> Finding<R> {
    pub fn as_field(&self) -> Option<&FieldValidationRecord<R>> {
        match self {
            Finding::Field(field) => Some(field),
            Finding::Nested(_) | Finding::Ancestor(_) => None,
        }
    }

    /// The nested record, upgrading an [Finding::Ancestor] link. `None` for field findings and
    /// for ancestors that have been dropped.
    pub fn as_nested(&self) -> Option<ValidationRecord<R>> {
        match self {
            Finding::Nested(record) => Some(record.clone()),
            Finding::Ancestor(weak) => weak.upgrade(),
            Finding::Field(_) => None,
        }
    }

    pub fn is_back_edge(&self) -> bool {
        matches!(self, Finding::Ancestor(_))
    }
}

/// Non-owning handle to a [ValidationRecord].
pub struct WeakValidationRecord<R: Record>(Weak<RefCell<BTreeMap<R::Member, Finding<R>>>>);

impl<R: Record> Clone for WeakValidationRecord<R> {
    fn clone(&self) -> Self {
        WeakValidationRecord(self.0.clone())
    }
}

impl<R: Record> fmt::Debug for WeakValidationRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(record) => write!(f, "{}", record.node_id()),
            None => write!(f, "dropped"),
        }
    }
}

impl<R: Record> WeakValidationRecord<R> {
    pub fn upgrade(&self) -> Option<ValidationRecord<R>> {
        self.0.upgrade().map(ValidationRecord)
    }
}

/// Per-instance mapping from member to [`Finding`]. Empty means valid.
pub struct ValidationRecord<R: Record>(Rc<RefCell<BTreeMap<R::Member, Finding<R>>>>);

impl<R: Record> Clone for ValidationRecord<R> {
    fn clone(&self) -> Self {
        ValidationRecord(self.0.clone())
    }
}

impl<R: Record> Default for ValidationRecord<R> {
    fn default() -> Self {
        ValidationRecord(Rc::default())
    }
}

impl<R: Record> Identity for ValidationRecord<R> {
    fn node_id(&self) -> NodeId {
        NodeId::of_rc(&self.0)
    }
}

// Lists members only; nested records may loop back to this one.
impl<R: Record> fmt::Debug for ValidationRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRecord")
            .field("id", &self.node_id())
            .field("members", &self.members())
            .finish()
    }
}

impl<R: Record> fmt::Display for ValidationRecord<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        for (idx, (path, field)) in self.flatten().iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{path}: {} (value: {:?})", field.diagnostic(), field.value())?;
        }
        Ok(())
    }
}

impl<R: Record> ValidationRecord<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_valid()
    }

    pub fn ptr_eq(&self, other: &ValidationRecord<R>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakValidationRecord<R> {
        WeakValidationRecord(Rc::downgrade(&self.0))
    }

    pub fn contains(&self, member: R::Member) -> bool {
        self.0.borrow().contains_key(&member)
    }

    pub fn get(&self, member: R::Member) -> Option<Finding<R>> {
        self.0.borrow().get(&member).cloned()
    }

    pub fn field(&self, member: R::Member) -> Option<FieldValidationRecord<R>> {
        self.get(member)
            .and_then(|finding| finding.as_field().cloned())
    }

    pub fn nested(&self, member: R::Member) -> Option<ValidationRecord<R>> {
        self.get(member).and_then(|finding| finding.as_nested())
    }

    pub fn members(&self) -> Vec<R::Member> {
        self.0.borrow().keys().copied().collect()
    }

    /// Snapshot of the current entries in member order.
    pub fn entries(&self) -> Vec<(R::Member, Finding<R>)> {
        self.0
            .borrow()
            .iter()
            .map(|(member, finding)| (*member, finding.clone()))
            .collect()
    }

    pub(crate) fn insert(&self, member: R::Member, finding: Finding<R>) {
        self.0.borrow_mut().insert(member, finding);
    }

    /// Every field finding reachable from this record, keyed by its dotted member path.
    ///
    /// Each distinct record is expanded once, so cyclic record graphs terminate; a finding
    /// reachable along several paths is reported under the first path visited.
    pub fn flatten(&self) -> Vec<(String, FieldValidationRecord<R>)> {
        let mut visited = BTreeSet::new();
        let mut flat = Vec::new();
        self.flatten_into("", &mut visited, &mut flat);
        flat
    }

    fn flatten_into(
        &self,
        prefix: &str,
        visited: &mut BTreeSet<NodeId>,
        flat: &mut Vec<(String, FieldValidationRecord<R>)>,
    ) {
        if !visited.insert(self.node_id()) {
            return;
        }
        for (member, finding) in self.entries() {
            let path = if prefix.is_empty() {
                member.name().to_string()
            } else {
                format!("{prefix}.{}", member.name())
            };
            match finding {
                Finding::Field(field) => flat.push((path, field)),
                Finding::Nested(record) => record.flatten_into(&path, visited, flat),
                Finding::Ancestor(weak) => {
                    if let Some(record) = weak.upgrade() {
                        record.flatten_into(&path, visited, flat);
                    }
                }
            }
        }
    }
}
