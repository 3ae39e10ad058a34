//! Record capabilities: the narrow interface both engines depend on.
//!
//! A concrete record type describes itself with a [`Member`] enumeration and a [`Schema`], a
//! table from member to [`Access`] (how to assign and read that member). The engines iterate
//! the table; they never dispatch on the concrete type.
//!
//! Members are visited in their `Ord` order. Deriving `Ord` on a fieldless enum gives
//! declaration order, which is what every record in this crate's tests relies on.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    fmt,
    hash::Hash,
    rc::Rc,
};

use crate::{
    error::ReweaveError,
    identity::{Identity, NodeId},
};

/// Symbolic member key of a record type.
pub trait Member: Copy + Ord + Hash + fmt::Debug + 'static {
    /// Every member the record type declares.
    const ALL: &'static [Self];

    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|member| member.name() == name)
    }
}

pub trait Record: Default + 'static {
    type Member: Member;
    /// Scalar payload of non-nested members. The engines never convert between variants.
    type Value: Clone + fmt::Debug + PartialEq + 'static;

    fn schema() -> &'static Schema<Self>;
}

pub type ScalarSetter<R> = fn(&mut R, <R as Record>::Value) -> Result<(), ReweaveError>;
pub type ScalarGetter<R> = fn(&R) -> Option<<R as Record>::Value>;
pub type NestedSetter<R> = fn(&mut R, Option<Instance<R>>);
pub type NestedGetter<R> = fn(&R) -> Option<Instance<R>>;

pub enum Access<R: Record> {
    Scalar {
        set: ScalarSetter<R>,
        get: ScalarGetter<R>,
    },
    Nested {
        set: NestedSetter<R>,
        get: NestedGetter<R>,
    },
}

impl<R: Record> Clone for Access<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Record> Copy for Access<R> {}

impl<R: Record> Access<R> {
    pub fn kind(&self) -> &'static str {
        match self {
            Access::Scalar { .. } => "scalar",
            Access::Nested { .. } => "nested",
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Access::Nested { .. })
    }
}

impl<R: Record> fmt::Debug for Access<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Access::{}", self.kind())
    }
}

/// Capability table of one record type, built once and shared as a `'static`.
pub struct Schema<R: Record> {
    name: &'static str,
    members: BTreeMap<R::Member, Access<R>>,
}

impl<R: Record> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish()
    }
}

impl<R: Record> Schema<R> {
    pub fn builder(name: &'static str) -> SchemaBuilder<R> {
        SchemaBuilder {
            name,
            members: BTreeMap::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declares(&self, member: R::Member) -> bool {
        self.members.contains_key(&member)
    }

    pub fn access(&self, member: R::Member) -> Option<&Access<R>> {
        self.members.get(&member)
    }

    /// Like [Schema::access], but an undeclared member is a programmer error.
    pub fn require(&self, member: R::Member) -> Result<&Access<R>, ReweaveError> {
        self.members
            .get(&member)
            .ok_or_else(|| ReweaveError::UnsupportedMember {
                record: self.name.to_string(),
                member: member.name().to_string(),
            })
    }

    pub(crate) fn kind_error(&self, member: R::Member, expected: &str) -> ReweaveError {
        ReweaveError::MemberKind {
            record: self.name.to_string(),
            member: member.name().to_string(),
            expected: expected.to_string(),
        }
    }

    /// Declared members with their access, in member order.
    pub fn iter(&self) -> impl Iterator<Item = (R::Member, &Access<R>)> + '_ {
        self.members.iter().map(|(member, access)| (*member, access))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub struct SchemaBuilder<R: Record> {
    name: &'static str,
    members: BTreeMap<R::Member, Access<R>>,
}

impl<R: Record> SchemaBuilder<R> {
    pub fn scalar(mut self, member: R::Member, set: ScalarSetter<R>, get: ScalarGetter<R>) -> Self {
        self.members.insert(member, Access::Scalar { set, get });
        self
    }

    pub fn nested(mut self, member: R::Member, set: NestedSetter<R>, get: NestedGetter<R>) -> Self {
        self.members.insert(member, Access::Nested { set, get });
        self
    }

    pub fn finish(self) -> Schema<R> {
        for member in R::Member::ALL {
            if !self.members.contains_key(member) {
                tracing::debug!(
                    "[Schema::finish] {} declares no access for member '{}'",
                    self.name,
                    member.name()
                );
            }
        }
        Schema {
            name: self.name,
            members: self.members,
        }
    }
}

/// Shared handle to a constructed record.
///
/// Clones share one identity. Instance graphs may contain reference cycles; such a graph stays
/// allocated until one of its nested members is cleared.
pub struct Instance<R>(Rc<RefCell<R>>);

impl<R> Clone for Instance<R> {
    fn clone(&self) -> Self {
        Instance(self.0.clone())
    }
}

impl<R> Identity for Instance<R> {
    fn node_id(&self) -> NodeId {
        NodeId::of_rc(&self.0)
    }
}

// Never prints the record itself: a cyclic graph would recurse forever.
impl<R: Record> fmt::Debug for Instance<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance<{}>({})", R::schema().name(), self.node_id())
    }
}

impl<R: Record> Default for Instance<R> {
    fn default() -> Self {
        Instance::new(R::default())
    }
}

impl<R: Record> Instance<R> {
    pub fn new(record: R) -> Self {
        Instance(Rc::new(RefCell::new(record)))
    }

    pub fn borrow(&self) -> Ref<'_, R> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, R> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Instance<R>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn value(&self, member: R::Member) -> Result<Option<R::Value>, ReweaveError> {
        let schema = R::schema();
        match schema.require(member)? {
            Access::Scalar { get, .. } => Ok(get(&self.borrow())),
            Access::Nested { .. } => Err(schema.kind_error(member, "nested")),
        }
    }

    pub fn nested(&self, member: R::Member) -> Result<Option<Instance<R>>, ReweaveError> {
        let schema = R::schema();
        match schema.require(member)? {
            Access::Nested { get, .. } => Ok(get(&self.borrow())),
            Access::Scalar { .. } => Err(schema.kind_error(member, "scalar")),
        }
    }

    pub fn set_value(&self, member: R::Member, value: R::Value) -> Result<(), ReweaveError> {
        let schema = R::schema();
        match schema.require(member)? {
            Access::Scalar { set, .. } => set(&mut self.borrow_mut(), value),
            Access::Nested { .. } => Err(schema.kind_error(member, "nested")),
        }
    }

    pub fn set_nested(
        &self,
        member: R::Member,
        nested: Option<Instance<R>>,
    ) -> Result<(), ReweaveError> {
        let schema = R::schema();
        match schema.require(member)? {
            Access::Nested { set, .. } => {
                set(&mut self.borrow_mut(), nested);
                Ok(())
            }
            Access::Scalar { .. } => Err(schema.kind_error(member, "scalar")),
        }
    }
}
