use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use async_trait::async_trait;

use crate::{
    error::ReweaveError,
    identity::{Identity, NodeId},
    record::{Member, Record},
};

/// Asynchronous provider of one scalar member value, awaited while the builder is consumed.
#[async_trait(?Send)]
pub trait ValueSource<R: Record> {
    async fn resolve(&self, member: R::Member) -> Result<R::Value, ReweaveError>;
}

/// A builder's recipe for one member.
pub enum Slot<R: Record> {
    Value(R::Value),
    Nested(Builder<R>),
    Deferred(Rc<dyn ValueSource<R>>),
}

impl<R: Record> Clone for Slot<R> {
    fn clone(&self) -> Self {
        match self {
            Slot::Value(value) => Slot::Value(value.clone()),
            Slot::Nested(builder) => Slot::Nested(builder.clone()),
            Slot::Deferred(source) => Slot::Deferred(source.clone()),
        }
    }
}

impl<R: Record> fmt::Debug for Slot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Value(value) => write!(f, "Value({value:?})"),
            Slot::Nested(builder) => write!(f, "Nested({})", builder.node_id()),
            Slot::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// Deferred recipe for one `R` instance.
///
/// `Builder` is a shared handle: clones refer to the same node, and a node may be nested into
/// itself or into any of its descendants. Within one build, every path that reaches the same
/// node yields the same [crate::record::Instance].
///
/// ```rust
/// # use reweave_core::builder::Builder;
/// # fn example<R: reweave_core::record::Record>(nested: R::Member, value: R::Member, v: R::Value) {
/// let root = Builder::<R>::new().with_value(value, v);
/// root.set_nested(nested, &root); // self-reference
/// # }
/// ```
pub struct Builder<R: Record>(Rc<RefCell<BTreeMap<R::Member, Slot<R>>>>);

impl<R: Record> Clone for Builder<R> {
    fn clone(&self) -> Self {
        Builder(self.0.clone())
    }
}

impl<R: Record> Default for Builder<R> {
    fn default() -> Self {
        Builder(Rc::default())
    }
}

impl<R: Record> Identity for Builder<R> {
    fn node_id(&self) -> NodeId {
        NodeId::of_rc(&self.0)
    }
}

impl<R: Record> fmt::Debug for Builder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("id", &self.node_id())
            .field("slots", &self.0.borrow())
            .finish()
    }
}

impl<R: Record> Builder<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, member: R::Member, slot: Slot<R>) -> &Self {
        tracing::trace!("[Builder::set] {} <- {:?}", member.name(), slot);
        self.0.borrow_mut().insert(member, slot);
        self
    }

    pub fn set_value(&self, member: R::Member, value: impl Into<R::Value>) -> &Self {
        self.set(member, Slot::Value(value.into()))
    }

    pub fn set_nested(&self, member: R::Member, nested: &Builder<R>) -> &Self {
        self.set(member, Slot::Nested(nested.clone()))
    }

    pub fn set_deferred<S>(&self, member: R::Member, source: S) -> &Self
    where
        S: ValueSource<R> + 'static,
    {
        self.set(member, Slot::Deferred(Rc::new(source)))
    }

    pub fn with_value(self, member: R::Member, value: impl Into<R::Value>) -> Self {
        self.set_value(member, value);
        self
    }

    pub fn with_nested(self, member: R::Member, nested: &Builder<R>) -> Self {
        self.set_nested(member, nested);
        self
    }

    pub fn with_deferred<S>(self, member: R::Member, source: S) -> Self
    where
        S: ValueSource<R> + 'static,
    {
        self.set_deferred(member, source);
        self
    }

    /// Removes a member's recipe. Clearing a nested slot is how a cyclic builder graph is
    /// broken for deallocation.
    pub fn clear(&self, member: R::Member) -> Option<Slot<R>> {
        self.0.borrow_mut().remove(&member)
    }

    pub fn slot(&self, member: R::Member) -> Option<Slot<R>> {
        self.0.borrow().get(&member).cloned()
    }

    /// Snapshot of every slot in member order.
    pub fn slots(&self) -> Vec<(R::Member, Slot<R>)> {
        self.0
            .borrow()
            .iter()
            .map(|(member, slot)| (*member, slot.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}
