use futures::future::{FutureExt, LocalBoxFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    config::EngineConfig,
    error::ReweaveError,
    identity::{EntryState, Identity, IdentityMemo},
    record::{Access, Instance, Member, Record},
    traversal::Traversal,
    validation::{FieldValidationRecord, Finding, RuleSet, ValidationRecord},
};

/// Memo threaded through one validation: instance identity -> its record.
pub type ValidationMemo<R> = IdentityMemo<Instance<R>, ValidationRecord<R>>;

/// Recursively validates instance graphs against a [RuleSet].
///
/// Nested members are validated recursively first, then scalar members with a rule are
/// checked. A nested record is recorded only when it is invalid at the moment it is returned.
/// A back-edge therefore sees its ancestor's record before the ancestor's own field checks and
/// records nothing, so a cycle on its own never makes a graph invalid. A back-edge that is
/// recorded (the ancestor already failed through an earlier nested member) is held as a
/// weak [Finding::Ancestor] link.
pub struct Validator<R: Record> {
    rules: RuleSet<R>,
    config: EngineConfig,
}

impl<R: Record> std::fmt::Debug for Validator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("record", &R::schema().name())
            .field("rules", &self.rules)
            .field("config", &self.config)
            .finish()
    }
}

impl<R: Record> Validator<R> {
    pub fn new(rules: RuleSet<R>) -> Self {
        Validator {
            rules,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &RuleSet<R> {
        &self.rules
    }

    /// Validates `root` with a fresh memo scoped to this call.
    pub async fn validate(&self, root: &Instance<R>) -> Result<ValidationRecord<R>, ReweaveError> {
        let mut memo = ValidationMemo::new();
        self.validate_with(root, &mut memo, &CancellationToken::new())
            .await
    }

    /// Like [Validator::validate], for a root that may be absent.
    pub async fn validate_optional(
        &self,
        root: Option<&Instance<R>>,
    ) -> Result<ValidationRecord<R>, ReweaveError> {
        let Some(root) = root else {
            return Err(ReweaveError::NullInstance);
        };
        self.validate(root).await
    }

    /// Validates `root` against a caller-owned memo.
    ///
    /// Instances already present in `memo` resolve to their earlier records. If validation
    /// fails or is cancelled, every memo entry added by this call is discarded, so no
    /// partially populated record stays reachable through the memo.
    pub async fn validate_with(
        &self,
        root: &Instance<R>,
        memo: &mut ValidationMemo<R>,
        cancel: &CancellationToken,
    ) -> Result<ValidationRecord<R>, ReweaveError> {
        let checkpoint = memo.checkpoint();
        let result = self.validate_inner(root, memo, cancel).await;
        if let Err(e) = &result {
            let discarded = memo.rollback(checkpoint);
            tracing::warn!(
                "[Validator::validate_with] validation of {root:?} aborted: {e}. Discarded {discarded} memo entries"
            );
        }
        result
    }

    async fn validate_inner(
        &self,
        root: &Instance<R>,
        memo: &mut ValidationMemo<R>,
        cancel: &CancellationToken,
    ) -> Result<ValidationRecord<R>, ReweaveError> {
        let schema = R::schema();
        for member in self.rules.members() {
            if schema.require(member)?.is_nested() {
                return Err(schema.kind_error(member, "nested"));
            }
        }

        let mut walk = Traversal::new(&self.config, cancel);
        let record = self.visit(root, memo, &mut walk).await?;
        tracing::debug!(
            "[Validator::validate_with] {root:?} visited {} new instances, valid: {}",
            walk.visited(),
            record.is_valid()
        );
        Ok(record)
    }

    fn visit<'a>(
        &'a self,
        instance: &'a Instance<R>,
        memo: &'a mut ValidationMemo<R>,
        walk: &'a mut Traversal,
    ) -> LocalBoxFuture<'a, Result<ValidationRecord<R>, ReweaveError>> {
        async move {
            if let Some(record) = memo.get(instance) {
                tracing::trace!(
                    "[Validator] memo hit for {:?} (complete: {})",
                    instance,
                    memo.is_complete(instance)
                );
                return Ok(record);
            }
            walk.enter().await?;

            let record = ValidationRecord::new();
            memo.register(instance, record.clone());
            let schema = R::schema();

            // Every nested member is validated before any scalar rule of this instance runs.
            for (member, access) in schema.iter() {
                let Access::Nested { get, .. } = access else {
                    continue;
                };
                let Some(nested) = get(&instance.borrow()) else {
                    continue;
                };
                let back_edge = memo.state(&nested) == Some(EntryState::InProgress);
                let nested_record = self.visit(&nested, memo, walk).await?;
                if nested_record.is_valid() {
                    tracing::trace!(
                        "[Validator] {}.{} -> {:?} currently valid, not recorded",
                        instance.node_id(),
                        member.name(),
                        nested
                    );
                } else if back_edge {
                    record.insert(member, Finding::Ancestor(nested_record.downgrade()));
                } else {
                    record.insert(member, Finding::Nested(nested_record));
                }
            }

            for (member, access) in schema.iter() {
                let Access::Scalar { get, .. } = access else {
                    continue;
                };
                let Some(rule) = self.rules.get(member) else {
                    continue;
                };
                let Some(value) = get(&instance.borrow()) else {
                    continue;
                };
                if let Some(diagnostic) = rule.check(&value)? {
                    tracing::debug!(
                        "[Validator] {:?}.{} failed: {}",
                        instance,
                        member.name(),
                        diagnostic
                    );
                    record.insert(
                        member,
                        Finding::Field(FieldValidationRecord::new(diagnostic, member, value)),
                    );
                }
            }

            memo.complete(instance);
            walk.leave();
            Ok(record)
        }
        .boxed_local()
    }
}
