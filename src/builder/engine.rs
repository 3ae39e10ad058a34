use futures::future::{FutureExt, LocalBoxFuture};
use tokio_util::sync::CancellationToken;

use crate::{
    builder::{Builder, Slot},
    config::EngineConfig,
    error::ReweaveError,
    identity::{Identity, IdentityMemo},
    record::{Access, Instance, Member, Record},
    traversal::Traversal,
};

/// Memo threaded through one build: builder identity -> instance produced for it.
pub type BuildMemo<R> = IdentityMemo<Builder<R>, Instance<R>>;

/// Materializes [Builder] graphs into [Instance] graphs.
#[derive(Debug, Clone, Default)]
pub struct BuildEngine {
    config: EngineConfig,
}

impl BuildEngine {
    pub fn new(config: EngineConfig) -> Self {
        BuildEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds `root` with a fresh memo scoped to this call.
    pub async fn build<R: Record>(&self, root: &Builder<R>) -> Result<Instance<R>, ReweaveError> {
        let mut memo = BuildMemo::new();
        self.build_with(root, &mut memo, &CancellationToken::new())
            .await
    }

    /// Builds `root` against a caller-owned memo.
    ///
    /// Builders already present in `memo` resolve to their earlier instances. If the build
    /// fails or is cancelled, every memo entry added by this call is discarded; entries from
    /// earlier calls are kept.
    pub async fn build_with<R: Record>(
        &self,
        root: &Builder<R>,
        memo: &mut BuildMemo<R>,
        cancel: &CancellationToken,
    ) -> Result<Instance<R>, ReweaveError> {
        let checkpoint = memo.checkpoint();
        let mut walk = Traversal::new(&self.config, cancel);
        let result = self.visit(root, memo, &mut walk).await;
        match &result {
            Ok(instance) => tracing::debug!(
                "[BuildEngine::build_with] built {:?} from {} new builder nodes",
                instance,
                walk.visited()
            ),
            Err(e) => {
                let discarded = memo.rollback(checkpoint);
                tracing::warn!(
                    "[BuildEngine::build_with] build of {} aborted: {e}. Discarded {discarded} memo entries",
                    R::schema().name()
                );
            }
        }
        result
    }

    fn visit<'a, R: Record>(
        &'a self,
        node: &'a Builder<R>,
        memo: &'a mut BuildMemo<R>,
        walk: &'a mut Traversal,
    ) -> LocalBoxFuture<'a, Result<Instance<R>, ReweaveError>> {
        async move {
            if let Some(instance) = memo.get(node) {
                tracing::trace!("[BuildEngine] memo hit for builder {}", node.node_id());
                return Ok(instance);
            }
            walk.enter().await?;

            let schema = R::schema();
            let instance = Instance::new(R::default());
            // Registered before any member is populated, so a descendant that refers back to
            // `node` receives this same instance.
            memo.register(node, instance.clone());
            tracing::debug!(
                "[BuildEngine] building {:?} from builder {}",
                instance,
                node.node_id()
            );

            for (member, slot) in node.slots() {
                let access = schema.require(member)?;
                match (slot, access) {
                    (Slot::Value(value), Access::Scalar { set, .. }) => {
                        set(&mut instance.borrow_mut(), value)?;
                    }
                    (Slot::Deferred(source), Access::Scalar { set, .. }) => {
                        let value = walk.guard(source.resolve(member)).await?;
                        tracing::trace!("[BuildEngine] resolved {} = {:?}", member.name(), value);
                        set(&mut instance.borrow_mut(), value)?;
                    }
                    (Slot::Nested(child), Access::Nested { set, .. }) => {
                        let nested = self.visit(&child, memo, walk).await?;
                        set(&mut instance.borrow_mut(), Some(nested));
                    }
                    (Slot::Nested(_), Access::Scalar { .. }) => {
                        return Err(schema.kind_error(member, "scalar"));
                    }
                    (Slot::Value(_) | Slot::Deferred(_), Access::Nested { .. }) => {
                        return Err(schema.kind_error(member, "nested"));
                    }
                }
            }

            memo.complete(node);
            walk.leave();
            Ok(instance)
        }
        .boxed_local()
    }
}
