//! 事务性用例（Transactional Use Case）
//!
//! 用例执行分两步：
//! 1. `validate`：在事务外校验输入，失败直接返回 `AppError::Validation`；
//! 2. `execute`：在 `UnitOfWorkPerformer::perform` 提供的事务内写入业务变更并追加事件。
//!
//! `execute` 返回错误时事务回滚，已追加的事件不会进入 Outbox。
//!
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use futures_util::FutureExt;
use outbox_domain::persist::{UnitOfWork, UnitOfWorkPerformer};
use std::sync::Arc;

#[async_trait]
pub trait TransactionalUseCase: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// 用例名称（用于日志）
    fn name(&self) -> &'static str;

    fn validate(&self, _input: &Self::Input) -> AppResult<()> {
        Ok(())
    }

    async fn execute(
        &self,
        input: Self::Input,
        uow: &mut dyn UnitOfWork,
        ctx: &AppContext,
    ) -> AppResult<Self::Output>;
}

/// 用例执行器：校验输入后在新事务中执行用例
pub struct UseCaseRunner<P> {
    performer: P,
}

impl<P> UseCaseRunner<P>
where
    P: UnitOfWorkPerformer,
{
    pub fn new(performer: P) -> Self {
        Self { performer }
    }

    pub async fn run<U>(
        &self,
        use_case: Arc<U>,
        input: U::Input,
        ctx: AppContext,
    ) -> AppResult<U::Output>
    where
        U: TransactionalUseCase,
    {
        let name = use_case.name();

        if let Err(err) = use_case.validate(&input) {
            tracing::debug!(use_case = name, error = %err, "use case input rejected");
            return Err(err);
        }

        let correlation_id = ctx.correlation_id.clone().unwrap_or_default();
        let result = self
            .performer
            .perform(move |uow| async move { use_case.execute(input, uow, &ctx).await }.boxed())
            .await;

        match &result {
            Ok(_) => tracing::debug!(use_case = name, %correlation_id, "use case committed"),
            Err(AppError::Validation(reason)) => {
                tracing::debug!(use_case = name, %correlation_id, %reason, "use case rejected")
            }
            Err(err) => {
                tracing::warn!(use_case = name, %correlation_id, error = %err, "use case rolled back")
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use outbox_domain::domain_event::{EventFactory, Topic};
    use outbox_domain::persist::{InMemoryOutboxStore, InMemoryUnitOfWorkPerformer};
    use outbox_domain::ports::{FixedClock, SequentialUuidGenerator};

    /// 追加两个事件；`fail_after_save` 为真时随后返回错误
    struct SignConvention {
        factory: EventFactory,
    }

    #[async_trait]
    impl TransactionalUseCase for SignConvention {
        type Input = bool;
        type Output = usize;

        fn name(&self) -> &'static str {
            "sign-convention"
        }

        async fn execute(
            &self,
            fail_after_save: bool,
            uow: &mut dyn UnitOfWork,
            ctx: &AppContext,
        ) -> AppResult<usize> {
            let payload = serde_json::json!({ "actor": ctx.actor_id });
            uow.save_event(
                self.factory
                    .create_new_event(Topic::ConventionPartiallySigned, &payload)?,
            )
            .await?;
            uow.save_event(
                self.factory
                    .create_new_event(Topic::ConventionFullySigned, &payload)?,
            )
            .await?;

            if fail_after_save {
                return Err(AppError::Infra("convention repository unavailable".into()));
            }
            Ok(2)
        }
    }

    fn use_case() -> Arc<SignConvention> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        ));
        Arc::new(SignConvention {
            factory: EventFactory::new(clock, Arc::new(SequentialUuidGenerator::default())),
        })
    }

    #[tokio::test]
    async fn events_are_committed_with_the_use_case() {
        let store = InMemoryOutboxStore::new();
        let runner = UseCaseRunner::new(InMemoryUnitOfWorkPerformer::new(store.clone()));
        let ctx = AppContext::builder().actor_id("signatory-1".to_string()).build();

        let saved = runner.run(use_case(), false, ctx).await.unwrap();

        assert_eq!(saved, 2);
        let events = store.all().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload()["actor"], "signatory-1");
    }

    #[tokio::test]
    async fn failure_rolls_back_staged_events() {
        let store = InMemoryOutboxStore::new();
        let runner = UseCaseRunner::new(InMemoryUnitOfWorkPerformer::new(store.clone()));

        let err = runner
            .run(use_case(), true, AppContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Infra(_)));
        assert!(store.all().await.is_empty());
    }
}
