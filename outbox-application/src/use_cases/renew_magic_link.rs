//! 申请续期魔法链接（RequestMagicLinkRenewal）
//!
//! 校验收件人与链接后，在事务内追加一个 `MagicLinkRenewalRequested` 事件；
//! 实际发信由订阅该主题的处理器在爬取时完成。
//!
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::use_case::TransactionalUseCase;
use async_trait::async_trait;
use outbox_domain::domain_event::{EventFactory, EventId, Topic};
use outbox_domain::persist::UnitOfWork;
use serde::{Deserialize, Serialize};

/// 续期请求，亦即事件载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRenewal {
    pub emails: Vec<String>,
    pub magic_link: String,
}

pub struct RequestMagicLinkRenewal {
    event_factory: EventFactory,
}

impl RequestMagicLinkRenewal {
    pub fn new(event_factory: EventFactory) -> Self {
        Self { event_factory }
    }
}

#[async_trait]
impl TransactionalUseCase for RequestMagicLinkRenewal {
    type Input = MagicLinkRenewal;
    type Output = EventId;

    fn name(&self) -> &'static str {
        "request-magic-link-renewal"
    }

    fn validate(&self, input: &MagicLinkRenewal) -> AppResult<()> {
        if input.emails.is_empty() {
            return Err(AppError::Validation("at least one email is required".into()));
        }
        if let Some(bad) = input.emails.iter().find(|e| !is_plausible_email(e)) {
            return Err(AppError::Validation(format!("invalid email: {bad}")));
        }
        if input.magic_link.trim().is_empty() {
            return Err(AppError::Validation("magic link is required".into()));
        }
        Ok(())
    }

    async fn execute(
        &self,
        input: MagicLinkRenewal,
        uow: &mut dyn UnitOfWork,
        _ctx: &AppContext,
    ) -> AppResult<EventId> {
        let event = self
            .event_factory
            .create_new_event(Topic::MagicLinkRenewalRequested, &input)?;
        let id = event.id();

        uow.save_event(event).await?;
        Ok(id)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_case::UseCaseRunner;
    use chrono::{TimeZone, Utc};
    use outbox_domain::domain_event::EventStatus;
    use outbox_domain::persist::{InMemoryOutboxStore, InMemoryUnitOfWorkPerformer};
    use outbox_domain::ports::{FixedClock, SequentialUuidGenerator};
    use std::sync::Arc;

    fn use_case() -> Arc<RequestMagicLinkRenewal> {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        ));
        Arc::new(RequestMagicLinkRenewal::new(EventFactory::new(
            clock,
            Arc::new(SequentialUuidGenerator::default()),
        )))
    }

    fn renewal(emails: &[&str]) -> MagicLinkRenewal {
        MagicLinkRenewal {
            emails: emails.iter().map(|e| e.to_string()).collect(),
            magic_link: "https://immersion.example/verify?jwt=abc".into(),
        }
    }

    #[tokio::test]
    async fn commits_one_event_with_payload() {
        let store = InMemoryOutboxStore::new();
        let runner = UseCaseRunner::new(InMemoryUnitOfWorkPerformer::new(store.clone()));

        let id = runner
            .run(
                use_case(),
                renewal(&["beneficiary@mail.com", "tutor@company.fr"]),
                AppContext::default(),
            )
            .await
            .unwrap();

        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.topic(), Topic::MagicLinkRenewalRequested);
        assert_eq!(stored.status(), EventStatus::NeverPublished);
        assert_eq!(
            stored.payload(),
            &serde_json::json!({
                "emails": ["beneficiary@mail.com", "tutor@company.fr"],
                "magicLink": "https://immersion.example/verify?jwt=abc",
            })
        );
    }

    #[tokio::test]
    async fn invalid_input_writes_nothing() {
        let store = InMemoryOutboxStore::new();
        let runner = UseCaseRunner::new(InMemoryUnitOfWorkPerformer::new(store.clone()));

        let no_email = runner
            .run(use_case(), renewal(&[]), AppContext::default())
            .await;
        let bad_email = runner
            .run(use_case(), renewal(&["not-an-email"]), AppContext::default())
            .await;

        assert!(matches!(no_email, Err(AppError::Validation(_))));
        assert!(matches!(bad_email, Err(AppError::Validation(m)) if m.contains("not-an-email")));
        assert!(store.all().await.is_empty());
    }
}
