use super::{EventStatus, Publication, Topic};
use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 事件唯一标识（创建时分配，不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for EventId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 领域事件：一次业务事实的不可变记录，附带投递历史与状态
///
/// 标识、主题、载荷与发生时间在创建后不可修改；
/// `publications` 只追加，状态变更受 `EventStatus` 状态机约束。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    id: EventId,
    topic: Topic,
    payload: Value,
    occurred_at: DateTime<Utc>,
    publications: Vec<Publication>,
    status: EventStatus,
    was_quarantined: bool,
}

impl DomainEvent {
    /// 由 `EventFactory` 调用；初始状态为 `never-published`
    pub(crate) fn new(id: EventId, topic: Topic, payload: Value, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            topic,
            payload,
            occurred_at,
            publications: Vec::new(),
            status: EventStatus::NeverPublished,
            was_quarantined: false,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    pub fn last_publication(&self) -> Option<&Publication> {
        self.publications.last()
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn was_quarantined(&self) -> bool {
        self.was_quarantined
    }

    /// 已记录的投递尝试次数
    pub fn attempts(&self) -> usize {
        self.publications.len()
    }

    /// 追加一次投递结果并迁移状态（原子地校验后再修改）
    pub fn record_outcome(
        &mut self,
        publication: Publication,
        new_status: EventStatus,
    ) -> DomainResult<()> {
        self.ensure_transition(new_status)?;
        self.publications.push(publication);
        self.set_status(new_status);
        Ok(())
    }

    /// 无投递记录的状态迁移（认领/释放）
    pub fn transition_to(&mut self, new_status: EventStatus) -> DomainResult<()> {
        self.ensure_transition(new_status)?;
        self.set_status(new_status);
        Ok(())
    }

    /// 释放 `in-process` 认领时应回到的状态：无投递记录为 `never-published`，否则为 `failed`
    pub fn status_before_claim(&self) -> EventStatus {
        if self.publications.is_empty() {
            EventStatus::NeverPublished
        } else {
            EventStatus::Failed
        }
    }

    fn ensure_transition(&self, new_status: EventStatus) -> DomainResult<()> {
        if self.status.can_transition_to(new_status) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                event_id: self.id,
                from: self.status,
                to: new_status,
            })
        }
    }

    fn set_status(&mut self, status: EventStatus) {
        self.status = status;
        self.was_quarantined = status == EventStatus::Quarantined;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::SubscriberOutcome;
    use chrono::TimeZone;

    fn event() -> DomainEvent {
        DomainEvent::new(
            EventId::from(Uuid::from_u128(1)),
            Topic::ConventionRejected,
            serde_json::json!({"id": "c-1"}),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn record_outcome_appends_and_moves_status() {
        let mut ev = event();
        let at = ev.occurred_at();

        ev.record_outcome(
            Publication::new(at, vec![SubscriberOutcome::failure("email", "smtp down")]),
            EventStatus::Failed,
        )
        .unwrap();
        ev.record_outcome(
            Publication::new(at, vec![SubscriberOutcome::success("email")]),
            EventStatus::Published,
        )
        .unwrap();

        assert_eq!(ev.attempts(), 2);
        assert_eq!(ev.status(), EventStatus::Published);
        assert!(!ev.was_quarantined());
    }

    #[test]
    fn terminal_event_rejects_new_outcome() {
        let mut ev = event();
        let at = ev.occurred_at();
        ev.record_outcome(Publication::new(at, vec![]), EventStatus::Quarantined)
            .unwrap();
        assert!(ev.was_quarantined());

        let err = ev
            .record_outcome(Publication::new(at, vec![]), EventStatus::Published)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(ev.attempts(), 1);
    }

    #[test]
    fn status_before_claim_depends_on_history() {
        let mut ev = event();
        assert_eq!(ev.status_before_claim(), EventStatus::NeverPublished);

        let at = ev.occurred_at();
        ev.record_outcome(Publication::new(at, vec![]), EventStatus::Failed)
            .unwrap();
        assert_eq!(ev.status_before_claim(), EventStatus::Failed);
    }

    #[test]
    fn event_id_parses_from_string() {
        let id = EventId::from(Uuid::from_u128(42));
        assert_eq!(id.to_string().parse::<EventId>().unwrap(), id);
        assert!("not-a-uuid".parse::<EventId>().is_err());
    }
}
