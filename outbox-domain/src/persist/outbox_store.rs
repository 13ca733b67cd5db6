//! Outbox 存储协议（OutboxStore）
//!
//! 持久保存领域事件及其投递状态，供爬取器拉取待投递/待重试事件并写回结果。
//!
use crate::domain_event::{DomainEvent, EventId, EventStatus, Publication, Topic};
use crate::error::DomainResult;
use async_trait::async_trait;
use bon::Builder;

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// 保存新事件；标识已存在时返回 `DomainError::Conflict` 且不写入
    async fn save(&self, event: &DomainEvent) -> DomainResult<()>;

    /// `never-published` 事件，按 `occurred_at` 升序，至多 `limit` 条
    async fn get_unpublished(&self, limit: usize) -> DomainResult<Vec<DomainEvent>>;

    /// `failed` 且未隔离的事件，按 `occurred_at` 升序，至多 `limit` 条
    async fn get_failed(&self, limit: usize) -> DomainResult<Vec<DomainEvent>>;

    /// 认领一批事件（迁移到 `in-process`），全部可认领时才修改
    async fn mark_in_process(&self, event_ids: &[EventId]) -> DomainResult<()>;

    /// 追加一次投递记录并原子地更新状态
    async fn record_outcome(
        &self,
        event_id: EventId,
        publication: Publication,
        new_status: EventStatus,
    ) -> DomainResult<()>;

    /// 释放残留的 `in-process` 认领（`keep` 中的事件仍在投递，保持不动），返回释放数量
    ///
    /// 释放后的状态由投递历史决定：无记录为 `never-published`，否则为 `failed`。
    async fn release_in_process(&self, keep: &[EventId]) -> DomainResult<usize>;

    /// 诊断用计数
    async fn count_events(&self, filter: &EventFilter) -> DomainResult<usize>;
}

/// 事件过滤条件，未设置的字段不参与过滤
#[derive(Builder, Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    status: Option<EventStatus>,
    topic: Option<Topic>,
    was_quarantined: Option<bool>,
}

impl EventFilter {
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.status.is_none_or(|s| event.status() == s)
            && self.topic.is_none_or(|t| event.topic() == t)
            && self
                .was_quarantined
                .is_none_or(|q| event.was_quarantined() == q)
    }
}
