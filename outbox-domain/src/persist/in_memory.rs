//! 内存版 Outbox 与工作单元
//!
//! 典型用途：测试、示例与本地开发。所有操作在一把异步锁内完成，
//! 因而 `save_all`、`mark_in_process` 等批量操作是原子的。
//!
use super::{EventFilter, OutboxStore, UnitOfWork, UnitOfWorkPerformer};
use crate::domain_event::{DomainEvent, EventId, EventStatus, Publication};
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
pub struct InMemoryOutboxStore {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原子地保存一批事件：任一标识冲突则全部不写入
    pub async fn save_all(&self, events: Vec<DomainEvent>) -> DomainResult<()> {
        let mut guard = self.events.lock().await;

        for (i, event) in events.iter().enumerate() {
            let duplicated = guard.iter().any(|e| e.id() == event.id())
                || events[..i].iter().any(|e| e.id() == event.id());
            if duplicated {
                return Err(DomainError::Conflict {
                    event_id: event.id(),
                });
            }
        }

        guard.extend(events);
        Ok(())
    }

    pub async fn get(&self, event_id: EventId) -> Option<DomainEvent> {
        self.events
            .lock()
            .await
            .iter()
            .find(|e| e.id() == event_id)
            .cloned()
    }

    /// 全部事件（按 `occurred_at` 升序）
    pub async fn all(&self) -> Vec<DomainEvent> {
        let mut events = self.events.lock().await.clone();
        events.sort_by_key(|e| e.occurred_at());
        events
    }

    async fn by_status(&self, status: EventStatus, limit: usize) -> Vec<DomainEvent> {
        let mut events: Vec<DomainEvent> = self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| e.status() == status && !e.was_quarantined())
            .cloned()
            .collect();

        events.sort_by_key(|e| e.occurred_at());
        events.truncate(limit);
        events
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn save(&self, event: &DomainEvent) -> DomainResult<()> {
        self.save_all(vec![event.clone()]).await
    }

    async fn get_unpublished(&self, limit: usize) -> DomainResult<Vec<DomainEvent>> {
        Ok(self.by_status(EventStatus::NeverPublished, limit).await)
    }

    async fn get_failed(&self, limit: usize) -> DomainResult<Vec<DomainEvent>> {
        Ok(self.by_status(EventStatus::Failed, limit).await)
    }

    async fn mark_in_process(&self, event_ids: &[EventId]) -> DomainResult<()> {
        let mut guard = self.events.lock().await;

        let mut claimed = Vec::with_capacity(event_ids.len());
        for id in event_ids {
            let idx = guard
                .iter()
                .position(|e| e.id() == *id)
                .ok_or_else(|| DomainError::NotFound {
                    reason: format!("event {id}"),
                })?;
            let current = guard[idx].status();
            if !current.can_transition_to(EventStatus::InProcess) {
                return Err(DomainError::InvalidTransition {
                    event_id: *id,
                    from: current,
                    to: EventStatus::InProcess,
                });
            }
            claimed.push(idx);
        }

        for idx in claimed {
            guard[idx].transition_to(EventStatus::InProcess)?;
        }
        Ok(())
    }

    async fn record_outcome(
        &self,
        event_id: EventId,
        publication: Publication,
        new_status: EventStatus,
    ) -> DomainResult<()> {
        let mut guard = self.events.lock().await;
        let event = guard
            .iter_mut()
            .find(|e| e.id() == event_id)
            .ok_or_else(|| DomainError::NotFound {
                reason: format!("event {event_id}"),
            })?;

        event.record_outcome(publication, new_status)
    }

    async fn release_in_process(&self, keep: &[EventId]) -> DomainResult<usize> {
        let mut guard = self.events.lock().await;
        let mut released = 0;

        for event in guard
            .iter_mut()
            .filter(|e| e.status() == EventStatus::InProcess && !keep.contains(&e.id()))
        {
            let previous = event.status_before_claim();
            event.transition_to(previous)?;
            released += 1;
        }

        Ok(released)
    }

    async fn count_events(&self, filter: &EventFilter) -> DomainResult<usize> {
        Ok(self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| filter.matches(e))
            .count())
    }
}

/// 内存事务：暂存事件，提交时一次性写入 Outbox
#[derive(Default)]
pub struct InMemoryUnitOfWork {
    pending: Vec<DomainEvent>,
}

impl InMemoryUnitOfWork {
    pub fn pending(&self) -> &[DomainEvent] {
        &self.pending
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn save_event(&mut self, event: DomainEvent) -> DomainResult<()> {
        if self.pending.iter().any(|e| e.id() == event.id()) {
            return Err(DomainError::Conflict {
                event_id: event.id(),
            });
        }
        self.pending.push(event);
        Ok(())
    }
}

#[derive(Clone)]
pub struct InMemoryUnitOfWorkPerformer {
    outbox: InMemoryOutboxStore,
}

impl InMemoryUnitOfWorkPerformer {
    pub fn new(outbox: InMemoryOutboxStore) -> Self {
        Self { outbox }
    }
}

#[async_trait]
impl UnitOfWorkPerformer for InMemoryUnitOfWorkPerformer {
    async fn perform<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DomainError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<T, E>> + Send + 'static,
    {
        let mut uow = InMemoryUnitOfWork::default();
        let output = work(&mut uow as &mut dyn UnitOfWork).await?;

        self.outbox.save_all(uow.pending).await?;
        Ok(output)
    }
}
