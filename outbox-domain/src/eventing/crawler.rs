//! 爬取器（Crawler）
//!
//! 从 Outbox 拉取可投递事件，经事件总线分发后写回每个事件的投递结果：
//! - `process_new_events`：处理 `never-published` 事件；
//! - `retry_failed_events`：重试 `failed`（未隔离）事件；
//! - 事件按 `max_concurrent` 切分批次，批内并发、批间顺序；
//! - 隔离主题的失败或达到最大尝试次数时进入 `quarantined` 并告警。
//!
//! 读取 Outbox 失败会中止本轮并告警，下一轮自然重试，不破坏任何事件状态。
//! 每轮开始前释放不在本实例投递中的 `in-process` 认领（如结果写回失败遗留的），
//! 使其在下一轮重新投递。
//! 调度方式由注入的 `SchedulingPolicy` 决定（见 `scheduler`）。
//!
use super::scheduler::{self, CrawlerHandle, SchedulingPolicy};
use super::{EventBus, QuarantineConfig};
use crate::domain_event::{DomainEvent, EventId, EventStatus, Publication};
use crate::error::DomainResult;
use crate::persist::OutboxStore;
use crate::ports::{Alert, AlertKind, Clock, Notifier, notify_quietly};
use bon::Builder;
use dashmap::DashSet;
use futures_util::future::join_all;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_PAGE_SIZE: usize = 200;
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: usize = 5;

/// 爬取器配置
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// 单批并发投递的事件数
    #[builder(default = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,
    /// 单轮从 Outbox 拉取的事件上限
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
    /// 含首次投递在内的最大尝试次数，达到后失败即隔离
    #[builder(default = DEFAULT_MAX_DELIVERY_ATTEMPTS)]
    pub max_delivery_attempts: usize,
    #[builder(default)]
    pub quarantine: QuarantineConfig,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// 单轮爬取的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub fetched: usize,
    pub batch_sizes: Vec<usize>,
    pub published: usize,
    pub failed: usize,
    pub quarantined: usize,
    /// 投递完成但结果未能写回
    pub not_recorded: usize,
    /// 已在本实例处理中而被跳过
    pub skipped_in_flight: usize,
    /// 本轮开始前释放的残留认领
    pub released: usize,
}

impl CrawlReport {
    fn tally(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Published => self.published += 1,
            Delivery::Failed => self.failed += 1,
            Delivery::Quarantined => self.quarantined += 1,
            Delivery::NotRecorded => self.not_recorded += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    NewEvents,
    Retry,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::NewEvents => f.write_str("new-events"),
            Pass::Retry => f.write_str("retry"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Delivery {
    Published,
    Failed,
    Quarantined,
    NotRecorded,
}

/// 本实例正在处理的事件；离开作用域时自动移除
struct InFlight<'a> {
    registry: &'a DashSet<EventId>,
    ids: Vec<EventId>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        for id in &self.ids {
            self.registry.remove(id);
        }
    }
}

#[derive(Builder)]
pub struct Crawler {
    outbox: Arc<dyn OutboxStore>,
    event_bus: Arc<dyn EventBus>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    #[builder(default)]
    config: CrawlerConfig,
    #[builder(default)]
    policy: SchedulingPolicy,
    #[builder(skip)]
    in_flight: DashSet<EventId>,
    /// 串行化“认领”与“释放残留认领”
    #[builder(skip)]
    claim_lock: Mutex<()>,
}

impl Crawler {
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// 启动爬取器：先释放残留的 `in-process` 认领，再按调度策略启动循环
    ///
    /// `Manual` 策略不启动任何循环，由调用方手动触发两个操作。
    pub async fn start(self: Arc<Self>) -> CrawlerHandle {
        self.release_stranded().await;

        match self.policy {
            SchedulingPolicy::Manual => CrawlerHandle::idle(),
            SchedulingPolicy::Periodic {
                new_events_period,
                retry_period,
            } => {
                let new_events = self.clone();
                let retry = self.clone();

                CrawlerHandle::spawn(|token| {
                    vec![
                        scheduler::spawn_loop(token.clone(), "new-events", new_events_period, move || {
                            let crawler = new_events.clone();
                            async move { crawler.process_new_events().await }
                        }),
                        scheduler::spawn_loop(token, "retry", retry_period, move || {
                            let crawler = retry.clone();
                            async move { crawler.retry_failed_events().await }
                        }),
                    ]
                })
            }
        }
    }

    /// 投递全部 `never-published` 事件（单页）
    pub async fn process_new_events(&self) -> DomainResult<CrawlReport> {
        self.tick(Pass::NewEvents).await
    }

    /// 重试全部 `failed` 且未隔离的事件（单页）
    pub async fn retry_failed_events(&self) -> DomainResult<CrawlReport> {
        self.tick(Pass::Retry).await
    }

    async fn tick(&self, pass: Pass) -> DomainResult<CrawlReport> {
        let released = self.release_stranded().await;
        let events = self.fetch(pass).await?;
        let mut report = self.dispatch(pass, events).await?;
        report.released = released;
        Ok(report)
    }

    /// 释放不在本实例投递中的 `in-process` 事件；失败只记录日志，由后续读取决定本轮去留
    async fn release_stranded(&self) -> usize {
        let _claim = self.claim_lock.lock().await;
        let keep: Vec<EventId> = self.in_flight.iter().map(|id| *id).collect();

        match self.outbox.release_in_process(&keep).await {
            Ok(0) => 0,
            Ok(released) => {
                tracing::warn!(released, "released stranded in-process events");
                released
            }
            Err(err) => {
                tracing::error!(error = %err, "could not release in-process events");
                0
            }
        }
    }

    async fn fetch(&self, pass: Pass) -> DomainResult<Vec<DomainEvent>> {
        let fetched = match pass {
            Pass::NewEvents => self.outbox.get_unpublished(self.config.page_size).await,
            Pass::Retry => self.outbox.get_failed(self.config.page_size).await,
        };

        if let Err(err) = &fetched {
            tracing::error!(%pass, error = %err, "could not read outbox, skipping tick");
            self.alert(Alert::new(
                AlertKind::OutboxUnreachable,
                format!("{pass} tick skipped: {err}"),
            ))
            .await;
        }
        fetched
    }

    async fn dispatch(&self, pass: Pass, events: Vec<DomainEvent>) -> DomainResult<CrawlReport> {
        let mut report = CrawlReport {
            fetched: events.len(),
            ..Default::default()
        };

        let mut in_flight = InFlight {
            registry: &self.in_flight,
            ids: Vec::with_capacity(events.len()),
        };
        let events: Vec<DomainEvent> = events
            .into_iter()
            .filter(|e| {
                if self.in_flight.insert(e.id()) {
                    in_flight.ids.push(e.id());
                    true
                } else {
                    report.skipped_in_flight += 1;
                    false
                }
            })
            .collect();

        for (index, batch) in events.chunks(self.config.max_concurrent.max(1)).enumerate() {
            let ids: Vec<EventId> = batch.iter().map(DomainEvent::id).collect();
            let claimed = {
                let _claim = self.claim_lock.lock().await;
                self.outbox.mark_in_process(&ids).await
            };
            if let Err(err) = claimed {
                tracing::error!(%pass, batch = index, error = %err, "could not claim events, aborting tick");
                self.alert(Alert::new(
                    AlertKind::OutboxUnreachable,
                    format!("{pass} tick aborted while claiming events: {err}"),
                ))
                .await;
                return Err(err);
            }

            report.batch_sizes.push(batch.len());
            let deliveries = join_all(batch.iter().map(|e| self.deliver(pass, e))).await;
            for delivery in deliveries {
                report.tally(delivery);
            }
        }

        if report.fetched > 0 {
            tracing::info!(
                %pass,
                fetched = report.fetched,
                batches = report.batch_sizes.len(),
                published = report.published,
                failed = report.failed,
                quarantined = report.quarantined,
                not_recorded = report.not_recorded,
                skipped = report.skipped_in_flight,
                "crawl tick completed"
            );
        }
        Ok(report)
    }

    async fn deliver(&self, pass: Pass, event: &DomainEvent) -> Delivery {
        let published_at = self.clock.now();
        let outcome = self.event_bus.publish(event).await;
        let next = self.next_status(event, outcome.all_succeeded());
        let publication = Publication::new(published_at, outcome.into_per_handler());

        let failures: Vec<String> = publication
            .failures()
            .map(|o| format!("{}: {}", o.subscriber(), o.error_message().unwrap_or_default()))
            .collect();

        if let Err(err) = self
            .outbox
            .record_outcome(event.id(), publication, next)
            .await
        {
            tracing::error!(
                %pass,
                event_id = %event.id(),
                topic = %event.topic(),
                status = %next,
                error = %err,
                "could not record delivery outcome"
            );
            self.alert(
                Alert::new(
                    AlertKind::OutcomeNotRecorded,
                    format!("outcome {next} not recorded: {err}"),
                )
                .for_event(event.id(), event.topic()),
            )
            .await;
            return Delivery::NotRecorded;
        }

        match next {
            EventStatus::Published => {
                tracing::debug!(%pass, event_id = %event.id(), topic = %event.topic(), "event published");
                Delivery::Published
            }
            EventStatus::Quarantined => {
                tracing::error!(
                    %pass,
                    event_id = %event.id(),
                    topic = %event.topic(),
                    attempts = event.attempts() + 1,
                    failures = ?failures,
                    "event quarantined"
                );
                self.alert(
                    Alert::new(
                        AlertKind::EventQuarantined,
                        format!(
                            "event quarantined after {} attempt(s): {}",
                            event.attempts() + 1,
                            failures.join("; ")
                        ),
                    )
                    .for_event(event.id(), event.topic()),
                )
                .await;
                Delivery::Quarantined
            }
            _ => {
                tracing::warn!(
                    %pass,
                    event_id = %event.id(),
                    topic = %event.topic(),
                    attempts = event.attempts() + 1,
                    failures = ?failures,
                    "event delivery failed"
                );
                Delivery::Failed
            }
        }
    }

    /// 本次投递后的状态：成功即 `published`；失败时隔离主题或尝试次数耗尽为 `quarantined`，否则 `failed`
    fn next_status(&self, event: &DomainEvent, succeeded: bool) -> EventStatus {
        if succeeded {
            return EventStatus::Published;
        }

        let attempts = event.attempts() + 1;
        if self.config.quarantine.contains(event.topic())
            || attempts >= self.config.max_delivery_attempts
        {
            EventStatus::Quarantined
        } else {
            EventStatus::Failed
        }
    }

    async fn alert(&self, alert: Alert) {
        notify_quietly(self.notifier.as_ref(), alert).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_event::{EventFactory, SubscriberOutcome, Topic};
    use crate::eventing::{InMemoryEventBus, handler_fn};
    use crate::persist::{EventFilter, InMemoryOutboxStore};
    use crate::ports::{FixedClock, LoggingNotifier, SequentialUuidGenerator};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tokio::sync::Notify;

    /// 不做认领的存储：用于验证爬取器自身的在途去重
    #[derive(Clone, Default)]
    struct NonClaimingStore {
        inner: InMemoryOutboxStore,
    }

    #[async_trait]
    impl OutboxStore for NonClaimingStore {
        async fn save(&self, event: &DomainEvent) -> DomainResult<()> {
            self.inner.save(event).await
        }
        async fn get_unpublished(&self, limit: usize) -> DomainResult<Vec<DomainEvent>> {
            self.inner.get_unpublished(limit).await
        }
        async fn get_failed(&self, limit: usize) -> DomainResult<Vec<DomainEvent>> {
            self.inner.get_failed(limit).await
        }
        async fn mark_in_process(&self, _event_ids: &[EventId]) -> DomainResult<()> {
            Ok(())
        }
        async fn record_outcome(
            &self,
            event_id: EventId,
            publication: Publication,
            new_status: EventStatus,
        ) -> DomainResult<()> {
            self.inner
                .record_outcome(event_id, publication, new_status)
                .await
        }
        async fn release_in_process(&self, keep: &[EventId]) -> DomainResult<usize> {
            self.inner.release_in_process(keep).await
        }
        async fn count_events(&self, filter: &EventFilter) -> DomainResult<usize> {
            self.inner.count_events(filter).await
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 9, 1, 7, 0, 0).unwrap(),
        ))
    }

    fn crawler(store: Arc<dyn OutboxStore>, bus: Arc<InMemoryEventBus>, config: CrawlerConfig) -> Crawler {
        Crawler::builder()
            .outbox(store)
            .event_bus(bus)
            .notifier(Arc::new(LoggingNotifier))
            .clock(clock())
            .config(config)
            .build()
    }

    #[test]
    fn next_status_follows_quarantine_rules() {
        let config = CrawlerConfig::builder()
            .max_delivery_attempts(2)
            .quarantine(QuarantineConfig::new([Topic::ConventionCancelled]))
            .build();
        let crawler = crawler(
            Arc::new(InMemoryOutboxStore::new()),
            Arc::new(InMemoryEventBus::new()),
            config,
        );
        let factory = EventFactory::new(clock(), Arc::new(SequentialUuidGenerator::default()));

        let rejected = factory
            .create_new_event(Topic::ConventionRejected, serde_json::json!({}))
            .unwrap();
        let cancelled = factory
            .create_new_event(Topic::ConventionCancelled, serde_json::json!({}))
            .unwrap();

        assert_eq!(crawler.next_status(&rejected, true), EventStatus::Published);
        assert_eq!(crawler.next_status(&rejected, false), EventStatus::Failed);
        assert_eq!(crawler.next_status(&cancelled, false), EventStatus::Quarantined);

        let mut retried = rejected.clone();
        retried
            .record_outcome(
                Publication::new(Utc::now(), vec![SubscriberOutcome::failure("h", "e")]),
                EventStatus::Failed,
            )
            .unwrap();
        assert_eq!(crawler.next_status(&retried, false), EventStatus::Quarantined);
    }

    #[test]
    fn default_config() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.page_size, 200);
        assert_eq!(config.max_delivery_attempts, 5);
        assert!(config.quarantine.is_empty());
    }

    #[tokio::test]
    async fn event_in_flight_is_not_dispatched_twice() {
        let store = NonClaimingStore::default();
        let bus = Arc::new(InMemoryEventBus::new());
        let release = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        {
            let (release, entered) = (release.clone(), entered.clone());
            bus.subscribe(
                Topic::ApiConsumerSaved,
                handler_fn("slow", move |_| {
                    let (release, entered) = (release.clone(), entered.clone());
                    async move {
                        entered.notify_one();
                        release.notified().await;
                        Ok(())
                    }
                }),
            );
        }
        let factory = EventFactory::new(clock(), Arc::new(SequentialUuidGenerator::default()));
        let ev = factory
            .create_new_event(Topic::ApiConsumerSaved, serde_json::json!({}))
            .unwrap();
        store.save(&ev).await.unwrap();

        let crawler = Arc::new(crawler(
            Arc::new(store.clone()),
            bus,
            CrawlerConfig::default(),
        ));

        let first = tokio::spawn({
            let crawler = crawler.clone();
            async move { crawler.process_new_events().await }
        });
        entered.notified().await;

        let second = crawler.process_new_events().await.unwrap();
        assert_eq!(second.fetched, 1);
        assert_eq!(second.skipped_in_flight, 1);
        assert!(second.batch_sizes.is_empty());

        release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.published, 1);
        assert_eq!(
            store.inner.get(ev.id()).await.unwrap().attempts(),
            1
        );
    }
}
