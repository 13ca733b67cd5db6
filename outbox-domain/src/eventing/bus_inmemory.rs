//! 内存版事件总线（InMemoryEventBus）
//!
//! 以 `DashMap<Topic, Vec<Arc<dyn EventHandler>>>` 保存订阅关系：
//! - `publish`：并发调用主题下的全部处理器并等待全部完成；
//! - 处理器返回错误、panic 或超时都被记录为该处理器的失败结果，不向外传播；
//! - 无订阅者的主题发布结果为失败（见 `PublishOutcome::no_subscribers`）。
//!
use super::{EventBus, EventHandler, PublishOutcome};
use crate::domain_event::{DomainEvent, SubscriberOutcome, Topic};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// 单个处理器调用的默认超时
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct InMemoryEventBus {
    subscriptions: DashMap<Topic, Vec<Arc<dyn EventHandler>>>,
    handler_timeout: Option<Duration>,
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self {
            subscriptions: DashMap::new(),
            handler_timeout: Some(DEFAULT_HANDLER_TIMEOUT),
        }
    }
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置单个处理器调用的超时；`None` 表示不限时
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    async fn invoke(&self, handler: Arc<dyn EventHandler>, event: &DomainEvent) -> SubscriberOutcome {
        let name = handler.handler_name().to_string();
        let call = AssertUnwindSafe(handler.handle(event)).catch_unwind();

        let result = match self.handler_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    return SubscriberOutcome::failure(name, format!("timed out after {limit:?}"));
                }
            },
            None => call.await,
        };

        match result {
            Ok(Ok(())) => SubscriberOutcome::success(name),
            Ok(Err(err)) => SubscriberOutcome::failure(name, format!("{err:#}")),
            Err(panic) => SubscriberOutcome::failure(name, panic_message(panic.as_ref())),
        }
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    fn subscribe(&self, topic: Topic, handler: Arc<dyn EventHandler>) {
        tracing::debug!(%topic, handler = handler.handler_name(), "handler subscribed");
        self.subscriptions.entry(topic).or_default().push(handler);
    }

    fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscriptions.get(&topic).map_or(0, |h| h.len())
    }

    async fn publish(&self, event: &DomainEvent) -> PublishOutcome {
        // 先克隆处理器列表，避免跨 await 持有 DashMap 的读锁
        let handlers: Vec<Arc<dyn EventHandler>> = self
            .subscriptions
            .get(&event.topic())
            .map(|h| h.value().clone())
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::warn!(
                event_id = %event.id(),
                topic = %event.topic(),
                "no subscriber for topic"
            );
            return PublishOutcome::no_subscribers(event.topic());
        }

        let outcomes = join_all(handlers.into_iter().map(|h| self.invoke(h, event))).await;

        for outcome in &outcomes {
            match outcome.error_message() {
                None => tracing::debug!(
                    event_id = %event.id(),
                    handler = outcome.subscriber(),
                    "handler succeeded"
                ),
                Some(error) => tracing::warn!(
                    event_id = %event.id(),
                    topic = %event.topic(),
                    handler = outcome.subscriber(),
                    error,
                    "handler failed"
                ),
            }
        }

        PublishOutcome::from_outcomes(outcomes)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
