//! 事件总线（EventBus）协议
//!
//! 主题 → 处理器列表的进程内注册表；`publish` 将一个事件投递给其主题的全部订阅者，
//! 逐个捕获处理器结果，自身从不失败。
//!
use super::EventHandler;
use crate::domain_event::{DomainEvent, SubscriberOutcome, Topic};
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait EventBus: Send + Sync {
    /// 为主题追加一个处理器；同一主题可有多个处理器，按注册顺序调用，不去重
    fn subscribe(&self, topic: Topic, handler: Arc<dyn EventHandler>);

    /// 当前订阅某主题的处理器数量
    fn subscriber_count(&self, topic: Topic) -> usize;

    /// 将事件投递给其主题的全部处理器
    async fn publish(&self, event: &DomainEvent) -> PublishOutcome;

    /// 启动期校验：列出的主题都必须至少有一个订阅者
    fn ensure_subscribed(&self, topics: &[Topic]) -> DomainResult<()> {
        let missing: Vec<Topic> = topics
            .iter()
            .copied()
            .filter(|t| self.subscriber_count(*t) == 0)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingSubscribers { topics: missing })
        }
    }
}

/// 一次发布的结果汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    all_succeeded: bool,
    per_handler: Vec<SubscriberOutcome>,
}

impl PublishOutcome {
    pub(crate) fn from_outcomes(per_handler: Vec<SubscriberOutcome>) -> Self {
        Self {
            all_succeeded: per_handler.iter().all(SubscriberOutcome::is_success),
            per_handler,
        }
    }

    /// 主题无订阅者：视为配置错误，结果为失败，避免事件被静默丢弃
    pub(crate) fn no_subscribers(topic: Topic) -> Self {
        Self {
            all_succeeded: false,
            per_handler: vec![SubscriberOutcome::failure(
                "event-bus",
                format!("no subscriber for topic {topic}"),
            )],
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.all_succeeded
    }

    pub fn per_handler(&self) -> &[SubscriberOutcome] {
        &self.per_handler
    }

    pub fn into_per_handler(self) -> Vec<SubscriberOutcome> {
        self.per_handler
    }
}
