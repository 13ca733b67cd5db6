//! 告警通知端口（Notifier）
//!
//! 持续性故障（Outbox 不可达、事件被隔离、结果写回失败）的旁路告警。
//! 告警是尽力而为的：调用方通过 `notify_quietly` 吞掉并记录通知自身的错误。
//!
use crate::domain_event::{EventId, Topic};
use async_trait::async_trait;
use std::fmt;

/// 告警类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// 读取 Outbox 失败，本轮爬取被跳过
    OutboxUnreachable,
    /// 事件进入隔离终态，不再重试
    EventQuarantined,
    /// 投递结果未能写回 Outbox
    OutcomeNotRecorded,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::OutboxUnreachable => "outbox-unreachable",
            AlertKind::EventQuarantined => "event-quarantined",
            AlertKind::OutcomeNotRecorded => "outcome-not-recorded",
        };
        f.write_str(s)
    }
}

/// 告警内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub event_id: Option<EventId>,
    pub topic: Option<Topic>,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            event_id: None,
            topic: None,
        }
    }

    pub fn for_event(mut self, event_id: EventId, topic: Topic) -> Self {
        self.event_id = Some(event_id);
        self.topic = Some(topic);
        self
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// 发送告警，通知失败只记录日志，不向上传播
pub async fn notify_quietly(notifier: &dyn Notifier, alert: Alert) {
    if let Err(err) = notifier.notify(&alert).await {
        tracing::warn!(
            kind = %alert.kind,
            error = %err,
            "alert could not be delivered"
        );
    }
}

/// 以 `tracing` 错误日志作为告警渠道
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, alert: &Alert) -> anyhow::Result<()> {
        tracing::error!(
            kind = %alert.kind,
            event_id = ?alert.event_id,
            topic = ?alert.topic,
            "{}",
            alert.message
        );
        Ok(())
    }
}
