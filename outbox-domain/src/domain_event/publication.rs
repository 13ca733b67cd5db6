use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个处理器的投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum DeliveryResult {
    Success,
    Failure { message: String },
}

/// 某个订阅者在一次投递尝试中的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberOutcome {
    /// 订阅者（处理器）名称
    subscriber: String,
    result: DeliveryResult,
}

impl SubscriberOutcome {
    pub fn success(subscriber: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            result: DeliveryResult::Success,
        }
    }

    pub fn failure(subscriber: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            result: DeliveryResult::Failure {
                message: message.into(),
            },
        }
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    pub fn result(&self) -> &DeliveryResult {
        &self.result
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, DeliveryResult::Success)
    }

    /// 失败信息（成功时为 `None`）
    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            DeliveryResult::Success => None,
            DeliveryResult::Failure { message } => Some(message),
        }
    }
}

/// 一次投递尝试：发生时间与各处理器结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    published_at: DateTime<Utc>,
    outcomes: Vec<SubscriberOutcome>,
}

impl Publication {
    pub fn new(published_at: DateTime<Utc>, outcomes: Vec<SubscriberOutcome>) -> Self {
        Self {
            published_at,
            outcomes,
        }
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn outcomes(&self) -> &[SubscriberOutcome] {
        &self.outcomes
    }

    /// 失败的处理器结果
    pub fn failures(&self) -> impl Iterator<Item = &SubscriberOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}
