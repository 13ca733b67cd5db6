//! 领域层统一错误定义
//!
//! 聚焦序列化、订阅校验、Outbox 存储、状态机与工作单元等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use crate::domain_event::{EventId, EventStatus, Topic};
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化/解析 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    // --- 事件系统 ---
    #[error("missing subscribers for topics: {topics:?}")]
    MissingSubscribers { topics: Vec<Topic> },

    // --- Outbox 存储 ---
    #[error("outbox error: {reason}")]
    Outbox { reason: String },
    #[error("conflict: event {event_id} already exists")]
    Conflict { event_id: EventId },
    #[error("not found: {reason}")]
    NotFound { reason: String },
    #[error("invalid status transition: event={event_id}, from={from}, to={to}")]
    InvalidTransition {
        event_id: EventId,
        from: EventStatus,
        to: EventStatus,
    },

    // --- 工作单元 ---
    #[error("unit of work error: {reason}")]
    UnitOfWork { reason: String },
}

impl DomainError {
    pub fn outbox(reason: impl Into<String>) -> Self {
        DomainError::Outbox {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
