//! 工作单元（Unit of Work）
//!
//! 用例在同一事务内写入业务变更并追加事件；事务提交时两者一并持久化，
//! 任一步骤失败则全部丢弃。
//!
use crate::domain_event::DomainEvent;
use crate::error::{DomainError, DomainResult};
use async_trait::async_trait;
use futures_util::future::BoxFuture;

/// 事务上下文：聚合本次事务可用的仓储
#[async_trait]
pub trait UnitOfWork: Send {
    /// 在当前事务中向 Outbox 追加事件
    async fn save_event(&mut self, event: DomainEvent) -> DomainResult<()>;
}

/// 事务执行器：提供事务上下文并负责提交/回滚
#[async_trait]
pub trait UnitOfWorkPerformer: Send + Sync {
    /// 在新事务中执行 `work`：成功则提交，返回错误则回滚
    async fn perform<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DomainError> + Send + 'static,
        F: for<'a> FnOnce(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<T, E>> + Send + 'static;
}
