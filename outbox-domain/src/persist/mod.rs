//! 持久化（persist）
//!
//! 定义 Outbox 存储协议、事务工作单元协议及其内存实现：
//! - `OutboxStore`：保存事件、按状态分页拉取、认领、写回投递结果与诊断计数；
//! - `UnitOfWork`/`UnitOfWorkPerformer`：保证业务写入与事件追加同事务提交；
//! - `InMemoryOutboxStore`/`InMemoryUnitOfWorkPerformer`：测试与本地开发用实现。
//!
//! 具体存储后端（如 Postgres）由上层提供实现并注入。
//!
mod in_memory;
mod outbox_store;
mod unit_of_work;

pub use in_memory::{InMemoryOutboxStore, InMemoryUnitOfWork, InMemoryUnitOfWorkPerformer};
pub use outbox_store::{EventFilter, OutboxStore};
pub use unit_of_work::{UnitOfWork, UnitOfWorkPerformer};
