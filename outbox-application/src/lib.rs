//! Outbox 应用层（outbox-application）
//!
//! - `context`：一次用例调用的横切信息；
//! - `use_case`：事务性用例协议与执行器，保证业务写入与事件追加同事务提交；
//! - `use_cases`：具体用例；
//! - `config`/`logging`：爬取器进程的配置加载与日志初始化。
//!
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod use_case;
pub mod use_cases;

pub use config::{ConfigLoader, OutboxConfig};
pub use use_case::{TransactionalUseCase, UseCaseRunner};
