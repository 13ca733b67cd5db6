//! 事件子系统（eventing）
//!
//! 提供事件发布/订阅与 Outbox 投递的运行时：
//! - `EventBus`：主题 → 处理器的进程内注册表与扇出投递；
//! - `EventHandler`：对某主题事件执行一个副作用；
//! - `Crawler`：从 Outbox 批量拉取事件、分发、写回结果并推进状态机；
//! - `SchedulingPolicy`/`CrawlerHandle`：手动触发或两个独立的周期循环。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod crawler;
pub mod handler;
pub mod quarantine;
pub mod scheduler;

pub use bus::{EventBus, PublishOutcome};
pub use bus_inmemory::{DEFAULT_HANDLER_TIMEOUT, InMemoryEventBus};
pub use crawler::{CrawlReport, Crawler, CrawlerConfig};
pub use handler::{EventHandler, FnHandler, handler_fn};
pub use quarantine::QuarantineConfig;
pub use scheduler::{CrawlerHandle, DEFAULT_CRAWLING_PERIOD, RETRY_PERIOD, SchedulingPolicy};
