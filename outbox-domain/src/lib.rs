//! Outbox 事件分发领域层（outbox-domain）
//!
//! 将业务状态变更转化为可靠、异步投递的副作用（邮件、短信、合作方 Webhook），
//! 不依赖消息中间件，仅使用进程内原语：
//! - 领域事件（`domain_event`）：事件模型、主题、状态机与事件工厂；
//! - 端口（`ports`）：时钟、UUID 生成器与告警通知；
//! - 持久化（`persist`）：Outbox 存储协议、工作单元与内存实现；
//! - 事件子系统（`eventing`）：事件总线、处理器、爬取器（Crawler）与周期调度。
//!
//! 典型用法：
//! 1. 在工作单元（`UnitOfWork`）内写入业务变更，并通过 `EventFactory` 生成事件一并保存；
//! 2. 通过 `EventBus::subscribe` 注册下游处理器；
//! 3. 构建 `Crawler` 并以 `SchedulingPolicy::Periodic` 启动，周期拉取并投递事件。
//!
//! 投递语义为“至少一次”，处理器需自行保证幂等。
//!
pub mod domain_event;
pub mod error;
pub mod eventing;
pub mod persist;
pub mod ports;
