//! 端口（Ports）
//!
//! 本核心消费的外部协作方抽象：时钟、UUID 生成器与告警通知。
//! Outbox 存储与工作单元位于 `persist`。

mod clock;
mod notifier;
mod uuid_generator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notifier::{Alert, AlertKind, LoggingNotifier, Notifier, notify_quietly};
pub use uuid_generator::{SequentialUuidGenerator, UuidGenerator, UuidV4Generator};
