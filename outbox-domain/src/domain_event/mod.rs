//! 领域事件（Domain Event）
//!
//! 定义事件主题（`Topic`）、投递状态机（`EventStatus`）、投递记录（`Publication`）、
//! 事件本体（`DomainEvent`）以及负责盖戳的 `EventFactory`。

mod event;
mod factory;
mod publication;
mod status;
mod topic;

pub use event::{DomainEvent, EventId};
pub use factory::EventFactory;
pub use publication::{DeliveryResult, Publication, SubscriberOutcome};
pub use status::EventStatus;
pub use topic::Topic;
