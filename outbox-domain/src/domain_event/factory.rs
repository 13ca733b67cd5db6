use super::{DomainEvent, EventId, Topic};
use crate::error::DomainResult;
use crate::ports::{Clock, UuidGenerator};
use serde::Serialize;
use std::sync::Arc;

/// 事件工厂：为新事件分配标识、发生时间与初始状态
///
/// 仅构造对象，不触碰存储；载荷形状由调用方负责校验。
#[derive(Clone)]
pub struct EventFactory {
    clock: Arc<dyn Clock>,
    uuid_generator: Arc<dyn UuidGenerator>,
}

impl EventFactory {
    pub fn new(clock: Arc<dyn Clock>, uuid_generator: Arc<dyn UuidGenerator>) -> Self {
        Self {
            clock,
            uuid_generator,
        }
    }

    /// 创建 `never-published` 状态的新事件
    ///
    /// 唯一可能的失败是载荷无法序列化为 JSON。
    pub fn create_new_event<P>(&self, topic: Topic, payload: P) -> DomainResult<DomainEvent>
    where
        P: Serialize,
    {
        let payload = serde_json::to_value(payload)?;
        let id = EventId::from(self.uuid_generator.generate());

        Ok(DomainEvent::new(id, topic, payload, self.clock.now()))
    }
}
