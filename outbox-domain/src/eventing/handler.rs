//! 事件处理器（EventHandler）
//!
//! 定义订阅某个主题的副作用逻辑（发送邮件、短信、合作方 Webhook 等）与其名称。
//! 同一事件可能被投递多次，处理器需保证幂等。
//!
use crate::domain_event::DomainEvent;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// 事件处理器：处理一个事件，返回错误即视为本次投递失败
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于投递记录与审计）
    fn handler_name(&self) -> &str;
    /// 处理事件
    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// 以闭包实现的处理器
pub struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(DomainEvent) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        (self.f)(event.clone()).await
    }
}

/// 将闭包包装为 `Arc<dyn EventHandler>`
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn EventHandler>
where
    F: Fn(DomainEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}
