//! Outbox 爬取器进程
//!
//! 加载配置、初始化日志、注册处理器并以周期策略运行爬取器，直到收到 Ctrl-C。
//! 用法：`outbox-worker [config.toml]`
//!
//! 本进程仅做装配：Outbox 为内存实现，启动时经 `RequestMagicLinkRenewal` 用例写入一条示例事件，
//! 以便观察完整的投递流程。生产部署需注入与业务写入共享事务的持久化 `OutboxStore`。
//!
use anyhow::Context;
use outbox_application::config::{ConfigLoader, OutboxConfig};
use outbox_application::context::AppContext;
use outbox_application::logging::init_logging;
use outbox_application::use_case::UseCaseRunner;
use outbox_application::use_cases::{MagicLinkRenewal, RequestMagicLinkRenewal};
use outbox_domain::domain_event::{EventFactory, EventId, Topic};
use outbox_domain::eventing::{Crawler, EventBus, EventHandler, InMemoryEventBus, handler_fn};
use outbox_domain::persist::{InMemoryOutboxStore, InMemoryUnitOfWorkPerformer};
use outbox_domain::ports::{LoggingNotifier, SystemClock, UuidV4Generator};
use std::sync::Arc;

/// 仅记录事件的处理器；接入真实的邮件/短信/Webhook 适配器前使用
fn log_only(topic: Topic) -> Arc<dyn EventHandler> {
    handler_fn(format!("log-{topic}"), |event| async move {
        tracing::info!(
            event_id = %event.id(),
            topic = %event.topic(),
            payload = %event.payload(),
            "event delivered"
        );
        Ok(())
    })
}

fn build_crawler(config: &OutboxConfig, store: InMemoryOutboxStore) -> anyhow::Result<Arc<Crawler>> {
    let bus = Arc::new(InMemoryEventBus::new().with_handler_timeout(config.handler_timeout()));
    for topic in Topic::ALL {
        bus.subscribe(topic, log_only(topic));
    }
    bus.ensure_subscribed(&Topic::ALL)?;

    Ok(Arc::new(
        Crawler::builder()
            .outbox(Arc::new(store))
            .event_bus(bus)
            .notifier(Arc::new(LoggingNotifier))
            .clock(Arc::new(SystemClock))
            .config(config.crawler_config()?)
            .policy(config.scheduling_policy())
            .build(),
    ))
}

/// 经用例写入一条示例事件
async fn seed_sample_renewal(store: &InMemoryOutboxStore) -> anyhow::Result<EventId> {
    let factory = EventFactory::new(Arc::new(SystemClock), Arc::new(UuidV4Generator));
    let runner = UseCaseRunner::new(InMemoryUnitOfWorkPerformer::new(store.clone()));

    let id = runner
        .run(
            Arc::new(RequestMagicLinkRenewal::new(factory)),
            MagicLinkRenewal {
                emails: vec!["beneficiary@example.com".to_string()],
                magic_link: "https://example.com/verify?jwt=sample".to_string(),
            },
            AppContext::builder()
                .correlation_id("outbox-worker-startup".to_string())
                .build(),
        )
        .await?;
    Ok(id)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = std::env::args().nth(1) {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().context("loading configuration")?;
    init_logging(&config)?;

    let store = InMemoryOutboxStore::new();
    let sample = seed_sample_renewal(&store).await?;
    tracing::info!(event_id = %sample, "sample magic-link renewal queued");

    let handle = build_crawler(&config, store)?.start().await;
    tracing::info!("outbox crawler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("shutting down");
    handle.stop().await;

    Ok(())
}
