//! 结构化日志初始化（tracing-subscriber）
//!
//! 过滤规则优先取 `OUTBOX_LOG` 环境变量（`EnvFilter` 语法），否则使用配置的级别。
//!
use crate::config::OutboxConfig;
use crate::error::{AppError, AppResult};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

pub const LOG_FILTER_ENV: &str = "OUTBOX_LOG";

/// 初始化全局日志订阅者；重复初始化返回错误
pub fn init_logging(config: &OutboxConfig) -> AppResult<()> {
    let level = parse_log_level(&config.log_level)?;
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|err| AppError::Configuration(format!("log filter: {err}")))?;

    let registry = Registry::default().with(filter);
    let installed = if config.log_json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.map_err(|err| AppError::Infra(format!("logging already initialized: {err}")))?;

    tracing::info!(%level, json = config.log_json, "logging initialized");
    Ok(())
}

pub fn parse_log_level(level: &str) -> AppResult<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(AppError::Configuration(format!(
            "invalid log level: {level}, use trace, debug, info, warn or error"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
        assert!(matches!(
            parse_log_level("verbose"),
            Err(AppError::Configuration(_))
        ));
    }
}
