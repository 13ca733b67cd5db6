//! 爬取器进程配置
//!
//! 按以下顺序合并（后者覆盖前者）：
//! 1. `OutboxConfig::default()`；
//! 2. TOML 配置文件（若存在）；
//! 3. `OUTBOX_` 前缀的环境变量，如 `OUTBOX_CRAWLING_PERIOD_MS=5000`。
//!
use crate::error::{AppError, AppResult};
use crate::logging::parse_log_level;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use outbox_domain::eventing::{
    CrawlerConfig, DEFAULT_CRAWLING_PERIOD, DEFAULT_HANDLER_TIMEOUT, QuarantineConfig,
    SchedulingPolicy,
};
use outbox_domain::eventing::crawler::{
    DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_DELIVERY_ATTEMPTS, DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV_PREFIX: &str = "OUTBOX_";
pub const DEFAULT_CONFIG_FILENAME: &str = "outbox.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    /// 逗号分隔的隔离主题
    pub quarantined_topics: String,
    /// 新事件循环周期；重试循环固定为 `RETRY_PERIOD`
    pub crawling_period_ms: u64,
    pub max_concurrent: usize,
    pub max_delivery_attempts: usize,
    pub page_size: usize,
    /// 单个处理器调用超时；0 表示不限时
    pub handler_timeout_ms: u64,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            quarantined_topics: String::new(),
            crawling_period_ms: DEFAULT_CRAWLING_PERIOD.as_millis() as u64,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            page_size: DEFAULT_PAGE_SIZE,
            handler_timeout_ms: DEFAULT_HANDLER_TIMEOUT.as_millis() as u64,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl OutboxConfig {
    pub fn validate(&self) -> AppResult<()> {
        let zeroes = [
            ("crawling_period_ms", self.crawling_period_ms == 0),
            ("max_concurrent", self.max_concurrent == 0),
            ("max_delivery_attempts", self.max_delivery_attempts == 0),
            ("page_size", self.page_size == 0),
        ];
        if let Some((key, _)) = zeroes.iter().find(|(_, zero)| *zero) {
            return Err(AppError::Configuration(format!("{key} must be greater than 0")));
        }

        self.quarantine()?;
        parse_log_level(&self.log_level)?;
        Ok(())
    }

    pub fn quarantine(&self) -> AppResult<QuarantineConfig> {
        self.quarantined_topics
            .parse()
            .map_err(|err| AppError::Configuration(format!("quarantined_topics: {err}")))
    }

    pub fn crawler_config(&self) -> AppResult<CrawlerConfig> {
        Ok(CrawlerConfig::builder()
            .max_concurrent(self.max_concurrent)
            .page_size(self.page_size)
            .max_delivery_attempts(self.max_delivery_attempts)
            .quarantine(self.quarantine()?)
            .build())
    }

    pub fn scheduling_policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::periodic(Duration::from_millis(self.crawling_period_ms))
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }
}

/// 配置加载器
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定配置文件；未指定时尝试当前目录下的 `outbox.toml`
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(OutboxConfig::default()));

        let path = self
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
        if path.exists() {
            figment = figment.merge(Toml::file(&path));
        } else if self.config_path.is_some() {
            tracing::warn!(path = %path.display(), "configuration file not found");
        }

        figment.merge(Env::prefixed(&self.env_prefix))
    }

    /// 加载并校验配置
    pub fn load(&self) -> AppResult<OutboxConfig> {
        let config: OutboxConfig = self.figment().extract()?;
        config.validate()?;
        Ok(config)
    }
}
