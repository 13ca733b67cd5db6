use bon::Builder;

/// 应用层上下文（Application Context）
///
/// 承载一次用例调用所需的横切信息，例如：
/// - 关联追踪 `correlation_id` 与执行者 `actor_id`，用于日志与审计；
/// - 幂等键（`idempotency_key`）：用于在基础设施层实现请求幂等。
///
/// 典型用法：
/// ```rust
/// use outbox_application::context::AppContext;
///
/// let ctx = AppContext::builder()
///     .correlation_id("cor-123".to_string())
///     .actor_id("u-1".to_string())
///     .build();
/// assert!(ctx.idempotency_key.is_none());
/// ```
#[derive(Builder, Clone, Debug, Default)]
pub struct AppContext {
    /// 关联追踪标识
    pub correlation_id: Option<String>,
    /// 执行者标识
    pub actor_id: Option<String>,
    /// 幂等键（可选）：为空则由上层或基础设施决定是否参与幂等
    pub idempotency_key: Option<String>,
}
