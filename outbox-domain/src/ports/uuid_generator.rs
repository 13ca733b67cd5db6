//! UUID 生成端口（UuidGenerator）
//!
//! 生产环境使用随机 v4，测试中使用可预测的 `SequentialUuidGenerator`。
//!
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait UuidGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

/// 随机 v4 UUID
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl UuidGenerator for UuidV4Generator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// 递增 UUID：第 n 次调用返回 `Uuid::from_u128(n)`（从 1 开始）
#[derive(Debug, Default)]
pub struct SequentialUuidGenerator {
    counter: AtomicU64,
}

impl UuidGenerator for SequentialUuidGenerator {
    fn generate(&self) -> Uuid {
        let next = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u128(u128::from(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_generator_is_predictable() {
        let id_gen = SequentialUuidGenerator::default();
        assert_eq!(id_gen.generate(), Uuid::from_u128(1));
        assert_eq!(id_gen.generate(), Uuid::from_u128(2));
    }
}
