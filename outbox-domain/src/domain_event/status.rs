use serde::{Deserialize, Serialize};
use std::fmt;

/// 事件投递状态
///
/// 状态机：
/// - `never-published → in-process → {published | failed | quarantined}`；
/// - `failed → in-process → {published | failed | quarantined}`；
/// - `in-process` 可被释放回 `never-published`/`failed`（爬取器重启时回收认领）；
/// - `published` 与 `quarantined` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    NeverPublished,
    InProcess,
    Published,
    Failed,
    Quarantined,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::NeverPublished => "never-published",
            EventStatus::InProcess => "in-process",
            EventStatus::Published => "published",
            EventStatus::Failed => "failed",
            EventStatus::Quarantined => "quarantined",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Published | EventStatus::Quarantined)
    }

    /// 状态机是否允许 `self → next`
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        use EventStatus::*;

        match (self, next) {
            (NeverPublished, InProcess | Published | Failed | Quarantined) => true,
            (InProcess, NeverPublished | Published | Failed | Quarantined) => true,
            (Failed, InProcess | Published | Failed | Quarantined) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
