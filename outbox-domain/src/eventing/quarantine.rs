use crate::domain_event::Topic;
use crate::error::DomainError;
use std::collections::HashSet;
use std::str::FromStr;

/// 隔离配置：这些主题的任何投递失败都直接进入 `quarantined`，不走重试
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuarantineConfig {
    topics: HashSet<Topic>,
}

impl QuarantineConfig {
    pub fn new(topics: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            topics: topics.into_iter().collect(),
        }
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.topics.contains(&topic)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.topics.iter().copied()
    }
}

/// 解析逗号分隔的主题列表，忽略空白项；未知主题报错
impl FromStr for QuarantineConfig {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let topics = s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Topic::from_str)
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(Self { topics })
    }
}
