use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 事件主题：业务事实的封闭集合，同时作为路由键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    ConventionSubmittedByBeneficiary,
    ConventionPartiallySigned,
    ConventionFullySigned,
    ConventionAcceptedByCounsellor,
    ConventionAcceptedByValidator,
    ConventionRejected,
    ConventionCancelled,
    ConventionRequiresModification,
    MagicLinkRenewalRequested,
    FormEstablishmentAdded,
    FormEstablishmentEdited,
    ContactRequestedByBeneficiary,
    ApiConsumerSaved,
    ApiConsumerKeyRevoked,
}

impl Topic {
    /// 全部主题（声明顺序）
    pub const ALL: [Topic; 14] = [
        Topic::ConventionSubmittedByBeneficiary,
        Topic::ConventionPartiallySigned,
        Topic::ConventionFullySigned,
        Topic::ConventionAcceptedByCounsellor,
        Topic::ConventionAcceptedByValidator,
        Topic::ConventionRejected,
        Topic::ConventionCancelled,
        Topic::ConventionRequiresModification,
        Topic::MagicLinkRenewalRequested,
        Topic::FormEstablishmentAdded,
        Topic::FormEstablishmentEdited,
        Topic::ContactRequestedByBeneficiary,
        Topic::ApiConsumerSaved,
        Topic::ApiConsumerKeyRevoked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::ConventionSubmittedByBeneficiary => "ConventionSubmittedByBeneficiary",
            Topic::ConventionPartiallySigned => "ConventionPartiallySigned",
            Topic::ConventionFullySigned => "ConventionFullySigned",
            Topic::ConventionAcceptedByCounsellor => "ConventionAcceptedByCounsellor",
            Topic::ConventionAcceptedByValidator => "ConventionAcceptedByValidator",
            Topic::ConventionRejected => "ConventionRejected",
            Topic::ConventionCancelled => "ConventionCancelled",
            Topic::ConventionRequiresModification => "ConventionRequiresModification",
            Topic::MagicLinkRenewalRequested => "MagicLinkRenewalRequested",
            Topic::FormEstablishmentAdded => "FormEstablishmentAdded",
            Topic::FormEstablishmentEdited => "FormEstablishmentEdited",
            Topic::ContactRequestedByBeneficiary => "ContactRequestedByBeneficiary",
            Topic::ApiConsumerSaved => "ApiConsumerSaved",
            Topic::ApiConsumerKeyRevoked => "ApiConsumerKeyRevoked",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownTopic(s.to_string()))
    }
}
