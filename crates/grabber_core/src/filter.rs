use std::collections::BTreeSet;

use serde::Deserialize;

use crate::{Candidate, ChannelType, PaymentMethod};

/// Accounts at or above this many characters are never claimed.
pub const MAX_ACCOUNT_LEN: usize = 13;

/// Structured payment descriptor carried in `Candidate::pay_info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PayInfo {
    #[serde(rename = "账号", alias = "account")]
    pub account: String,
}

impl PayInfo {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Classify a candidate into the payment method it would be claimed under.
///
/// Returns `None` for unknown channels, long accounts and descriptors that do
/// not parse.
pub fn eligible_method(candidate: &Candidate) -> Option<PaymentMethod> {
    let method = match candidate.channel_type {
        ChannelType::Alipay => PaymentMethod::Alipay,
        ChannelType::Bank => PaymentMethod::Bank,
        ChannelType::Other(_) => return None,
    };
    let pay_info = PayInfo::parse(candidate.pay_info.as_deref()?)?;
    if pay_info.account.chars().count() < MAX_ACCOUNT_LEN {
        Some(method)
    } else {
        None
    }
}

pub fn should_claim(candidate: &Candidate, enabled: &BTreeSet<PaymentMethod>) -> bool {
    eligible_method(candidate).is_some_and(|method| enabled.contains(&method))
}

/// Warning text for a candidate the filter rejected.
pub fn skip_message(candidate: &Candidate) -> String {
    format!(
        "skipped order {}: payment method not selected (channel: {}, amount: {})",
        candidate.order_id, candidate.channel_type_name, candidate.amount
    )
}
