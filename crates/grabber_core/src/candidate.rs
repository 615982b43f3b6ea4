use serde::{Deserialize, Serialize};

const ALIPAY_CODE: &str = "601";
const BANK_CODE: &str = "600";

/// Payment channel class of a listing, decoded from `channelTypeCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChannelCode", into = "String")]
pub enum ChannelType {
    Alipay,
    Bank,
    Other(String),
}

impl ChannelType {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            ALIPAY_CODE => ChannelType::Alipay,
            BANK_CODE => ChannelType::Bank,
            other => ChannelType::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ChannelType::Alipay => ALIPAY_CODE,
            ChannelType::Bank => BANK_CODE,
            ChannelType::Other(code) => code,
        }
    }
}

impl Default for ChannelType {
    fn default() -> Self {
        ChannelType::Other(String::new())
    }
}

// The listing endpoint is inconsistent about quoting the code.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChannelCode {
    Text(String),
    Number(i64),
}

impl From<ChannelCode> for ChannelType {
    fn from(code: ChannelCode) -> Self {
        match code {
            ChannelCode::Text(text) => ChannelType::from_code(&text),
            ChannelCode::Number(number) => ChannelType::from_code(&number.to_string()),
        }
    }
}

impl From<ChannelType> for String {
    fn from(channel: ChannelType) -> Self {
        channel.code().to_string()
    }
}

/// One open order from the listing endpoint. Lives for a single poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(rename = "systemOrderNumber")]
    pub order_id: String,
    #[serde(rename = "channelTypeCode", default)]
    pub channel_type: ChannelType,
    /// Payment descriptor as sent by the server: a JSON document in a string.
    #[serde(default)]
    pub pay_info: Option<String>,
    #[serde(rename = "orderAmount", default)]
    pub amount: f64,
    #[serde(default)]
    pub channel_type_name: String,
}
