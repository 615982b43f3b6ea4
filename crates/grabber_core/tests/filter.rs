use std::collections::BTreeSet;

use grabber_core::{should_claim, Candidate, ChannelType, PaymentMethod};

fn alipay_with_account(account: &str) -> Candidate {
    Candidate {
        order_id: "A100".into(),
        channel_type: ChannelType::Alipay,
        pay_info: Some(format!(r#"{{"账号":"{account}","姓名":"x"}}"#)),
        amount: 1500.0,
        channel_type_name: "alipay".into(),
    }
}

fn methods(list: &[PaymentMethod]) -> BTreeSet<PaymentMethod> {
    list.iter().copied().collect()
}

#[test]
fn short_alipay_account_follows_enabled_methods() {
    let candidate = alipay_with_account("1380013800");
    assert!(should_claim(&candidate, &methods(&[PaymentMethod::Alipay])));
    assert!(should_claim(
        &candidate,
        &methods(&[PaymentMethod::Alipay, PaymentMethod::Bank])
    ));
    assert!(!should_claim(&candidate, &methods(&[PaymentMethod::Bank])));
    assert!(!should_claim(&candidate, &methods(&[])));
}

#[test]
fn thirteen_character_account_is_never_claimed() {
    let candidate = alipay_with_account("1234567890123");
    assert!(!should_claim(
        &candidate,
        &methods(&[PaymentMethod::Alipay, PaymentMethod::Bank])
    ));
}

#[test]
fn malformed_pay_info_is_rejected() {
    let mut candidate = alipay_with_account("1");
    candidate.pay_info = Some("{not json".into());
    assert!(!should_claim(&candidate, &methods(&[PaymentMethod::Alipay])));

    candidate.pay_info = Some(r#"{"other":"field"}"#.into());
    assert!(!should_claim(&candidate, &methods(&[PaymentMethod::Alipay])));
}

#[test]
fn bank_channel_needs_bank_enabled() {
    let mut candidate = alipay_with_account("6222");
    candidate.channel_type = ChannelType::Bank;
    assert!(should_claim(&candidate, &methods(&[PaymentMethod::Bank])));
    assert!(!should_claim(&candidate, &methods(&[PaymentMethod::Alipay])));
}

#[test]
fn candidate_decodes_from_listing_record() {
    let record = serde_json::json!({
        "systemOrderNumber": "SO-77",
        "channelTypeCode": 601,
        "payInfo": "{\"账号\":\"13800138000\"}",
        "orderAmount": 3200.5,
        "channelTypeName": "支付宝",
        "createTime": "2024-01-01 10:00:00"
    });
    let candidate: Candidate = serde_json::from_value(record).unwrap();
    assert_eq!(candidate.order_id, "SO-77");
    assert_eq!(candidate.channel_type, ChannelType::Alipay);
    assert_eq!(candidate.amount, 3200.5);
    assert!(should_claim(&candidate, &methods(&[PaymentMethod::Alipay])));
}

#[test]
fn string_channel_codes_are_recognised() {
    assert_eq!(ChannelType::from_code("600"), ChannelType::Bank);
    assert_eq!(ChannelType::from_code(" 601 "), ChannelType::Alipay);
    assert_eq!(
        ChannelType::from_code("999"),
        ChannelType::Other("999".into())
    );
}
