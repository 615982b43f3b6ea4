use std::collections::BTreeMap;
use std::time::Duration;

use grabber_core::ChannelType;
use grabber_engine::{
    ClaimClient, ClaimOutcome, ClientSettings, Credentials, ListResponse, ReqwestClaimClient,
    TransportFailure,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST_PATH: &str = "/prod-api/lws/agentOrder/rushOrderList";
const CLAIM_PATH: &str = "/prod-api/lws/agentOrder/rushOrder";

fn session() -> Credentials {
    let mut cookies = BTreeMap::new();
    cookies.insert("Admin-Token".to_string(), "abc".to_string());
    cookies.insert("sid".to_string(), "1".to_string());
    Credentials {
        bearer_token: "abc".into(),
        cookies,
        user_agent: "grabber-test/1.0".into(),
        target_site: None,
    }
}

fn client() -> ReqwestClaimClient {
    ReqwestClaimClient::new(ClientSettings::default()).unwrap()
}

#[tokio::test]
async fn list_sends_session_and_price_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("pageNum", "1"))
        .and(query_param("pageSize", "30"))
        .and(query_param("startAmount", "1000"))
        .and(query_param("endAmount", "10000"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("User-Agent", "grabber-test/1.0"))
        .and(header("Cookie", "Admin-Token=abc; sid=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "ok",
            "data": { "records": [
                {
                    "systemOrderNumber": "SO-1",
                    "channelTypeCode": "601",
                    "payInfo": "{\"账号\":\"1380013800\"}",
                    "orderAmount": 1200,
                    "channelTypeName": "支付宝"
                },
                { "channelTypeCode": "600" },
                {
                    "systemOrderNumber": "SO-2",
                    "channelTypeCode": "600",
                    "payInfo": null,
                    "orderAmount": 5000.5,
                    "channelTypeName": "银行卡"
                }
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .list_candidates(&server.uri(), 1000, 10_000, &session())
        .await
        .expect("list ok");

    let ListResponse::Candidates(candidates) = response else {
        panic!("expected candidates, got {response:?}");
    };
    let ids: Vec<_> = candidates.iter().map(|c| c.order_id.as_str()).collect();
    assert_eq!(ids, vec!["SO-1", "SO-2"]);
    assert_eq!(candidates[0].channel_type, ChannelType::Alipay);
    assert_eq!(candidates[1].channel_type, ChannelType::Bank);
    assert_eq!(candidates[1].amount, 5000.5);
}

#[tokio::test]
async fn list_with_application_error_is_rejected_not_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 401, "msg": "login expired" })),
        )
        .mount(&server)
        .await;

    let response = client()
        .list_candidates(&server.uri(), 1, 2, &session())
        .await
        .unwrap();
    assert_eq!(
        response,
        ListResponse::Rejected {
            code: 401,
            reason: "login expired".into()
        }
    );
}

#[tokio::test]
async fn list_without_records_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "data": null })))
        .mount(&server)
        .await;

    let response = client()
        .list_candidates(&format!("{}/", server.uri()), 1, 2, &session())
        .await
        .unwrap();
    assert_eq!(response, ListResponse::Candidates(Vec::new()));
}

#[tokio::test]
async fn list_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client()
        .list_candidates(&server.uri(), 1, 2, &session())
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportFailure::HttpStatus(502));
}

#[tokio::test]
async fn list_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "code": 0 })),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    };
    let client = ReqwestClaimClient::new(settings).unwrap();
    let err = client
        .list_candidates(&server.uri(), 1, 2, &session())
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportFailure::Timeout);
}

#[tokio::test]
async fn list_with_garbage_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client()
        .list_candidates(&server.uri(), 1, 2, &session())
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportFailure::Decode);
}

#[tokio::test]
async fn claim_reports_application_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLAIM_PATH))
        .and(query_param("orderNo", "WIN"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "ok" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CLAIM_PATH))
        .and(query_param("orderNo", "LOSE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 500, "msg": "order already taken" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CLAIM_PATH))
        .and(query_param("orderNo", "SILENT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 7 })))
        .mount(&server)
        .await;

    let client = client();
    let site = server.uri();
    assert_eq!(
        client.claim(&site, "WIN", &session()).await.unwrap(),
        ClaimOutcome::Success
    );
    assert_eq!(
        client.claim(&site, "LOSE", &session()).await.unwrap(),
        ClaimOutcome::Failure("order already taken".into())
    );
    assert_eq!(
        client.claim(&site, "SILENT", &session()).await.unwrap(),
        ClaimOutcome::Failure("application code 7".into())
    );
}

#[tokio::test]
async fn claim_against_unparseable_site_is_invalid_url() {
    let err = client()
        .claim("not a site", "X", &session())
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportFailure::InvalidUrl);
}

#[tokio::test]
async fn user_info_returns_account_document() {
    let server = MockServer::start().await;
    let body = json!({ "code": 200, "user": { "userName": "trader" } });
    Mock::given(method("GET"))
        .and(path("/prod-api/getInfo"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let info = client().user_info(&server.uri(), &session()).await.unwrap();
    assert_eq!(info, body);
}

#[tokio::test]
async fn empty_user_agent_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CLAIM_PATH))
        .and(header("User-Agent", "grabber-test/1.0"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CLAIM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0 })))
        .mount(&server)
        .await;

    let credentials = Credentials {
        user_agent: String::new(),
        ..session()
    };
    let outcome = client()
        .claim(&server.uri(), "X", &credentials)
        .await
        .unwrap();
    assert_eq!(outcome, ClaimOutcome::Success);
}
