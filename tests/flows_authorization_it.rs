// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use wechat_component_broker::{
	_preludet::*,
	auth::AuthorizerAppId,
	clock::{Clock, ManualClock},
	dispatch::Outcome,
	flows::{AUTHORIZER_TOKEN_PATH, COMPONENT_TOKEN_PATH, QUERY_AUTH_PATH},
};

const TENANT_APPID: &str = "wx-tenant-appid";

async fn ready_broker(server: &MockServer) -> (ReqwestTestBroker, Arc<ManualClock>) {
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Component config should build for authorization tests.");
	let (broker, _store, clock) = build_reqwest_test_broker(config);

	server
		.mock_async(|when, then| {
			when.method(POST).path(COMPONENT_TOKEN_PATH);
			then.status(200)
				.json_body(json!({ "component_access_token": "A1", "expires_in": 7200 }));
		})
		.await;
	broker.record_verify_ticket("T1").await.expect("Recording the verify ticket should succeed.");

	(broker, clock)
}

fn tenant() -> AuthorizerAppId {
	AuthorizerAppId::new(TENANT_APPID).expect("Tenant app id fixture should be valid.")
}

#[tokio::test]
async fn query_auth_returns_tenant_credentials() {
	let server = MockServer::start_async().await;
	let (broker, clock) = ready_broker(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(QUERY_AUTH_PATH)
				.query_param("component_access_token", "A1")
				.json_body(json!({
					"component_appid": TEST_COMPONENT_APPID,
					"authorization_code": "auth-code-1",
				}));
			then.status(200).json_body(json!({
				"authorization_info": {
					"authorizer_appid": TENANT_APPID,
					"authorizer_access_token": "tenant-access",
					"expires_in": 7200,
					"authorizer_refresh_token": "tenant-refresh",
					"func_info": [
						{ "funcscope_category": { "id": 1 } },
						{ "funcscope_category": { "id": 18 } }
					]
				}
			}));
		})
		.await;
	let outcome =
		broker.query_auth("auth-code-1").await.expect("Authorization exchange should not error.");
	let info = outcome.success().expect("Authorization exchange should succeed.");

	assert_eq!(info.credentials.authorizer_appid, tenant());
	assert_eq!(info.credentials.authorizer_access_token.expose(), "tenant-access");
	assert_eq!(info.credentials.authorizer_refresh_token.expose(), "tenant-refresh");
	assert_eq!(info.credentials.expires_at, clock.now() + Duration::seconds(7200));
	assert_eq!(info.granted_categories, vec![1, 18]);
	assert!(info.grants(18));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn query_auth_passes_remote_errors_through() {
	let server = MockServer::start_async().await;
	let (broker, _clock) = ready_broker(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(QUERY_AUTH_PATH);
			then.status(200).json_body(json!({ "errcode": 61010, "errmsg": "code is expired" }));
		})
		.await;
	let outcome =
		broker.query_auth("stale-code").await.expect("Remote errors should not be broker errors.");

	match outcome {
		Outcome::Failure(response) => {
			assert_eq!(response.payload(), json!({ "errcode": 61010, "errmsg": "code is expired" }));
		},
		Outcome::Success(info) => panic!("Unexpected success: {info:?}."),
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_carries_over_the_refresh_token_when_omitted() {
	let server = MockServer::start_async().await;
	let (broker, clock) = ready_broker(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTHORIZER_TOKEN_PATH).json_body(json!({
				"component_appid": TEST_COMPONENT_APPID,
				"authorizer_appid": TENANT_APPID,
				"authorizer_refresh_token": "tenant-refresh",
			}));
			then.status(200).json_body(json!({
				"authorizer_access_token": "tenant-access-2",
				"expires_in": 7200,
			}));
		})
		.await;
	let credentials = broker
		.refresh_authorizer_access_token(&tenant(), "tenant-refresh")
		.await
		.expect("Authorizer refresh should not error.")
		.success()
		.expect("Authorizer refresh should succeed.");

	assert_eq!(credentials.authorizer_access_token.expose(), "tenant-access-2");
	assert_eq!(credentials.authorizer_refresh_token.expose(), "tenant-refresh");
	assert_eq!(credentials.expires_at, clock.now() + Duration::hours(2));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_adopts_a_rotated_refresh_token() {
	let server = MockServer::start_async().await;
	let (broker, _clock) = ready_broker(&server).await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTHORIZER_TOKEN_PATH);
			then.status(200).json_body(json!({
				"authorizer_access_token": "tenant-access-2",
				"expires_in": 7200,
				"authorizer_refresh_token": "tenant-refresh-2",
			}));
		})
		.await;
	let credentials = broker
		.refresh_authorizer_access_token(&tenant(), "tenant-refresh")
		.await
		.expect("Authorizer refresh should not error.")
		.success()
		.expect("Authorizer refresh should succeed.");

	assert_eq!(credentials.authorizer_refresh_token.expose(), "tenant-refresh-2");
}

#[tokio::test]
async fn refresh_passes_remote_errors_through() {
	let server = MockServer::start_async().await;
	let (broker, _clock) = ready_broker(&server).await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(AUTHORIZER_TOKEN_PATH);
			then.status(200)
				.json_body(json!({ "errcode": 61023, "errmsg": "refresh_token is invalid" }));
		})
		.await;
	let outcome = broker
		.refresh_authorizer_access_token(&tenant(), "revoked")
		.await
		.expect("Remote errors should not be broker errors.");

	assert_eq!(outcome.failure().and_then(|response| response.errcode()), Some(61023));
}
