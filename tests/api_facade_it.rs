// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use wechat_component_broker::{
	_preludet::*,
	api::{ADD_TO_TEMPLATE, DELETE_TEMPLATE, GET_TEMPLATE_LIST, JSCODE_TO_SESSION},
	auth::AuthorizerAppId,
	dispatch::ApiResponse,
	flows::COMPONENT_TOKEN_PATH,
};

async fn broker_with_token(server: &MockServer) -> ReqwestTestBroker {
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Component config should build for facade tests.");
	let (broker, _store, _clock) = build_reqwest_test_broker(config);

	server
		.mock_async(|when, then| {
			when.method(POST).path(COMPONENT_TOKEN_PATH);
			then.status(200)
				.json_body(json!({ "component_access_token": "A1", "expires_in": 7200 }));
		})
		.await;
	broker.record_verify_ticket("T1").await.expect("Recording the verify ticket should succeed.");

	broker
}

#[tokio::test]
async fn jscode_to_session_sends_query_parameters() {
	let server = MockServer::start_async().await;
	let broker = broker_with_token(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(JSCODE_TO_SESSION.path)
				.query_param("appid", "wx-mini-program")
				.query_param("js_code", "js-code-1")
				.query_param("grant_type", "authorization_code")
				.query_param("component_appid", TEST_COMPONENT_APPID)
				.query_param("component_access_token", "A1");
			then.status(200).json_body(json!({ "openid": "o-1", "session_key": "s-1" }));
		})
		.await;
	let appid =
		AuthorizerAppId::new("wx-mini-program").expect("Mini program app id should be valid.");
	let response = broker
		.jscode_to_session(&appid, "js-code-1")
		.await
		.expect("jscode2session should dispatch.");

	assert_eq!(response, ApiResponse::Json(json!({ "openid": "o-1", "session_key": "s-1" })));
	assert!(response.is_success());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn template_operations_hit_their_endpoints() {
	let server = MockServer::start_async().await;
	let broker = broker_with_token(&server).await;
	let list = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(GET_TEMPLATE_LIST.path)
				.query_param("component_access_token", "A1");
			then.status(200).json_body(json!({ "errcode": 0, "errmsg": "ok", "template_list": [] }));
		})
		.await;
	let add = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(ADD_TO_TEMPLATE.path)
				.query_param("component_access_token", "A1")
				.json_body(json!({ "draft_id": 7 }));
			then.status(200).json_body(json!({ "errcode": 0, "errmsg": "ok" }));
		})
		.await;

	assert!(broker.get_template_list().await.expect("Template list should dispatch.").is_success());
	assert!(broker.add_to_template(7).await.expect("Add to template should dispatch.").is_success());

	list.assert_calls_async(1).await;
	add.assert_calls_async(1).await;
}

#[tokio::test]
async fn remote_errors_are_returned_untouched() {
	let server = MockServer::start_async().await;
	let broker = broker_with_token(&server).await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path(DELETE_TEMPLATE.path).json_body(json!({ "template_id": 42 }));
			then.status(200).json_body(json!({ "errcode": 85064, "errmsg": "template not found" }));
		})
		.await;
	let response =
		broker.delete_template(42).await.expect("Remote errors should not be broker errors.");

	assert_eq!(response.errcode(), Some(85064));
	assert_eq!(response.payload(), json!({ "errcode": 85064, "errmsg": "template not found" }));
}

#[tokio::test]
async fn token_failure_payload_replaces_the_call() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Component config should build for token failure test.");
	let (broker, _store, _clock) = build_reqwest_test_broker(config);
	let _token = server
		.mock_async(|when, then| {
			when.method(POST).path(COMPONENT_TOKEN_PATH);
			then.status(200).json_body(json!({ "errcode": 40013, "errmsg": "invalid appid" }));
		})
		.await;
	let drafts = server
		.mock_async(|when, then| {
			when.method(GET).path("/wxa/gettemplatedraftlist");
			then.status(200).json_body(json!({ "errcode": 0, "draft_list": [] }));
		})
		.await;

	broker.record_verify_ticket("T1").await.expect("Recording the verify ticket should succeed.");

	let response =
		broker.get_template_draft_list().await.expect("Token failures should not be broker errors.");

	assert_eq!(response.errcode(), Some(40013));

	drafts.assert_calls_async(0).await;
}

#[tokio::test]
async fn missing_ticket_is_reported_as_an_error() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.build()
		.expect("Component config should build for missing ticket test.");
	let (broker, _store, _clock) = build_reqwest_test_broker(config);
	let err = broker
		.get_template_list()
		.await
		.expect_err("Facade calls need a verify ticket to obtain a token.");

	assert!(matches!(err, Error::MissingVerifyTicket), "Unexpected error: {err:?}.");
}
