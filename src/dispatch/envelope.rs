//! Outbound request description consumed by the dispatcher.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		HeaderMap, HeaderName, HeaderValue, Method, Request,
		header::{ACCEPT_ENCODING, CONTENT_TYPE},
	},
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Query parameter carrying the component access token.
pub const TOKEN_QUERY_PARAM: &str = "component_access_token";

const REDACTED: &str = "<redacted>";
const SENSITIVE_FIELDS: [&str; 3] =
	["component_appsecret", "component_verify_ticket", "authorizer_refresh_token"];
const SENSITIVE_HEADERS: [&str; 4] =
	["authorization", "cookie", "proxy-authorization", "set-cookie"];

/// Method, path, body fields, and headers for one open platform call.
///
/// POST bodies are sent as JSON; GET bodies are flattened into the query string. Fields whose
/// value is JSON `null` are dropped before sending.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestEnvelope {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured API base.
	pub path: String,
	/// Top-level body fields.
	pub body: JsonMap<String, JsonValue>,
	/// Caller headers, merged over the defaults.
	pub headers: Vec<(String, String)>,
	/// Attach the component access token as a query parameter.
	pub requires_token: bool,
}
impl RequestEnvelope {
	/// Builds a token-authenticated envelope.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			body: JsonMap::new(),
			headers: Vec::new(),
			requires_token: true,
		}
	}

	/// Shorthand for a GET envelope.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a POST envelope.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Sets a body field.
	pub fn field(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.body.insert(key.into(), value.into());

		self
	}

	/// Replaces the whole body.
	pub fn with_body(mut self, body: JsonMap<String, JsonValue>) -> Self {
		self.body = body;

		self
	}

	/// Adds a caller header; it wins over a default of the same name.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Skips the component access token.
	pub fn without_token(mut self) -> Self {
		self.requires_token = false;

		self
	}

	/// Body fields with `null` values removed.
	pub fn payload(&self) -> JsonMap<String, JsonValue> {
		self.body
			.iter()
			.filter(|(_, value)| !value.is_null())
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect()
	}

	/// Caller headers merged over `Content-Type: application/json` and `Accept-Encoding: *`.
	///
	/// Names compare case-insensitively; defaults only fill in what the caller left out.
	pub fn merged_headers(&self) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::new();

		for (name, value) in &self.headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		if !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		}
		if !headers.contains_key(ACCEPT_ENCODING) {
			headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("*"));
		}

		Ok(headers)
	}

	/// Resolves the full URL, appending GET fields and the token as query parameters.
	///
	/// The path is resolved under `api_base`, so a base with a path prefix (a reverse proxy
	/// mounted at `/wechat/`, say) keeps that prefix.
	pub fn url(&self, api_base: &Url, token: Option<&str>) -> Result<Url, ConfigError> {
		let mut base = api_base.clone();

		if !base.path().ends_with('/') {
			let prefix = format!("{}/", base.path());

			base.set_path(&prefix);
		}

		let mut url = base
			.join(self.path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: self.path.clone(), source })?;
		let mut pairs = Vec::new();

		if self.method == Method::GET {
			pairs.extend(self.payload().into_iter().map(|(key, value)| (key, query_value(value))));
		}
		if let Some(token) = token {
			pairs.push((TOKEN_QUERY_PARAM.to_owned(), token.to_owned()));
		}
		if !pairs.is_empty() {
			url.query_pairs_mut().extend_pairs(pairs);
		}

		Ok(url)
	}

	/// Builds the HTTP request handed to the transport.
	pub fn to_http_request(
		&self,
		api_base: &Url,
		token: Option<&str>,
	) -> Result<HttpRequest, ConfigError> {
		let url = self.url(api_base, token)?;
		let body = if self.method == Method::GET {
			Vec::new()
		} else {
			serde_json::to_vec(&self.payload()).map_err(ConfigError::BodySerialize)?
		};
		let mut request =
			Request::builder().method(self.method.clone()).uri(url.as_str()).body(body)?;

		*request.headers_mut() = self.merged_headers()?;

		Ok(request)
	}

	/// Body fields with secrets masked, for logging.
	pub fn redacted_payload(&self) -> JsonMap<String, JsonValue> {
		let mut payload = self.payload();

		for field in SENSITIVE_FIELDS {
			if let Some(value) = payload.get_mut(field) {
				*value = JsonValue::String(REDACTED.into());
			}
		}

		payload
	}

	/// Caller headers with credential-bearing values masked, for logging.
	pub fn redacted_headers(&self) -> Vec<(String, String)> {
		self.headers
			.iter()
			.map(|(name, value)| {
				let sensitive =
					SENSITIVE_HEADERS.iter().any(|header| header.eq_ignore_ascii_case(name));
				let value = if sensitive { REDACTED.to_owned() } else { value.clone() };

				(name.clone(), value)
			})
			.collect()
	}
}

fn query_value(value: JsonValue) -> String {
	match value {
		JsonValue::String(text) => text,
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn api_base() -> Url {
		Url::parse("https://api.weixin.qq.com").expect("API base fixture should parse.")
	}

	#[test]
	fn null_fields_are_dropped() {
		let envelope = RequestEnvelope::post("/wxa/addtotemplate")
			.field("draft_id", 7)
			.field("template_type", JsonValue::Null);

		assert_eq!(JsonValue::Object(envelope.payload()), json!({ "draft_id": 7 }));
	}

	#[test]
	fn caller_headers_win_over_defaults_case_insensitively() {
		let headers = RequestEnvelope::post("/x")
			.header("content-type", "text/plain")
			.merged_headers()
			.expect("Headers should merge.");

		assert_eq!(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()), Some("text/plain"));
		assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
		assert_eq!(headers.get(ACCEPT_ENCODING).and_then(|v| v.to_str().ok()), Some("*"));
	}

	#[test]
	fn invalid_headers_are_rejected() {
		let err = RequestEnvelope::get("/x")
			.header("bad header", "v")
			.merged_headers()
			.expect_err("Spaces are not allowed in header names.");

		assert!(matches!(err, ConfigError::InvalidHeader { name } if name == "bad header"));
	}

	#[test]
	fn get_fields_and_token_land_in_the_query() {
		let url = RequestEnvelope::get("/sns/component/jscode2session")
			.field("appid", "wx-tenant")
			.field("js_code", "code-1")
			.field("skipped", JsonValue::Null)
			.url(&api_base(), Some("A1"))
			.expect("URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

		assert_eq!(url.path(), "/sns/component/jscode2session");
		assert_eq!(pairs.get("appid").map(String::as_str), Some("wx-tenant"));
		assert_eq!(pairs.get("js_code").map(String::as_str), Some("code-1"));
		assert_eq!(pairs.get(TOKEN_QUERY_PARAM).map(String::as_str), Some("A1"));
		assert!(!pairs.contains_key("skipped"));
	}

	#[test]
	fn api_base_path_prefix_is_kept() {
		for base in ["https://proxy.example.com/wechat/", "https://proxy.example.com/wechat"] {
			let api_base = Url::parse(base).expect("Proxy base fixture should parse.");
			let url = RequestEnvelope::post("/cgi-bin/component/api_component_token")
				.url(&api_base, Some("A1"))
				.expect("URL should build.");

			assert_eq!(url.host_str(), Some("proxy.example.com"));
			assert_eq!(url.path(), "/wechat/cgi-bin/component/api_component_token");
			assert_eq!(url.query(), Some("component_access_token=A1"));
		}

		let root = RequestEnvelope::get("/wxa/gettemplatelist")
			.url(&api_base(), None)
			.expect("URL should build.");

		assert_eq!(root.as_str(), "https://api.weixin.qq.com/wxa/gettemplatelist");
	}

	#[test]
	fn post_bodies_are_json_and_tokenless_urls_have_no_query() {
		let envelope = RequestEnvelope::post("/cgi-bin/component/api_component_token")
			.without_token()
			.field("component_appid", "wx-component");
		let request =
			envelope.to_http_request(&api_base(), None).expect("Request should build.");

		assert_eq!(request.uri().query(), None);
		assert_eq!(request.method(), Method::POST);
		assert_eq!(
			serde_json::from_slice::<JsonValue>(request.body()).expect("Body should be JSON."),
			json!({ "component_appid": "wx-component" })
		);
	}

	#[test]
	fn secrets_are_masked_in_logged_payloads() {
		let envelope = RequestEnvelope::post("/x")
			.field("component_appsecret", "s3cret")
			.field("component_verify_ticket", "ticket@@@value")
			.field("component_appid", "wx-component");
		let logged = JsonValue::Object(envelope.redacted_payload()).to_string();

		assert!(!logged.contains("s3cret"));
		assert!(!logged.contains("ticket@@@value"));
		assert!(logged.contains("wx-component"));
	}

	#[test]
	fn credential_headers_are_masked_in_logs() {
		let envelope = RequestEnvelope::get("/x")
			.header("Authorization", "Bearer s3cret")
			.header("Cookie", "session=abc")
			.header("X-Request-Source", "broker");

		assert_eq!(
			envelope.redacted_headers(),
			vec![
				("Authorization".to_owned(), REDACTED.to_owned()),
				("Cookie".to_owned(), REDACTED.to_owned()),
				("X-Request-Source".to_owned(), "broker".to_owned()),
			]
		);
		assert_eq!(envelope.headers[0].1, "Bearer s3cret");
	}
}
