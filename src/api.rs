//! Pass-through facade over component-level open platform endpoints.
//!
//! Each operation is a single dispatched call authenticated with the component access token.
//! Responses (including remote error payloads) are returned untouched.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::AuthorizerAppId,
	dispatch::{ApiResponse, RequestEnvelope},
	flows::Broker,
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Static description of a facade endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiOperation {
	/// Stable operation name, used as the span stage.
	pub name: &'static str,
	/// HTTP method.
	pub method: Method,
	/// Path relative to the API base.
	pub path: &'static str,
	/// Parameters the caller must supply.
	pub params: &'static [&'static str],
}
impl ApiOperation {
	/// Starts an authenticated envelope for this endpoint.
	pub fn envelope(&self) -> RequestEnvelope {
		RequestEnvelope::new(self.method.clone(), self.path)
	}
}

/// Mini program login: exchanges a `js_code` for a session on behalf of a tenant.
pub const JSCODE_TO_SESSION: ApiOperation = ApiOperation {
	name: "jscode_to_session",
	method: Method::GET,
	path: "/sns/component/jscode2session",
	params: &["appid", "js_code"],
};
/// Lists code drafts uploaded by developers.
pub const GET_TEMPLATE_DRAFT_LIST: ApiOperation = ApiOperation {
	name: "get_template_draft_list",
	method: Method::GET,
	path: "/wxa/gettemplatedraftlist",
	params: &[],
};
/// Promotes a draft into the code template library.
pub const ADD_TO_TEMPLATE: ApiOperation = ApiOperation {
	name: "add_to_template",
	method: Method::POST,
	path: "/wxa/addtotemplate",
	params: &["draft_id"],
};
/// Lists the code template library.
pub const GET_TEMPLATE_LIST: ApiOperation = ApiOperation {
	name: "get_template_list",
	method: Method::GET,
	path: "/wxa/gettemplatelist",
	params: &[],
};
/// Removes a template from the code template library.
pub const DELETE_TEMPLATE: ApiOperation = ApiOperation {
	name: "delete_template",
	method: Method::POST,
	path: "/wxa/deletetemplate",
	params: &["template_id"],
};

/// Every facade operation.
pub const OPERATIONS: [ApiOperation; 5] = [
	JSCODE_TO_SESSION,
	GET_TEMPLATE_DRAFT_LIST,
	ADD_TO_TEMPLATE,
	GET_TEMPLATE_LIST,
	DELETE_TEMPLATE,
];

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges a mini program login code for the tenant's session.
	pub async fn jscode_to_session(
		&self,
		appid: &AuthorizerAppId,
		js_code: &str,
	) -> Result<ApiResponse> {
		let envelope = JSCODE_TO_SESSION
			.envelope()
			.field("appid", appid.to_string())
			.field("js_code", js_code)
			.field("grant_type", "authorization_code")
			.field("component_appid", self.config.component_appid.to_string());

		self.call(&JSCODE_TO_SESSION, envelope).await
	}

	/// Lists code drafts.
	pub async fn get_template_draft_list(&self) -> Result<ApiResponse> {
		self.call(&GET_TEMPLATE_DRAFT_LIST, GET_TEMPLATE_DRAFT_LIST.envelope()).await
	}

	/// Adds draft `draft_id` to the template library.
	pub async fn add_to_template(&self, draft_id: u64) -> Result<ApiResponse> {
		self.call(&ADD_TO_TEMPLATE, ADD_TO_TEMPLATE.envelope().field("draft_id", draft_id)).await
	}

	/// Lists templates.
	pub async fn get_template_list(&self) -> Result<ApiResponse> {
		self.call(&GET_TEMPLATE_LIST, GET_TEMPLATE_LIST.envelope()).await
	}

	/// Deletes template `template_id`.
	pub async fn delete_template(&self, template_id: u64) -> Result<ApiResponse> {
		let envelope = DELETE_TEMPLATE.envelope().field("template_id", template_id);

		self.call(&DELETE_TEMPLATE, envelope).await
	}

	async fn call(
		&self,
		operation: &ApiOperation,
		envelope: RequestEnvelope,
	) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Api;

		let span = FlowSpan::new(KIND, operation.name);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send(envelope)).await;

		match &result {
			Ok(response) if response.is_success() =>
				obs::record_flow_outcome(KIND, FlowOutcome::Success),
			_ => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_operation_requires_the_component_token() {
		for operation in OPERATIONS {
			let envelope = operation.envelope();

			assert!(envelope.requires_token, "{} must be authenticated.", operation.name);
			assert_eq!(envelope.method, operation.method);
			assert!(operation.path.starts_with('/'));
		}
	}

	#[test]
	fn declared_params_match_the_facade() {
		assert_eq!(JSCODE_TO_SESSION.params, ["appid", "js_code"]);
		assert_eq!(ADD_TO_TEMPLATE.params, ["draft_id"]);
		assert_eq!(DELETE_TEMPLATE.params, ["template_id"]);
		assert!(GET_TEMPLATE_LIST.params.is_empty());
	}
}
