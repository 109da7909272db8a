//! HTTP dispatcher shared by every broker operation.
//!
//! [`Broker::send`] turns a [`RequestEnvelope`] into exactly one HTTP exchange and returns an
//! [`ApiResponse`]. Remote errors and the closed set of recoverable transport failures come
//! back as values; only local failures (configuration, storage, unclassified transport errors)
//! surface as [`Error`].

mod envelope;
mod response;

pub use envelope::*;
pub use response::*;

// crates.io
use oauth2::AsyncHttpClient;
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	flows::Broker,
	http::{ApiHttpClient, ResponseMetadataSlot, TransportErrorMapper},
	obs,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `envelope`, attaching the component access token when it asks for one.
	///
	/// When the token cannot be obtained because the token endpoint answered with an error
	/// payload (or a recoverable transport failure), that payload is returned in place of the
	/// call's own response. A missing verify ticket is reported as
	/// [`Error::MissingVerifyTicket`].
	pub async fn send(&self, envelope: RequestEnvelope) -> Result<ApiResponse> {
		if !envelope.requires_token {
			return self.execute(&envelope, None).await;
		}

		let token = match self.get_component_access_token().await {
			Ok(token) => token,
			Err(Error::Remote { response }) => return Ok(response),
			Err(e) => return Err(e),
		};

		self.execute(&envelope, Some(token.expose())).await
	}

	/// Performs one HTTP exchange with an already-resolved token.
	pub(crate) async fn execute(
		&self,
		envelope: &RequestEnvelope,
		token: Option<&str>,
	) -> Result<ApiResponse> {
		let request_id = Uuid::new_v4();
		let api_base = &self.config.api_base;
		let request = envelope.to_http_request(api_base, token)?;

		obs::log_request(request_id, envelope, &envelope.url(api_base, None)?, token.is_some());

		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone(), self.config.request_timeout);
		let response = match handle.call(request).await {
			Ok(response) => ApiResponse::parse(response.body()),
			Err(e) => ApiResponse::Transport(self.transport_mapper.map_transport_error(e)?),
		};

		obs::log_response(request_id, slot.take().and_then(|meta| meta.status), &response);

		Ok(response)
	}
}
