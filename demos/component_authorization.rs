//! Interactive component authorization walkthrough.
//!
//! The demo records a verify ticket pasted from the platform push, prints the login page URL a
//! tenant administrator opens, and optionally exchanges the `auth_code` returned to the redirect
//! URL for the tenant's credentials.

// std
use std::{
	io::{self, Write},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use wechat_component_broker::{
	auth::ComponentAppId,
	config::ComponentConfig,
	dispatch::Outcome,
	flows::{AuthType, AuthorizationRequest, Broker},
	store::{CacheStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let appid = prompt_with_default("Enter your component app id", Some("wx-component-demo"))?;
	let secret = prompt_with_default("Enter your component app secret", None)?;
	let redirect_input = prompt_with_default(
		"Enter the authorization redirect URL",
		Some("https://app.example.com/wechat/callback"),
	)?;
	let config = ComponentConfig::builder(ComponentAppId::new(appid)?, secret)
		.auth_redirect_url(Url::parse(&redirect_input)?)
		.build()?;
	let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
	let broker = Broker::new(store, config);
	let ticket = prompt_with_default("Paste the latest component_verify_ticket", None)?;

	broker.record_verify_ticket(ticket).await?;

	let url = broker
		.authorization_url(AuthorizationRequest::default().auth_type(AuthType::All))
		.await?;

	println!("Login page URL: {url}");

	let auth_code = prompt_with_default("Paste the auth_code (leave blank to stop)", Some(""))?;

	if auth_code.is_empty() {
		return Ok(());
	}

	match broker.query_auth(&auth_code).await? {
		Outcome::Success(info) => {
			println!("Authorized tenant: {}", info.credentials.authorizer_appid);
			println!("Granted categories: {:?}", info.granted_categories);
			println!("Access token expires at: {}", info.credentials.expires_at);
		},
		Outcome::Failure(response) => println!("Authorization exchange failed: {response}"),
	}

	Ok(())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
	match default {
		Some(value) if !value.is_empty() => print!("{label} [{value}]: "),
		_ => print!("{label}: "),
	}

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() {
		Ok(default.unwrap_or_default().to_owned())
	} else {
		Ok(trimmed.to_owned())
	}
}
