//! Transport primitives for GraphQL-over-HTTP exchanges.
//!
//! The dispatcher never talks to the network itself. It asks a [`TransportFactory`] for a fresh
//! [`Transport`] every time a credential is renewed, passing the caller's [`TransportOptions`]
//! with the `Authorization` header filled in, and forwards each [`Operation`] to whichever
//! transport is current. [`ReqwestTransportFactory`] is the default implementation.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
// self
use crate::{_prelude::*, auth::BearerToken};
#[cfg(feature = "reqwest")]
use crate::{
	config,
	error::{ConfigError, TransportError},
};

/// Name of the header the dispatcher owns exclusively.
pub const AUTHORIZATION: &str = "Authorization";

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<serde_json::Value>> + 'a + Send>>;

/// One GraphQL request. The dispatcher treats it as an opaque payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
	/// GraphQL document.
	pub query: String,
	/// Variables bound to the document.
	#[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
	pub variables: serde_json::Value,
	/// Operation to execute when the document defines several.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation_name: Option<String>,
}
impl Operation {
	/// Creates an operation for the provided document without variables.
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), variables: serde_json::Value::Null, operation_name: None }
	}

	/// Binds variables to the operation.
	pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
		self.variables = variables;

		self
	}

	/// Selects the named operation.
	pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
		self.operation_name = Some(name.into());

		self
	}
}

/// Caller configuration merged into every transport the dispatcher builds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
	/// Extra request headers. Must not contain `Authorization`.
	pub headers: BTreeMap<String, String>,
	/// Per-request timeout enforced by the transport.
	pub timeout: Option<Duration>,
	/// `User-Agent` header override.
	pub user_agent: Option<String>,
}
impl TransportOptions {
	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the per-request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the `User-Agent` header.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Looks up a header value, ignoring ASCII case in the name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns the header name as spelled by the caller, ignoring ASCII case in the lookup.
	pub fn find_header(&self, name: &str) -> Option<&str> {
		self.headers.keys().find(|key| key.eq_ignore_ascii_case(name)).map(String::as_str)
	}

	/// Returns a copy of these options carrying `Authorization: Bearer <token>`.
	pub fn with_bearer(&self, token: &BearerToken) -> Self {
		let mut merged = self.clone();

		merged.headers.retain(|key, _| !key.eq_ignore_ascii_case(AUTHORIZATION));
		merged.headers.insert(AUTHORIZATION.into(), token.authorization_value());

		merged
	}
}

/// A request/response channel bound to one credential's lifetime.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes `operation` and resolves with the response `data`.
	fn send(&self, operation: Operation) -> TransportFuture<'_>;
}

/// Builds a [`Transport`] for an endpoint and a set of options.
///
/// The dispatcher calls [`build`](TransportFactory::build) once per successful refresh and never
/// mutates a transport after installing it.
pub trait TransportFactory
where
	Self: 'static + Send + Sync,
{
	/// Builds a transport that sends to `endpoint` with `options`.
	fn build(&self, endpoint: &Url, options: TransportOptions) -> Result<Arc<dyn Transport>>;
}

/// Factory for [`ReqwestTransport`] instances sharing one connection pool.
///
/// Clients built through [`ReqwestTransportFactory::try_new`] do not follow redirects; a custom
/// client passed to [`ReqwestTransportFactory::with_client`] keeps whatever policy it was built
/// with.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransportFactory(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransportFactory {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a factory around a client that does not follow redirects.
	pub fn try_new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl TransportFactory for ReqwestTransportFactory {
	fn build(&self, endpoint: &Url, options: TransportOptions) -> Result<Arc<dyn Transport>> {
		let transport = ReqwestTransport::new(self.0.clone(), endpoint.clone(), &options)?;

		Ok(Arc::new(transport))
	}
}

/// GraphQL-over-HTTP transport backed by reqwest.
///
/// Posts `{"query", "variables", "operationName"}` as JSON and resolves with the response `data`.
/// Non-success statuses map to [`TransportError::Status`] and a non-empty `errors` array maps to
/// [`Error::GraphQl`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	endpoint: Url,
	headers: HeaderMap,
	timeout: Option<std::time::Duration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport, validating every configured header.
	pub fn new(client: ReqwestClient, endpoint: Url, options: &TransportOptions) -> Result<Self> {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		for (name, value) in &options.headers {
			let invalid = || ConfigError::InvalidHeader { header: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let mut header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			if header_name == reqwest::header::AUTHORIZATION {
				header_value.set_sensitive(true);
			}

			headers.insert(header_name, header_value);
		}

		if let Some(user_agent) = options.user_agent.as_deref() {
			let value = HeaderValue::from_str(user_agent)
				.map_err(|_| ConfigError::InvalidHeader { header: USER_AGENT.to_string() })?;

			headers.insert(USER_AGENT, value);
		}

		Ok(Self { client, endpoint, headers, timeout: options.timeout.map(config::to_std) })
	}

	async fn execute(&self, operation: Operation) -> Result<serde_json::Value> {
		let mut request =
			self.client.post(self.endpoint.clone()).headers(self.headers.clone()).json(&operation);

		if let Some(timeout) = self.timeout {
			request = request.timeout(timeout);
		}

		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(TransportError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
			}
			.into());
		}

		let document: GraphQlResponse =
			serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&body))
				.map_err(|source| TransportError::MalformedResponse { source })?;

		if !document.errors.is_empty() {
			return Err(Error::GraphQl { errors: document.errors });
		}

		Ok(document.data)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, operation: Operation) -> TransportFuture<'_> {
		Box::pin(self.execute(operation))
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestTransport")
			.field("endpoint", &self.endpoint.as_str())
			.field("headers", &self.headers)
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[cfg(feature = "reqwest")]
#[derive(Deserialize)]
struct GraphQlResponse {
	#[serde(default)]
	data: serde_json::Value,
	#[serde(default)]
	errors: Vec<serde_json::Value>,
}
