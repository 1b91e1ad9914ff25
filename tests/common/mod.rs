//! Shared fixtures for dispatcher integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use time::{Duration, OffsetDateTime};
use tokio::sync::Notify;
// self
use bearer_dispatch::{
	Operation, TransportOptions,
	auth::BearerToken,
	error::{CredentialError, Result, TransportError},
	http::{Transport, TransportFactory, TransportFuture},
	provider::{CredentialFuture, CredentialProvider},
	url::Url,
};

/// Query that makes [`EchoTransport`] fail with an HTTP 502.
pub const FAILING_QUERY: &str = "{ fail }";

/// Encodes an unsigned JWT whose payload is the provided JSON claims.
pub fn encode_jwt(claims: &serde_json::Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.signature")
}

/// Issues a JWT expiring `ttl` after the wall clock, tagged with `serial` so tokens differ.
pub fn jwt_expiring_in(ttl: Duration, serial: usize) -> String {
	let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp();

	encode_jwt(&serde_json::json!({ "exp": exp, "serial": serial }))
}

/// Lets spawned refresh and drain tasks run to their next suspension point.
pub async fn settle() {
	for _ in 0..32 {
		tokio::task::yield_now().await;
	}
}

/// Advances the paused Tokio clock and lets woken tasks run.
pub async fn advance(by: Duration) {
	tokio::time::advance(by.unsigned_abs()).await;

	settle().await;
}

/// What a [`TokenSource`] hands out.
#[derive(Clone, Debug)]
pub enum Mint {
	/// JWTs expiring after the given duration.
	Jwt(Duration),
	/// JWTs expiring after the given duration, each released only after the gate is notified.
	Gated(Duration, Arc<Notify>),
	/// Tokens that carry no expiry.
	Opaque,
	/// Empty strings.
	Empty,
	/// Provider failures.
	Fail,
}

/// Counting credential provider.
#[derive(Debug)]
pub struct TokenSource {
	mint: Mint,
	calls: AtomicUsize,
	last: Mutex<Option<String>>,
}
impl TokenSource {
	pub fn new(mint: Mint) -> Arc<Self> {
		Arc::new(Self { mint, calls: AtomicUsize::new(0), last: Mutex::new(None) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn last_token(&self) -> Option<String> {
		self.last.lock().expect("Token source lock should not be poisoned.").clone()
	}

	fn remember(&self, token: &str) {
		*self.last.lock().expect("Token source lock should not be poisoned.") = Some(token.into());
	}
}
impl CredentialProvider for TokenSource {
	fn fetch(&self) -> CredentialFuture<'_> {
		let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

		Box::pin(async move {
			let token = match &self.mint {
				Mint::Jwt(ttl) => jwt_expiring_in(*ttl, serial),
				Mint::Gated(ttl, gate) => {
					gate.notified().await;

					jwt_expiring_in(*ttl, serial)
				},
				Mint::Opaque => format!("opaque-{serial}"),
				Mint::Empty => String::new(),
				Mint::Fail => return Err(CredentialError::provider("identity service unavailable")),
			};

			self.remember(&token);

			Ok(BearerToken::new(token))
		})
	}
}

/// Transport double that echoes each operation and records what it received.
#[derive(Debug)]
pub struct EchoTransport {
	pub options: TransportOptions,
	received: Mutex<Vec<String>>,
}
impl EchoTransport {
	pub fn received(&self) -> Vec<String> {
		self.received.lock().expect("Echo transport lock should not be poisoned.").clone()
	}
}
impl Transport for EchoTransport {
	fn send(&self, operation: Operation) -> TransportFuture<'_> {
		self.received
			.lock()
			.expect("Echo transport lock should not be poisoned.")
			.push(operation.query.clone());

		Box::pin(async move {
			if operation.query == FAILING_QUERY {
				return Err(TransportError::Status { status: 502, body: "bad gateway".into() }.into());
			}

			Ok(serde_json::json!({
				"query": operation.query,
				"operationName": operation.operation_name,
				"authorization": self.options.header("authorization"),
			}))
		})
	}
}

/// Transport factory that records every transport it builds.
#[derive(Debug, Default)]
pub struct RecordingFactory {
	built: Mutex<Vec<Arc<EchoTransport>>>,
}
impl RecordingFactory {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn build_count(&self) -> usize {
		self.built.lock().expect("Factory lock should not be poisoned.").len()
	}

	pub fn latest(&self) -> Option<Arc<EchoTransport>> {
		self.built.lock().expect("Factory lock should not be poisoned.").last().cloned()
	}

	pub fn latest_authorization(&self) -> Option<String> {
		self.latest().and_then(|transport| transport.options.header("Authorization").map(Into::into))
	}
}
impl TransportFactory for RecordingFactory {
	fn build(&self, _endpoint: &Url, options: TransportOptions) -> Result<Arc<dyn Transport>> {
		let transport = Arc::new(EchoTransport { options, received: Default::default() });

		self.built.lock().expect("Factory lock should not be poisoned.").push(transport.clone());

		Ok(transport)
	}
}

pub const ENDPOINT: &str = "https://api.example.com/graphql";
