//! Token decoders that extract an expiry instant from an opaque bearer token.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::CredentialError};

/// Extracts the expiry instant from an opaque token string.
///
/// Implementations must be pure. Tokens without a usable expiry are rejected with
/// [`CredentialError::MissingExpiry`]; tokens that never expire are not supported.
pub trait TokenDecoder
where
	Self: Send + Sync,
{
	/// Returns the instant at which `token` expires.
	fn decode(&self, token: &str) -> Result<OffsetDateTime, CredentialError>;
}

/// Reads the `exp` claim from a JWT payload without verifying its signature.
///
/// Signature verification belongs to the service that consumes the token; the dispatcher only
/// needs the expiry to schedule its next refresh.
#[derive(Clone, Copy, Debug, Default)]
pub struct JwtDecoder;
impl TokenDecoder for JwtDecoder {
	fn decode(&self, token: &str) -> Result<OffsetDateTime, CredentialError> {
		let mut segments = token.split('.');
		let payload = match (segments.next(), segments.next()) {
			(Some(header), Some(payload)) if !header.is_empty() && !payload.is_empty() => payload,
			_ => return Err(CredentialError::decode("token is not a JWT")),
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|e| CredentialError::decode(format!("payload is not base64url: {e}")))?;
		let claims: JwtClaims =
			serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(&bytes))
				.map_err(|source| CredentialError::Claims { source })?;
		let exp = claims.exp.ok_or(CredentialError::MissingExpiry)?;
		let seconds = exp
			.as_i64()
			.or_else(|| exp.as_f64().filter(|secs| secs.is_finite()).map(|secs| secs as i64))
			.ok_or(CredentialError::MissingExpiry)?;

		OffsetDateTime::from_unix_timestamp(seconds)
			.map_err(|e| CredentialError::decode(format!("exp claim is out of range: {e}")))
	}
}

#[derive(Deserialize)]
struct JwtClaims {
	#[serde(default)]
	exp: Option<serde_json::Number>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn jwt(payload: &str) -> String {
		format!(
			"{}.{}.sig",
			URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
			URL_SAFE_NO_PAD.encode(payload)
		)
	}

	#[test]
	fn reads_integer_and_fractional_exp() {
		let expiry = JwtDecoder
			.decode(&jwt(r#"{"exp":1700000000,"sub":"svc"}"#))
			.expect("JWT with an integer exp should decode.");

		assert_eq!(expiry.unix_timestamp(), 1_700_000_000);

		let expiry = JwtDecoder
			.decode(&jwt(r#"{"exp":1700000000.75}"#))
			.expect("JWT with a fractional exp should decode.");

		assert_eq!(expiry.unix_timestamp(), 1_700_000_000);
	}

	#[test]
	fn rejects_tokens_without_exp() {
		let err = JwtDecoder
			.decode(&jwt(r#"{"sub":"svc"}"#))
			.expect_err("JWT without exp should be rejected.");

		assert!(matches!(err, CredentialError::MissingExpiry));
	}

	#[test]
	fn rejects_non_jwt_tokens() {
		for token in ["opaque", ".payload.sig", "header..sig"] {
			let err = JwtDecoder.decode(token).expect_err("Non-JWT tokens should be rejected.");

			assert!(matches!(err, CredentialError::Decode { .. }), "{token}: {err:?}");
		}

		let err = JwtDecoder
			.decode("aGVhZGVy.!!!.sig")
			.expect_err("Payloads that are not base64url should be rejected.");

		assert!(matches!(err, CredentialError::Decode { .. }));
	}

	#[test]
	fn reports_the_malformed_claim_path() {
		let err = JwtDecoder
			.decode(&jwt(r#"{"exp":"tomorrow"}"#))
			.expect_err("String exp claims should be rejected.");

		match err {
			CredentialError::Claims { source } => assert_eq!(source.path().to_string(), "exp"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
