//! Ephemeral credential pairing a bearer token with its expiry instant.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TokenDecoder},
	error::CredentialError,
};

/// A freshly acquired bearer token and the instant it stops being valid.
///
/// Credentials are never persisted; the dispatcher folds the token into transport headers and
/// keeps only the expiry as the target of its next refresh.
#[derive(Clone, Debug)]
pub struct Credential {
	/// Bearer token secret; callers must avoid logging it.
	pub token: BearerToken,
	/// Expiry instant decoded from the token.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Decodes the expiry of `token` with `decoder`, rejecting empty tokens.
	pub fn decode(token: BearerToken, decoder: &dyn TokenDecoder) -> Result<Self, CredentialError> {
		if token.is_empty() {
			return Err(CredentialError::EmptyToken);
		}

		let expires_at = decoder.decode(token.expose())?;

		Ok(Self { token, expires_at })
	}

	/// Returns how long the credential remains valid at `instant` (negative once expired).
	pub fn time_left_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Returns `true` if the credential has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
