//! Credential provider contract: the caller-supplied source of fresh bearer tokens.

// self
use crate::{_prelude::*, auth::BearerToken, error::CredentialError};

/// Boxed future returned by [`CredentialProvider::fetch`].
pub type CredentialFuture<'a> =
	Pin<Box<dyn Future<Output = Result<BearerToken, CredentialError>> + 'a + Send>>;

/// Asynchronous source of bearer tokens.
///
/// The dispatcher calls [`fetch`](CredentialProvider::fetch) once per refresh attempt and never
/// overlaps two of its own calls, but implementations must tolerate being called again as soon as
/// the previous future resolves. Any async closure returning `Result<impl Into<String>, E>`
/// implements this trait.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Acquires a fresh bearer token.
	fn fetch(&self) -> CredentialFuture<'_>;
}
impl<F, Fut, T, E> CredentialProvider for F
where
	F: Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<T, E>>,
	T: Into<String>,
	E: Into<Box<dyn StdError + Send + Sync>>,
{
	fn fetch(&self) -> CredentialFuture<'_> {
		let pending = self();

		Box::pin(async move {
			let token = pending.await.map_err(CredentialError::provider)?;

			Ok(BearerToken::new(token))
		})
	}
}
