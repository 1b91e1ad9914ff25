// crates.io
use tokio::runtime::Handle;
// self
use super::{Dispatcher, Inner, State};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransportFactory;
use crate::{
	_prelude::*,
	auth::{JwtDecoder, TokenDecoder},
	config::DispatcherConfig,
	error::ConfigError,
	http::{AUTHORIZATION, TransportFactory, TransportOptions},
	provider::CredentialProvider,
};

/// Builder for [`Dispatcher`] values.
///
/// Only the endpoint and the credential provider are required. Options default to empty, the
/// decoder to [`JwtDecoder`], the transport to [`ReqwestTransportFactory`] (feature `reqwest`),
/// and timing to [`DispatcherConfig::default`].
#[derive(Default)]
pub struct DispatcherBuilder {
	endpoint: Option<String>,
	options: TransportOptions,
	provider: Option<Arc<dyn CredentialProvider>>,
	decoder: Option<Arc<dyn TokenDecoder>>,
	factory: Option<Arc<dyn TransportFactory>>,
	config: DispatcherConfig,
}
impl DispatcherBuilder {
	/// Sets the endpoint every transport sends to.
	pub fn endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
		self.endpoint = Some(endpoint.as_ref().to_owned());

		self
	}

	/// Sets the options merged into every transport. Must not define `Authorization`.
	pub fn options(mut self, options: TransportOptions) -> Self {
		self.options = options;

		self
	}

	/// Sets the credential provider.
	pub fn provider(mut self, provider: impl 'static + CredentialProvider) -> Self {
		self.provider = Some(Arc::new(provider));

		self
	}

	/// Sets a shared credential provider.
	pub fn shared_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
		self.provider = Some(provider);

		self
	}

	/// Overrides the token decoder.
	pub fn decoder(mut self, decoder: impl 'static + TokenDecoder) -> Self {
		self.decoder = Some(Arc::new(decoder));

		self
	}

	/// Overrides the transport factory.
	pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
		self.factory = Some(factory);

		self
	}

	/// Overrides the timing configuration.
	pub fn config(mut self, config: DispatcherConfig) -> Self {
		self.config = config;

		self
	}

	/// Validates the configuration, builds the dispatcher, and schedules its first refresh.
	///
	/// Must be called from within a Tokio runtime.
	pub fn build(self) -> Result<Dispatcher> {
		let endpoint = match self.endpoint.as_deref() {
			Some(raw) if !raw.is_empty() => Url::parse(raw)
				.map_err(|source| ConfigError::InvalidEndpoint { source })?,
			_ => return Err(ConfigError::MissingEndpoint.into()),
		};
		let provider = self.provider.ok_or(ConfigError::MissingProvider)?;

		if let Some(header) = self.options.find_header(AUTHORIZATION) {
			return Err(ConfigError::ReservedHeader { header: header.to_owned() }.into());
		}

		let factory = match self.factory {
			Some(factory) => factory,
			None => default_factory()?,
		};
		let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
		let inner = Arc::new(Inner {
			endpoint,
			options: self.options,
			provider,
			decoder: self.decoder.unwrap_or_else(|| Arc::new(JwtDecoder)),
			factory,
			config: self.config,
			runtime,
			metrics: Default::default(),
			state: Mutex::new(State::default()),
		});

		inner.schedule_refresh(None);

		Ok(Dispatcher { inner })
	}
}
impl Debug for DispatcherBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DispatcherBuilder")
			.field("endpoint", &self.endpoint)
			.field("options", &self.options)
			.field("provider_set", &self.provider.is_some())
			.field("factory_set", &self.factory.is_some())
			.field("config", &self.config)
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn default_factory() -> Result<Arc<dyn TransportFactory>> {
	Ok(Arc::new(ReqwestTransportFactory::try_new()?))
}

#[cfg(not(feature = "reqwest"))]
fn default_factory() -> Result<Arc<dyn TransportFactory>> {
	Err(ConfigError::MissingTransportFactory.into())
}
