//! Demonstrates a dispatcher that keeps a GraphQL client authenticated with short-lived tokens.
//!
//! 1. Supply an async closure that fetches a JWT from your identity service.
//! 2. Build the dispatcher; it fetches the first token right away.
//! 3. Send operations as usual. Requests issued before the first token arrives wait in line.
//!
//! Set `GRAPHQL_ENDPOINT` and `GRAPHQL_TOKEN` (a JWT carrying an `exp` claim) before running.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use time::Duration;
// self
use bearer_dispatch::{Dispatcher, DispatcherConfig, Operation, RetryPolicy, TransportOptions};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let endpoint = env::var("GRAPHQL_ENDPOINT")
		.map_err(|_| eyre!("GRAPHQL_ENDPOINT must point at a GraphQL endpoint."))?;
	let provider = || async {
		// Replace with a call to your identity service.
		env::var("GRAPHQL_TOKEN")
	};
	let dispatcher = Dispatcher::builder()
		.endpoint(endpoint)
		.options(
			TransportOptions::default()
				.with_user_agent("bearer-dispatch-demo")
				.with_timeout(Duration::seconds(15)),
		)
		.config(
			DispatcherConfig::default()
				.with_refresh_margin(Duration::minutes(2))
				.with_retry(RetryPolicy::default().with_max(Duration::seconds(10))),
		)
		.provider(provider)
		.build()?;
	let data = dispatcher.send(Operation::new("{ __typename }")).await?;

	println!("Endpoint answered: {data}.");
	println!(
		"Refresh attempts so far: {} ({} failed).",
		dispatcher.metrics().refresh_attempts(),
		dispatcher.metrics().refresh_failures()
	);

	dispatcher.close();

	Ok(())
}
