#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use bearer_dispatch::{
	Dispatcher, Operation, TransportOptions,
	error::{Error, TransportError},
	http::{ReqwestTransport, ReqwestTransportFactory, Transport, TransportFactory},
	reqwest::Client as ReqwestClient,
	url::Url,
};
use common::*;

fn options_with_token(token: &str) -> TransportOptions {
	TransportOptions::default()
		.with_user_agent("bearer-dispatch-tests")
		.with_bearer(&bearer_dispatch::auth::BearerToken::new(token))
}

#[tokio::test]
async fn dispatcher_sends_graphql_with_the_fresh_bearer() {
	let server = MockServer::start_async().await;
	let token = jwt_expiring_in(Duration::minutes(10), 1);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/graphql")
				.header("authorization", format!("Bearer {token}"))
				.header("content-type", "application/json")
				.json_body(serde_json::json!({
					"query": "query Me($id: ID!) { user(id: $id) { name } }",
					"variables": { "id": "42" },
					"operationName": "Me",
				}));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "data": { "user": { "name": "Ada" } } }));
		})
		.await;
	let provider = {
		let token = token.clone();

		move || {
			let token = token.clone();

			async move { Ok::<_, std::io::Error>(token) }
		}
	};
	let dispatcher =
		Dispatcher::new(server.url("/graphql"), provider).expect("Dispatcher should build.");
	let data = dispatcher
		.send(
			Operation::new("query Me($id: ID!) { user(id: $id) { name } }")
				.with_variables(serde_json::json!({ "id": "42" }))
				.with_operation_name("Me"),
		)
		.await
		.expect("GraphQL request should succeed.");

	mock.assert_async().await;

	assert_eq!(data, serde_json::json!({ "user": { "name": "Ada" } }));

	dispatcher.close();
}

#[tokio::test]
async fn graphql_errors_surface_as_graphql_failures() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql").header("user-agent", "bearer-dispatch-tests");
			then.status(200).json_body(serde_json::json!({
				"data": null,
				"errors": [{ "message": "Cannot query field \"nope\"." }],
			}));
		})
		.await;
	let endpoint = Url::parse(&server.url("/graphql")).expect("Mock endpoint should parse.");
	let transport = ReqwestTransportFactory::try_new()
		.expect("Default reqwest client should build.")
		.build(&endpoint, options_with_token("token"))
		.expect("Transport should build.");
	let err = transport
		.send(Operation::new("{ nope }"))
		.await
		.expect_err("GraphQL errors should fail the request.");

	mock.assert_async().await;

	match err {
		Error::GraphQl { errors } => {
			assert_eq!(errors.len(), 1);
			assert_eq!(errors[0]["message"], "Cannot query field \"nope\".");
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn http_failures_keep_status_and_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql");
			then.status(401).body("token expired");
		})
		.await;

	let endpoint = Url::parse(&server.url("/graphql")).expect("Mock endpoint should parse.");
	let transport = ReqwestTransport::new(ReqwestClient::new(), endpoint, &options_with_token("t"))
		.expect("Transport should build.");
	let err = transport
		.send(Operation::new("{ ping }"))
		.await
		.expect_err("Non-success statuses should fail the request.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Status { status: 401, ref body }) if body == "token expired"
	));
}

#[tokio::test]
async fn malformed_bodies_are_reported() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql");
			then.status(200).body("{\"data\": ");
		})
		.await;

	let endpoint = Url::parse(&server.url("/graphql")).expect("Mock endpoint should parse.");
	let transport = ReqwestTransport::new(ReqwestClient::new(), endpoint, &options_with_token("t"))
		.expect("Transport should build.");
	let err = transport
		.send(Operation::new("{ ping }"))
		.await
		.expect_err("Truncated JSON should fail the request.");

	assert!(matches!(err, Error::Transport(TransportError::MalformedResponse { .. })));
}

#[tokio::test]
async fn default_factory_does_not_follow_redirects() {
	let server = MockServer::start_async().await;
	let redirect = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql");
			then.status(307).header("location", "/elsewhere");
		})
		.await;
	let elsewhere = server
		.mock_async(|when, then| {
			when.path("/elsewhere");
			then.status(200).json_body(serde_json::json!({ "data": {} }));
		})
		.await;
	let endpoint = Url::parse(&server.url("/graphql")).expect("Mock endpoint should parse.");
	let transport = ReqwestTransportFactory::try_new()
		.expect("Default reqwest client should build.")
		.build(&endpoint, options_with_token("t"))
		.expect("Transport should build.");
	let err = transport
		.send(Operation::new("{ ping }"))
		.await
		.expect_err("Redirect responses should not be followed.");

	redirect.assert_async().await;

	assert!(matches!(err, Error::Transport(TransportError::Status { status: 307, .. })));
	assert_eq!(elsewhere.hits_async().await, 0);
}
