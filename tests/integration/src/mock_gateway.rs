//! Mock gateway admin APIs for integration testing
//!
//! Wiremock servers that imitate the self-hosted admin API and the cloud
//! control plane.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Control-plane id used by every cloud mock.
pub const CONTROL_PLANE_ID: &str = "0b6e2f4a-9c1d-4e8f-a2b3-c4d5e6f70819";

/// Realm derived from [`CONTROL_PLANE_ID`].
pub const REALM_NAME: &str = "auth-realm-0b6e2f4a";

/// JWT credential list body.
pub fn credential_list(id: &str, key: &str, secret: &str, consumer_id: &str) -> Value {
    json!({
        "data": [{
            "id": id,
            "key": key,
            "secret": secret,
            "consumer": {"id": consumer_id}
        }],
        "total": 1
    })
}

/// Empty credential list body.
pub fn empty_list() -> Value {
    json!({"data": [], "total": 0})
}

/// Mock self-hosted admin API
pub struct MockAdminApi {
    pub server: MockServer,
}

impl MockAdminApi {
    /// Start a new mock admin API
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock
    pub fn url(&self) -> String {
        self.server.uri()
    }

    fn credentials_path(consumer: &str) -> String {
        format!("/consumers/{consumer}/jwt")
    }

    /// Credentials lookup returning one credential, expected `times` times
    pub async fn mock_credentials(&self, consumer: &str, key: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(Self::credentials_path(consumer)))
            .and(header("kong-admin-token", "test-admin-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(credential_list(
                &format!("cred-{key}"),
                key,
                "0123456789abcdef",
                consumer,
            )))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Credentials lookup returning an empty list
    pub async fn mock_no_credentials(&self, consumer: &str) {
        Mock::given(method("GET"))
            .and(path(Self::credentials_path(consumer)))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_list()))
            .mount(&self.server)
            .await;
    }

    /// Credentials endpoint answering with `status`
    pub async fn mock_credentials_status(&self, consumer: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(Self::credentials_path(consumer)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Credentials lookup that answers after `delay`
    pub async fn mock_credentials_delayed(&self, consumer: &str, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(Self::credentials_path(consumer)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(credential_list("slow", "slow", "slow-secret", consumer))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Credential creation echoing the generated key and secret
    pub async fn mock_create(&self, consumer: &str) {
        let owner = consumer.to_string();
        Mock::given(method("POST"))
            .and(path(Self::credentials_path(consumer)))
            .respond_with(move |request: &wiremock::Request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                ResponseTemplate::new(201).set_body_json(json!({
                    "id": "cred-created",
                    "key": body["key"],
                    "secret": body["secret"],
                    "consumer": {"id": owner}
                }))
            })
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Status endpoint answering with `status`
    pub async fn mock_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

/// Mock cloud control plane
pub struct MockCloudApi {
    pub server: MockServer,
}

impl MockCloudApi {
    /// Start a new mock control plane
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Control-plane URL to configure the issuer with
    pub fn control_plane_url(&self) -> String {
        format!("{}/v2/control-planes/{CONTROL_PLANE_ID}", self.server.uri())
    }

    fn consumers_path() -> String {
        format!("/v2/control-planes/{CONTROL_PLANE_ID}/core-entities/consumers")
    }

    fn realm_path() -> String {
        format!("/v1/realms/{REALM_NAME}")
    }

    /// Realm check answering with `status`
    pub async fn mock_realm_check(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(Self::realm_path()))
            .and(header("authorization", "Bearer kpat_integration"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Realm creation answering with `status` and `body`, expected once
    pub async fn mock_realm_create(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/realms"))
            .and(body_json(json!({
                "name": REALM_NAME,
                "allowed_control_planes": [CONTROL_PLANE_ID]
            })))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Direct consumer lookup by id
    pub async fn mock_consumer(&self, external_id: &str, internal_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{external_id}", Self::consumers_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": internal_id,
                "username": external_id
            })))
            .mount(&self.server)
            .await;
    }

    /// Direct consumer lookup answering 404
    pub async fn mock_consumer_missing(&self, external_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{external_id}", Self::consumers_path())))
            .respond_with(ResponseTemplate::new(404))
            .mount(&self.server)
            .await;
    }

    /// Username search returning `body`
    pub async fn mock_search(&self, username: &str, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(Self::consumers_path()))
            .and(query_param("username", username))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Credentials under the internal consumer id, expected `times` times
    pub async fn mock_credentials(&self, internal_id: &str, key: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{internal_id}/jwt", Self::consumers_path())))
            .respond_with(ResponseTemplate::new(200).set_body_json(credential_list(
                &format!("cred-{key}"),
                key,
                "fedcba9876543210",
                internal_id,
            )))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Credential creation under the internal consumer id
    pub async fn mock_create(&self, internal_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("{}/{internal_id}/jwt", Self::consumers_path())))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "cred-new",
                "key": "new-key",
                "secret": "new-secret"
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}
