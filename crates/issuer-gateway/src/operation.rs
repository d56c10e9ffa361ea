//! Names of guarded gateway operations. Each name owns one circuit breaker.

/// Health check
pub const HEALTH_CHECK: &str = "health_check";
/// Credential list lookup
pub const SECRET_GET: &str = "consumer_secret_get";
/// Credential provisioning
pub const SECRET_CREATE: &str = "consumer_secret_create";
/// Cloud realm existence check
pub const REALM_CHECK: &str = "realm_check";
/// Cloud realm creation
pub const REALM_CREATE: &str = "realm_create";
/// Cloud consumer lookup by id
pub const CONSUMER_RESOLVE: &str = "consumer_resolve";
/// Cloud consumer lookup by username
pub const CONSUMER_SEARCH: &str = "consumer_search";
