//! Rate limiting middleware using token bucket algorithm.
//!
//! Each tier comes in two flavors: the plain variant keys buckets by the
//! socket peer address, the `proxy` variant by client IP taken from
//! `X-Forwarded-For` / `X-Real-IP` headers. Trust the proxy variants only
//! when the service actually runs behind a reverse proxy, otherwise the
//! header is client-controlled.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Requests per second for the public redirect endpoint.
const PUBLIC_PER_SECOND: u64 = 2;
/// Burst size for the public redirect endpoint.
const PUBLIC_BURST: u32 = 100;

/// Requests per second for authenticated endpoints.
const SECURE_PER_SECOND: u64 = 1;
/// Burst size for authenticated endpoints.
const SECURE_BURST: u32 = 10;

/// Creates a rate limiter for the public redirect endpoint.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`, keyed by
/// the socket peer address.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/{code}", get(redirect_handler))
///     .layer(rate_limit::layer());
/// ```
pub fn layer() -> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>
{
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(PUBLIC_PER_SECOND)
            .burst_size(PUBLIC_BURST)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Public-tier limiter for deployments behind a reverse proxy.
///
/// Same limits as [`layer`], keyed by the forwarded client IP.
pub fn proxy_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(PUBLIC_PER_SECOND)
            .burst_size(PUBLIC_BURST)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Creates a stricter rate limiter for authenticated endpoints.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
///
/// Mutations and bulk import are far rarer than redirects, so the `/api`
/// surface gets the tighter bucket.
///
/// # Example
///
/// ```rust,ignore
/// let api_routes = Router::new()
///     .route("/links", post(create_link_handler))
///     .layer(rate_limit::secure_layer());
/// ```
pub fn secure_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(SECURE_PER_SECOND)
            .burst_size(SECURE_BURST)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}

/// Authenticated-tier limiter for deployments behind a reverse proxy.
///
/// Same limits as [`secure_layer`], keyed by the forwarded client IP.
pub fn secure_proxy_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(SECURE_PER_SECOND)
            .burst_size(SECURE_BURST)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(governor_conf)
}
