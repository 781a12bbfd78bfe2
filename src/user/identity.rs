use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

/// The caller identity established by the fronting auth layer, or `None`
/// for anonymous guests.
///
/// Token validation happens upstream; by the time a request reaches these
/// handlers the identity is trusted and arrives as the `x-user-id`
/// header. An unparseable header is treated as anonymous rather than
/// rejected, since role checks happen in the services.
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());
        Ok(CallerIdentity(identity))
    }
}
