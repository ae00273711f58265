//! Root key credential extraction

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// Bearer credential of the calling root key, if any
///
/// Extraction never fails: the credential is resolved by the key service
/// after the request body has been validated.
#[derive(Clone, Default)]
pub struct RootKeyCredential(pub Option<String>);

impl RootKeyCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl std::fmt::Debug for RootKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RootKeyCredential")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl<S> FromRequestParts<S> for RootKeyCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_bearer_token(&parts.headers)))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, authorization.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers("Bearer root_abc123")),
            Some("root_abc123".to_string())
        );
    }

    #[test]
    fn test_missing_or_malformed_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = RootKeyCredential(Some("root_abc123".to_string()));
        assert!(!format!("{:?}", credential).contains("root_abc123"));
    }
}
