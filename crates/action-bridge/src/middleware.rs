//! Request guards.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;

/// Only serve requests whose `Host` header names the local machine.
pub async fn require_localhost(request: Request, next: Next) -> Result<Response, AppError> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if is_local_host(host) {
        Ok(next.run(request).await)
    } else {
        Err(AppError::Forbidden(format!(
            "Only local requests are accepted (Host: {})",
            if host.is_empty() { "<missing>" } else { host }
        )))
    }
}

/// `localhost` or `127.0.0.1`, with or without a port.
pub fn is_local_host(host: &str) -> bool {
    let name = host.split(':').next().unwrap_or_default();
    name.eq_ignore_ascii_case("localhost") || name == "127.0.0.1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local_host() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("localhost:63343"));
        assert!(is_local_host("127.0.0.1:63343"));
        assert!(is_local_host("LOCALHOST"));
        assert!(!is_local_host(""));
        assert!(!is_local_host("example.com"));
        assert!(!is_local_host("127.0.0.2:63343"));
        assert!(!is_local_host("localhost.evil.com"));
    }
}
