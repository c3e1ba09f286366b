use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Resolve the client IP: `X-Forwarded-For`, then `X-Real-IP`, then the
/// transport remote address. First non-empty wins, unvalidated — any
/// untrusted intermediary can spoof the headers; documented, not fixed.
pub fn client_ip(req: &Request) -> String {
    if let Some(value) = header_value(req, "x-forwarded-for") {
        return value;
    }
    if let Some(value) = header_value(req, "x-real-ip") {
        return value;
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(name: &str, value: &str) -> Request {
        Request::builder()
            .uri("/")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn forwarded_for_wins() {
        let req = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "9.9.9.9, 10.0.0.1")
            .header("x-real-ip", "8.8.8.8")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "9.9.9.9");
    }

    #[test]
    fn falls_back_to_real_ip() {
        assert_eq!(client_ip(&request_with("x-real-ip", "8.8.8.8")), "8.8.8.8");
    }

    #[test]
    fn unknown_without_headers_or_socket() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }

    #[test]
    fn empty_header_is_skipped() {
        let req = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "")
            .header("x-real-ip", "8.8.8.8")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "8.8.8.8");
    }
}
