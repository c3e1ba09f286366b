use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Permissive CORS: a non-empty request `Origin` is echoed back without an
/// allow-list check, and every `OPTIONS` request short-circuits with 204
/// before any stateful work below this layer.
pub async fn cors(req: Request, next: Next) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();

    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut(), origin.as_ref());
        return response;
    }

    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut(), origin.as_ref());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    let Some(origin) = origin else { return };
    if origin.is_empty() {
        return;
    }

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_the_request_origin() {
        let mut headers = HeaderMap::new();
        let origin = HeaderValue::from_static("https://ecos.example");
        apply_cors_headers(&mut headers, Some(&origin));

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://ecos.example"
        );
        assert_eq!(headers.get(header::VARY).unwrap(), "Origin");
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[test]
    fn no_origin_means_no_cors_headers() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers, None);
        assert!(headers.is_empty());

        let empty = HeaderValue::from_static("");
        apply_cors_headers(&mut headers, Some(&empty));
        assert!(headers.is_empty());
    }
}
