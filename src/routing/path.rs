use std::collections::HashMap;

use axum::extract::Request;

/// One compiled segment of a route pattern.
///
/// Patterns mix literal segments with `:name` placeholders; a placeholder
/// matches exactly one non-empty path segment and never crosses a `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
}

/// Compile a pattern like `/api/v1/productos/:id` once at registration.
pub(crate) fn compile_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(part.to_string()),
        })
        .collect()
}

/// Structural match of a request path against a compiled pattern.
///
/// Segment counts must be equal; literals compare exactly; parameters bind
/// their segment's value. Returns the captured parameters on success.
pub(crate) fn match_path(segments: &[Segment], path: &str) -> Option<PathParams> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() != segments.len() {
        return None;
    }

    let mut params = PathParams::default();
    for (segment, part) in segments.iter().zip(parts) {
        match segment {
            Segment::Literal(literal) => {
                if literal != part {
                    return None;
                }
            }
            Segment::Param(name) => {
                if part.is_empty() {
                    return None;
                }
                params.insert(name.clone(), part.to_string());
            }
        }
    }

    Some(params)
}

/// Parameters captured from the matched route, one instance per request.
///
/// Carried in the request's extensions, the axum analogue of a
/// request-scoped context value; never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, value: String) {
        self.0.insert(name, value);
    }
}

/// Read a captured path parameter from the request.
pub fn param<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.extensions()
        .get::<PathParams>()
        .and_then(|params| params.get(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exactly() {
        let segments = compile_pattern("/api/v1/productos");
        assert!(match_path(&segments, "/api/v1/productos").is_some());
        assert!(match_path(&segments, "/api/v1/producto").is_none());
        assert!(match_path(&segments, "/api/v1/productos/").is_none());
    }

    #[test]
    fn param_binds_one_segment() {
        let segments = compile_pattern("/api/v1/productos/:id");
        let params = match_path(&segments, "/api/v1/productos/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn segment_count_mismatch_is_no_match() {
        let segments = compile_pattern("/api/v1/productos/:id");
        assert!(match_path(&segments, "/api/v1/productos/42/extra").is_none());
        assert!(match_path(&segments, "/api/v1/productos").is_none());
    }

    #[test]
    fn param_never_crosses_a_slash() {
        let segments = compile_pattern("/api/:section");
        assert!(match_path(&segments, "/api/v1/data").is_none());
    }

    #[test]
    fn param_requires_non_empty_segment() {
        let segments = compile_pattern("/api/v1/productos/:id");
        assert!(match_path(&segments, "/api/v1/productos/").is_none());
    }

    #[test]
    fn multiple_params_bind_independently() {
        let segments = compile_pattern("/api/:version/ventas/:id");
        let params = match_path(&segments, "/api/v1/ventas/7").unwrap();
        assert_eq!(params.get("version"), Some("v1"));
        assert_eq!(params.get("id"), Some("7"));
    }
}
