//! Captured responses and their byte encoding.

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::response::Parts;
use axum::http::{HeaderMap, Response, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cache::CodecError;

/// A complete response: status, headers in first-seen order, body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<String>)>,
    pub body: Vec<u8>,
}

impl WebResponse {
    /// Capture the head of a response together with its fully read body.
    pub fn capture(parts: &Parts, body: &[u8]) -> Self {
        Self {
            status: parts.status.as_u16(),
            headers: header_multimap(&parts.headers),
            body: body.to_vec(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Rebuild an HTTP response. Header entries that are no longer valid are skipped.
    pub fn into_response(self) -> Response<Body> {
        let mut headers = HeaderMap::new();
        for (name, values) in &self.headers {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            for value in values {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(name.clone(), value);
                }
            }
        }

        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *response.headers_mut() = headers;
        response
    }
}

/// Group header values by name, preserving the order names first appear.
pub fn header_multimap(headers: &HeaderMap) -> Vec<(String, Vec<String>)> {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_string(), values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> WebResponse {
        WebResponse {
            status: 302,
            headers: vec![
                ("location".into(), vec!["/login".into()]),
                ("set-cookie".into(), vec!["a=1".into(), "b=2".into()]),
            ],
            body: b"moved".to_vec(),
        }
    }

    #[test]
    fn encodes_and_decodes() {
        let response = sample();
        let bytes = response.to_bytes().unwrap();
        assert_eq!(WebResponse::from_bytes(&bytes).unwrap(), response);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        assert!(WebResponse::from_bytes(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn capture_keeps_multi_valued_headers() {
        let response = Response::builder()
            .status(200)
            .header("content-type", "text/plain")
            .header("set-cookie", "a=1")
            .header("set-cookie", "b=2")
            .body(())
            .unwrap();
        let (parts, ()) = response.into_parts();

        let captured = WebResponse::capture(&parts, b"ok");
        assert_eq!(captured.status, 200);
        assert_eq!(
            captured.headers,
            vec![
                ("content-type".to_string(), vec!["text/plain".to_string()]),
                (
                    "set-cookie".to_string(),
                    vec!["a=1".to_string(), "b=2".to_string()]
                ),
            ]
        );
        assert_eq!(captured.body, b"ok");
    }

    #[test]
    fn into_response_restores_head() {
        let response = sample().into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/login");
        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies.len(), 2);
    }

    fn header_strategy() -> impl Strategy<Value = (String, Vec<String>)> {
        (
            "[a-z][a-z0-9-]{0,15}",
            prop::collection::vec("[ -~]{0,24}", 1..4),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_codec_round_trip(
            status in 100u16..600,
            headers in prop::collection::vec(header_strategy(), 0..8),
            body in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let response = WebResponse { status, headers, body };
            let bytes = response.to_bytes().unwrap();
            prop_assert_eq!(WebResponse::from_bytes(&bytes).unwrap(), response);
        }
    }
}
