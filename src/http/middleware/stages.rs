//! The four independent pipeline stages.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use std::io::Write;

use crate::http::compress::CompressingWriter;
use crate::http::middleware::BoxedHandler;
use crate::i18n::Catalog;

/// Localization refresh: reload the catalog snapshot before the inner
/// handler runs, so every request observes the latest translations without a
/// restart. Reload failures keep the previous snapshot and are not fatal.
pub fn refresh_catalog(catalog: Arc<Catalog>, next: BoxedHandler) -> BoxedHandler {
    Arc::new(move |req| {
        let catalog = catalog.clone();
        let next = next.clone();
        Box::pin(async move {
            if let Err(e) = catalog.reload() {
                tracing::warn!(error = %e, "locale catalog reload failed, serving stale catalog");
            }
            next(req).await
        })
    })
}

/// Latency logging: unconditionally log elapsed wall time tagged with the
/// request path, including after a recovered failure further down the chain.
pub fn stopwatch(next: BoxedHandler) -> BoxedHandler {
    Arc::new(move |req| {
        let next = next.clone();
        Box::pin(async move {
            let start = Instant::now();
            let path = req.uri().path().to_string();
            let response = next(req).await;
            tracing::debug!(path = %path, elapsed = ?start.elapsed(), "request served");
            response
        })
    })
}

/// Failure containment: a panic anywhere below this stage is intercepted so
/// the process keeps serving other requests. No meaningful error body is
/// promised; the contained request gets an empty 500.
pub fn catch_panic(next: BoxedHandler) -> BoxedHandler {
    Arc::new(move |req| {
        let next = next.clone();
        Box::pin(async move {
            let path = req.uri().path().to_string();
            let attempt = std::panic::catch_unwind(AssertUnwindSafe(|| next(req)));
            let outcome = match attempt {
                Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
                Err(payload) => Err(payload),
            };
            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    tracing::error!(
                        path = %path,
                        panic = %panic_message(payload.as_ref()),
                        "handler panicked, containing"
                    );
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        })
    })
}

/// Compression negotiation: pass through untouched unless the client
/// advertises gzip; otherwise mark the response and run its body through the
/// compressing writer, finalizing the gzip stream on every exit path.
pub fn negotiate_compression(next: BoxedHandler) -> BoxedHandler {
    Arc::new(move |req| {
        let next = next.clone();
        Box::pin(async move {
            if !accepts_gzip(req.headers()) {
                return next(req).await;
            }
            let response = next(req).await;
            compress_response(response).await
        })
    })
}

/// Whether `Accept-Encoding` advertises gzip (with a non-zero quality).
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    for header in headers.get_all(ACCEPT_ENCODING) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for entry in value.split(',') {
            let mut parts = entry.split(';');
            let Some(coding) = parts.next() else {
                continue;
            };
            if !coding.trim().eq_ignore_ascii_case("gzip") {
                continue;
            }
            // Only a true zero qvalue refuses; q=0.001 is still an offer.
            let refused = parts.any(|param| {
                let param = param.trim().to_ascii_lowercase();
                param
                    .strip_prefix("q=")
                    .and_then(|q| q.parse::<f32>().ok())
                    .is_some_and(|q| q == 0.0)
            });
            if !refused {
                return true;
            }
        }
    }
    false
}

async fn compress_response(response: Response) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to buffer response body for compression");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    parts
        .headers
        .insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(CONTENT_LENGTH);

    let mut writer = CompressingWriter::new(Vec::new(), &mut parts.headers);
    let compressed = writer.write_all(&bytes).and_then(|_| writer.finish());
    match compressed {
        Ok(data) => Response::from_parts(parts, Body::from(data)),
        Err(e) => {
            // A Vec sink cannot fail in practice, but never send a gzip
            // header over an identity body.
            tracing::error!(error = %e, "gzip encoding failed, sending identity");
            parts.headers.remove(CONTENT_ENCODING);
            Response::from_parts(parts, Body::from(bytes))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::handler;
    use axum::body::to_bytes;
    use axum::http::Request;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn request(accept_encoding: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = accept_encoding {
            builder = builder.header(ACCEPT_ENCODING, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn text_handler(text: &'static str) -> BoxedHandler {
        handler(move |_req| async move { text.into_response() })
    }

    #[test]
    fn accept_encoding_parsing() {
        let headers = |v: &str| {
            let mut h = HeaderMap::new();
            h.insert(ACCEPT_ENCODING, HeaderValue::from_str(v).unwrap());
            h
        };
        assert!(accepts_gzip(&headers("gzip")));
        assert!(accepts_gzip(&headers("deflate, gzip;q=0.8, br")));
        assert!(accepts_gzip(&headers("GZIP")));
        assert!(!accepts_gzip(&headers("identity")));
        assert!(!accepts_gzip(&headers("gzip;q=0")));
        assert!(!accepts_gzip(&headers("gzip;q=0.000")));
        // A tiny qvalue is still an offer, not a refusal.
        assert!(accepts_gzip(&headers("gzip;q=0.001")));
        assert!(accepts_gzip(&headers("gzip;q=0.05")));
        assert!(!accepts_gzip(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn negotiation_compresses_when_advertised() {
        let chain = negotiate_compression(text_handler("hello hello hello"));
        let response = chain(request(Some("gzip"))).await;
        assert_eq!(response.headers()[CONTENT_ENCODING], "gzip");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut decoded = String::new();
        GzDecoder::new(&body[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "hello hello hello");
    }

    #[tokio::test]
    async fn negotiation_passes_through_without_token() {
        let chain = negotiate_compression(text_handler("hello"));
        let response = chain(request(None)).await;
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn contained_panic_becomes_500() {
        let chain = catch_panic(handler(|_req| async { panic!("boom") }));
        let response = chain(request(None)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn stopwatch_passes_response_through() {
        let chain = stopwatch(text_handler("timed"));
        let response = chain(request(None)).await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"timed");
    }

    #[tokio::test]
    async fn refresh_runs_before_handler() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_US.json"), r#"{"k": "old"}"#).unwrap();
        let catalog = Arc::new(Catalog::new(dir.path(), "en_US"));
        catalog.reload().unwrap();

        // The handler reads the catalog; the stage must have reloaded the
        // rewritten file by then.
        std::fs::write(dir.path().join("en_US.json"), r#"{"k": "new"}"#).unwrap();
        let reader = catalog.clone();
        let chain = refresh_catalog(
            catalog,
            handler(move |_req| {
                let reader = reader.clone();
                async move {
                    reader
                        .messages("en_US")
                        .get("k")
                        .cloned()
                        .unwrap_or_default()
                        .into_response()
                }
            }),
        );
        let response = chain(request(None)).await;
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"new");
    }
}
