//! Static file serving over any [`FileSource`]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Router,
};
use chrono::{DateTime, SubsecRound, Utc};
use percent_encoding::percent_decode_str;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::Arc;
use stowaway_core::{Error, ErrorKind, FileSource, OpenedFile, Result};
use stowaway_vfs::VirtualFileSystem;

/// Document served for directory requests
pub const INDEX_FILE: &str = "index.html";

/// Router that answers every `GET`/`HEAD` request from `source`.
///
/// The request path (percent-decoded) is handed to [`FileSource::open`] as
/// is. Directories are answered with their `index.html`, or `404` when there
/// is none.
pub fn serve_source<S>(source: S) -> Router
where
    S: FileSource + 'static,
{
    Router::new()
        .fallback(serve_file::<S>)
        .with_state(Arc::new(source))
}

/// Mount a filesystem (or part of it) as a static site
pub trait FileServerExt {
    /// Serve the files below `base_path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `base_path` contains `..`.
    fn file_server(&self, base_path: &str) -> Result<Router>;
}

impl FileServerExt for VirtualFileSystem {
    fn file_server(&self, base_path: &str) -> Result<Router> {
        let scoped = self.sub_file_system(base_path)?;
        tracing::debug!("serving {} files from {}", scoped.len(), scoped.root());
        Ok(serve_source(scoped))
    }
}

/// HTTP status for an error kind
pub fn status_for(err: &Error) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn serve_file<S>(
    State(source): State<Arc<S>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response
where
    S: FileSource + 'static,
{
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
        )
            .into_response();
    }

    let path = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path.into_owned(),
        Err(_) => return error_response(&Error::validation("request path is not valid UTF-8")),
    };

    match respond(source.as_ref(), &path, &headers, method == Method::HEAD) {
        Ok(response) => response,
        Err(err) => error_response(&err),
    }
}

fn respond<S: FileSource>(
    source: &S,
    path: &str,
    headers: &HeaderMap,
    head_only: bool,
) -> Result<Response> {
    let mut file = source.open(path)?;
    let mut stat = file.stat()?;

    if stat.is_dir() {
        let index = format!("{}/{}", path.trim_end_matches('/'), INDEX_FILE);
        file = source.open(&index)?;
        stat = file.stat()?;
        if stat.is_dir() {
            return Err(Error::not_found(path));
        }
    }

    let modified = stat.modified.map(|t| t.trunc_subsecs(0));
    if let (Some(modified), Some(since)) = (modified, if_modified_since(headers)) {
        if modified <= since {
            let mut response_headers = HeaderMap::new();
            insert_date(&mut response_headers, header::LAST_MODIFIED, modified);
            return Ok((StatusCode::NOT_MODIFIED, response_headers).into_response());
        }
    }

    let size = stat.size;
    let range = match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(spec) => match parse_range(spec, size) {
            ByteRange::Satisfiable(range) => Some(range),
            ByteRange::Unsatisfiable => {
                let mut response_headers = HeaderMap::new();
                insert_text(&mut response_headers, header::CONTENT_RANGE, &format!("bytes */{}", size));
                return Ok((StatusCode::RANGE_NOT_SATISFIABLE, response_headers).into_response());
            }
            ByteRange::Ignored => None,
        },
        None => None,
    };

    let (status, body_range) = match range {
        Some(range) => (StatusCode::PARTIAL_CONTENT, range),
        None => (StatusCode::OK, 0..size),
    };
    let length = body_range.end - body_range.start;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(&stat.name)),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(modified) = modified {
        insert_date(&mut response_headers, header::LAST_MODIFIED, modified);
    }
    if status == StatusCode::PARTIAL_CONTENT {
        insert_text(
            &mut response_headers,
            header::CONTENT_RANGE,
            &format!("bytes {}-{}/{}", body_range.start, body_range.end - 1, size),
        );
    }

    if head_only {
        return Ok((status, response_headers).into_response());
    }

    file.seek(SeekFrom::Start(body_range.start))?;
    let mut body = Vec::new();
    file.by_ref().take(length).read_to_end(&mut body)?;

    Ok((status, response_headers, Body::from(body)).into_response())
}

fn error_response(err: &Error) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::warn!("request failed: {}", err);
    } else {
        tracing::debug!("request rejected: {}", err);
    }

    (
        status,
        Json(serde_json::json!({
            "error": err.to_string()
        })),
    )
        .into_response()
}

#[derive(Debug, PartialEq, Eq)]
enum ByteRange {
    Satisfiable(Range<u64>),
    Unsatisfiable,
    /// Malformed or multi-range; the full body is served instead
    Ignored,
}

/// Parse a single `bytes=` range against a body of `size` bytes
fn parse_range(spec: &str, size: u64) -> ByteRange {
    let Some(spec) = spec.trim().strip_prefix("bytes=") else {
        return ByteRange::Ignored;
    };
    if spec.contains(',') {
        return ByteRange::Ignored;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return ByteRange::Ignored;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // Suffix: the last N bytes
        let Ok(suffix) = end.parse::<u64>() else {
            return ByteRange::Ignored;
        };
        if suffix == 0 || size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Satisfiable(size.saturating_sub(suffix)..size);
    }

    let Ok(start) = start.parse::<u64>() else {
        return ByteRange::Ignored;
    };
    if start >= size {
        return ByteRange::Unsatisfiable;
    }
    let last = if end.is_empty() {
        size - 1
    } else {
        match end.parse::<u64>() {
            Ok(last) if last >= start => last.min(size - 1),
            _ => return ByteRange::Ignored,
        }
    };

    ByteRange::Satisfiable(start..last + 1)
}

fn if_modified_since(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let value = headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn insert_date(headers: &mut HeaderMap, name: header::HeaderName, time: DateTime<Utc>) {
    insert_text(headers, name, &http_date(time));
}

fn insert_text(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

/// Content type by file extension
fn content_type(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::TimeZone;
    use stowaway_core::FileMetadata;
    use stowaway_vfs::FileSystemBuilder;
    use tower::ServiceExt;

    fn modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn site() -> VirtualFileSystem {
        let mut builder = FileSystemBuilder::new("stowaway");
        for (path, content) in [
            ("stowaway/foo", "foo"),
            ("stowaway/dir/bar", "bar"),
            ("stowaway/dir/baz", "baz"),
            ("stowaway/docs/index.html", "<h1>docs</h1>"),
            ("stowaway/with space.txt", "spaced"),
        ] {
            let name = stowaway_core::path::base_name(path);
            let metadata = FileMetadata::file(name, 0, 0o644).with_modified(modified());
            builder.insert(path, metadata, content.as_bytes()).unwrap();
        }
        builder.build()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body.to_vec())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_serves_embedded_files() {
        let app = site().file_server("").unwrap();

        let (status, headers, body) = get(app.clone(), "/foo").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"foo");
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::LAST_MODIFIED], "Wed, 01 May 2024 12:00:00 GMT");

        let (status, _, body) = get(app, "/dir/bar").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"bar");
    }

    #[tokio::test]
    async fn test_serves_sub_file_system() {
        let app = site().file_server("dir").unwrap();

        let (status, _, body) = get(app.clone(), "/baz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"baz");

        let (status, _, _) = get(app, "/foo").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_file_server_rejects_parent() {
        let err = site().file_server("../etc").err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_and_directories() {
        let app = site().file_server("").unwrap();

        let (status, _, body) = get(app.clone(), "/nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("nope.txt"));

        let (status, _, _) = get(app.clone(), "/dir/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, headers, body) = get(app, "/docs/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body, b"<h1>docs</h1>");
    }

    #[tokio::test]
    async fn test_percent_decoded_path() {
        let app = site().file_server("").unwrap();
        let (status, headers, body) = get(app, "/with%20space.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(body, b"spaced");
    }

    #[tokio::test]
    async fn test_head_has_headers_only() {
        let app = site().file_server("").unwrap();
        let request = Request::head("/foo").body(Body::empty()).unwrap();
        let (status, headers, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let app = site().file_server("").unwrap();
        let request = Request::post("/foo").body(Body::empty()).unwrap();
        let (status, headers, _) = send(app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[header::ALLOW], "GET, HEAD");
    }

    #[tokio::test]
    async fn test_range_requests() {
        let app = site().file_server("").unwrap();

        let request = Request::get("/docs/index.html")
            .header(header::RANGE, "bytes=4-7")
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 4-7/13");
        assert_eq!(body, b"docs");

        let request = Request::get("/foo")
            .header(header::RANGE, "bytes=10-")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = send(app, request).await;
        assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(headers[header::CONTENT_RANGE], "bytes */3");
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let app = site().file_server("").unwrap();

        let request = Request::get("/foo")
            .header(header::IF_MODIFIED_SINCE, "Wed, 01 May 2024 12:00:00 GMT")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());

        let request = Request::get("/foo")
            .header(header::IF_MODIFIED_SINCE, "Tue, 30 Apr 2024 12:00:00 GMT")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("bytes=0-0", 10), ByteRange::Satisfiable(0..1));
        assert_eq!(parse_range("bytes=2-", 10), ByteRange::Satisfiable(2..10));
        assert_eq!(parse_range("bytes=-3", 10), ByteRange::Satisfiable(7..10));
        assert_eq!(parse_range("bytes=-30", 10), ByteRange::Satisfiable(0..10));
        assert_eq!(parse_range("bytes=5-100", 10), ByteRange::Satisfiable(5..10));
        assert_eq!(parse_range("bytes=10-", 10), ByteRange::Unsatisfiable);
        assert_eq!(parse_range("bytes=-0", 10), ByteRange::Unsatisfiable);
        assert_eq!(parse_range("bytes=5-2", 10), ByteRange::Ignored);
        assert_eq!(parse_range("bytes=0-1,4-5", 10), ByteRange::Ignored);
        assert_eq!(parse_range("items=0-1", 10), ByteRange::Ignored);
    }

    #[test]
    fn test_status_for() {
        assert_eq!(status_for(&Error::not_found("x")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&Error::validation("..")), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&Error::unsupported("readdir")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("index.HTML"), "text/html; charset=utf-8");
        assert_eq!(content_type("app.wasm"), "application/wasm");
        assert_eq!(content_type("foo"), "application/octet-stream");
    }
}
