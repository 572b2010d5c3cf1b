use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes, HttpBody};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use serde_json::{json, Value};

use super::config::FilterOptions;
use super::filter::ExceptionFilter;
use crate::application::ports::{RequestInfo, ResponseSink, SinkError};
use crate::domain::error_types::canonical_error_name;
use crate::domain::{Exception, HttpException, UnknownThrow};

/// Largest plain-text error body read back for normalization
pub const MAX_PLAIN_ERROR_BODY: usize = 64 * 1024;

/// In-memory [`ResponseSink`] turned into an axum response afterwards
#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    sent: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::with_headers(HeaderMap::new())
    }

    /// Start from headers already set on the response, minus body framing
    pub fn with_headers(mut headers: HeaderMap) -> Self {
        headers.remove(header::CONTENT_TYPE);
        headers.remove(header::CONTENT_LENGTH);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers,
            body: None,
            sent: false,
        }
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[async_trait]
impl ResponseSink for BufferedResponse {
    fn headers_sent(&self) -> bool {
        self.sent
    }

    fn set_status(&mut self, status: StatusCode) {
        if !self.sent {
            self.status = status;
        }
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        if self.sent {
            return Err(SinkError::AlreadySent);
        }
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| SinkError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| SinkError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    fn remove_header(&mut self, name: &str) {
        if !self.sent {
            self.headers.remove(name);
        }
    }

    async fn send_json(&mut self, body: &Value) -> Result<(), SinkError> {
        if self.sent {
            return Err(SinkError::AlreadySent);
        }
        let bytes = serde_json::to_vec(body).map_err(|e| SinkError::Write(e.to_string()))?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(bytes));
        self.sent = true;
        Ok(())
    }

    fn end(&mut self, text: Option<&str>) {
        if self.sent {
            return;
        }
        if let Some(text) = text {
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            self.body = Some(Bytes::copy_from_slice(text.as_bytes()));
        }
        self.sent = true;
    }
}

/// Turn a caught panic into an [`Exception::Unknown`] response
///
/// For use with `tower_http::catch_panic::CatchPanicLayer::custom`; the
/// resulting response is normalized by [`ExceptionFilterLayer`].
pub fn panic_to_exception(panic: Box<dyn Any + Send + 'static>) -> Response {
    Exception::Unknown(UnknownThrow::from_panic(panic.as_ref())).into_response()
}

/// Run the exception filter over one response, if it is an error
pub async fn normalize_response(
    filter: &ExceptionFilter,
    response: Response,
    request: &RequestInfo,
) -> Response {
    let (mut parts, body) = response.into_parts();

    if let Some(exception) = parts.extensions.remove::<Exception>() {
        let mut sink = BufferedResponse::with_headers(parts.headers);
        filter.catch(exception, request, &mut sink).await;
        return sink.into_response();
    }

    let status = parts.status;
    if !(status.is_client_error() || status.is_server_error()) || is_json(&parts.headers) {
        return Response::from_parts(parts, body);
    }

    // Plain error produced outside a handler (rejections, unmatched routes)
    let text = match axum::body::to_bytes(body, MAX_PLAIN_ERROR_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if text.is_empty() {
        canonical_error_name(status).to_string()
    } else {
        text
    };
    let exception = HttpException::with_body(
        status,
        json!({
            "error": canonical_error_name(status),
            "message": message,
        }),
    );

    let mut sink = BufferedResponse::with_headers(parts.headers);
    filter.catch(exception.into(), request, &mut sink).await;
    sink.into_response()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Exception filter middleware layer
#[derive(Clone)]
pub struct ExceptionFilterLayer {
    filter: Arc<ExceptionFilter>,
}

impl ExceptionFilterLayer {
    pub fn new(options: FilterOptions) -> Self {
        Self::from_filter(ExceptionFilter::new(options))
    }

    pub fn from_filter(filter: ExceptionFilter) -> Self {
        Self {
            filter: Arc::new(filter),
        }
    }
}

impl<S> tower::Layer<S> for ExceptionFilterLayer {
    type Service = ExceptionFilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionFilterService {
            inner,
            filter: Arc::clone(&self.filter),
        }
    }
}

/// Exception filter service wrapper
#[derive(Clone)]
pub struct ExceptionFilterService<S> {
    inner: S,
    filter: Arc<ExceptionFilter>,
}

impl<S, ResBody> tower::Service<Request> for ExceptionFilterService<S>
where
    S: tower::Service<Request, Response = axum::http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let filter = Arc::clone(&self.filter);

        Box::pin(async move {
            let request_info = RequestInfo::from_request(&req);
            let response = inner.call(req).await?.map(Body::new);
            Ok(normalize_response(&filter, response, &request_info).await)
        })
    }
}
