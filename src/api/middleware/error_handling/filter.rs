use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::FutureExt;
use tracing::{error, warn};

use super::client_ip::resolve_client_ip;
use super::config::FilterOptions;
use super::correlation::{CorrelationTracker, CORRELATION_ID_HEADER, REQUEST_ID_HEADER};
use super::dispatcher::{DispatchContext, ResponseDispatcher};
use super::payload::ErrorPayloadBuilder;
use super::taxonomy::{Classification, ErrorTaxonomyMapper};
use crate::application::errors::FilterError;
use crate::application::ports::{ErrorMetrics, RateLimitTracker, RequestInfo, ResponseSink};
use crate::domain::error_response::FALLBACK_ERROR;
use crate::domain::{ErrorResponse, Exception, UnknownThrow};

/// Global exception filter
///
/// Terminal handler for every error raised while serving a request. `catch`
/// never fails: each call ends in exactly one response, the normalized
/// payload when the pipeline succeeds and a minimal fallback otherwise.
#[derive(Clone)]
pub struct ExceptionFilter {
    options: Arc<FilterOptions>,
    taxonomy: ErrorTaxonomyMapper,
    payload_builder: ErrorPayloadBuilder,
    dispatcher: ResponseDispatcher,
    metrics: Option<Arc<dyn ErrorMetrics>>,
    rate_limit_tracker: Option<Arc<dyn RateLimitTracker>>,
}

impl ExceptionFilter {
    pub fn new(options: FilterOptions) -> Self {
        let options = Arc::new(options);
        Self {
            taxonomy: ErrorTaxonomyMapper::new(Arc::clone(&options)),
            payload_builder: ErrorPayloadBuilder::new(Arc::clone(&options)),
            dispatcher: ResponseDispatcher::new(options.write_timeout()),
            metrics: None,
            rate_limit_tracker: None,
            options,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn ErrorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_rate_limit_tracker(mut self, tracker: Arc<dyn RateLimitTracker>) -> Self {
        self.rate_limit_tracker = Some(tracker);
        self
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Normalize `exception` into the response held by `sink`
    pub async fn catch(
        &self,
        exception: Exception,
        request: &RequestInfo,
        sink: &mut dyn ResponseSink,
    ) {
        if sink.headers_sent() {
            warn!(
                method = %request.method,
                url = %request.url,
                exception = %exception,
                "exception_after_response_sent"
            );
            return;
        }

        let outcome = AssertUnwindSafe(self.process(&exception, request, sink))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(url = %request.url, error = %err, "exception_filter_failed");
                self.send_fallback(request, sink).await;
            }
            Err(panic) => {
                let cause = UnknownThrow::from_panic(panic.as_ref());
                drop(panic);
                error!(url = %request.url, panic = %cause, "exception_filter_panicked");
                self.send_fallback(request, sink).await;
            }
        }
    }

    async fn process(
        &self,
        exception: &Exception,
        request: &RequestInfo,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), FilterError> {
        let Classification { status, body } = self.taxonomy.classify(exception);
        let correlation_id = CorrelationTracker::resolve(&request.headers, sink)?;
        let client_ip = resolve_client_ip(request);
        let path = request.path();

        if self.options.enable_rate_limit_tracking {
            if let Some(tracker) = &self.rate_limit_tracker {
                tracker.track(&client_ip, path);
            }
        }

        if self.options.enable_metrics {
            if let Some(metrics) = &self.metrics {
                metrics.increment(status.as_u16(), request.route_label(), request.method.as_str());
            }
        }

        let payload =
            self.payload_builder
                .build(status, &body, request, &correlation_id, exception);

        let context = DispatchContext {
            correlation_id: &correlation_id,
            request,
            client_ip: &client_ip,
            exception,
        };
        self.dispatcher
            .dispatch(sink, status, &payload, &context)
            .await
    }

    /// Last resort: a bare 500 body, or a plain-text end if even that fails
    async fn send_fallback(&self, request: &RequestInfo, sink: &mut dyn ResponseSink) {
        if sink.headers_sent() {
            return;
        }

        let fallback = ErrorResponse::fallback(request.url.as_str());
        // Correlation headers carry the fallback's fresh id
        for name in [CORRELATION_ID_HEADER, REQUEST_ID_HEADER] {
            if sink.set_header(name, &fallback.request_id).is_err() {
                sink.remove_header(name);
            }
        }

        let write_timeout = self.dispatcher.write_timeout();
        let attempt = AssertUnwindSafe(async {
            let body = serde_json::to_value(&fallback)?;
            sink.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            tokio::time::timeout(write_timeout, sink.send_json(&body))
                .await
                .map_err(|_| FilterError::WriteTimeout(write_timeout))??;
            Ok::<(), FilterError>(())
        })
        .catch_unwind()
        .await;

        match attempt {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(request_id = %fallback.request_id, error = %err, "fallback_response_failed");
                sink.end(Some(FALLBACK_ERROR));
            }
            Err(_) => {
                error!(request_id = %fallback.request_id, "fallback_response_panicked");
                sink.end(Some(FALLBACK_ERROR));
            }
        }
    }
}
