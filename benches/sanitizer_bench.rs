/// Sanitizer and payload benchmarks
/// Measures redaction cost on clean and sensitive error text
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use api_envelope::api::middleware::error_handling::{
    ErrorPayloadBuilder, ErrorSanitizer, ErrorTaxonomyMapper, FilterOptions,
};
use api_envelope::application::ports::RequestInfo;
use api_envelope::domain::{CorrelationId, Exception, NamedError};
use axum::http::Method;

fn sanitizer_benchmarks(c: &mut Criterion) {
    let sanitizer = ErrorSanitizer::enabled();
    let mut group = c.benchmark_group("sanitize");

    let inputs = [
        ("clean", "User 42 not found in directory".to_string()),
        (
            "sensitive",
            "Login failed for password: hunter2 with token=abc123 card 4111-1111-1111-1111"
                .to_string(),
        ),
        ("long_clean", "connection refused by upstream ".repeat(64)),
    ];

    for (name, input) in inputs.iter() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| sanitizer.sanitize(black_box(input)))
        });
    }
    group.finish();
}

fn payload_benchmarks(c: &mut Criterion) {
    let options = Arc::new(FilterOptions::production());
    let taxonomy = ErrorTaxonomyMapper::new(Arc::clone(&options));
    let builder = ErrorPayloadBuilder::new(options);
    let request = RequestInfo::new(Method::POST, "/v1/login")
        .with_header("x-forwarded-for", "203.0.113.1, 70.41.3.18");
    let correlation_id = CorrelationId::generate();
    let exception: Exception = NamedError::new("UnauthorizedError", "password: hunter2 rejected").into();

    c.bench_function("classify_and_build", |b| {
        b.iter(|| {
            let classification = taxonomy.classify(black_box(&exception));
            builder.build(
                classification.status,
                &classification.body,
                &request,
                &correlation_id,
                &exception,
            )
        })
    });
}

criterion_group!(benches, sanitizer_benchmarks, payload_benchmarks);
criterion_main!(benches);
