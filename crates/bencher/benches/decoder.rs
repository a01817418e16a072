use std::hint::black_box;

use bencher::RequestFixture;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_h1::codec::{HeaderDecoder, RequestDecoder};
use micro_h1::config::DEFAULT_MAX_HEADER_BYTES;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

static SMALL_HEADER: RequestFixture = RequestFixture::new("small_header", include_str!("../resources/request/get_small.txt"));
static LARGE_HEADER: RequestFixture = RequestFixture::new("large_header", include_str!("../resources/request/get_large.txt"));

fn fixtures() -> [RequestFixture; 2] {
    [SMALL_HEADER, LARGE_HEADER]
}

fn benchmark_request_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_decoder");

    for fixture in fixtures() {
        group.throughput(Throughput::Bytes(fixture.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture| {
            let mut request_decoder = RequestDecoder::new();
            b.iter_batched_ref(
                || BytesMut::from(fixture.content()),
                |bytes_mut| {
                    let header = request_decoder.decode(bytes_mut).expect("input should be valid http request header").unwrap();
                    let body = request_decoder.decode(bytes_mut).expect("input should be valid http request body").unwrap();
                    black_box((header, body));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_header_decoder(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("header_decoder");

    for fixture in fixtures() {
        group.throughput(Throughput::Bytes(fixture.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fixture.name()), &fixture, |b, fixture| {
            let mut header_decoder = HeaderDecoder::new(DEFAULT_MAX_HEADER_BYTES);
            b.iter_batched_ref(
                || BytesMut::from(fixture.content()),
                |bytes_mut| black_box(header_decoder.decode(bytes_mut).expect("input should be valid http request header")),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// the same head delivered in pieces, the scan must stay linear
fn benchmark_fragmented_header(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("fragmented_header_decoder");
    group.throughput(Throughput::Bytes(LARGE_HEADER.len() as u64));

    for delivery in [1, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(delivery), &delivery, |b, &delivery| {
            b.iter(|| {
                let mut header_decoder = HeaderDecoder::new(DEFAULT_MAX_HEADER_BYTES);
                let mut bytes_mut = BytesMut::with_capacity(LARGE_HEADER.len());
                for piece in LARGE_HEADER.deliveries(delivery) {
                    bytes_mut.extend_from_slice(piece);
                    if let Some(header) = header_decoder.decode(&mut bytes_mut).expect("input should be valid http request header") {
                        return black_box(header);
                    }
                }
                unreachable!("fixture holds a complete header block")
            });
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_request_decoder, benchmark_header_decoder, benchmark_fragmented_header);
criterion_main!(decoder);
