use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rdb_decoder::{Control, DecoderConfig, RdbDecoder};
use rdb_tests::DumpBuilder;
use rdb_tests::pack::{self, Packed};

fn bench_decode_small(c: &mut Criterion) {
    let dump = DumpBuilder::new(12)
        .aux(b"redis-ver", b"7.2.4")
        .select_db(0)
        .string_object(b"greeting", b"hello world")
        .finish();
    let decoder = RdbDecoder::new();

    c.bench_function("decode_small", |b| {
        b.iter(|| decoder.decode(&dump).unwrap());
    });
}

fn bench_decode_mixed(c: &mut Criterion) {
    let members: Vec<Packed<'_>> = (0..64).map(Packed::Int).collect();
    let mut builder = DumpBuilder::new(12);
    builder.select_db(0).resize_db(400, 100);
    for i in 0..100 {
        let key = format!("key:{i}");
        builder
            .expire_ms(1_700_000_000_000 + i)
            .string_object(key.as_bytes(), b"some value")
            .object(10, format!("list:{i}").as_bytes())
            .string(&pack::ziplist(&members))
            .object(20, format!("set:{i}").as_bytes())
            .string(&pack::listpack(&members))
            .hash_object(format!("hash:{i}").as_bytes(), &[(b"f1", b"v1"), (b"f2", b"v2")]);
    }
    let dump = builder.finish();
    let decoder = RdbDecoder::new();

    c.bench_function("decode_mixed", |b| {
        b.iter(|| decoder.decode(&dump).unwrap());
    });
}

fn bench_decode_checksum(c: &mut Criterion) {
    let value = b"0123456789abcdef".repeat(64);
    let mut builder = DumpBuilder::new(12);
    for i in 0..200 {
        builder.string_object(format!("k{i}").as_bytes(), &value);
    }
    let dump = builder.finish();

    let verifying = RdbDecoder::new();
    let skipping = RdbDecoder::with_config(DecoderConfig {
        verify_checksum: false,
        ..DecoderConfig::default()
    });

    let mut group = c.benchmark_group("decode_checksum");
    group.bench_function("verify", |b| {
        b.iter(|| verifying.decode(&dump).unwrap());
    });
    group.bench_function("skip", |b| {
        b.iter(|| skipping.decode(&dump).unwrap());
    });
    group.finish();
}

fn bench_decode_compressed(c: &mut Criterion) {
    let value = b"fn placeholder() {}\n".repeat(50);

    let plain = DumpBuilder::new(12)
        .byte(0)
        .string(b"a")
        .string(&value)
        .byte(0)
        .string(b"b")
        .string(&value)
        .finish();
    let compressed = DumpBuilder::new(12)
        .byte(0)
        .string(b"a")
        .compressed_string(&value)
        .byte(0)
        .string(b"b")
        .compressed_string(&value)
        .finish();
    let decoder = RdbDecoder::new();

    let mut group = c.benchmark_group("decode_compression");
    group.bench_function("plain", |b| {
        b.iter(|| decoder.decode(&plain).unwrap());
    });
    group.bench_function("lzf", |b| {
        b.iter(|| decoder.decode(&compressed).unwrap());
    });
    group.finish();
}

fn bench_decode_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_throughput");
    let decoder = RdbDecoder::new();

    for size_kb in [1, 10, 100] {
        let value = vec![b'x'; size_kb * 1024];
        let dump = DumpBuilder::new(12)
            .select_db(0)
            .string_object(b"large", &value)
            .finish();

        group.throughput(Throughput::Bytes(dump.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("decode", format!("{size_kb}kb")),
            &dump,
            |b, d| {
                b.iter(|| {
                    decoder
                        .parse(&d[..], |_| Control::Continue)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_small,
    bench_decode_mixed,
    bench_decode_checksum,
    bench_decode_compressed,
    bench_decode_throughput
);
criterion_main!(benches);
