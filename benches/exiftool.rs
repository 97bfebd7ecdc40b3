use criterion::{criterion_group, criterion_main, Criterion};
use exiftool_session::scanner::{split_ready_token, TokenScanner};
use exiftool_session::ExifToolMetadata;
use std::hint::black_box;
use std::io::Cursor;

const TOKEN: &[u8] = b"{ready}\n";

fn sample_record() -> Vec<u8> {
    let mut fields = serde_json::Map::new();
    fields.insert("SourceFile".into(), "data/image.jpg".into());
    fields.insert("Make".into(), "Huawei".into());
    fields.insert("Model".into(), "Nexus 6P".into());
    fields.insert("ImageWidth".into(), 4032.into());
    fields.insert("ImageHeight".into(), 3024.into());
    fields.insert("CreateDate".into(), "2017:08:01 16:20:43".into());
    fields.insert("FileModifyDate".into(), "2023:01:05 10:11:12+01:00".into());
    fields.insert("GPSDateTime".into(), "2017:08:01 14:20:40Z".into());
    for i in 0..200 {
        fields.insert(format!("Tag{i}"), format!("value number {i}").into());
    }
    serde_json::to_vec_pretty(&serde_json::Value::Array(vec![fields.into()])).unwrap()
}

fn bench_framing(c: &mut Criterion) {
    let mut stream = sample_record();
    stream.extend_from_slice(TOKEN);

    c.bench_function("split ready token", |b| {
        b.iter(|| split_ready_token(black_box(&stream), false, TOKEN).unwrap())
    });

    let mut many = Vec::new();
    for _ in 0..100 {
        many.extend_from_slice(&stream);
    }
    c.bench_function("scan 100 records", |b| {
        b.iter(|| {
            let mut scanner = TokenScanner::new(Cursor::new(black_box(&many)), TOKEN);
            let mut count = 0;
            while scanner.next_record().unwrap().is_some() {
                count += 1;
            }
            assert_eq!(count, 100);
        })
    });

    let mut large = vec![b'x'; 16 * 1024 * 1024];
    large.extend_from_slice(TOKEN);
    c.bench_function("scan 16 MiB record", |b| {
        b.iter(|| {
            let mut scanner = TokenScanner::new(Cursor::new(black_box(&large)), TOKEN);
            scanner.next_record().unwrap().unwrap().len()
        })
    });
}

fn bench_metadata(c: &mut Criterion) {
    let record = sample_record();

    c.bench_function("parse record", |b| {
        b.iter(|| ExifToolMetadata::parse("data/image.jpg", black_box(&record)).unwrap())
    });

    let meta = ExifToolMetadata::parse("data/image.jpg", &record).unwrap();
    c.bench_function("earliest creation date", |b| {
        b.iter(|| black_box(&meta).get_earliest_creation_date().unwrap())
    });
}

criterion_group!(benches, bench_framing, bench_metadata);
criterion_main!(benches);
