//! Benchmarks for parsing JSON template libraries

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glyph_recog::loader::library_to_json;
use glyph_recog::{parse_library, GlyphRecord, Point};

fn create_library_json(size: usize) -> String {
    let records: Vec<GlyphRecord> = (0..size)
        .map(|i| {
            let strokes = (0..1 + i % 5)
                .map(|s| {
                    (0..20)
                        .map(|p| Point::new((p * 5 + s) as f64, ((p * i) % 97) as f64))
                        .collect()
                })
                .collect();
            GlyphRecord::new(char::from_u32(0x4e00 + i as u32).unwrap_or('?').to_string(), strokes)
        })
        .collect();
    library_to_json(&records).unwrap()
}

fn benchmark_parse_small(c: &mut Criterion) {
    let json = create_library_json(50);
    c.bench_function("parse_library_50", |b| {
        b.iter(|| black_box(parse_library(black_box(&json)).unwrap()))
    });
}

fn benchmark_parse_large(c: &mut Criterion) {
    let json = create_library_json(2000);
    c.bench_function("parse_library_2000", |b| {
        b.iter(|| black_box(parse_library(black_box(&json)).unwrap()))
    });
}

criterion_group!(benches, benchmark_parse_small, benchmark_parse_large);
criterion_main!(benches);
