#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use wixcop::serial::serialize;
use wixcop::{Converter, Document, Settings};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a legacy product with `components` components, badly indented,
/// so every stage of the pipeline has work to do.
fn make_legacy_product(components: usize) -> String {
    let mut wxs = String::from(
        "<?xml version='1.0'?>\n<Wix xmlns='http://schemas.microsoft.com/wix/2006/wi'>\n <Fragment>\n",
    );
    for i in 0..components {
        let _ = write!(
            wxs,
            "   <Component Id='C{i}' Guid='*' Win64='yes'>\n\
             \t<File Source='bin\\file{i}.dll' />\n\
             \t<RegistryValue Root='HKLM' Key='Software\\Demo' Name='v{i}' Value='{i}' />\n\
             </Component>\n"
        );
    }
    wxs.push_str(" </Fragment>\n</Wix>\n");
    wxs
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let source = make_legacy_product(500);
    c.bench_function("parse_legacy_500", |b| {
        b.iter(|| Document::parse_str(black_box(&source)).expect("parse failed"));
    });
}

fn bench_convert(c: &mut Criterion) {
    let settings = Settings::default();
    let converter = Converter::new(&settings, 4);
    for size in [10, 500] {
        let source = make_legacy_product(size);
        c.bench_function(&format!("convert_legacy_{size}"), |b| {
            b.iter(|| converter.convert_str(black_box(&source)).expect("convert failed"));
        });
    }
}

fn bench_canonical_noop(c: &mut Criterion) {
    let settings = Settings::default();
    let converter = Converter::new(&settings, 4);
    let canonical = converter
        .convert_str(&make_legacy_product(500))
        .expect("convert failed")
        .output;
    c.bench_function("convert_canonical_500", |b| {
        b.iter(|| converter.convert_str(black_box(&canonical)).expect("convert failed"));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let settings = Settings::default();
    let doc = Document::parse_str(&make_legacy_product(500)).expect("parse failed");
    c.bench_function("serialize_500", |b| {
        b.iter(|| serialize(black_box(&doc), &settings));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_convert,
    bench_canonical_noop,
    bench_serialize
);
criterion_main!(benches);
