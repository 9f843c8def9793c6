//! Benchmarks for Markdown conversion and slide text extraction.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mdoffice::pptx::{extract_text_from, markdown_to_pptx, Presentation};
use mdoffice::{markdown_to_docx, DocConfig};

/// Creates a synthetic Markdown document with the given number of sections.
fn create_test_markdown(section_count: usize) -> String {
    let mut md = String::new();
    for i in 0..section_count {
        md.push_str(&format!("## Section {}\n\n", i));
        md.push_str("This paragraph introduces the section with some test content.\n");
        for j in 0..5 {
            md.push_str(&format!("- bullet {} of section {}\n", j, i));
        }
        md.push_str("1. first step\n2. second step\n\n");
    }
    md
}

/// Benchmark PPTX building at various sizes.
fn bench_pptx_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("pptx_building");
    let config = DocConfig::new("Benchmark");

    for sections in [10, 50, 200].iter() {
        let md = create_test_markdown(*sections);
        group.throughput(Throughput::Bytes(md.len() as u64));
        group.bench_with_input(BenchmarkId::new("sections", sections), &md, |b, md| {
            b.iter(|| {
                let mut pres = markdown_to_pptx(black_box(md), &config, None, None).unwrap();
                let _ = pres.to_bytes();
            });
        });
    }

    group.finish();
}

/// Benchmark DOCX building at various sizes.
fn bench_docx_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("docx_building");
    let config = DocConfig::new("Benchmark");

    for sections in [10, 50, 200].iter() {
        let md = create_test_markdown(*sections);
        group.throughput(Throughput::Bytes(md.len() as u64));
        group.bench_with_input(BenchmarkId::new("sections", sections), &md, |b, md| {
            b.iter(|| {
                let mut doc = markdown_to_docx(black_box(md), &config, None).unwrap();
                let _ = doc.to_bytes();
            });
        });
    }

    group.finish();
}

/// Benchmark text extraction from a saved presentation.
fn bench_text_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_extraction");
    let config = DocConfig::new("Benchmark");

    for sections in [10, 50, 200].iter() {
        let md = create_test_markdown(*sections);
        let bytes = markdown_to_pptx(&md, &config, None, None)
            .unwrap()
            .to_bytes()
            .unwrap();
        let pres = Presentation::from_bytes(bytes).unwrap();

        group.bench_with_input(BenchmarkId::new("sections", sections), &pres, |b, pres| {
            b.iter(|| {
                let _ = extract_text_from(black_box(pres), true);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pptx_building,
    bench_docx_building,
    bench_text_extraction,
);
criterion_main!(benches);
