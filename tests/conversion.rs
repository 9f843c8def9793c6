//! End-to-end tests over the public API: extract images and marked text from
//! a deck, rebuild it from Markdown, inject images and run generation.

use mdoffice::generate::{DocKind, MockGenerator};
use mdoffice::marker::parse_marker;
use mdoffice::pptx::{extract_text, markdown_to_pptx, ImageExtractor, ImageInjector, Presentation};
use mdoffice::{
    generate_document, markdown_to_docx, DocConfig, GenerationRequest, ImageRef, ImageSession,
    InjectionRequest, OutputFormat, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}

fn picture_count(pres: &Presentation) -> usize {
    (0..pres.slide_count())
        .map(|i| pres.slide_images(i).unwrap().len())
        .sum()
}

/// A saved deck with a title slide and two content slides, the second
/// carrying two pictures.
fn source_deck(dir: &Path) -> PathBuf {
    let images = dir.join("source_images");
    fs::create_dir_all(&images).unwrap();
    write_png(&images.join(ImageRef::new(9, 1).file_name("png")), 40, 20);
    write_png(&images.join(ImageRef::new(9, 2).file_name("png")), 20, 40);

    let md = "## Overview\nIntro text\n## Details\n- point\n[圖片 9-1]\n[圖片 9-2]\n";
    let mut pres = markdown_to_pptx(md, &DocConfig::new("Source"), Some(&images), None).unwrap();
    let path = dir.join("source.pptx");
    pres.save(&path).unwrap();
    path
}

#[test]
fn test_extract_and_rebuild_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let deck = source_deck(dir.path());

    let session = ImageSession::in_dir(dir.path().join("temp_images")).unwrap();
    let extracted = session.extract(&deck).unwrap();
    let names: Vec<String> = extracted.iter().map(|e| e.filename()).collect();
    assert_eq!(names, ["slide_3_image_1.png", "slide_3_image_2.png"]);

    let text = extract_text(&deck, true).unwrap();
    assert_eq!(text.image_count, 2);
    let markers: Vec<&str> = text
        .text
        .lines()
        .filter(|l| parse_marker(l).is_some())
        .collect();
    assert_eq!(markers, ["[圖片 3-1: 來自投影片 3]", "[圖片 3-2: 來自投影片 3]"]);

    // Rewritten Markdown keeps the markers under new headings.
    let rewritten = format!("# 新版\n## 摘要\n重點\n{}\n## 附錄\n{}\n", markers[0], markers[1]);
    let mut rebuilt = markdown_to_pptx(
        &rewritten,
        &DocConfig::new("Rebuilt"),
        Some(session.path()),
        Some(&deck),
    )
    .unwrap();

    // Template slides are replaced, not appended to.
    assert_eq!(rebuilt.slide_count(), 4);
    assert_eq!(picture_count(&rebuilt), 2);
    assert_eq!(rebuilt.slide_images(2).unwrap().len(), 1);
    assert_eq!(rebuilt.slide_images(3).unwrap().len(), 1);

    let out = dir.path().join("rebuilt.pptx");
    rebuilt.save(&out).unwrap();
    let reread = extract_text(&out, false).unwrap();
    assert!(reread.text.contains("摘要\n重點"));
    assert!(!reread.text.contains("Overview"));
}

#[test]
fn test_extract_into_plain_directory() {
    let dir = tempfile::tempdir().unwrap();
    let deck = source_deck(dir.path());
    let out = dir.path().join("extracted");

    let images = ImageExtractor::extract(&deck, &out).unwrap();
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|img| img.file_path.starts_with(&out)));
    assert_eq!(images[0].marker, "[圖片 3-1]");
}

#[test]
fn test_inject_writes_versions() {
    let dir = tempfile::tempdir().unwrap();
    let deck = source_deck(dir.path());
    let extra = dir.path().join("chart.png");
    write_png(&extra, 100, 50);

    let requests = vec![
        InjectionRequest::new(&extra, 2),
        InjectionRequest::new(&extra, 99),
        InjectionRequest::new(dir.path().join("missing.png"), 1),
    ];
    let first = ImageInjector::inject(&deck, &requests, None).unwrap();
    assert_eq!(first, dir.path().join("source_v1.pptx"));

    let pres = Presentation::open(&first).unwrap();
    assert_eq!(pres.slide_count(), 3);
    assert_eq!(pres.slide_images(1).unwrap().len(), 1);
    assert_eq!(picture_count(&pres), 3);

    let second = ImageInjector::inject(&deck, &[], None).unwrap();
    assert_eq!(second, dir.path().join("source_v2.pptx"));
}

#[test]
fn test_requests_from_json() {
    let json = r#"[{"image_path": "a.png", "slide_number": 2}, {"image_path": "b.png", "slide_number": -1}]"#;
    let requests: Vec<InjectionRequest> = serde_json::from_str(json).unwrap();
    assert_eq!(requests[0], InjectionRequest::new("a.png", 2));
    assert_eq!(requests[1].slide_number, -1);
}

#[test]
fn test_docx_with_docx_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("style.docx");
    markdown_to_docx("## Old body\nold text", &DocConfig::new("Old"), None)
        .unwrap()
        .save(&template)
        .unwrap();

    let mut doc = markdown_to_docx(
        "## 步驟\n- 檢查\n1. 執行\n說明",
        &DocConfig::new("SOP"),
        Some(&template),
    )
    .unwrap();
    let out = dir.path().join("sop.docx");
    doc.save(&out).unwrap();

    let text = mdoffice::docx::extract_text(&out).unwrap();
    assert_eq!(text, "SOP\n步驟\n檢查\n執行\n說明");
}

#[test]
fn test_generation_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_base(dir.path());
    settings.ensure_dirs().unwrap();
    fs::write(settings.template_dir.join("outline.md"), "# 目的\n# 範圍\n").unwrap();

    let request = GenerationRequest::new(DocKind::Sop, "outline.md", "新人訓練")
        .with_output_format(OutputFormat::Docx);
    let result = generate_document(&MockGenerator, &request, &settings).unwrap();

    assert!(result.base_name.starts_with("generated_sop_"));
    assert!(result.markdown_path.is_file());
    let output = result.output_path.unwrap();
    assert_eq!(output.extension().unwrap(), "docx");
    let text = mdoffice::docx::extract_text(&output).unwrap();
    assert!(text.contains("1. 簡介"));
    assert!(result.preview.ends_with("..."));
}
