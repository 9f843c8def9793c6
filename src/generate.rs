//! Template-driven document generation through an external text generator.
//!
//! The generator itself (an LLM client) lives outside this crate behind
//! [`TextGenerator`]; this module builds the prompt, stores the returned
//! Markdown and converts it to the requested office format.

use crate::config::Settings;
use crate::detect::OutputFormat;
use crate::error::{Error, Result};
use crate::model::DocConfig;
use crate::text::{is_supported_template, template_text};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Token accounting of one generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Estimated cost in USD
    pub cost: f64,
}

impl Usage {
    /// Usage with the cost filled in from the price table.
    pub fn priced(model: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        let model = model.into();
        let cost = estimate_cost(&model, input_tokens, output_tokens);
        Self {
            model,
            input_tokens,
            output_tokens,
            cost,
        }
    }
}

/// Text returned by a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
}

/// Produces Markdown from a prompt.
///
/// Implementations report failures as [`Error::Generation`]; callers do not
/// retry.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Offline generator returning a fixed document, for trying the pipeline
/// without spending tokens.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

const MOCK_DOCUMENT: &str = "# 模擬生成文檔\n\n這是一份由模擬 AI 生成的文檔內容。\n\n## 1. 簡介\n本系統是一個高效的文件生成工具...\n\n## 2. 功能\n- 支持多種格式\n- AI 智能生成\n- 模擬模式測試\n\n## 3. 結論\n模擬模式運行正常。\n";

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str) -> Result<Generation> {
        Ok(Generation {
            text: MOCK_DOCUMENT.to_string(),
            usage: Usage::priced(
                "mock-model",
                prompt.chars().count() as u64,
                MOCK_DOCUMENT.chars().count() as u64,
            ),
        })
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub model: &'static str,
    pub input: f64,
    pub output: f64,
}

pub const MODEL_PRICES: &[ModelPrice] = &[
    ModelPrice { model: "gpt-4o", input: 2.50, output: 10.00 },
    ModelPrice { model: "gpt-4o-mini", input: 0.15, output: 0.60 },
    ModelPrice { model: "gpt-4-turbo", input: 10.00, output: 30.00 },
    ModelPrice { model: "gpt-4", input: 30.00, output: 60.00 },
    ModelPrice { model: "gpt-3.5-turbo", input: 0.50, output: 1.50 },
];

/// Cost in USD of a call; unknown models cost nothing.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
    MODEL_PRICES
        .iter()
        .find(|p| p.model == model)
        .map(|p| {
            input_tokens as f64 / 1_000_000.0 * p.input
                + output_tokens as f64 / 1_000_000.0 * p.output
        })
        .unwrap_or(0.0)
}

/// Kind of document to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    SystemDoc,
    Sop,
    TechReport,
    /// Rewrite an existing SOP (passed as the requirements) in the
    /// template's style, preserving image markers
    SopOptimize,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::SystemDoc => "system_doc",
            DocKind::Sop => "sop",
            DocKind::TechReport => "tech_report",
            DocKind::SopOptimize => "sop_optimize",
        }
    }

    /// Title given to the generated document.
    pub fn title(&self) -> &'static str {
        match self {
            DocKind::SystemDoc => "系統設計文檔",
            DocKind::Sop => "標準作業程序(SOP)",
            DocKind::TechReport => "技術分析報告",
            DocKind::SopOptimize => "SOP優化文檔",
        }
    }

    /// Whether the SOP role profile applies rather than the system one.
    pub fn is_sop(&self) -> bool {
        matches!(self, DocKind::Sop | DocKind::SopOptimize)
    }

    /// Assemble the prompt. A role profile, when present, is placed first
    /// and fenced off from the instructions.
    pub fn build_prompt(&self, profile: Option<&str>, template: &str, requirements: &str) -> String {
        let mut prompt = String::new();
        if let Some(profile) = profile.filter(|p| !p.trim().is_empty()) {
            prompt.push_str(profile);
            prompt.push_str("\n\n=== Role Definition End ===\n\n");
        }

        let (intro, asks) = match self {
            DocKind::SystemDoc => (
                "請根據以下模板結構和用戶需求，生成一份專業的系統文檔。",
                [
                    "保持專業的技術文檔風格",
                    "包含系統架構、功能模組、技術棧等內容",
                    "確保文檔結構清晰、邏輯嚴謹",
                    "使用標準的技術術語",
                    "根據模板格式調整輸出格式",
                    "請生成完整的系統文檔內容，使用Markdown格式輸出。",
                ],
            ),
            DocKind::Sop => (
                "請根據以下模板結構和用戶需求，生成一份標準作業程序(SOP)文檔。",
                [
                    "步驟清晰明確",
                    "包含目的、範圍、職責、流程圖（文字描述）、詳細步驟",
                    "注意事項和異常處理",
                    "語言簡練、指令性強",
                    "根據模板格式調整輸出格式",
                    "請生成完整的SOP內容，使用Markdown格式輸出。",
                ],
            ),
            DocKind::TechReport => (
                "請根據以下模板結構和用戶需求，生成一份技術分析報告。",
                [
                    "數據準確、分析深入",
                    "包含背景、方法、結果、結論等部分",
                    "圖表說明清晰",
                    "技術細節完整",
                    "根據模板格式調整輸出格式",
                    "請生成完整的技術報告內容，使用Markdown格式輸出。",
                ],
            ),
            DocKind::SopOptimize => {
                prompt.push_str(&sop_optimize_prompt(template, requirements));
                return prompt;
            }
        };

        prompt.push_str(intro);
        prompt.push_str(&format!(
            "\n\n模板內容：\n{template}\n\n用戶需求：\n{requirements}\n\n要求：\n"
        ));
        for (i, ask) in asks.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, ask));
        }
        prompt
    }
}

fn sop_optimize_prompt(template: &str, original: &str) -> String {
    format!(
        r#"你是一位專業的 SOP 文檔優化專家。請將以下舊的 SOP 文檔優化為統一、專業的標準作業程序。

=== 原始 SOP 內容 ===
{original}

=== 參考模板風格 ===
{template}

=== 優化要求 ===

**1. 內容處理原則**：
- **保留所有關鍵信息**：所有操作步驟、設定值、路徑、注意事項都必須保留
- **保留所有圖片標記**：格式為 [圖片 X-Y: 來自投影片 Z]，必須完整保留
- **允許合理整合**：可以整合重複或相似的內容，使文檔更簡潔
- **保留業務邏輯**：確保所有業務流程和邏輯關係都清晰呈現

**2. 圖片標記處理**：
- 所有 [圖片 X-Y: 來自投影片 Z] 標記必須保留
- 圖片標記應放在相關內容的適當位置
- 不要刪除任何圖片標記

**3. 格式優化**：
- 參考模板的章節結構（目的、範圍、職責、流程等）
- 使用清晰的標題層級（#, ##, ###）
- 使用列表和表格提高可讀性
- 統一術語和表達方式

**4. 內容組織**：
- 將內容按照標準 SOP 結構重新組織
- 合併重複的說明，但保留所有獨特的信息
- 確保邏輯清晰、步驟連貫
- 使用適當的章節劃分

**5. 語言優化**：
- 使用專業、簡練的語言
- 統一術語
- 改善可讀性
- 消除冗餘表達

**輸出格式**：
- 使用 Markdown 格式
- 清晰的標題層級
- 適當使用列表和表格

請生成優化後的 SOP 文檔，確保所有關鍵信息和圖片標記都被保留。
"#
    )
}

impl FromStr for DocKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "system_doc" => Ok(DocKind::SystemDoc),
            "sop" => Ok(DocKind::Sop),
            "tech_report" | "technical_report" => Ok(DocKind::TechReport),
            "sop_optimize" => Ok(DocKind::SopOptimize),
            other => Err(Error::InvalidData(format!("unknown document kind: {other}"))),
        }
    }
}

impl std::fmt::Display for DocKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: DocKind,
    /// Template file; relative paths are looked up in the template directory
    pub template: PathBuf,
    /// User requirements, or the original SOP text for `sop_optimize`
    pub requirements: String,
    pub output_format: OutputFormat,
    /// Extracted images resolved by markers (PPTX output only)
    pub image_folder: Option<PathBuf>,
    /// Role profile prepended to the prompt
    pub profile: Option<String>,
    /// Office template supplying layouts or styles for the output
    pub style_template: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(kind: DocKind, template: impl Into<PathBuf>, requirements: impl Into<String>) -> Self {
        Self {
            kind,
            template: template.into(),
            requirements: requirements.into(),
            output_format: OutputFormat::default(),
            image_folder: None,
            profile: None,
            style_template: None,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_image_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.image_folder = Some(folder.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_style_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.style_template = Some(template.into());
        self
    }
}

/// Files written by a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    /// File name shared by the outputs, without extension
    pub base_name: String,
    pub markdown_path: PathBuf,
    /// Converted file; `None` when Markdown was requested
    pub output_path: Option<PathBuf>,
    pub format: OutputFormat,
    pub usage: Usage,
    /// Leading part of the Markdown
    pub preview: String,
}

const PREVIEW_CHARS: usize = 500;

fn resolve_template(template: &Path, settings: &Settings) -> Result<PathBuf> {
    let candidates = [template.to_path_buf(), settings.template_dir.join(template)];
    let path = candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| Error::ResourceNotFound(format!("template {}", template.display())))?;
    if !is_supported_template(&path) {
        return Err(Error::UnsupportedFormat(format!("template {}", path.display())));
    }
    Ok(path)
}

/// Output name without extension for a run started at `timestamp`
/// (`YYYYMMDDHHMMSS`).
pub fn output_base_name(kind: DocKind, template: &Path, timestamp: &str) -> String {
    match kind {
        DocKind::SopOptimize => {
            let stem = template
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sop".to_string());
            format!("{stem}_{timestamp}")
        }
        other => format!("generated_{}_{timestamp}", other.as_str()),
    }
}

/// Run a generation request end to end.
///
/// The Markdown is always saved; DOCX or PPTX output is converted from it.
/// PDF output is rejected before the generator is called.
pub fn generate_document(
    generator: &dyn TextGenerator,
    request: &GenerationRequest,
    settings: &Settings,
) -> Result<GeneratedDocument> {
    if request.output_format == OutputFormat::Pdf {
        return Err(Error::UnsupportedFormat("pdf output".to_string()));
    }

    let template_path = resolve_template(&request.template, settings)?;
    let template = template_text(&template_path)?;
    let prompt = request
        .kind
        .build_prompt(request.profile.as_deref(), &template, &request.requirements);

    tracing::info!(kind = %request.kind, template = %template_path.display(), "generating document");
    let generation = generator.generate(&prompt)?;
    tracing::info!(
        model = %generation.usage.model,
        input_tokens = generation.usage.input_tokens,
        output_tokens = generation.usage.output_tokens,
        cost = generation.usage.cost,
        "generation finished"
    );

    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
    let base_name = output_base_name(request.kind, &request.template, &timestamp);
    std::fs::create_dir_all(&settings.output_dir)?;

    let markdown_path = settings.output_dir.join(format!("{base_name}.md"));
    std::fs::write(&markdown_path, &generation.text)?;

    let config = DocConfig::new(request.kind.title());
    let output_path = match request.output_format {
        OutputFormat::Markdown => None,
        format => {
            let path = settings
                .output_dir
                .join(format!("{base_name}.{}", format.extension()));
            convert(&generation.text, &config, request, format, &path)?;
            Some(path)
        }
    };

    let mut preview: String = generation.text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");

    Ok(GeneratedDocument {
        base_name,
        markdown_path,
        output_path,
        format: request.output_format,
        usage: generation.usage,
        preview,
    })
}

fn convert(
    markdown: &str,
    config: &DocConfig,
    request: &GenerationRequest,
    format: OutputFormat,
    path: &Path,
) -> Result<()> {
    match format {
        #[cfg(feature = "pptx")]
        OutputFormat::Pptx => crate::pptx::markdown_to_pptx(
            markdown,
            config,
            request.image_folder.as_deref(),
            request.style_template.as_deref(),
        )?
        .save(path),
        #[cfg(feature = "docx")]
        OutputFormat::Docx => {
            crate::docx::markdown_to_docx(markdown, config, request.style_template.as_deref())?
                .save(path)
        }
        other => Err(Error::Render(format!(
            "{} output is not available in this build",
            other.extension()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn generate(&self, _prompt: &str) -> Result<Generation> {
            Err(Error::Generation("quota exceeded".to_string()))
        }
    }

    fn settings_with_template() -> (tempfile::TempDir, Settings) {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::from_base(root.path());
        settings.ensure_dirs().unwrap();
        std::fs::write(settings.template_dir.join("old_sop.md"), "# 目的\n").unwrap();
        (root, settings)
    }

    #[test]
    fn test_estimate_cost() {
        let cost = estimate_cost("gpt-4o-mini", 1_000_000, 2_000_000);
        assert!((cost - 1.35).abs() < 1e-9);
        assert_eq!(estimate_cost("unknown", 10, 10), 0.0);
        assert_eq!(Usage::priced("gpt-4o", 0, 1_000_000).cost, 10.0);
    }

    #[test]
    fn test_doc_kind_parse() {
        assert_eq!("technical_report".parse::<DocKind>().unwrap(), DocKind::TechReport);
        assert_eq!(DocKind::SopOptimize.to_string(), "sop_optimize");
        assert!("memo".parse::<DocKind>().is_err());
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = DocKind::Sop.build_prompt(Some("ROLE"), "TEMPLATE", "NEEDS");
        assert!(prompt.starts_with("ROLE\n\n=== Role Definition End ===\n\n"));
        assert!(prompt.contains("模板內容：\nTEMPLATE"));
        assert!(prompt.contains("用戶需求：\nNEEDS"));
        assert!(prompt.contains("6. 請生成完整的SOP內容"));

        let optimize = DocKind::SopOptimize.build_prompt(None, "T", "[圖片 1-1: 來自投影片 1]");
        assert!(optimize.contains("=== 原始 SOP 內容 ===\n[圖片 1-1: 來自投影片 1]"));
    }

    #[test]
    fn test_output_base_name() {
        let ts = "20240102030405";
        assert_eq!(
            output_base_name(DocKind::Sop, Path::new("t.docx"), ts),
            "generated_sop_20240102030405"
        );
        assert_eq!(
            output_base_name(DocKind::SopOptimize, Path::new("old_sop.pptx"), ts),
            "old_sop_20240102030405"
        );
    }

    #[cfg(feature = "pptx")]
    #[test]
    fn test_generate_pptx() {
        let (_root, settings) = settings_with_template();
        let request = GenerationRequest::new(DocKind::SystemDoc, "old_sop.md", "需求");
        let doc = generate_document(&MockGenerator, &request, &settings).unwrap();

        assert!(doc.base_name.starts_with("generated_system_doc_"));
        assert!(doc.markdown_path.is_file());
        let out = doc.output_path.unwrap();
        assert_eq!(out.extension().unwrap(), "pptx");
        let pres = crate::pptx::Presentation::open(&out).unwrap();
        assert_eq!(pres.slide_count(), 5);
        assert!(doc.preview.ends_with("..."));
        assert_eq!(doc.usage.model, "mock-model");
    }

    #[test]
    fn test_markdown_only_and_pdf() {
        let (_root, settings) = settings_with_template();
        let request = GenerationRequest::new(DocKind::SopOptimize, "old_sop.md", "舊內容")
            .with_output_format(OutputFormat::Markdown);
        let doc = generate_document(&MockGenerator, &request, &settings).unwrap();
        assert!(doc.base_name.starts_with("old_sop_"));
        assert!(doc.output_path.is_none());

        let pdf = request.with_output_format(OutputFormat::Pdf);
        assert!(matches!(
            generate_document(&MockGenerator, &pdf, &settings),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_errors_propagate() {
        let (_root, settings) = settings_with_template();
        let request = GenerationRequest::new(DocKind::Sop, "old_sop.md", "x");
        assert!(matches!(
            generate_document(&FailingGenerator, &request, &settings),
            Err(Error::Generation(_))
        ));

        let missing = GenerationRequest::new(DocKind::Sop, "nope.md", "x");
        assert!(matches!(
            generate_document(&MockGenerator, &missing, &settings),
            Err(Error::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_unsupported_template_rejected_before_generation() {
        let (_root, settings) = settings_with_template();
        std::fs::write(settings.template_dir.join("blob.bin"), [0u8, 1, 2]).unwrap();
        let request = GenerationRequest::new(DocKind::Sop, "blob.bin", "x");
        assert!(matches!(
            generate_document(&FailingGenerator, &request, &settings),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_mock_usage_is_free() {
        let generation = MockGenerator.generate("提示").unwrap();
        assert_eq!(generation.usage.model, "mock-model");
        assert_eq!(generation.usage.input_tokens, 2);
        assert_eq!(generation.usage.cost, 0.0);
    }
}
