//! mdoffice CLI - Markdown to PowerPoint and Word with slide images
//!
//! Extracts images and marked-up text from presentations, converts Markdown
//! back into PPTX or DOCX, and injects images into saved decks.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use mdoffice::pptx::{self, ImageExtractor, ImageInjector, LayoutRole, Presentation};
use mdoffice::generate::{DocKind, MockGenerator};
use mdoffice::{
    generate_document, ConvertOptions, DocConfig, FormatType, GenerationRequest, ImageSession,
    InjectionRequest, OutputFormat, Settings,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Markdown to PowerPoint and Word, with slide image reconciliation
#[derive(Parser)]
#[command(
    name = "mdoffice",
    author = "iyulab",
    version,
    about = "Convert Markdown to PPTX/DOCX and move images between slides",
    long_about = "mdoffice - Markdown to Office conversion.\n\n\
                  Extracts slide images and text with image markers, rebuilds presentations \
                  or Word documents from Markdown on top of a template, and injects images \
                  into existing presentations."
)]
struct Cli {
    /// Show debug logs (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Markdown to a presentation or document
    Convert {
        /// Markdown file ("-" for stdin)
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (default: from the output extension)
        #[arg(short, long)]
        format: Option<ConvertFormat>,

        /// Document title
        #[arg(short, long)]
        title: Option<String>,

        /// Headline of the title slide (default: the title)
        #[arg(long)]
        display_name: Option<String>,

        /// Folder of extracted images for marker resolution
        #[arg(short, long)]
        images: Option<PathBuf>,

        /// Template whose layouts or styles are reused
        #[arg(long)]
        template: Option<PathBuf>,

        /// Subtitle on the title slide
        #[arg(long)]
        subtitle: Option<String>,

        /// Keep code fences around the Markdown
        #[arg(long)]
        no_cleanup: bool,
    },

    /// Extract every picture of a presentation
    ExtractImages {
        /// Input presentation
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print a JSON manifest of the extracted files
        #[arg(long)]
        json: bool,
    },

    /// Extract slide text, optionally with image markers
    ExtractText {
        /// Input presentation
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Insert a marker line for every picture
        #[arg(short, long)]
        markers: bool,

        /// Output JSON with the text and image count
        #[arg(long)]
        json: bool,
    },

    /// Add images to slides of an existing presentation
    Inject {
        /// Input presentation
        input: PathBuf,

        /// Placement as SLIDE=IMAGE, repeatable
        #[arg(short, long = "place", value_parser = parse_placement)]
        placements: Vec<InjectionRequest>,

        /// JSON file with [{"image_path": ..., "slide_number": ...}]
        #[arg(short, long)]
        requests: Option<PathBuf>,

        /// Output file path (default: <name>_vN.pptx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a document offline with the built-in mock generator
    ///
    /// Directories come from MDOFFICE_BASE_DIR and related variables.
    Generate {
        /// Document kind: system_doc, sop, tech_report, sop_optimize
        #[arg(value_parser = parse_kind)]
        kind: DocKind,

        /// Template file (relative paths are also looked up in the template directory)
        #[arg(short, long)]
        template: PathBuf,

        /// Requirements, or the original SOP text for sop_optimize
        #[arg(short, long, default_value = "")]
        requirements: String,

        /// Output format: md, docx, pptx
        #[arg(short, long, default_value = "pptx", value_parser = parse_output_format)]
        format: OutputFormat,

        /// Presentation whose images are extracted for marker resolution
        #[arg(long)]
        images_from: Option<PathBuf>,

        /// Office template supplying layouts or styles
        #[arg(long)]
        style_template: Option<PathBuf>,

        /// Role profile prepended to the prompt
        #[arg(long)]
        profile: Option<String>,
    },

    /// Show presentation or document information
    Info {
        /// Input file path
        input: PathBuf,
    },

    /// Show version information
    Version,
}

/// Conversion target
#[derive(Clone, Copy, ValueEnum)]
enum ConvertFormat {
    /// PowerPoint presentation
    Pptx,
    /// Word document
    Docx,
}

fn parse_placement(value: &str) -> Result<InjectionRequest, String> {
    let (slide, image) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLIDE=IMAGE, got '{value}'"))?;
    let slide: i64 = slide
        .trim()
        .parse()
        .map_err(|_| format!("invalid slide number '{slide}'"))?;
    Ok(InjectionRequest::new(image.trim(), slide))
}

fn parse_kind(value: &str) -> Result<DocKind, String> {
    value.parse().map_err(|e: mdoffice::Error| e.to_string())
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    value.parse().map_err(|e: mdoffice::Error| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            title,
            display_name,
            images,
            template,
            subtitle,
            no_cleanup,
        } => {
            let markdown = read_input(&input)?;
            let format = match format {
                Some(f) => f,
                None => format_from_extension(&output)?,
            };

            let title = title.unwrap_or_else(|| default_title(&input, format));
            let mut config = DocConfig::new(title);
            if let Some(name) = display_name {
                config = config.with_display_name(name);
            }

            let pb = create_spinner("Converting...");
            match format {
                ConvertFormat::Pptx => {
                    let mut options = ConvertOptions::default();
                    if let Some(sub) = subtitle {
                        options = options.with_subtitle(sub);
                    }
                    if no_cleanup {
                        options = options.without_cleanup();
                    }
                    let mut pres = pptx::markdown_to_pptx_with(
                        &markdown,
                        &config,
                        images.as_deref(),
                        template.as_deref(),
                        &options,
                    )?;
                    pres.save(&output)?;
                    pb.finish_and_clear();
                    println!(
                        "{} Created presentation with {} slides: {}",
                        "✓".green().bold(),
                        pres.slide_count(),
                        output.display()
                    );
                }
                ConvertFormat::Docx => {
                    let mut doc =
                        mdoffice::docx::markdown_to_docx(&markdown, &config, template.as_deref())?;
                    doc.save(&output)?;
                    pb.finish_and_clear();
                    println!(
                        "{} Created document with {} paragraphs: {}",
                        "✓".green().bold(),
                        doc.paragraphs().len(),
                        output.display()
                    );
                }
            }
        }

        Commands::ExtractImages {
            input,
            output,
            json,
        } => {
            let pb = create_spinner("Extracting images...");
            let images = ImageExtractor::extract(&input, &output)?;
            pb.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&images)?);
            } else if images.is_empty() {
                println!("{} No images found in presentation", "!".yellow().bold());
            } else {
                for image in &images {
                    println!("  {} {}", image.marker.cyan(), image.filename());
                }
                println!(
                    "{} Extracted {} images to {}",
                    "✓".green().bold(),
                    images.len(),
                    output.display()
                );
            }
        }

        Commands::ExtractText {
            input,
            output,
            markers,
            json,
        } => {
            let extraction = pptx::extract_text(&input, markers)?;
            let content = if json {
                serde_json::to_string_pretty(&extraction)?
            } else {
                extraction.text
            };
            write_output(output.as_ref(), &content)?;

            if let Some(path) = output {
                println!(
                    "{} Extracted text ({} images referenced): {}",
                    "✓".green().bold(),
                    extraction.image_count,
                    path.display()
                );
            }
        }

        Commands::Inject {
            input,
            placements,
            requests,
            output,
        } => {
            let mut all = placements;
            if let Some(path) = requests {
                let loaded: Vec<InjectionRequest> = serde_json::from_str(&fs::read_to_string(path)?)?;
                all.extend(loaded);
            }
            if all.is_empty() {
                println!("{} No injection requests given; writing an unchanged copy", "!".yellow().bold());
            }

            let pb = create_spinner("Injecting images...");
            let written = ImageInjector::inject(&input, &all, output.as_deref())?;
            pb.finish_and_clear();
            println!("{} Saved {}", "✓".green().bold(), written.display());
        }

        Commands::Generate {
            kind,
            template,
            requirements,
            format,
            images_from,
            style_template,
            profile,
        } => {
            let settings = Settings::from_env();
            settings.ensure_dirs()?;

            let mut request =
                GenerationRequest::new(kind, template, requirements).with_output_format(format);
            if let Some(style) = style_template {
                request = request.with_style_template(style);
            }
            if let Some(profile) = profile {
                request = request.with_profile(profile);
            }

            // Removed with its images when this command returns.
            let session = match images_from {
                Some(source) => {
                    let session = ImageSession::new(&settings)?;
                    let images = session.extract(&source)?;
                    println!(
                        "{} Extracted {} images into session {}",
                        "✓".green().bold(),
                        images.len(),
                        session.id()
                    );
                    Some(session)
                }
                None => None,
            };
            if let Some(session) = &session {
                request = request.with_image_folder(session.path());
            }

            let pb = create_spinner("Generating...");
            let result = generate_document(&MockGenerator, &request, &settings)?;
            pb.finish_and_clear();

            println!("{} Markdown: {}", "✓".green().bold(), result.markdown_path.display());
            if let Some(path) = &result.output_path {
                println!("{} Output: {}", "✓".green().bold(), path.display());
            }
            println!(
                "{}: {} ({} in / {} out tokens, ${:.4})",
                "Usage".bold(),
                result.usage.model,
                result.usage.input_tokens,
                result.usage.output_tokens,
                result.usage.cost
            );
        }

        Commands::Info { input } => {
            let format = mdoffice::detect_format_from_path(&input)?;

            println!("{}", "Document Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Format".bold(), format);

            match format {
                FormatType::Pptx => print_presentation_info(&Presentation::open(&input)?)?,
                FormatType::Docx => {
                    let text = mdoffice::docx::extract_text(&input)?;
                    println!("{}: {}", "Paragraphs".bold(), text.lines().count());
                    println!("{}: {}", "Characters".bold(), text.chars().count());
                }
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_presentation_info(pres: &Presentation) -> Result<(), Box<dyn std::error::Error>> {
    let size = pres.slide_size();
    println!(
        "{}: {:.2} x {:.2} in",
        "Slide size".bold(),
        size.width as f64 / 914_400.0,
        size.height as f64 / 914_400.0
    );
    println!("{}: {}", "Slides".bold(), pres.slide_count());

    let images: usize = (0..pres.slide_count())
        .map(|i| pres.slide_images(i).map(|v| v.len()))
        .sum::<Result<usize, _>>()?;
    println!("{}: {}", "Images".bold(), images);

    println!("\n{}", "Layouts".cyan().bold());
    println!("{}", "─".repeat(40));
    let resolved = pres.resolved_layouts();
    for (i, layout) in pres.layouts().iter().enumerate() {
        let roles: Vec<&str> = [
            (LayoutRole::Title, "title"),
            (LayoutRole::Content, "content"),
            (LayoutRole::Blank, "blank"),
        ]
        .iter()
        .filter(|(role, _)| resolved.is_some_and(|r| r.get(*role) == i))
        .map(|(_, name)| *name)
        .collect();
        let tag = if roles.is_empty() {
            String::new()
        } else {
            format!(" [{}]", roles.join(", ")).green().to_string()
        };
        println!("{:>3}. {}{}", i, layout.name, tag);
    }
    if let Some(r) = resolved {
        if r.synthesizes_text() {
            println!(
                "{} Content layout has no body placeholder; text boxes will be synthesized",
                "!".yellow().bold()
            );
        }
    }
    Ok(())
}

fn format_from_extension(path: &Path) -> Result<ConvertFormat, Box<dyn std::error::Error>> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pptx") => Ok(ConvertFormat::Pptx),
        Some("docx") => Ok(ConvertFormat::Docx),
        _ => Err(format!("cannot infer format from '{}', use --format", path.display()).into()),
    }
}

fn default_title(input: &Path, format: ConvertFormat) -> String {
    let untitled = match format {
        ConvertFormat::Pptx => OutputFormat::Pptx,
        ConvertFormat::Docx => OutputFormat::Docx,
    };
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| s != "-")
        .unwrap_or_else(|| DocConfig::default_for(untitled).title)
}

fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn print_version() {
    println!("{} {}", "mdoffice".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown to PowerPoint and Word with slide image reconciliation");
    println!();
    println!("Output formats: PPTX, DOCX");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
