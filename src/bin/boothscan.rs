//! CLI binary for boothscan.
//!
//! A thin shim over the library crate: maps flags to `ScanConfig`, picks
//! the backends (Supabase from the environment, or an offline directory)
//! and prints results.

use anyhow::{Context, Result};
use boothscan::pipeline::normalize::normalize_all;
use boothscan::{
    BlobStore, Catalog, CompanyStore, CompanyUpdate, CompanyView, ContactList, LocalBlobStore,
    MemoryBlobStore, MemoryStore, ProgressCallback, ScanConfig, ScanError, ScanOutput,
    ScanProgressCallback, ScanRequest, Scanner, SupabaseBlobStore, SupabaseConfig, SupabaseStore,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while normalising and extracting, then a bar over the uploads.
struct CliProgressCallback {
    bar: ProgressBar,
    normalized: AtomicUsize,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading photos…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            normalized: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} photos  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_style(style);
        self.bar.set_prefix("Uploading");
        self.bar.set_position(0);
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_scan_start(&self, total_images: usize) {
        self.bar.set_length(total_images as u64);
        self.bar.set_prefix("Normalising");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Scanning {total_images} photos…"))
        ));
    }

    fn on_image_normalized(&self, index: usize, total: usize, bytes: usize) {
        let done = self.normalized.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.println(format!(
            "  {} Photo {:>2}/{:<2}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{:>6} KB", bytes / 1024)),
        ));
        if done == total {
            self.bar.set_prefix("Extracting");
            self.bar.set_message("Asking the model…");
        }
    }

    fn on_extraction_complete(&self, confidence: f64, degraded: bool) {
        let line = if degraded {
            format!("  {} Extraction unavailable, saving a blank record", cyan("⚠"))
        } else {
            format!("  {} Extracted  {}", green("✓"), dim(&format!("confidence {confidence:.2}")))
        };
        self.bar.println(line);
        self.activate_bar();
    }

    fn on_asset_uploaded(&self, _index: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_asset_failed(&self, index: usize, total: usize, error: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Photo {:>2}/{:<2}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_scan_complete(&self, company_id: Uuid, uploaded: usize, total: usize) {
        self.bar.finish_and_clear();
        let failed = self.failed.load(Ordering::SeqCst);
        eprintln!(
            "{} Saved {}  {}/{} photos{}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&company_id.to_string()),
            uploaded,
            total,
            if failed == 0 {
                String::new()
            } else {
                format!("  ({} failed)", red(&failed.to_string()))
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan three booth photos into Supabase
  boothscan scan booth1.jpg booth2.jpg card.png

  # Scan without a database, keeping photos under ./out
  boothscan scan --offline ./out booth1.jpg

  # See what the model reads, write nothing
  boothscan extract booth1.jpg --provider gemini

  # Edit a record
  boothscan update 6f1c… --emails "a@acme.com; b@acme.com" --booth B12

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY             Google Gemini API key
  OPENAI_API_KEY             OpenAI API key
  ANTHROPIC_API_KEY          Anthropic API key
  EDGEQUAKE_LLM_PROVIDER     Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL            Override model ID
  SUPABASE_URL               Project URL (NEXT_PUBLIC_SUPABASE_URL also accepted)
  SUPABASE_SERVICE_ROLE_KEY  Service-role key used for rows and storage
  BOOTHSCAN_BUCKET           Storage bucket (default: company-assets)

Without an API key every scan still succeeds, with a blank "New company"
record at confidence 0.
"#;

/// Turn trade-show booth photos into company records using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "boothscan",
    version,
    about = "Turn trade-show booth photos into company records using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BOOTHSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "BOOTHSCAN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalise, extract and save a company with its photos.
    Scan {
        /// Photo files, in the order they were taken.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Owning user id stored on the record.
        #[arg(long, env = "BOOTHSCAN_OWNER")]
        owner: Option<String>,

        /// Free-text hint (recorded in the logs only).
        #[arg(long)]
        hint: Option<String>,

        /// Use an in-memory store and write photos under DIR instead of Supabase.
        #[arg(long, value_name = "DIR")]
        offline: Option<PathBuf>,

        /// Print the full ScanOutput as JSON.
        #[arg(long)]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "BOOTHSCAN_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Normalise and extract, print the result as JSON. Nothing is saved.
    Extract {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Normalise photos and write them as DIR/<index>.jpg.
    Normalize {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output directory.
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// List saved companies, newest first.
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one company with its photos.
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },

    /// Change fields of a saved company. Only the given fields change.
    Update {
        id: Uuid,
        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Delete a company, its photo rows and stored photos.
    Delete { id: Uuid },

    /// Remove one photo from a company.
    RemovePhoto { id: Uuid, asset_id: Uuid },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// LLM model ID (e.g. gemini-2.5-flash, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Longest image side after normalisation, in pixels.
    #[arg(long, env = "BOOTHSCAN_MAX_SIDE", default_value_t = 1600)]
    max_side: u32,

    /// JPEG quality of normalised photos (1–100).
    #[arg(long, env = "BOOTHSCAN_QUALITY", default_value_t = 80,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Extraction call timeout in seconds.
    #[arg(long, env = "BOOTHSCAN_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Confidence below which the notes get a warning line.
    #[arg(long, env = "BOOTHSCAN_LOW_CONFIDENCE", default_value_t = 0.6)]
    low_confidence: f64,

    /// Path to a text file containing a custom extraction prompt.
    #[arg(long, env = "BOOTHSCAN_PROMPT")]
    prompt: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    website: Option<String>,
    /// Emails separated by `,` or `;`.
    #[arg(long)]
    emails: Option<String>,
    /// Phone numbers separated by `,` or `;`.
    #[arg(long)]
    phones: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    booth: Option<String>,
    /// Product categories, comma separated.
    #[arg(long, value_delimiter = ',')]
    categories: Option<Vec<String>>,
    #[arg(long)]
    notes: Option<String>,
}

impl From<UpdateArgs> for CompanyUpdate {
    fn from(a: UpdateArgs) -> Self {
        CompanyUpdate {
            name: a.name,
            website: a.website,
            emails: a.emails.as_deref().map(ContactList::from),
            phones: a.phones.as_deref().map(ContactList::from),
            country: a.country,
            city: a.city,
            booth: a.booth,
            categories: a
                .categories
                .map(|c| c.into_iter().map(|s| s.trim().to_string()).collect()),
            notes: a.notes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Scan {
            images,
            owner,
            hint,
            offline,
            json,
            no_progress,
            pipeline,
        } => {
            let show_progress = !cli.quiet && !no_progress && !json;
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn ScanProgressCallback>)
            } else {
                None
            };
            let config = build_config(&pipeline, progress).await?;
            let (store, blobs) = match offline {
                Some(dir) => offline_backends(&dir).await?,
                None => supabase_backends()?,
            };

            let files = read_images(&images).await?;
            let mut request = ScanRequest::new(files);
            request.owner_id = owner;
            request.hint_text = hint;

            let output = Scanner::new(config, store, blobs)
                .scan(request)
                .await
                .context("Scan failed")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).context("Failed to serialise output")?
                );
            } else {
                print_scan(&output);
            }
        }

        Command::Extract { images, pipeline } => {
            let config = build_config(&pipeline, None).await?;
            let (store, blobs) = offline_memory();
            let scanner = Scanner::new(config, store, blobs);
            if !scanner.extractor().is_configured() && !cli.quiet {
                eprintln!(
                    "{} No inference credential found; the result will be blank",
                    cyan("⚠")
                );
            }
            let files = read_images(&images).await?;
            let extraction = scanner
                .extract_only(files)
                .await
                .context("Extraction failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&extraction).context("Failed to serialise result")?
            );
        }

        Command::Normalize {
            images,
            output,
            pipeline,
        } => {
            let files = read_images(&images).await?;
            let normalized = normalize_all(files, pipeline.max_side, pipeline.quality, None)
                .await
                .context("Normalisation failed")?;
            tokio::fs::create_dir_all(&output)
                .await
                .with_context(|| format!("Failed to create {}", output.display()))?;
            for (index, image) in normalized.iter().enumerate() {
                let path = output.join(format!("{index}.jpg"));
                tokio::fs::write(&path, &image.bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!(
                        "  {} {}  {}",
                        green("✓"),
                        path.display(),
                        dim(&format!(
                            "{}×{}  {} KB",
                            image.width,
                            image.height,
                            image.bytes.len() / 1024
                        ))
                    );
                }
            }
        }

        Command::List { json } => {
            let views = catalog()?.list().await.context("Failed to list companies")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else if views.is_empty() {
                eprintln!("No companies yet.");
            } else {
                for v in &views {
                    println!(
                        "{}  {:<32}  {:>2} photos  {}",
                        v.record.id,
                        v.record.name,
                        v.photos.len(),
                        dim(&v.record.created_at.format("%Y-%m-%d %H:%M").to_string())
                    );
                }
            }
        }

        Command::Show { id, json } => {
            let view = catalog()?
                .get(id)
                .await
                .context("Failed to load company")?
                .ok_or(ScanError::CompanyNotFound { id })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view);
            }
        }

        Command::Update { id, fields } => {
            let view = catalog()?
                .update(id, fields.into())
                .await
                .context("Update failed")?
                .ok_or(ScanError::CompanyNotFound { id })?;
            print_view(&view);
        }

        Command::Delete { id } => {
            if catalog()?.delete(id).await.context("Delete failed")? {
                eprintln!("{} Deleted {}", green("✔"), id);
            } else {
                return Err(ScanError::CompanyNotFound { id }.into());
            }
        }

        Command::RemovePhoto { id, asset_id } => {
            catalog()?
                .remove_photo(id, asset_id)
                .await
                .context("Failed to remove photo")?;
            eprintln!("{} Removed photo {}", green("✔"), asset_id);
        }
    }

    Ok(())
}

/// Map CLI args to `ScanConfig`.
async fn build_config(args: &PipelineArgs, progress: Option<ProgressCallback>) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder()
        .max_side(args.max_side)
        .jpeg_quality(args.quality)
        .extraction_timeout_secs(args.timeout)
        .low_confidence_threshold(args.low_confidence);

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = args.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.extraction_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(bytes);
    }
    Ok(files)
}

type Backends = (Arc<dyn CompanyStore>, Arc<dyn BlobStore>);

fn supabase_backends() -> Result<Backends> {
    let config = SupabaseConfig::from_env().context(
        "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set (or use `scan --offline DIR`)",
    )?;
    let store = SupabaseStore::new(config.clone()).context("Failed to build Supabase client")?;
    let blobs = SupabaseBlobStore::new(config).context("Failed to build Supabase client")?;
    Ok((Arc::new(store), Arc::new(blobs)))
}

async fn offline_backends(dir: &Path) -> Result<Backends> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok((
        Arc::new(MemoryStore::new()),
        Arc::new(LocalBlobStore::new(dir)),
    ))
}

fn offline_memory() -> Backends {
    (
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryBlobStore::default()),
    )
}

fn catalog() -> Result<Catalog> {
    let (store, blobs) = supabase_backends()?;
    Ok(Catalog::new(store, blobs))
}

fn print_scan(output: &ScanOutput) {
    let c = &output.company;
    println!("{}  {}", bold(&c.name), dim(&c.id.to_string()));
    print_fields(c.website.as_deref(), c.booth.as_deref(), c.city.as_deref(), c.country.as_deref());
    print_list("Emails", c.emails.as_deref());
    print_list("Phones", c.phones.as_deref());
    print_list("Categories", c.product_categories.as_deref());
    if let Some(ref notes) = c.notes {
        println!("Notes:       {}", notes.replace('\n', "\n             "));
    }
    for asset in output.uploaded_assets() {
        println!("Photo {:>2}:    {}", asset.sort_order, asset.public_url);
    }
}

fn print_view(view: &CompanyView) {
    let c = &view.record;
    println!("{}  {}  {}", bold(&c.name), dim(&c.id.to_string()), green(&view.status));
    print_fields(c.website.as_deref(), c.booth.as_deref(), c.city.as_deref(), c.country.as_deref());
    print_list("Emails", c.emails.as_deref());
    print_list("Phones", c.phones.as_deref());
    print_list("Categories", c.product_categories.as_deref());
    if let Some(conf) = c.confidence {
        println!("Confidence:  {conf:.2}");
    }
    if let Some(ref notes) = c.notes {
        println!("Notes:       {}", notes.replace('\n', "\n             "));
    }
    for p in &view.photos {
        println!("Photo {:>2}:    {}  {}", p.sort_order, p.public_url, dim(&p.id.to_string()));
    }
}

fn print_fields(website: Option<&str>, booth: Option<&str>, city: Option<&str>, country: Option<&str>) {
    if let Some(w) = website {
        println!("Website:     {w}");
    }
    if let Some(b) = booth {
        println!("Booth:       {b}");
    }
    let place: Vec<&str> = [city, country].into_iter().flatten().collect();
    if !place.is_empty() {
        println!("Location:    {}", place.join(", "));
    }
}

fn print_list(label: &str, items: Option<&[String]>) {
    if let Some(items) = items.filter(|i| !i.is_empty()) {
        println!("{:<12} {}", format!("{label}:"), items.join(", "));
    }
}
