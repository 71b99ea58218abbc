use clap::{Parser, Subcommand};
use notes_mirror::{config, feed, output, render};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that write the site.
#[derive(clap::Args, Clone)]
struct RenderArgs {
    /// Rewrite every output file, even when its contents are unchanged
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "notes-mirror")]
#[command(about = "Mirror a notes feed into a static site")]
#[command(long_about = "\
Mirror a notes feed into a static site

Fetches one author's notes from a JSON feed, stores them as a canonical
collection, and renders an index plus one page per note.

Layout:

  notes-mirror.toml        # Optional config (run 'notes-mirror gen-config')
  data/
  ├── notes_raw.json       # Feed response, verbatim
  └── notes.json           # { count, items: [Note] }, newest first
  public/
  ├── index.html           # All notes
  ├── notes/<slug>.html    # One page per note
  ├── styles.css
  └── script.js            # Light/dark toggle

Set RUST_LOG=debug for diagnostics.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "notes-mirror.toml", global = true)]
    config: PathBuf,

    /// Directory for notes_raw.json and notes.json [config: paths.data_dir]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for the rendered site [config: paths.output_dir]
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the feed into the canonical notes collection
    Fetch,
    /// Render the site from the canonical notes collection
    Render(RenderArgs),
    /// Run the full pipeline: fetch → render
    Build(RenderArgs),
    /// Validate config and the stored collection without writing
    Check,
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the config file and apply CLI path overrides.
fn resolve_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.config)?;
    if let Some(dir) = &cli.data_dir {
        site_config.paths.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.output {
        site_config.paths.output_dir = dir.clone();
    }
    Ok(site_config)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Fetch => {
            let site_config = resolve_config(&cli)?;
            let report = feed::fetch(&site_config)?;
            output::print_fetch_output(&report, &site_config.feed.author);
        }
        Command::Render(args) => {
            let site_config = resolve_config(&cli)?;
            let paths = &site_config.paths;
            let report = render::generate(
                &site_config.site,
                &paths.notes_path(),
                &paths.output_dir,
                args.force,
            )?;
            output::print_render_output(&report);
        }
        Command::Build(args) => {
            let site_config = resolve_config(&cli)?;
            let paths = &site_config.paths;

            println!("==> Stage 1: Fetching {}", site_config.feed.url);
            let report = feed::fetch(&site_config)?;
            output::print_fetch_output(&report, &site_config.feed.author);

            println!(
                "==> Stage 2: Rendering {} \u{2192} {}",
                paths.notes_path().display(),
                paths.output_dir.display()
            );
            let report = render::generate(
                &site_config.site,
                &paths.notes_path(),
                &paths.output_dir,
                args.force,
            )?;
            output::print_render_output(&report);

            println!("==> Build complete: {}", paths.output_dir.display());
        }
        Command::Check => {
            let site_config = resolve_config(&cli)?;
            let notes_path = site_config.paths.notes_path();
            println!("==> Checking {}", notes_path.display());
            let collection = render::load_collection(&notes_path)?;
            render::validate_notes(&collection.items)?;
            println!("==> {} notes, content is valid", collection.items.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
