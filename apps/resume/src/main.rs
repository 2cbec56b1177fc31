mod compiler;
mod config;
mod content;
mod docx;
mod errors;
mod latex;
mod projects;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compiler::{probe_engine, Builder, PdfLatex};
use crate::config::Config;
use crate::content::load_content;
use crate::docx::layout::DocStyle;
use crate::docx::{docx_from_tex, generate_docx, ContactSheet};
use crate::latex::LatexGenerator;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "instant-resume", version, about = "LaTeX résumé editor and build tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web editor
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        projects_dir: Option<PathBuf>,
    },
    /// Compile the resume directory into the build directory
    Build {
        /// Remove the build directory first
        #[arg(long)]
        clean: bool,
        /// Print the engine's output
        #[arg(short, long)]
        verbose: bool,
        /// Rebuild whenever a source file changes
        #[arg(short, long)]
        watch: bool,
    },
    /// Generate the LaTeX section files from résumé YAML
    Latex {
        content: PathBuf,
        /// Output directory (default: next to the YAML)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate Word documents from résumé YAML
    Docx {
        content: PathBuf,
        #[arg(long, value_enum, default_value_t = StyleArg::Both)]
        style: StyleArg,
        /// Output directory (default: next to the YAML)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a Word document from a project's LaTeX sections
    Tex2docx {
        project_dir: PathBuf,
        /// YAML file with `contact` and `summary`
        #[arg(long)]
        contact: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
    Formatted,
    Ats,
    Both,
}

impl StyleArg {
    fn styles(self) -> &'static [DocStyle] {
        match self {
            StyleArg::Formatted => &[DocStyle::Formatted],
            StyleArg::Ats => &[DocStyle::Ats],
            StyleArg::Both => &[DocStyle::Formatted, DocStyle::Ats],
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve {
            host,
            port,
            projects_dir,
        } => {
            config.host = host.unwrap_or(config.host);
            config.port = port.unwrap_or(config.port);
            config.projects_dir = projects_dir.unwrap_or(config.projects_dir);
            serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Build {
            clean,
            verbose,
            watch,
        } => build(&config, clean, verbose, watch).await,
        Command::Latex { content, out } => {
            let resume = load_content(&content)?;
            let dir = out.unwrap_or_else(|| parent_dir(&content));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let written = LatexGenerator::new(&resume).write_all(&dir)?;
            info!("Wrote {} section files to {}", written.len(), dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Docx {
            content,
            style,
            out,
        } => {
            let resume = load_content(&content)?;
            let dir = out.unwrap_or_else(|| parent_dir(&content));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            for &style in style.styles() {
                generate_docx(&resume, style, &dir.join(style.file_name()))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Tex2docx {
            project_dir,
            contact,
            out,
        } => {
            let sheet = match contact {
                Some(path) => {
                    let yaml = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_yaml::from_str::<Option<ContactSheet>>(&yaml)
                        .with_context(|| format!("parsing {}", path.display()))?
                        .unwrap_or_default()
                }
                None => ContactSheet::default(),
            };
            let out = out.unwrap_or_else(|| project_dir.join("resume.docx"));
            docx_from_tex(&project_dir, sheet, &out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Instant Resume v{}", env!("CARGO_PKG_VERSION"));
    info!("Projects directory: {}", config.projects_dir.display());
    info!("Serving frontend from: {}", config.frontend_dir.display());

    probe_engine(&config.latex_engine).await;

    let engine = Arc::new(PdfLatex::new(
        config.latex_engine.clone(),
        config.compile_timeout,
    ));
    let state = AppState::new(config.clone(), engine)
        .await
        .context("opening projects directory")?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn build(config: &Config, clean: bool, verbose: bool, watch: bool) -> Result<ExitCode> {
    if !config.resume_dir.join(&config.main_tex).is_file() {
        anyhow::bail!(
            "{} not found in {}",
            config.main_tex,
            config.resume_dir.display()
        );
    }

    let engine = Arc::new(PdfLatex::new(
        config.latex_engine.clone(),
        config.compile_timeout,
    ));
    let builder = Builder::new(
        config.resume_dir.clone(),
        config.build_dir.clone(),
        config.main_tex.clone(),
        verbose,
        engine,
    );

    if watch {
        compiler::watch::watch(&builder, clean).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = builder.build(clean).await?;
    if report.moved_aux > 0 {
        info!("Moved {} aux files into {}", report.moved_aux, config.build_dir.display());
    }
    match report.pdf {
        Some(pdf) if report.success => {
            info!("Output: {}", pdf.display());
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            if !verbose {
                eprintln!("{}", report.output.diagnostics());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}
