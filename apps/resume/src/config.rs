use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default so a bare checkout runs without a `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub projects_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub resume_dir: PathBuf,
    pub build_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub latex_engine: String,
    pub main_tex: String,
    pub compile_timeout: Duration,
    pub default_project: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            projects_dir: env_or("PROJECTS_DIR", "projects").into(),
            frontend_dir: env_or("FRONTEND_DIR", "webapp/frontend").into(),
            resume_dir: env_or("RESUME_DIR", "resume").into(),
            build_dir: env_or("BUILD_DIR", "build").into(),
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            latex_engine: env_or("LATEX_ENGINE", "pdflatex"),
            main_tex: env_or("MAIN_TEX", "cv-llt.tex"),
            compile_timeout: Duration::from_secs(
                env_or("COMPILE_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("COMPILE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            default_project: env_or("DEFAULT_PROJECT", "default"),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

/// File name of the PDF the engine produces for `main_tex`.
pub fn pdf_name_for(main_tex: &str) -> String {
    let stem = main_tex.strip_suffix(".tex").unwrap_or(main_tex);
    format!("{stem}.pdf")
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Config rooted in a scratch directory, used by route and manager tests.
    pub fn for_tests(root: &std::path::Path) -> Self {
        Config {
            projects_dir: root.join("projects"),
            frontend_dir: root.join("frontend"),
            resume_dir: root.join("resume"),
            build_dir: root.join("build"),
            host: "127.0.0.1".to_string(),
            port: 0,
            latex_engine: "pdflatex".to_string(),
            main_tex: "cv-llt.tex".to_string(),
            compile_timeout: Duration::from_secs(5),
            default_project: "default".to_string(),
            rust_log: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_name_strips_tex_suffix() {
        assert_eq!(pdf_name_for("cv-llt.tex"), "cv-llt.pdf");
    }

    #[test]
    fn test_pdf_name_without_suffix() {
        assert_eq!(pdf_name_for("resume"), "resume.pdf");
    }
}
