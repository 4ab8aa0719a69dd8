//! colflow - Main Entry Point
//!
//! Renders the multi-column regions of a markdown note to a standalone HTML
//! page, the way live preview would show them.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::{fs, io};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::{error, info};

use colflow::config::{load_config, save_config, Settings};
use colflow::error::{Error, Result};
use colflow::export::{generate_html_document, render_note_body, write_html_file};
use colflow::live_preview::LivePreview;
use colflow::markdown::ComrakRenderer;
use colflow::vault::Vault;

/// Application name constant.
const APP_NAME: &str = "colflow";

#[derive(Parser, Debug)]
#[command(version, about = "Render the multi-column regions of a markdown note to HTML", long_about = None)]
struct Cli {
    /// Markdown note to render
    #[arg(required_unless_present = "write_config")]
    note: Option<PathBuf>,

    /// Folder embeds and links resolve against (default: the note's folder)
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Write the page to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Save the current settings to the config file and exit
    #[arg(long, conflicts_with_all = ["note", "vault", "out"])]
    write_config: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_config();

    let result = if cli.write_config {
        save_config(&settings).map(|path| {
            info!("Settings written to {}", path.display());
        })
    } else {
        let Some(note) = cli.note else {
            Cli::command()
                .error(ErrorKind::MissingRequiredArgument, "no note given")
                .exit();
        };
        render(&note, cli.vault.as_deref(), cli.out.as_deref(), settings)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn render(note: &Path, vault: Option<&Path>, out: Option<&Path>, settings: Settings) -> Result<()> {
    info!("Starting {} for {}", APP_NAME, note.display());

    let document = fs::read_to_string(note).map_err(|source| Error::FileRead {
        path: note.to_path_buf(),
        source,
    })?;

    let vault_root = vault
        .map(Path::to_path_buf)
        .or_else(|| settings.default_vault.clone())
        .or_else(|| note.parent().map(Path::to_path_buf))
        .filter(|root| !root.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    let vault = Vault::open(&vault_root)?;

    let source_path = fs::canonicalize(note).unwrap_or_else(|_| note.to_path_buf());
    let mut preview = LivePreview::new(
        Box::new(ComrakRenderer::default()),
        Box::new(vault),
        settings,
    );

    let body = render_note_body(&document, &source_path, &mut preview);
    let title = note
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Document");
    let html = generate_html_document(&body, title);

    match out {
        Some(path) => write_html_file(path, &html),
        None => io::stdout().write_all(html.as_bytes()).map_err(Error::from),
    }
}
