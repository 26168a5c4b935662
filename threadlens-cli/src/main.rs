use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use threadlens_core::{
    DEFAULT_CONCURRENCY, DEFAULT_PER_PAGE, HostConfig, LensError, PostId, Projection, Session,
    root_id_from_url,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "threadlens",
    version,
    about = "Fetch a discussion thread and project it as a transcript, raw JSON, or an AI-ready list"
)]
struct Cli {
    /// Thread permalink URL, bare 26-char post id, or any text containing one
    target: String,

    /// Projection to print: transcript, raw, or ai
    #[arg(long, default_value = "transcript")]
    view: String,

    /// Server base URL (defaults to MM_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bearer token (defaults to MM_TOKEN; unset means ambient credentials)
    #[arg(long)]
    token: Option<String>,

    /// Thread page size
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: u32,

    /// Maximum profile fetches in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Write the export file into this directory instead of printing the view
    #[arg(long)]
    out: Option<PathBuf>,

    /// Use the target post as-is instead of promoting a reply to its root
    #[arg(long)]
    no_promote: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> threadlens_core::Result<()> {
    let projection: Projection = cli.view.parse()?;

    let id = root_id_from_url(&cli.target)
        .map(Ok)
        .unwrap_or_else(|| PostId::from_user_input(&cli.target))?;

    let client = HostConfig::from_env()
        .with_overrides(cli.host, cli.token)
        .into_client()?;

    let id = if cli.no_promote {
        id
    } else {
        client.ensure_root_id(id).await
    };

    let mut session = Session::new();
    session.switch_projection(projection);
    session
        .refresh(&client, id, cli.per_page, cli.concurrency)
        .await?;

    if let Some(dir) = cli.out {
        let export = session.export_current()?;
        let path = dir.join(&export.filename);
        fs::write(&path, &export.content).map_err(|source| LensError::Io {
            path: path.clone(),
            source,
        })?;
        println!("{}", path.display());
    } else {
        let view = session.view_current();
        if view.ends_with('\n') {
            print!("{view}");
        } else {
            println!("{view}");
        }
    }

    Ok(())
}
