use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use filesync_lib::fs_writer::LocalFileWriter;
use filesync_lib::input_validation::validate_username;
use filesync_lib::sync_engine::{FailureKind, SyncPhase};
use filesync_lib::{probe_host, AppConfig, AuthSession, HttpRemoteStore, LogManager, SyncSession};

#[derive(Parser)]
#[command(name = "sync-cli", version)]
#[command(about = "Reconcile a local folder with the remote file workspace", long_about = None)]
struct Cli {
    /// Local folder to synchronize
    #[arg(short, long)]
    folder: PathBuf,

    /// YAML configuration file
    #[arg(short, long, default_value = "filesync.yaml")]
    config: PathBuf,

    /// API base URL, e.g. http://localhost:8000/api
    #[arg(short, long)]
    server: Option<String>,

    /// Bearer token from a previous login
    #[arg(short, long)]
    token: Option<String>,

    #[arg(short, long, requires = "password")]
    username: Option<String>,

    #[arg(short, long, requires = "username")]
    password: Option<String>,

    /// Show the plan without transferring anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Never write into the local folder; only upload
    #[arg(long)]
    upload_only: bool,

    /// Glob of folder-relative paths to leave out (repeatable)
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// Print the files currently on the server and exit
    #[arg(short, long)]
    list: bool,

    /// Download one remote file by name (repeatable) and exit
    #[arg(long = "fetch", value_name = "NAME")]
    fetch: Vec<String>,

    /// Destination for --fetch, defaults to the synced folder
    #[arg(long, value_name = "DIR", requires = "fetch")]
    to: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env();
    if let Some(server) = cli.server.take() {
        config.server_url = server;
    }
    if let Some(token) = cli.token.take() {
        config.token = Some(token);
    }
    config.upload_only |= cli.upload_only;
    config.exclude_patterns.append(&mut cli.exclude);
    config.validate()?;

    let remote = match (cli.username.take(), cli.password.take(), config.token.clone()) {
        (Some(username), Some(password), _) => {
            validate_username(&username)?;
            HttpRemoteStore::login(&config.server_url, &username, &password, config.request_timeout()).await?
        }
        (_, _, Some(token)) => HttpRemoteStore::new(
            &config.server_url,
            AuthSession {
                username: String::new(),
                token,
            },
            config.request_timeout(),
        )?,
        _ => anyhow::bail!("Missing credentials: pass --token or --username/--password"),
    };

    let capability = probe_host(config.upload_only);
    let log = Arc::new(LogManager::new(config.max_log_lines));
    let mut session = SyncSession::new(remote, capability, log);

    let result = if cli.list {
        list_files(&session).await
    } else if !cli.fetch.is_empty() {
        fetch_files(&cli, &session).await
    } else {
        sync_folder(&cli, &config, &mut session).await
    };

    let auth = session.into_remote().logout();
    tracing::info!(user = %auth.username, "Session closed");

    result
}

async fn list_files(session: &SyncSession<HttpRemoteStore>) -> anyhow::Result<()> {
    let names = session
        .remote_names()
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {e}", e.code()))?;

    println!("📂 {} file(s) on the server", names.len());
    for name in &names {
        println!("   📄 {name}");
    }
    Ok(())
}

async fn fetch_files(cli: &Cli, session: &SyncSession<HttpRemoteStore>) -> anyhow::Result<()> {
    let dest = cli.to.as_deref().unwrap_or(&cli.folder).canonicalize()?;
    let writer = LocalFileWriter::new();
    let mut failed = 0;

    println!("⬇️  Fetching into {dest:?}");
    for name in &cli.fetch {
        match session.fetch_one(name, &dest, &writer).await {
            Ok(path) => println!("   ✅ {name} -> {path:?}"),
            Err(e) => {
                failed += 1;
                eprintln!("   ⚠️  [{}] {e}", e.code());
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) could not be fetched", cli.fetch.len());
    }
    Ok(())
}

async fn sync_folder(
    cli: &Cli,
    config: &AppConfig,
    session: &mut SyncSession<HttpRemoteStore>,
) -> anyhow::Result<()> {
    println!("🔍 Analyzing folder...");
    println!("   Folder: {:?}", cli.folder);
    println!("   Server: {}", config.server_url);
    println!("   Mode: {}", session.capability().label());
    println!();

    let inventory = session.select_folder(&cli.folder, &config.exclude_patterns)?;
    let total_local = inventory.records.len();
    let target_dir = inventory.target_dir.clone();

    let plan = session
        .analyze()
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {e}", e.code()))?
        .clone();

    println!("📊 Sync Analysis:");
    println!("   Local files: {total_local}");
    println!("   Files to upload: {}", plan.to_upload.len());
    println!("   Files to download: {}", plan.to_download.len());
    if let Some(dir) = &target_dir {
        println!("   Download folder: {dir:?}");
    }
    println!();

    if plan.is_empty() {
        println!("✅ Folder is in sync!");
        return Ok(());
    }

    for name in &plan.to_upload {
        println!("   ⬆️  {name}");
    }
    for name in &plan.to_download {
        println!("   ⬇️  {name}");
    }
    println!();

    if cli.dry_run {
        return Ok(());
    }

    let total_files = (plan.to_upload.len() + plan.to_download.len()) as u64;
    let pb = ProgressBar::new(total_files);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let upload_total = plan.to_upload.len() as u64;
    let outcome = session
        .start(|progress| {
            let offset = match progress.phase {
                SyncPhase::Uploading => 0,
                SyncPhase::Downloading => upload_total,
            };
            pb.set_position(offset + progress.processed_files as u64);
            match progress.current_file {
                Some(file) => pb.set_message(format!("{:?} - {}", progress.phase, file)),
                None => pb.set_message(format!("{:?}", progress.phase)),
            }
        })
        .await?;

    let Some(outcome) = outcome else {
        pb.abandon_with_message("⚠️  Another sync is already running");
        return Ok(());
    };

    pb.finish_with_message("✅ Done");
    println!();
    if let Some(summary) = session.summary(&outcome) {
        println!("{summary}");
    }

    if !session.capability().has_filesystem_write() {
        for name in &plan.to_download {
            println!("   ⬇️  {name}");
        }
    }

    if !outcome.failures.is_empty() {
        println!();
        println!("   Errors: {}", outcome.failures.len());
        for failure in &outcome.failures {
            let kind_str = match failure.kind {
                FailureKind::Upload => "Upload Failed",
                FailureKind::Download => "Download Failed",
                FailureKind::Write => "Write Failed",
            };
            eprintln!("   ⚠️  [{}] {}: {}", kind_str, failure.name, failure.message);
        }
    }

    Ok(())
}
