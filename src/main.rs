use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use env_logger::Env;

use osu_mirror::{
    agent::{PageAgent, Reconcile, StaticPage, ToastSlot},
    api::MirrorClient,
    application::{DiskSaver, FetchRelay, RelayHub, TabId},
    config::{AgentConfig, RelayConfig},
    domain::{AppError, DownloadPhase},
    packaging::{self, PackageConfig},
};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "osu-mirror", version, about = "Mirror downloads for osu! beatmapsets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download one beatmapset through the relay
    Fetch(FetchArgs),
    /// Build the Chrome and Firefox release archives
    Package(PackageArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Beatmapset id
    id: String,

    /// Directory the archive is saved into
    #[arg(long, env = "OSU_MIRROR_OUT", default_value = ".")]
    out: PathBuf,

    #[arg(long, env = "OSU_MIRROR_BASE", default_value = "https://osu.direct")]
    mirror: String,

    /// Artist shown on the beatmapset page, for the fallback filename
    #[arg(long)]
    artist: Option<String>,

    /// Title shown on the beatmapset page, for the fallback filename
    #[arg(long)]
    title: Option<String>,
}

#[derive(Args)]
struct PackageArgs {
    #[arg(long, default_value = "dist")]
    dist: PathBuf,

    #[arg(long, default_value = "public")]
    public: PathBuf,

    #[arg(long, default_value = "build")]
    build: PathBuf,

    #[arg(long, default_value = "release")]
    release: PathBuf,

    /// Version written into both manifests
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    version: String,
}

async fn fetch(args: FetchArgs) -> Result<(), AppError> {
    let saver = Arc::new(DiskSaver::new(&args.out));
    let client = MirrorClient::new(RelayConfig {
        mirror_base: args.mirror,
        ..Default::default()
    });
    let (relay, _hub) = RelayHub::new(FetchRelay::new(client, saver.clone())).spawn();

    let config = AgentConfig::default();
    let mut page = StaticPage::new(&format!("https://osu.ppy.sh/beatmapsets/{}", args.id))
        .with_container(&config.container_selector);
    if let Some(artist) = &args.artist {
        page = page.with_text(&config.artist_selector, artist);
    }
    if let Some(title) = &args.title {
        page = page.with_text(&config.title_selector, title);
    }

    let toast = ToastSlot::with_observer(|toast| match toast {
        Some(toast) => log::info!("[{:>4}] {}", toast.percent_text(), toast.title),
        None => log::debug!("Toast closed"),
    });
    let agent = PageAgent::new(config, relay, TabId(1), toast);

    if agent.injector().reconcile(&mut page) != Reconcile::Injected {
        return Err(AppError::InvalidInput(args.id));
    }
    let button = page
        .buttons()
        .next()
        .cloned()
        .ok_or_else(|| AppError::InvalidInput(args.id.clone()))?;

    let outcome = agent.trigger(&page, &button.beatmapset_id)?.run().await;
    if outcome.phase != DownloadPhase::Completed {
        return Err(AppError::DownloadFailed);
    }

    saver.wait_idle().await.map_err(|e| {
        log::error!("{}", e);
        AppError::DownloadFailed
    })?;
    log::info!(
        "Saved {} into {}",
        outcome.filename.unwrap_or_default(),
        saver.dir().display()
    );
    Ok(())
}

fn package(args: PackageArgs) -> Result<(), AppError> {
    let config = PackageConfig {
        dist_dir: args.dist,
        public_dir: args.public,
        build_dir: args.build,
        release_dir: args.release,
        version: args.version,
    };
    packaging::package_all(&config)
        .map(|_| ())
        .map_err(|e| AppError::Package(e.to_string()))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_LEVEL)).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Fetch(args) => fetch(args).await,
        Command::Package(args) => package(args),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
