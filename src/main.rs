use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use unsplash_cache::error::CacheError;
use unsplash_cache::{manifest, pipeline, resolver, urls};
use unsplash_cache::{cache, ApiConfig, DownloadConfig};

#[derive(Parser, Debug)]
#[command(name = "unsplash-cache")]
#[command(about = "Cache and locally mirror Unsplash images referenced by a content tree", long_about = None)]
#[command(version)]
struct Args {
    /// Unsplash API access key
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true, global = true)]
    access_key: Option<String>,

    /// Unsplash+ secret key (unlocks unwatermarked downloads)
    #[arg(long, env = "UNSPLASH_SECRET_KEY", hide_env_values = true, global = true)]
    secret_key: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a content tree and build the remote-metadata manifest
    Build {
        /// Content root to scan for photo references
        #[arg(default_value = "content")]
        content_dir: PathBuf,

        /// Where to write the remote manifest
        #[arg(long, default_value = "data/unsplash-images.json")]
        manifest: PathBuf,
    },

    /// Download every asset referenced by the remote manifest
    Download {
        /// Remote manifest to consume
        #[arg(long, default_value = "data/unsplash-images.json")]
        manifest: PathBuf,

        /// Directory downloaded images are written into
        #[arg(short, long, default_value = "public/images/unsplash")]
        output: PathBuf,

        /// Concurrent transfers per window
        #[arg(long, default_value_t = 3)]
        concurrency: usize,

        /// Transfer attempts per asset
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Per-attempt timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Target rendition width in pixels
        #[arg(long, default_value_t = 1080)]
        width: u32,

        /// Target rendition quality (1-100)
        #[arg(long, default_value_t = 80)]
        quality: u32,
    },

    /// Remove cached assets and the local manifest
    Purge {
        #[arg(default_value = "public/images/unsplash")]
        dir: PathBuf,
    },

    /// Report cache directory statistics
    Stats {
        #[arg(default_value = "public/images/unsplash")]
        dir: PathBuf,
    },

    /// Convert a photo page URL into its download URL
    Url { page_url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("unsplash_cache={}", log_level))
        .init();

    let api = ApiConfig {
        access_key: args.access_key,
        secret_key: args.secret_key,
        ..ApiConfig::default()
    };

    match args.command {
        Command::Build {
            content_dir,
            manifest: manifest_path,
        } => {
            let config = DownloadConfig::default();
            let remote = pipeline::build_remote_manifest(&content_dir, &api, &config).await?;
            manifest::save_remote(&manifest_path, &remote)?;
            println!(
                "Manifest: {} image(s), {} failed, success rate {}",
                remote.stats.succeeded, remote.stats.failed, remote.stats.success_rate
            );
            if remote.environment.fallback {
                println!("Warning: built without credentials (empty fallback manifest)");
            }
        }

        Command::Download {
            manifest: manifest_path,
            output,
            concurrency,
            retries,
            timeout,
            width,
            quality,
        } => {
            let config = DownloadConfig {
                concurrency,
                max_retries: retries,
                timeout: Duration::from_secs(timeout),
                output_dir: output,
                target_width: width,
                target_quality: quality,
                ..DownloadConfig::default()
            };

            let (summary, _local) = match pipeline::run_download(&manifest_path, &api, &config).await
            {
                Ok(r) => r,
                Err(CacheError::ManifestMissing { path }) => {
                    eprintln!(
                        "Error: no remote manifest at {} — run `unsplash-cache build` first",
                        path.display()
                    );
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            println!(
                "Downloaded: {}, skipped: {}, failed: {}",
                summary.successful.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }

        Command::Purge { dir } => {
            let before = cache::stats(&dir);
            if !before.has_manifest {
                info!("no local manifest in {}, cache already clean", dir.display());
            }
            let report = cache::purge(&dir);
            println!(
                "Removed {} file(s), freed {} byte(s)",
                report.removed_files, report.freed_bytes
            );
        }

        Command::Stats { dir } => {
            let s = cache::stats(&dir);
            println!(
                "{} cached file(s), {} byte(s), manifest present: {}",
                s.file_count, s.total_bytes, s.has_manifest
            );
        }

        Command::Url { page_url } => {
            let Some(id) = resolver::resolve(&page_url) else {
                eprintln!("Error: not a recognizable Unsplash photo URL: {}", page_url);
                std::process::exit(1);
            };
            if api.access_key.is_none() {
                eprintln!("Error: {}", CacheError::MissingCredential("UNSPLASH_ACCESS_KEY"));
                std::process::exit(1);
            }

            let client = reqwest::Client::new();
            let config = DownloadConfig::default();
            let Some(meta) = unsplash_cache::metadata::fetch(
                &client,
                &api,
                &id,
                config.target_width,
                config.target_quality,
            )
            .await
            else {
                eprintln!("Error: could not fetch metadata for {}", id);
                std::process::exit(1);
            };

            let (url, unwatermarked) =
                urls::asset_url(&api, &meta, config.target_width, config.target_quality);
            println!("{}", url);
            if !unwatermarked {
                info!("no premium credential or tracking parameter; URL may be watermarked");
            }
        }
    }

    Ok(())
}
