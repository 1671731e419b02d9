//! jotter CLI: flat-file blog posts into a CDN-friendly post store
//!
//! Commands: new, migrate, list, show, tags, now, watch, completions

mod output;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::Level;

use jotter_core::cache::SurrogateKey;
use jotter_core::clock::SystemClock;
use jotter_core::config::{BlogConfig, ErrorPolicy};
use jotter_core::error::BlogError;
use jotter_migrate::{Migrator, TracingSink, WriterSink};
use jotter_store::PostStore;
use jotter_vault::{NowPage, Vault, VaultEvent, VaultWatcher};

use crate::output::{format_post, format_posts, format_tag_counts, OutputFormat};

/// How long `watch` waits for an editor's burst of events to finish.
const WATCH_SETTLE: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "jotter")]
#[command(version)]
#[command(about = "Flat-file blog posts with CDN surrogate keys")]
struct Cli {
    /// Config file (defaults to ./jotter.toml when present)
    #[arg(long, global = true, env = "JOTTER_CONFIG")]
    config: Option<PathBuf>,

    /// Post database, overriding the config file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Posts folder, overriding the config file
    #[arg(long, global = true)]
    posts_dir: Option<PathBuf>,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a new post file dated today
    New {
        /// Post title
        title: Option<String>,
    },
    /// Parse post files and upsert them into the post store
    Migrate {
        /// Files to migrate, in order (defaults to every post in the posts folder)
        paths: Vec<PathBuf>,
        /// What to do when a file fails: fail-fast or continue
        #[arg(long)]
        on_error: Option<ErrorPolicy>,
        /// Log progress instead of printing it (shown with -v)
        #[arg(short, long)]
        quiet: bool,
    },
    /// List posts, newest first
    #[command(alias = "ls")]
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show one post by slug
    Show {
        slug: String,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List tags, or the posts carrying one tag
    Tags {
        tag: Option<String>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the "now" page
    Now,
    /// Re-migrate post files as they change
    Watch,
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = BlogConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(posts_dir) = cli.posts_dir {
        config.posts_dir = posts_dir;
    }

    let mut stdout = io::stdout().lock();

    match cli.command {
        Some(Commands::New { title }) => {
            let path = Vault::new(&config.posts_dir).create_post(title.as_deref(), &SystemClock)?;
            writeln!(stdout, "{} created.", path.display())?;
        }
        Some(Commands::Migrate {
            paths,
            on_error,
            quiet,
        }) => {
            let policy = on_error.unwrap_or(config.migrate.on_error);
            let paths = if paths.is_empty() {
                Vault::new(&config.posts_dir).post_files()?
            } else {
                paths
            };

            let store = open_store(&config.database)?;
            let migrator = Migrator::new(&store, policy);
            let report = if quiet {
                migrator.run(&paths, &mut TracingSink)?
            } else {
                migrator.run(&paths, &mut WriterSink::new(&mut stdout))?
            };
            if !report.is_clean() {
                bail!(
                    "{} of {} post files failed to migrate",
                    report.failed.len(),
                    report.total()
                );
            }
        }
        Some(Commands::List { format }) => {
            let store = open_store(&config.database)?;
            let posts = store.newest_first()?;
            let headers = config.cdn.list_headers(&posts);
            write!(stdout, "{}", format_posts(&posts, &headers, format))?;
        }
        Some(Commands::Show { slug, format }) => {
            let store = open_store(&config.database)?;
            let post = store
                .find_by_slug(&slug)?
                .ok_or_else(|| BlogError::NotFound(format!("post '{slug}'")))?;
            let headers = config.cdn.post_headers(&post);
            write!(stdout, "{}", format_post(&post, &headers, format))?;
        }
        Some(Commands::Tags { tag, format }) => {
            let store = open_store(&config.database)?;
            match tag {
                Some(tag) => {
                    let posts = store.tagged(&tag)?;
                    let headers = config.cdn.list_headers(&posts);
                    write!(stdout, "{}", format_posts(&posts, &headers, format))?;
                }
                None => {
                    write!(stdout, "{}", format_tag_counts(&store.tag_counts()?, format))?;
                }
            }
        }
        Some(Commands::Now) => {
            let page = NowPage::load(&config.now_page)
                .with_context(|| format!("reading {}", config.now_page.display()))?;
            let headers = [
                config.cdn.cache_control(),
                config.cdn.surrogate_control(),
                SurrogateKey::from_keys(vec![page.cache_key()]).header(),
            ];
            for (name, value) in headers {
                writeln!(stdout, "{name}: {value}")?;
            }
            write!(stdout, "\n{}", page.body)?;
        }
        Some(Commands::Watch) => {
            let store = open_store(&config.database)?;
            let watcher = VaultWatcher::start(&config.posts_dir)
                .with_context(|| format!("watching {}", config.posts_dir.display()))?;
            let migrator = Migrator::new(&store, ErrorPolicy::Continue);
            let mut sink = WriterSink::new(&mut stdout);

            tracing::info!(posts_dir = %config.posts_dir.display(), "watching for changes");
            loop {
                let batch = watcher.next_batch(WATCH_SETTLE);
                if batch.is_empty() {
                    break;
                }
                for event in batch {
                    match event {
                        VaultEvent::Changed(path) => {
                            migrator.run(&[path], &mut sink)?;
                        }
                        VaultEvent::Removed(path) => {
                            tracing::warn!(
                                path = %path.display(),
                                "post file removed, stored post kept"
                            );
                        }
                    }
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "jotter", &mut stdout);
        }
        None => {
            writeln!(
                stdout,
                "jotter v{}: flat-file blog posts with CDN surrogate keys",
                env!("CARGO_PKG_VERSION")
            )?;
            writeln!(stdout, "Run `jotter --help` for usage.")?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open_store(database: &Path) -> Result<PostStore> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(PostStore::open(database)?)
}
