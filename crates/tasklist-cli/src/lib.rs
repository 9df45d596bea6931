pub mod cli;
pub mod commands;
pub mod render;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tasklist_core::config::{self, Config};
use tasklist_core::datastore::Persistence;
use tasklist_core::datetime;
use tasklist_core::kv::FileKvStore;
use tasklist_core::store::TaskStore;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting tasklist"
    );

    let mut cfg = Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );
    debug!(files = ?cfg.loaded_files, "configuration loaded");

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    let backend = FileKvStore::open(&data_dir)
        .with_context(|| format!("failed to open storage at {}", data_dir.display()))?;

    let locale = cfg.locale()?;
    let persistence = Persistence::new(backend, cfg.storage_key(), locale);
    let mut store = TaskStore::open(persistence, cfg.seed());
    let renderer = render::Renderer::new(&cfg, locale);

    let mut out = io::stdout().lock();
    commands::dispatch(
        &mut store,
        &cfg,
        &renderer,
        &mut out,
        cli.command.unwrap_or_default(),
        datetime::today(),
    )?;

    info!("done");
    Ok(())
}
