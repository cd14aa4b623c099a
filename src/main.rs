use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use parvu::engine::TableInfo;
use parvu::worker::{spawn_with_channel, WorkerEvent};
use parvu::{
    AppConfig, Args, CacheManager, ConfigManager, OpenOptions, QueryEngine, QueryHistory, Recents,
    APP_NAME,
};
use polars::prelude::DataFrame;
use std::sync::mpsc::Receiver;

fn print_page(df: &DataFrame, page: usize, info: &TableInfo) {
    println!("{}", df);
    println!(
        "page {} of {} ({} rows, {} columns)",
        page,
        info.total_pages,
        info.total_rows,
        info.columns.len()
    );
}

fn recv_event(events: &Receiver<WorkerEvent>) -> Result<WorkerEvent> {
    match events.recv() {
        Ok(WorkerEvent::Error(msg)) => Err(eyre!(msg)),
        Ok(event) => Ok(event),
        Err(_) => Err(eyre!("query worker exited unexpectedly")),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(APP_NAME)?;

    let path = args
        .path
        .clone()
        .ok_or_else(|| eyre!("no file given; see --help"))?;

    let opts = OpenOptions::from_args_and_config(args, &config);
    let engine = QueryEngine::open(&path, &opts)?;

    // Track the opened file in recents; failures here never block browsing
    if config.recents.enabled {
        match ConfigManager::new(APP_NAME) {
            Ok(config_manager) => {
                let mut recents = Recents::load(config_manager, config.recents.limit);
                if let Err(e) = recents.add(&path) {
                    log::warn!("could not update recents: {}", e);
                }
            }
            Err(e) => log::warn!("could not initialize config manager: {}", e),
        }
    }

    let query = args
        .query
        .clone()
        .unwrap_or_else(|| config.render_vars(&config.query.default_query));

    let (worker, events) = spawn_with_channel(engine, config.query.max_rows, !args.no_revise);

    let sort = args.sort.clone().map(|column| (column, !args.descending));
    worker.fetch(Some(query.clone()), sort, args.page);
    let page_event = recv_event(&events)?;

    // Record the successful query before any follow-up jobs
    if config.query.enable_history && args.query.is_some() {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => QueryHistory::load(cache, config.query.history_limit).add(&query),
            Err(e) => log::warn!("could not initialize cache manager: {}", e),
        }
    }

    if let WorkerEvent::Page { df, page, info } = &page_event {
        print_page(df, *page, info);
    }

    if let Some(output) = &args.output {
        worker.export(output.clone());
        if let WorkerEvent::Exported(path) = recv_event(&events)? {
            println!("exported to {}", path.display());
        }
    }

    worker.shutdown();
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_recents {
        match ConfigManager::new(APP_NAME) {
            Ok(config_manager) => {
                let mut recents = Recents::load(config_manager, usize::MAX);
                if let Err(e) = recents.clear() {
                    eprintln!("Error clearing recents: {}", e);
                    std::process::exit(1);
                }
                println!("Recents cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No recents to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    if args.init_config {
        match ConfigManager::new(APP_NAME) {
            Ok(config_manager) => match config_manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Wrote default config to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
