//! feed-monitor - watches RSS/Atom feeds and posts an event for each new item.
//!
//! ## Architecture overview
//!
//! ```text
//!  timer ──► poll.rs ─┬─► source/     fetch + parse (RSS / Atom)
//!                     ├─► detect.rs   new items + next watermark (pure)
//!                     ├─► store/      read / persist watermark (SQLite)
//!                     └─► notify.rs   POST {host}/event per new item
//! ```
//!
//! * **`source/`** - the `FeedSource` trait, the `RawItem` type, and the HTTP
//!   implementation (RSS via `rss`, Atom via `feed-rs`).
//! * **`detect`** - decides which items are new given a feed's watermark.
//! * **`store/`** - feed registry and watermarks in SQLite.
//! * **`notify`** - best-effort JSON POST per new item.
//! * **`poll`** - runs fetch → detect → persist → notify for every feed on a
//!   timer.
//! * **`config`**, **`cli`**, **`logging`** - startup plumbing.
//! * **`main`** - wires everything together.

mod cli;
mod config;
mod detect;
mod logging;
mod notify;
mod poll;
mod source;
mod store;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cli::Cli;
use config::Config;
use notify::HttpNotifier;
use poll::Poller;
use source::HttpFeedSource;
use store::{SqliteStore, StoreError, WatermarkStore};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("failed to initialise logging")?;

    let store = Arc::new(
        SqliteStore::open(&cli.database)
            .with_context(|| format!("failed to open database {}", cli.database.display()))?,
    );

    // -- one-shot operator commands -------------------------------------------
    if let Some(url) = &cli.add {
        return add_feed(store.as_ref(), url);
    }
    if cli.list {
        return list_feeds(store.as_ref());
    }

    // -- startup: everything below is loaded once for the process lifetime ----
    let config = Config::load(&cli.config).context("failed to load configuration")?;

    let registrations = store
        .list_feeds()
        .context("failed to load registered feeds")?;
    if registrations.is_empty() {
        warn!("no feeds registered, add one with --add <URL>");
    }

    let source = HttpFeedSource::new(cli.timeout()).context("failed to build HTTP client")?;
    let notifier = HttpNotifier::new(cli.timeout()).context("failed to build HTTP client")?;
    let poller = Poller::new(Arc::new(source), store, Arc::new(notifier), config.host)
        .with_workers(usize::from(cli.workers));

    if cli.once {
        poller.run_cycle(&registrations);
        return Ok(());
    }

    info!(
        feeds = registrations.len(),
        interval_minutes = cli.interval,
        workers = cli.workers,
        "starting feed monitor"
    );
    poller.run(&registrations, cli.interval())
}

fn add_feed(store: &dyn WatermarkStore, url: &str) -> Result<()> {
    match store.register_feed(url) {
        Ok(id) => {
            info!(feed_id = %id, url, "added feed");
            Ok(())
        }
        Err(StoreError::DuplicateFeed(url)) => match store.find_feed(&url)? {
            Some(id) => bail!("{url} is already registered as feed {id}"),
            None => bail!("{url} is already registered"),
        },
        Err(err) => Err(err).with_context(|| format!("failed to add {url} as feed")),
    }
}

fn list_feeds(store: &dyn WatermarkStore) -> Result<()> {
    for feed in store.list_feeds()? {
        let last_seen = match store.get_watermark(feed.id) {
            Ok(Some(ts)) => ts.to_rfc3339(),
            Ok(None) => "never checked".to_string(),
            Err(err) => format!("unreadable ({err})"),
        };
        println!("{}\t{}\t{}", feed.id, last_seen, feed.url);
    }
    Ok(())
}
