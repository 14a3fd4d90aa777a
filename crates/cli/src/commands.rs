//! Command implementations. Each returns the JSON document to print.

use anyhow::{Result, bail};
use clap::Args;
use favicache_client::{HttpIconLoader, LoadConfig, ProbeOptions, resolve_link};
use favicache_core::{AppConfig, CandidateGenerator, FaviconCache, KeyValueStore, Link, domain::domain_of, open_resolver};
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Drop entries whose TTL has elapsed
    #[arg(long)]
    pub expired: bool,

    /// Drop the entry for this URL's domain
    #[arg(long)]
    pub url: Option<String>,

    /// Keep only the newest N entries
    #[arg(long)]
    pub max_entries: Option<usize>,

    /// Drop every entry
    #[arg(long)]
    pub all: bool,
}

pub fn candidates(config: &AppConfig, url: &str) -> Value {
    let generator = CandidateGenerator::new(config.provider_mode());
    json!({
        "domain": domain_of(Some(url)),
        "mode": generator.mode(),
        "candidates": generator.candidate_list(Some(url)),
    })
}

pub async fn resolve(config: &AppConfig, url: &str, force_refresh: bool) -> Result<Value> {
    let resolver = Mutex::new(open_resolver(config)?);
    let loader = HttpIconLoader::new(LoadConfig::from(config))?;
    let link = Link::new("cli", url);

    let outcome = resolve_link(&resolver, &loader, &link, ProbeOptions { force_refresh }).await;
    Ok(serde_json::to_value(outcome)?)
}

pub fn show(config: &AppConfig, url: Option<&str>) -> Result<Value> {
    let mut resolver = open_resolver(config)?;
    Ok(show_entries(resolver.cache(), url))
}

pub fn purge(config: &AppConfig, args: &PurgeArgs) -> Result<Value> {
    let mut resolver = open_resolver(config)?;
    let deleted = purge_entries(resolver.cache(), args)?;
    Ok(json!({ "deleted": deleted }))
}

fn show_entries<S: KeyValueStore>(cache: &mut FaviconCache<S>, url: Option<&str>) -> Value {
    match url {
        Some(url) => match cache.entry(Some(url)) {
            Some(entry) => {
                let live = cache.is_live(&entry);
                json!({ "domain": domain_of(Some(url)), "entry": entry, "live": live })
            }
            None => json!({ "domain": domain_of(Some(url)), "entry": null }),
        },
        None => {
            let entries: Vec<Value> = cache
                .entries()
                .into_iter()
                .map(|(domain, entry)| {
                    let live = cache.is_live(&entry);
                    json!({ "domain": domain, "entry": entry, "live": live })
                })
                .collect();
            json!({ "key": cache.key(), "count": entries.len(), "entries": entries })
        }
    }
}

fn purge_entries<S: KeyValueStore>(cache: &mut FaviconCache<S>, args: &PurgeArgs) -> Result<usize> {
    if !args.expired && !args.all && args.url.is_none() && args.max_entries.is_none() {
        bail!("specify at least one of --expired, --url, --max-entries, or --all");
    }

    if args.all {
        return Ok(cache.clear());
    }

    let mut deleted = 0;
    if args.expired {
        deleted += cache.purge_expired();
    }
    if let Some(url) = args.url.as_deref()
        && cache.forget(Some(url))
    {
        deleted += 1;
    }
    if let Some(max) = args.max_entries {
        deleted += cache.purge_to(max);
    }
    tracing::info!(deleted, "purged favicon cache");
    Ok(deleted)
}
