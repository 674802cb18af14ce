//! Crawls the URLs given on the command line and follows same-site links one
//! level deep.
//!
//! ```text
//! RUST_LOG=spider_engine=debug cargo run --example crawl -- https://example.com/
//! ```

use spider_engine::Url;
use spider_engine::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn links(body: &str) -> impl Iterator<Item = &str> {
    body.split("href=\"").skip(1).filter_map(|rest| rest.split('"').next())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let seeds: Vec<String> = std::env::args().skip(1).collect();
    if seeds.is_empty() {
        anyhow::bail!("usage: crawl <url>...");
    }

    let roots: HashSet<Url> = seeds.iter().filter_map(|s| s.parse().ok()).collect();
    let engine = Engine::builder()
        .max_requests(4)
        .log(true)
        .start_urls(seeds)
        .build()?;

    let spider = Arc::new(Spider::new("links"));
    let handle = engine.handle();
    let seen = Mutex::new(roots.clone());
    spider.on_response(move |response| {
        println!("{} {} bytes", response.url(), response.body().len());
        if !roots.contains(response.url()) {
            return;
        }
        for href in links(response.body()) {
            let Ok(next) = response.url().join(href) else {
                continue;
            };
            if next.host_str() != response.url().host_str() {
                continue;
            }
            if seen.lock().map(|mut s| s.insert(next.clone())).unwrap_or(false) {
                if let Err(e) = handle.enqueue(next) {
                    warn!("Could not follow link {}: {}", href, e);
                }
            }
        }
    });
    engine.route_any(spider);

    engine.crawl().await?;
    println!("{}", engine.stats());
    Ok(())
}
