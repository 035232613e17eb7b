use futures::stream::{self, StreamExt};
use std::io::Read;
use std::sync::Arc;
use tcin_resolver::{ExportRow, Resolver, ResolveResult, ResolverConfig};

/// Resolutions run sequentially by default; the source rate-limits
/// aggressively enough that more concurrency rarely pays off.
const DEFAULT_CONCURRENCY: usize = 1;

#[tokio::main]
async fn main() -> ResolveResult<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module("html5ever", log::LevelFilter::Error)
        .filter_module("selectors", log::LevelFilter::Warn)
        .init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let concurrency = args
        .next()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_CONCURRENCY);

    let tcins: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let resolver = Arc::new(Resolver::new(ResolverConfig::default())?);

    println!("{}", ExportRow::HEADER.join(","));

    let mut records = stream::iter(tcins)
        .map(|tcin| {
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(&tcin).await }
        })
        .buffered(concurrency.max(1));

    while let Some(record) = records.next().await {
        let row = ExportRow::from(&record);
        println!("{}", row.values().map(csv_field).join(","));
    }

    let stats = resolver.stats();
    stats.finish();
    stats.print_summary();

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
