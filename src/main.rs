//! covcache binary: CLI front end over the cached datasets
//!
//! Thin dispatch layer: each subcommand performs one cached read (or a
//! forced refresh) and prints the records as JSON. An empty snapshot exits
//! with status 2 instead of output.

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use covcache::app::AppContext;
use covcache::cache::{Page, Query};
use covcache::cli::{Cli, Command};
use covcache::config::Config;
use covcache::data::vaccine::within_radius;
use covcache::data::{CoronaCityRecord, WeatherRecord};
use covcache::store::Stamped;

/// Exit status when the current snapshot holds no matching records
const EXIT_NO_DATA: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let ctx = AppContext::new(config)?;

    let records = match cli.command {
        Command::Weather { cities } => {
            let query = if cities.is_empty() {
                Query::all()
            } else {
                Query::matching(move |w: &WeatherRecord| {
                    cities.iter().any(|c| c == &w.city || c == &w.city_kor)
                })
            };
            to_values(ctx.weather()?.get(query).await?)?
        }
        Command::News { page, page_count } => {
            let query = Query::all().paged(Page::new(page, page_count));
            to_values(ctx.news()?.get(query).await?)?
        }
        Command::CoronaState => to_values(ctx.corona_state()?.get(Query::all()).await?)?,
        Command::CoronaCity { regions } => {
            let query = if regions.is_empty() {
                Query::all()
            } else {
                Query::matching(move |r: &CoronaCityRecord| regions.contains(&r.region))
            };
            to_values(ctx.corona_city()?.get(query).await?)?
        }
        Command::Vaccine { lat, lon, within } => {
            let query = match (lat, lon) {
                (Some(lat), Some(lon)) => Query::matching(within_radius(lat, lon, within)),
                _ => Query::all(),
            };
            to_values(ctx.vaccine()?.get(query).await?)?
        }
        Command::Refresh { dataset } => {
            refresh(&ctx, &dataset).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    if records.is_empty() {
        eprintln!("no data for current snapshot");
        return Ok(ExitCode::from(EXIT_NO_DATA));
    }
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(ExitCode::SUCCESS)
}

/// Serializes stamped records for output, stamp included
fn to_values<T: Serialize>(records: Vec<Stamped<T>>) -> Result<Vec<serde_json::Value>> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(Into::into))
        .collect()
}

/// Force-refreshes one dataset by name, or every dataset for "all"
async fn refresh(ctx: &AppContext, dataset: &str) -> Result<()> {
    match dataset {
        "weather" => {
            ctx.weather()?.refresh().await?;
        }
        "news" => {
            ctx.news()?.refresh().await?;
        }
        "corona-state" => {
            ctx.corona_state()?.refresh().await?;
        }
        "corona-city" => {
            ctx.corona_city()?.refresh().await?;
        }
        "vaccine" => {
            ctx.vaccine()?.refresh().await?;
        }
        "all" => {
            ctx.weather()?.refresh().await?;
            ctx.news()?.refresh().await?;
            ctx.corona_state()?.refresh().await?;
            ctx.corona_city()?.refresh().await?;
            ctx.vaccine()?.refresh().await?;
        }
        other => bail!(
            "unknown dataset {:?}; expected weather, news, corona-state, corona-city, vaccine, or all",
            other
        ),
    }
    Ok(())
}
