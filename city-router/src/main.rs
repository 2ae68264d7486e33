use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use city_router::cache::CacheConfig;
use city_router::config::RouterConfig;
use city_router::directory::{
    BuildingDirectory, DirectoryConfig, HttpBuildingDirectory, StaticBuildingDirectory,
};
use city_router::domain::{GeoPoint, RouteMode, RouteResult};
use city_router::geometry::{FileGeometrySource, GeometrySource};
use city_router::{RouteRequest, RouteService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Geometry file used when `CITY_GEOMETRY` is not set.
const DEFAULT_GEOMETRY: &str = "city.json";

const USAGE: &str = "usage: city-router [<origin lat,lng> <destination lat,lng> [real|all|water]]
       with no arguments, reads one query per line from stdin";

/// One parsed query.
struct Query {
    request: RouteRequest,
    water_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        None
    } else {
        match parse_query(&args) {
            Ok(query) => Some(query),
            Err(message) => {
                eprintln!("{message}\n{USAGE}");
                return ExitCode::from(2);
            }
        }
    };

    let geometry_path =
        std::env::var("CITY_GEOMETRY").unwrap_or_else(|_| DEFAULT_GEOMETRY.to_string());
    let source = FileGeometrySource::new(geometry_path);

    // Prefer a live directory, then a buildings file, then nothing
    if let Ok(url) = std::env::var("BUILDING_DIRECTORY_URL") {
        let mut config = DirectoryConfig::new(url);
        if let Ok(key) = std::env::var("BUILDING_DIRECTORY_KEY") {
            config = config.with_api_key(key);
        }
        match HttpBuildingDirectory::new(config) {
            Ok(directory) => run(directory, source, query).await,
            Err(e) => {
                error!(error = %e, "failed to create building directory client");
                ExitCode::FAILURE
            }
        }
    } else if let Ok(path) = std::env::var("CITY_BUILDINGS") {
        match StaticBuildingDirectory::from_file(&path) {
            Ok(directory) => {
                info!(buildings = directory.len(), %path, "loaded buildings");
                run(directory, source, query).await
            }
            Err(e) => {
                error!(error = %e, "failed to load buildings");
                ExitCode::FAILURE
            }
        }
    } else {
        warn!("no building directory configured, transporters will not be resolved");
        run(StaticBuildingDirectory::default(), source, query).await
    }
}

async fn run<D>(directory: D, source: FileGeometrySource, query: Option<Query>) -> ExitCode
where
    D: BuildingDirectory + 'static,
{
    let geometry = match source.load() {
        Ok(geometry) => geometry,
        Err(e) => {
            error!(error = %e, "failed to load city geometry");
            return ExitCode::FAILURE;
        }
    };

    let service = match RouteService::from_geometry(
        &geometry,
        directory,
        RouterConfig::default(),
        &CacheConfig::default(),
    ) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "failed to build city graph");
            return ExitCode::FAILURE;
        }
    };

    if let Some(query) = query {
        return print_result(&answer(&service, &query).await);
    }

    if let Some(secs) = refresh_interval() {
        let service = service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                if let Err(e) = service.reload(&source).await {
                    warn!(error = %e, "geometry refresh failed");
                }
            }
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                return ExitCode::FAILURE;
            }
        };
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if args.is_empty() {
            continue;
        }
        match parse_query(&args) {
            Ok(query) => {
                print_result(&answer(&service, &query).await);
            }
            Err(message) => eprintln!("{message}"),
        }
    }
}

async fn answer<D: BuildingDirectory>(service: &RouteService<D>, query: &Query) -> RouteResult {
    if query.water_only {
        service.find_water_only_route(&query.request).await
    } else {
        service.find_route(&query.request).await
    }
}

fn print_result(result: &RouteResult) -> ExitCode {
    match serde_json::to_string_pretty(result) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "failed to serialize result");
            ExitCode::FAILURE
        }
    }
}

fn refresh_interval() -> Option<u64> {
    let raw = std::env::var("GEOMETRY_REFRESH_SECS").ok()?;
    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!(value = %raw, "ignoring invalid GEOMETRY_REFRESH_SECS");
            None
        }
    }
}

fn parse_query(args: &[String]) -> Result<Query, String> {
    let (origin, destination, mode) = match args {
        [origin, destination] => (origin, destination, None),
        [origin, destination, mode] => (origin, destination, Some(mode.as_str())),
        _ => return Err("expected an origin, a destination and an optional mode".to_string()),
    };

    let request = RouteRequest::new(parse_point(origin)?, parse_point(destination)?);
    Ok(match mode {
        Some("water") => Query {
            request,
            water_only: true,
        },
        Some(mode) => Query {
            request: request.with_mode(RouteMode::parse(mode)),
            water_only: false,
        },
        None => Query {
            request,
            water_only: false,
        },
    })
}

fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lat,lng but got {s:?}"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad longitude {lng:?}: {e}"))?;
    Ok(GeoPoint::new(lat, lng))
}
