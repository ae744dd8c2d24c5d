use clap::{Parser, Subcommand, ValueEnum};
use lanka_route::config::Config;
use lanka_route::location::{city_list, LocationResolver, ReferenceLoader, ReferenceStore};
use lanka_route::plot::{to_geojson, PlotPlan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Lanka Route — plot Sri Lankan towns from a place-name fragment.
///
/// Tokens are separated by '&'. Prefix the origin with "start;" and the
/// destination with "end;". A token may be written "district-city".
///
/// Examples:
///   lanka-route plot "start;Colombo&Kandy&end;Galle"
///   lanka-route plot "matara-weligama&end;Hambantota" --format geojson
///   lanka-route resolve Peradeniya colombo-05
///   lanka-route serve --port 8080
#[derive(Parser)]
#[command(name = "lanka-route", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Offline mode: only use cached dumps and built-in data.
    #[arg(long, global = true, env = "LANKA_ROUTE_OFFLINE")]
    offline: bool,

    /// Do not read or write the dump cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache file location.
    #[arg(long, global = true, env = "LANKA_ROUTE_CACHE")]
    cache: Option<PathBuf>,

    /// Days before a cached dump is fetched again.
    #[arg(long, global = true, env = "LANKA_ROUTE_CACHE_TTL_DAYS")]
    cache_ttl_days: Option<i64>,

    /// Source of the `cities` SQL dump.
    #[arg(long, global = true, env = "LANKA_ROUTE_CITIES_URL")]
    cities_url: Option<String>,

    /// Source of the `districts` SQL dump.
    #[arg(long, global = true, env = "LANKA_ROUTE_DISTRICTS_URL")]
    districts_url: Option<String>,

    /// HTTP timeout in seconds for each dump.
    #[arg(long, global = true, env = "LANKA_ROUTE_TIMEOUT")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a fragment into markers and a route line.
    Plot {
        /// e.g. "start;Colombo&Kandy&end;Galle"
        fragment: String,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Resolve individual place names.
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List every known city key.
    Cities,
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value = "127.0.0.1", env = "LANKA_ROUTE_HOST")]
        host: String,

        #[arg(long, short = 'p', default_value_t = 3030, env = "LANKA_ROUTE_PORT")]
        port: u16,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Geojson,
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            cities_url: self.cities_url.clone().unwrap_or(defaults.cities_url),
            districts_url: self.districts_url.clone().unwrap_or(defaults.districts_url),
            cache_path: if self.no_cache {
                None
            } else {
                self.cache.clone().or(defaults.cache_path)
            },
            cache_ttl_days: self.cache_ttl_days.unwrap_or(defaults.cache_ttl_days),
            offline: self.offline,
            timeout_secs: self.timeout.unwrap_or(defaults.timeout_secs),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The store is sealed before anything is resolved.
    let store = ReferenceLoader::new(cli.config()).load();

    match cli.command {
        Command::Plot { fragment, format } => plot(&store, &fragment, format),
        Command::Resolve { names } => resolve(&store, &names),
        Command::Cities => print_json(&city_list(&store)),
        Command::Serve { host, port } => serve(store, &host, port),
    }
}

fn plot(store: &ReferenceStore, fragment: &str, format: Format) {
    let plan = PlotPlan::from_fragment(&LocationResolver::new(store), fragment);

    for marker in &plan.markers {
        eprintln!(
            "  {:<8} {:<20} -> {} ({}) [{}]",
            marker.role, marker.place, marker.city, marker.coordinate, marker.matched_by
        );
    }
    for token in &plan.unresolved {
        eprintln!("  skipped  {:<20} -> no match", token);
    }

    match format {
        Format::Json => print_json(&plan),
        Format::Geojson => print_json(&to_geojson(&plan)),
    }
}

fn resolve(store: &ReferenceStore, names: &[String]) {
    let resolver = LocationResolver::new(store);
    let results: Vec<_> = names
        .iter()
        .map(|name| {
            let hit = resolver.resolve(name);
            if hit.is_none() {
                eprintln!("  No match for '{}'", name);
            }
            serde_json::json!({ "query": name, "result": hit })
        })
        .collect();
    print_json(&results);
}

fn serve(store: ReferenceStore, host: &str, port: u16) {
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error: Cannot start runtime: {}", e);
        std::process::exit(1);
    });
    if let Err(e) = runtime.block_on(lanka_route::server::start(store, host, port)) {
        eprintln!("Error: Server on {}:{} failed: {}", host, port, e);
        std::process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot encode output: {}", e);
            std::process::exit(1);
        }
    }
}
