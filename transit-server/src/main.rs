use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use transit_server::cache::CacheConfig;
use transit_server::domain::{ServiceTime, Stop, StopTimeRecord};
use transit_server::feed::{self, Feed, FeedError};
use transit_server::graph::{BuildConfig, BuildError, GraphBuilder, TransitGraph, snapshot};
use transit_server::router::{RouteError, RouteOutcome, RouteRequest, Router, RouterConfig};
use transit_server::web::{AppState, create_router};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a graph snapshot from GTFS stops and stop times.
    Build(BuildArgs),
    /// Find the earliest-arrival route between two stops.
    Route(RouteArgs),
    /// Serve the JSON API over a graph snapshot.
    Serve(ServeArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// GTFS directory containing stops.txt and stop_times.txt.
    #[arg(long, env = "TRANSIT_FEED_DIR", conflicts_with_all = ["stops", "stop_times"])]
    feed_dir: Option<PathBuf>,

    /// Path to stops.txt.
    #[arg(long, required_unless_present = "feed_dir", requires = "stop_times")]
    stops: Option<PathBuf>,

    /// Path to stop_times.txt.
    #[arg(long, required_unless_present = "feed_dir", requires = "stops")]
    stop_times: Option<PathBuf>,

    /// Where to write the graph snapshot.
    #[arg(short, long, env = "TRANSIT_GRAPH")]
    output: PathBuf,

    /// Maximum walking distance between stops (metres).
    #[arg(long, default_value_t = 200.0)]
    walk_radius: f64,

    /// Walking speed (metres per second).
    #[arg(long, default_value_t = 1.5)]
    walking_speed: f64,
}

#[derive(Args)]
struct RouteArgs {
    /// Graph snapshot to route over.
    #[arg(short, long, env = "TRANSIT_GRAPH")]
    graph: PathBuf,

    /// Origin stop id.
    #[arg(long)]
    origin: String,

    /// Destination stop id.
    #[arg(long)]
    destination: String,

    /// Departure time in HH:MM:SS format.
    #[arg(long)]
    start_time: String,

    /// Minimum transfer penalty in seconds.
    #[arg(long, default_value_t = 180)]
    transfer_time: u32,
}

#[derive(Args)]
struct ServeArgs {
    /// Graph snapshot to serve.
    #[arg(short, long, env = "TRANSIT_GRAPH")]
    graph: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "TRANSIT_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Default minimum transfer penalty in seconds.
    #[arg(long, env = "TRANSIT_TRANSFER_TIME", default_value_t = 180)]
    transfer_time: u32,

    /// Per-query label budget; unbounded if unset.
    #[arg(long, env = "TRANSIT_MAX_LABELS")]
    max_labels: Option<usize>,

    /// How long cached route results live (seconds).
    #[arg(long, env = "TRANSIT_CACHE_TTL", default_value_t = 600)]
    cache_ttl: u64,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Snapshot(#[from] snapshot::SnapshotError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("--start-time must be HH:MM:SS")]
    StartTime,

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    report(run(Cli::parse()), &mut std::io::stderr())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Build(args) => build(args),
        Command::Route(args) => route(args),
        Command::Serve(args) => serve(args),
    }
}

/// Print a failed command's error to `err` and pick the exit code.
fn report(result: Result<(), CliError>, err: &mut impl Write) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build(args: BuildArgs) -> Result<(), CliError> {
    let config = BuildConfig::new(args.walk_radius, args.walking_speed);
    let mut builder = GraphBuilder::new(config)?;

    let (stops, stop_times): (Vec<Stop>, Vec<StopTimeRecord>) =
        match (&args.feed_dir, &args.stops, &args.stop_times) {
            (Some(dir), _, _) => {
                let feed = Feed::load(dir)?;
                (feed.stops, feed.stop_times)
            }
            (None, Some(stops), Some(stop_times)) => {
                (feed::load_stops(stops)?, feed::load_stop_times(stop_times)?)
            }
            // clap enforces that one of the two forms is present.
            _ => (Vec::new(), Vec::new()),
        };

    builder.add_stops(stops);
    builder.add_stop_times(stop_times);
    let (graph, report) = builder.build();
    info!(?report, "Build report");

    snapshot::save(&graph, &args.output)?;
    println!(
        "Wrote {} ({} stops, {} edges, {} trips)",
        args.output.display(),
        graph.node_count(),
        graph.edge_count(),
        graph.trip_count()
    );
    Ok(())
}

fn route(args: RouteArgs) -> Result<(), CliError> {
    let departure = ServiceTime::parse(&args.start_time).map_err(|_| CliError::StartTime)?;
    let graph = snapshot::load(&args.graph)?;

    println!(
        "Routing from '{}' ({}) to '{}' ({}), departing at {} with transfer penalty={}s\n",
        name_of(&graph, &args.origin),
        args.origin,
        name_of(&graph, &args.destination),
        args.destination,
        departure,
        args.transfer_time
    );

    let config = RouterConfig::new(args.transfer_time, None);
    let request = RouteRequest::new(args.origin, args.destination, departure);
    match Router::new(&graph, &config).route(&request)? {
        RouteOutcome::Found(itinerary) => {
            println!("{}", itinerary.render(|id| graph.display_name(id)));
        }
        RouteOutcome::Unreachable => println!("No feasible path found."),
    }
    Ok(())
}

#[tokio::main]
async fn serve(args: ServeArgs) -> Result<(), CliError> {
    let graph = snapshot::load(&args.graph)?;
    let config = RouterConfig::new(args.transfer_time, args.max_labels);
    let cache_config = CacheConfig {
        ttl: Duration::from_secs(args.cache_ttl),
        ..CacheConfig::default()
    };

    let state = AppState::new(graph, config, &cache_config);
    let app = create_router(state);

    info!(addr = %args.addr, "Transit router listening");
    println!("API Endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /api/route              - Earliest-arrival route");
    println!("  GET  /api/stops              - All stops");
    println!("  GET  /api/stops/:id/edges    - Outgoing edges of a stop");
    println!("  GET  /api/graph/edges        - All edges");
    println!("  GET  /api/graph/stats        - Graph and cache counts");

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn name_of<'a>(graph: &'a TransitGraph, id: &'a str) -> &'a str {
    graph
        .node_index(id)
        .map(|n| graph.stop(n).display_name())
        .unwrap_or(id)
}
