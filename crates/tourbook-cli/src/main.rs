use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tourbook_catalog::TourCatalog;
use tourbook_core::{compute_total, format_rubles, CatalogSession, ParticipantCount, Tour};
use tourbook_web::{CatalogQuery, WebConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "tourbook")]
#[command(about = "Adventure tour catalog and booking page")]
struct Cli {
    /// Tour fixture to load instead of `fixtures/tours.yaml`.
    #[arg(long, global = true, env = "TOURBOOK_TOURS_PATH")]
    tours: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the catalog page.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        bind: Option<IpAddr>,
    },
    /// Print the tours matching the given filters.
    Tours(FilterArgs),
    /// Print the booking total for a tour.
    Quote {
        #[arg(long)]
        tour_id: u32,
        #[arg(long, default_value = "1")]
        participants: String,
    },
}

#[derive(Debug, Args, Default)]
struct FilterArgs {
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    activity: Option<String>,
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long)]
    season: Option<String>,
    #[arg(long)]
    price_min: Option<String>,
    #[arg(long)]
    price_max: Option<String>,
    #[arg(long)]
    duration_min: Option<String>,
    #[arg(long)]
    duration_max: Option<String>,
}

impl From<FilterArgs> for CatalogQuery {
    fn from(args: FilterArgs) -> Self {
        CatalogQuery {
            region: args.region,
            activity: args.activity,
            difficulty: args.difficulty,
            season: args.season,
            price_min: args.price_min,
            price_max: args.price_max,
            duration_min: args.duration_min,
            duration_max: args.duration_max,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

fn tour_line(tour: &Tour) -> String {
    let seasons = tour
        .season
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "#{} {} | {} | {} | {} | {} | {} | {}",
        tour.id,
        tour.title,
        tour.region,
        tour.activity,
        tour.difficulty,
        tour.duration_label(),
        tour.price_label(),
        seasons
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = WebConfig::from_env();
    if let Some(tours) = cli.tours {
        config.tours_path = tours;
    }

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        bind: None,
    }) {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            tourbook_web::serve(config).await?;
        }
        Commands::Tours(args) => {
            let catalog = TourCatalog::load_yaml(&config.tours_path)?;
            let mut session = CatalogSession::new(catalog.tours());
            CatalogQuery::from(args).apply(&mut session);
            let visible = session.visible();
            println!("Найдено туров: {}", visible.len());
            for tour in visible {
                println!("{}", tour_line(tour));
            }
        }
        Commands::Quote {
            tour_id,
            participants,
        } => {
            let catalog = TourCatalog::load_yaml(&config.tours_path)?;
            let tour = catalog
                .get(tour_id)
                .with_context(|| format!("no tour with id {tour_id}"))?;
            let count = ParticipantCount::from_input(&participants);
            println!(
                "{}: {} × {} = {}",
                tour.title,
                count.label(),
                format_rubles(u64::from(tour.price)),
                format_rubles(compute_total(tour.price, &participants))
            );
        }
    }

    Ok(())
}
