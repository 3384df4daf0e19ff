//! K-Smart CLI

use std::{io, path::PathBuf, process};

use clap::{Args, Parser, Subcommand};
use ksmart::{
    bv::allocate, checkout::prepare_settlement, fixtures::CartFixture, summary::OrderSummary,
};
use ksmart_app::{
    config::{BackendArgs, LoggingConfig},
    context::AppContext,
    domain::{shipping::records::DestinationQuery, vouchers::apply_voucher},
    observability::init_logging,
};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "ksmart", about = "K-Smart storefront CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Split a BV total between Plan A and Plan B
    Allocate {
        /// Total BV of the transaction
        bv: Decimal,
    },

    /// Render a cart fixture, with settlement figures when it is complete
    Summary(SummaryArgs),

    /// Show a member's cart
    Cart {
        /// Member email
        #[arg(long)]
        email: String,
    },

    /// List active BV periods
    Periods,

    /// Search shipping destinations
    Destinations {
        /// Sub-district, city or postcode
        keyword: String,
    },

    /// Check a voucher code
    Voucher {
        /// Voucher code
        code: String,
    },
}

#[derive(Debug, Args)]
struct SummaryArgs {
    /// Fixture name under `<fixtures-dir>/carts`
    name: String,

    /// Fixture base directory
    #[arg(long, default_value = "./fixtures")]
    fixtures_dir: PathBuf,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = init_logging(&cli.logging) {
        eprintln!("{error}");
        process::exit(1);
    }

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Allocate { bv } => allocate_bv(bv),
        Commands::Summary(args) => summarise_fixture(&args),
        command => run_online(&cli.backend, command).await,
    }
}

async fn run_online(backend: &BackendArgs, command: Commands) -> Result<(), String> {
    let context = AppContext::from_backend_config(backend.backend_config(), backend.shipper())
        .map_err(|error| error.to_string())?;

    match command {
        Commands::Cart { email } => {
            let cart = context
                .cart_store(email)
                .refresh()
                .await
                .map_err(|error| error.to_string())?;

            debug!(badge = cart.badge_count(), "cart loaded");

            OrderSummary::for_items(cart.items())
                .and_then(|summary| summary.write_to(io::stdout()))
                .map_err(|error| error.to_string())
        }
        Commands::Periods => {
            let periods = context
                .bv_periods
                .active_periods()
                .await
                .map_err(|error| error.user_message())?;

            for period in periods {
                let range = match (period.start_date, period.end_date) {
                    (Some(start), Some(end)) => format!("{start} .. {end}"),
                    _ => String::new(),
                };

                println!("{:>6}  {}  {range}", period.id, period.name);
            }

            Ok(())
        }
        Commands::Destinations { keyword } => {
            let destinations = context
                .shipping
                .search_destinations(DestinationQuery { keyword })
                .await
                .map_err(|error| error.user_message())?;

            for destination in destinations {
                println!("{:>8}  {}", destination.id, destination.label);
            }

            Ok(())
        }
        Commands::Voucher { code } => {
            let voucher = apply_voucher(context.vouchers.as_ref(), &code)
                .await
                .map_err(|error| error.user_message())?;

            println!(
                "{}: {}% off",
                voucher.code,
                (voucher.discount * Decimal::ONE_HUNDRED).normalize()
            );

            Ok(())
        }
        Commands::Allocate { .. } | Commands::Summary(_) => Ok(()),
    }
}

fn allocate_bv(bv: Decimal) -> Result<(), String> {
    let split = allocate(bv).map_err(|error| error.to_string())?;

    println!("total_bv:  {}", split.total_bv.normalize());
    println!("bv_plan_a: {}", split.bv_plan_a.normalize());
    println!("bv_plan_b: {}", split.bv_plan_b.normalize());
    println!("rule:      {}", split.rule);

    Ok(())
}

fn summarise_fixture(args: &SummaryArgs) -> Result<(), String> {
    let fixture =
        CartFixture::load(&args.fixtures_dir, &args.name).map_err(|error| error.to_string())?;
    let cart = fixture.cart().map_err(|error| error.to_string())?;

    let Some(profile) = &fixture.profile else {
        return OrderSummary::for_items(cart.items())
            .and_then(|summary| summary.write_to(io::stdout()))
            .map_err(|error| error.to_string());
    };

    let draft = fixture.draft().map_err(|error| error.to_string())?;
    let settlement = prepare_settlement(&draft, &cart, profile, &fixture.bv_periods)
        .map_err(|error| error.to_string())?;

    OrderSummary::for_settlement(cart.items(), &settlement)
        .write_to(io::stdout())
        .map_err(|error| error.to_string())?;

    println!(
        "\n{}",
        serde_json::to_string_pretty(&settlement.request).map_err(|error| error.to_string())?
    );

    Ok(())
}
