use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yoviajo_client::{ApiClient, ClientError, Config, FileSessionStore, SessionManager};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "yoviajo", about = "Find, offer and manage shared rides on YoViajo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in with DNI and password.
    Login {
        dni: String,
        #[arg(long, env = "YOVIAJO_PASSWORD", hide_env_values = true)]
        password: String,
        /// `C` (driver) or `P` (passenger), when the DNI has both accounts.
        #[arg(long)]
        role: Option<String>,
    },
    /// Create an account.
    Register {
        name: String,
        email: String,
        dni: String,
        #[arg(long, env = "YOVIAJO_PASSWORD", hide_env_values = true)]
        password: String,
        /// `C` for driver, `P` for passenger.
        #[arg(long, default_value = "P")]
        role: String,
        #[arg(long, default_value = "X")]
        gender: String,
        #[arg(long)]
        car_model: Option<String>,
        #[arg(long)]
        car_plate: Option<String>,
    },
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Browse rides, requests and matches.
    Market {
        #[arg(long, default_value = "")]
        origin: String,
        #[arg(long, default_value = "")]
        destination: String,
        /// Date prefix, e.g. 2025-05 or 2025-05-01.
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Your rides, bookings and requests.
    Trips,
    /// Reserve seats on a ride and get the payment link.
    Reserve {
        ride_id: i64,
        #[arg(long, default_value_t = 1)]
        seats: i32,
    },
    /// Cancel one of your bookings.
    CancelBooking {
        booking_id: i64,
        /// Confirm after reading the penalty notice.
        #[arg(long)]
        yes: bool,
    },
    /// Report that the driver of a past booking never showed up.
    Report {
        booking_id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Rate a finished trip from 1 to 5.
    Review {
        booking_id: i64,
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Publish a ride as a driver.
    PublishRide {
        origin: String,
        destination: String,
        /// Local departure, e.g. 2025-05-01T08:30.
        departure: String,
        price: f64,
        #[arg(long, default_value_t = 3)]
        seats: i32,
    },
    /// Cancel one of your published rides.
    CancelRide {
        ride_id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Passengers booked on one of your rides.
    Manifest { ride_id: i64 },
    /// Ask for a ride as a passenger.
    RequestRide {
        origin: String,
        destination: String,
        date: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        price: Option<i64>,
    },
    DeleteRequest { request_id: i64 },
    /// Invite the other side of a match.
    Invite {
        ride_id: i64,
        request_id: i64,
        user_id: i64,
    },
    /// Time left until a departure.
    Countdown {
        departure: String,
        /// Keep updating until it expires.
        #[arg(long)]
        watch: bool,
    },
    /// Look up place names.
    Places { query: String },
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Subcommand)]
pub enum AdminCommand {
    Stats {
        #[arg(long)]
        watch: bool,
    },
    Users {
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Only users waiting for identity review.
        #[arg(long)]
        pending: bool,
    },
    Rides {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    Bookings {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    Logs {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    Verify {
        user_id: i64,
        #[arg(long)]
        reject: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yoviajo_cli=info,yoviajo_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<ClientError>() {
            Some(client_err) => eprintln!("{}", client_err.user_message()),
            None => eprintln!("Error: {:#}", err),
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().map_err(ClientError::from)?;
    tracing::debug!("Using backend {}", config.api_url());

    let store = FileSessionStore::new(config.session_path());
    let session = Arc::new(SessionManager::restore(Box::new(store)).await);
    let api = ApiClient::from_config(&config, session)?;

    commands::execute(cli.command, api, &config).await
}
