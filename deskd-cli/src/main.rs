mod config;
mod handlers;
mod server;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use deskd_core::types::{BookingId, DeskId, UserId};

use crate::config::{open_client, StorageBackend};

#[derive(Parser)]
#[command(name = "deskd", about = "deskd: book a desk for the day", version)]
struct Cli {
    /// Storage backend: "memory", "sqlite:<path>" or "file:<path>"
    #[arg(long, global = true, default_value = "sqlite:deskd.db", env = "DESKD_STORAGE")]
    storage: StorageBackend,

    /// File listing one desk name per line
    #[arg(long, global = true, default_value = "desks", env = "DESKD_DESKS")]
    desks: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the deskd HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3100")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },

    /// List every desk in natural order
    Desks,

    /// List desks free on a day (YYYY-MM-DD)
    Available { day: NaiveDate },

    /// List all bookings on a day (YYYY-MM-DD)
    Bookings { day: NaiveDate },

    /// List a user's bookings from today onwards
    Mine {
        #[arg(long)]
        user: String,
    },

    /// Book a desk for a whole day
    Book {
        #[arg(long)]
        user: String,
        desk: String,
        day: NaiveDate,
    },

    /// Cancel one of your bookings
    Cancel {
        #[arg(long)]
        user: String,
        id: i64,
    },

    /// Print version information
    Version,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("deskd {}", env!("CARGO_PKG_VERSION"));
        println!("Desk booking with natural desk ordering");
        return Ok(());
    }

    let client = open_client(&cli.storage, &cli.desks)?;

    match cli.command {
        Commands::Serve { port, host } => server::run(&host, port, client).await?,
        Commands::Desks => print_json(&client.desks())?,
        Commands::Available { day } => print_json(&client.available_desks(day)?)?,
        Commands::Bookings { day } => print_json(&client.bookings(day)?)?,
        Commands::Mine { user } => print_json(&client.user_bookings(&UserId::new(user))?)?,
        Commands::Book { user, desk, day } => {
            let booking = client.book_day(&UserId::new(user), &DeskId::new(desk), day)?;
            tracing::info!(id = %booking.id, "Booked");
            print_json(&booking)?
        }
        Commands::Cancel { user, id } => {
            client.cancel_booking(BookingId(id), &UserId::new(user))?;
            println!("Booking {} cancelled", id);
        }
        // printed before the store is opened
        Commands::Version => {}
    }

    Ok(())
}
