//! Hangar Flight Client
//!
//! Lists the datasets a server advertises, then fetches one and prints it.
//!
//! ```text
//! hangar-client [key]        # default key: people
//! HANGAR_SERVER=http://host:8815 hangar-client
//! ```

use std::env;

use arrow::util::pretty::pretty_format_batches;
use arrow_array::RecordBatch;
use arrow_flight::{FlightClient, Ticket};
use futures::TryStreamExt;
use tonic::transport::Channel;
use tracing::{debug, error};

use hangar::Error;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8815";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let server = env::var("HANGAR_SERVER").unwrap_or_else(|_| DEFAULT_SERVER.to_string());
    let key = env::args().nth(1).unwrap_or_else(|| "people".to_string());

    if let Err(e) = run(&server, &key).await {
        error!(error = %e, %server, "Client failed");
        std::process::exit(1);
    }
}

async fn run(server: &str, key: &str) -> hangar::Result<()> {
    let channel = Channel::from_shared(server.to_string())
        .map_err(|e| Error::Config(format!("invalid server URI {server}: {e}")))?
        .connect()
        .await?;
    let mut client = FlightClient::new(channel);

    println!("Available flights:");
    let mut flights = client.list_flights(bytes::Bytes::new()).await?;
    while let Some(info) = flights.try_next().await? {
        if let Some(path) = info.flight_descriptor.as_ref().and_then(|d| d.path.first()) {
            println!("  - {path} ({} rows)", info.total_records);
        }
    }

    debug!(key, "Fetching dataset");
    let batches: Vec<RecordBatch> = client
        .do_get(Ticket::new(key.to_string()))
        .await?
        .try_collect()
        .await?;

    println!("\nResults:\n{}", pretty_format_batches(&batches)?);
    Ok(())
}
