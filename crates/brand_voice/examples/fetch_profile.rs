// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fetches a profile twice and prints cache statistics.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p brand_voice --example fetch_profile -- http://localhost:8080 acme
//! ```

use brand_voice::{AccessConfig, ProfileRepository};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let base_url = args.next().unwrap_or_else(|| "http://localhost:8080".to_owned());
    let id = args.next().unwrap_or_else(|| "acme".to_owned());

    let repository = ProfileRepository::from_config(&AccessConfig::new(base_url))?;

    for round in 1..=2 {
        match repository.get_profile(&id).await {
            Ok(profile) => println!("[{round}] {} ({}): tone {:?}", profile.name, profile.id, profile.tone),
            Err(error) if error.is_unavailable() => println!("[{round}] profile service unavailable, using defaults: {error}"),
            Err(error) => println!("[{round}] cannot load profile: {error}"),
        }
    }

    let stats = repository.stats();
    println!(
        "hits {} misses {} hit rate {:.2} loads {} circuit open {}",
        stats.hits,
        stats.misses,
        stats.hit_rate,
        stats.loads,
        repository.circuit_state().is_open()
    );

    Ok(())
}
