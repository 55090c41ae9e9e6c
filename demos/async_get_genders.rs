//! List genders through the public (unauthenticated) endpoint.
//!
//! Run:
//! `cargo run --example async_get_genders`
//!
//! Optional env vars:
//! - `CINT_HOST` (defaults to `cdp.cintworks.net`)
//! - `CINT_SCHEME` (defaults to `https`)

use cint_client::{CintClient, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = CintClient::new(ClientConfig::from_env()?)?;

    let genders = client.get_genders().await?;
    if let Some(value) = genders.as_json() {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
