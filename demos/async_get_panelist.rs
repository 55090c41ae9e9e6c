//! Fetch one panelist from the default panel.
//!
//! Run:
//! `CINT_KEY=<key> CINT_SECRET=<secret> cargo run --example async_get_panelist -- <panelist-id>`

use cint_client::CintClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(panelist_id) = std::env::args().nth(1) else {
        eprintln!("Usage: async_get_panelist <panelist-id>");
        std::process::exit(2);
    };
    if std::env::var("CINT_KEY").is_err() {
        eprintln!("Set CINT_KEY and CINT_SECRET before running this example.");
        std::process::exit(2);
    }

    let client = CintClient::from_env()?;
    let panelist = client.get_panelist(&panelist_id, None).await?;
    if let Some(value) = panelist.as_json() {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}
