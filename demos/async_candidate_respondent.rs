//! Nominate a panelist for a survey and print the link that starts it.
//!
//! Run:
//! `CINT_KEY=<key> CINT_SECRET=<secret> cargo run --example async_candidate_respondent -- <panelist-id>`

use cint_client::CintClient;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(panelist_id) = std::env::args().nth(1) else {
        eprintln!("Usage: async_candidate_respondent <panelist-id>");
        std::process::exit(2);
    };

    let client = CintClient::from_env()?;
    let candidate = client
        .candidate_respondent(
            &json!({"respondent_params": "source=demo", "allow_routing": true}),
            &panelist_id,
            None,
        )
        .await?;

    println!("params: {}", candidate.params().unwrap_or_default());
    println!("start:  {}", candidate.link_start()?);
    Ok(())
}
