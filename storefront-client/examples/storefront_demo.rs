//! Storefront client walkthrough
//!
//! Logs in against a running backend, lists products, and asks the
//! inference service for recommendations.
//!
//! Run: cargo run --example storefront_demo -- <identifier> <password>

use anyhow::{Context, bail};
use std::sync::Arc;
use storefront_client::{ClientConfig, FileStorage, ServiceTarget, StorefrontClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let identifier = args.next().context("usage: storefront_demo <identifier> <password>")?;
    let password = args.next().context("usage: storefront_demo <identifier> <password>")?;

    let client = StorefrontClient::builder()
        .config(ClientConfig::from_env())
        .storage(Arc::new(FileStorage::new("./.storefront", "session.json")))
        .on_session_expired(|| eprintln!("Session expired, please log in again."))
        .build()?;

    let login = client.login(&identifier, &password).await;
    if !login.is_ok() {
        bail!(
            "login failed: {}",
            login.message.unwrap_or_else(|| "unknown error".into())
        );
    }
    let user = login.data.expect("successful login carries a user");
    println!("Logged in as {} <{}>", user.username, user.email);

    let products = client.get(ServiceTarget::Primary, "/products").await;
    match products.data {
        Some(data) => println!("Products: {}", serde_json::to_string_pretty(&data)?),
        None => println!(
            "Could not list products: {}",
            products.message.unwrap_or_else(|| "unknown error".into())
        ),
    }

    let recommendations = client
        .get(ServiceTarget::Inference, "/recommendations?limit=5")
        .await;
    match recommendations.data {
        Some(data) => println!("Recommendations: {}", serde_json::to_string_pretty(&data)?),
        None => println!(
            "No recommendations: {}",
            recommendations
                .message
                .unwrap_or_else(|| "unknown error".into())
        ),
    }

    Ok(())
}
