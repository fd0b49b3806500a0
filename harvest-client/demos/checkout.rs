// harvest-client/demos/checkout.rs
// Buyer checkout and farmer fulfillment against the in-process market

use std::sync::Arc;

use harvest_client::{ClientConfig, HarvestClient, SessionContext};
use harvest_mock::{InMemoryMarket, MemoryHub};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let hub = MemoryHub::new();
    let market = Arc::new(InMemoryMarket::new().with_hub(hub.clone()));
    let buyer = market.seed_buyer("buyer-1");
    let farmer = market.seed_farmer("farmer-1");
    market.seed_product("kale", "farmer-1", "Kale", Decimal::new(450, 2), 40);
    market.seed_product("eggs", "farmer-1", "Eggs (dozen)", Decimal::new(600, 2), 12);

    let config = ClientConfig::from_env();

    // Buyer side
    let client = HarvestClient::with_parts(
        &config,
        SessionContext::in_memory(),
        market.clone(),
        Arc::new(hub.connector()),
    );
    let _follower = client.follow_session();
    client.notifications().on_notification(|n| {
        tracing::info!(kind = %n.kind, "Buyer notified: {}", n.message);
    });

    market.act_as(&buyer.id);
    client.session().establish("demo-buyer-token", buyer.clone())?;
    client.cart().add("kale", 3).await?;
    client.cart().add("eggs", 1).await?;
    tracing::info!(total = %client.cart().total(), "Cart ready");

    let outcome = client.checkout().checkout("7 Market Street").await?;
    let Some(receipt) = outcome.receipt() else {
        anyhow::bail!("Checkout failed: {:?}", outcome.failure());
    };
    tracing::info!(
        orders = receipt.orders.len(),
        total = %receipt.total(),
        transaction_id = ?receipt.transaction_id,
        "Purchase complete"
    );

    // Farmer side
    let farm = HarvestClient::with_parts(
        &config,
        SessionContext::in_memory(),
        market.clone(),
        Arc::new(hub.connector()),
    );
    market.act_as(&farmer.id);
    farm.session().establish("demo-farmer-token", farmer.clone())?;
    farm.fulfillment().load().await?;

    let order_id = receipt.orders[0].id.clone();
    while let Some(action) = farm.fulfillment().next_action(&order_id) {
        tracing::info!("Farmer: {}", action.label);
        farm.fulfillment().advance(&order_id).await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    client.notifications().disconnect().await;
    Ok(())
}
