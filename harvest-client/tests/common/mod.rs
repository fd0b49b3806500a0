#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use harvest_client::{ClientConfig, HarvestClient, SessionContext, User};
use harvest_mock::{InMemoryMarket, MemoryHub};
use rust_decimal::Decimal;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub struct Fixture {
    pub market: Arc<InMemoryMarket>,
    pub hub: MemoryHub,
    pub client: HarvestClient,
    pub buyer: User,
    pub farmer: User,
    pub other_farmer: User,
}

/// Market with two farmers and three approved products:
/// `pa` (f1, 50.00), `pb` (f2, 30.00), `pc` (f1, 12.50)
pub fn fixture_with(config: ClientConfig, latency: Duration) -> Fixture {
    let hub = MemoryHub::new();
    let market = Arc::new(
        InMemoryMarket::new()
            .with_hub(hub.clone())
            .with_latency(latency),
    );
    let buyer = market.seed_buyer("b1");
    let farmer = market.seed_farmer("f1");
    let other_farmer = market.seed_farmer("f2");
    market.seed_product("pa", "f1", "Apples", dec("50"), 100);
    market.seed_product("pb", "f2", "Beets", dec("30"), 100);
    market.seed_product("pc", "f1", "Chard", dec("12.50"), 5);

    let client = HarvestClient::with_parts(
        &config,
        SessionContext::in_memory(),
        market.clone(),
        Arc::new(hub.connector()),
    );
    Fixture {
        market,
        hub,
        client,
        buyer,
        farmer,
        other_farmer,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(
        ClientConfig::default().with_reconnect(Duration::from_millis(100), 3),
        Duration::ZERO,
    )
}

impl Fixture {
    /// Sign in on both sides: the market acts as the user, the session holds them
    pub fn sign_in(&self, user: &User) {
        self.market.act_as(&user.id);
        self.client
            .session()
            .establish(format!("token-{}", user.id), user.clone())
            .unwrap();
    }

    /// Buyer with `pa × 2` and `pb × 1` in the cart (total 130)
    pub async fn buyer_with_cart(&self) {
        self.sign_in(&self.buyer);
        self.client.cart().add("pa", 2).await.unwrap();
        self.client.cart().add("pb", 1).await.unwrap();
    }
}
