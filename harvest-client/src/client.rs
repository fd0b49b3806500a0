//! Client assembly
//!
//! Wires one session into every component that needs it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::cart::CartManager;
use crate::checkout::CheckoutOrchestrator;
use crate::fulfillment::OrderStatusCoordinator;
use crate::notification::{ChannelConnector, NotificationChannel, WsConnector};
use crate::service::OrderService;
use crate::session::SessionContext;
use crate::{ClientConfig, ClientResult, HttpClient};

/// Components sharing one session
///
/// # Example
///
/// ```no_run
/// use harvest_client::{ClientConfig, HarvestClient};
///
/// # async fn run() -> harvest_client::ClientResult<()> {
/// let client = HarvestClient::connect(&ClientConfig::from_env())?;
/// let _follow = client.follow_session();
/// if let Some(http) = client.http() {
///     http.login("bea@example.com", "secret").await?;
/// }
/// client.cart().fetch().await?;
/// # Ok(())
/// # }
/// ```
pub struct HarvestClient {
    session: SessionContext,
    http: Option<HttpClient>,
    cart: Arc<CartManager>,
    checkout: CheckoutOrchestrator,
    fulfillment: OrderStatusCoordinator,
    notifications: NotificationChannel,
}

impl HarvestClient {
    /// Talk to the service over HTTP and WebSocket
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let session = config.build_session();
        let http = config.build_http_client(session.clone())?;
        let connector = Arc::new(WsConnector::new(config.resolved_socket_url()?));
        let mut client = Self::with_parts(config, session, Arc::new(http.clone()), connector);
        client.http = Some(http);
        Ok(client)
    }

    /// Assemble around any service and channel connector
    pub fn with_parts(
        config: &ClientConfig,
        session: SessionContext,
        service: Arc<dyn OrderService>,
        connector: Arc<dyn ChannelConnector>,
    ) -> Self {
        let cart = Arc::new(CartManager::new(session.clone(), service.clone()));
        let checkout = CheckoutOrchestrator::new(
            session.clone(),
            service.clone(),
            cart.clone(),
            config.checkout.clone(),
        );
        let fulfillment = OrderStatusCoordinator::new(session.clone(), service);
        let notifications = NotificationChannel::new(connector, config.notification.clone());
        Self {
            session,
            http: None,
            cart,
            checkout,
            fulfillment,
            notifications,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// REST client; `None` when assembled around another service
    pub fn http(&self) -> Option<&HttpClient> {
        self.http.as_ref()
    }

    pub fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub fn checkout(&self) -> &CheckoutOrchestrator {
        &self.checkout
    }

    pub fn fulfillment(&self) -> &OrderStatusCoordinator {
        &self.fulfillment
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    /// Keep the notification channel bound to the session's user
    pub fn follow_session(&self) -> JoinHandle<()> {
        self.notifications.follow_session(&self.session)
    }
}
