//! HttpClient against a canned loopback server

use std::sync::Arc;

use harvest_client::{ClientConfig, ClientError, HttpClient, OrderService, SessionContext};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Route = Arc<dyn Fn(&str, &str) -> (u16, String) + Send + Sync>;

/// Requests seen by the server: `(method path, authorization header)`
#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(String, Option<String>)>>>);

async fn serve(route: Route) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Seen::default();
    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let route = route.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let head_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };
                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let mut lines = head.lines();
                let mut request_line = lines.next().unwrap().split_whitespace();
                let method = request_line.next().unwrap().to_string();
                let path = request_line.next().unwrap().to_string();
                let mut content_length = 0;
                let mut authorization = None;
                for line in lines {
                    if let Some((name, value)) = line.split_once(':') {
                        match name.trim().to_ascii_lowercase().as_str() {
                            "content-length" => content_length = value.trim().parse().unwrap(),
                            "authorization" => authorization = Some(value.trim().to_string()),
                            _ => {}
                        }
                    }
                }
                while buf.len() < head_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                log.0.lock().push((format!("{} {}", method, path), authorization));
                let (status, body) = route(&method, &path);
                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (format!("http://{}/api", addr), seen)
}

const USER: &str = r#"{"id":"b1","email":"b1@example.com","name":"Bea","phone":"555","role":"buyer"}"#;

fn cart_body() -> String {
    r#"{"items":[{"id":"c1","buyer_id":"b1","product_id":"pa","quantity":2,
        "product":{"id":"pa","farmer_id":"f1","name":"Apples","category":"fruit",
        "price":50.0,"quantity":10,"status":"approved"}}],"total":100.0}"#
        .to_string()
}

fn market(method: &str, path: &str) -> (u16, String) {
    match (method, path) {
        ("POST", "/api/auth/login") => (
            200,
            format!(r#"{{"access_token":"tok-1","token_type":"bearer","user":{}}}"#, USER),
        ),
        ("GET", "/api/cart") => (200, cart_body()),
        ("POST", "/api/orders") => (400, r#"{"detail":"Insufficient stock for Apples"}"#.into()),
        ("PUT", "/api/cart/c1") => (
            422,
            r#"{"detail":[{"loc":["body","quantity"],"msg":"value is not a valid integer"}]}"#
                .into(),
        ),
        ("POST", "/api/payment/process") => (
            200,
            r#"{"success":false,"message":"Payment failed. Please try again."}"#.into(),
        ),
        ("GET", "/api/orders") => (401, r#"{"detail":"Invalid token"}"#.into()),
        ("GET", "/api/auth/me") => (401, r#"{"detail":"Invalid token"}"#.into()),
        _ => (404, r#"{"detail":"Not Found"}"#.into()),
    }
}

#[tokio::test]
async fn test_login_then_bearer_on_every_call() {
    let (base_url, seen) = serve(Arc::new(market)).await;
    let client = HttpClient::new(&ClientConfig::new(base_url), SessionContext::in_memory()).unwrap();

    let user = client.login("b1@example.com", "secret").await.unwrap();
    assert_eq!(user.name, "Bea");
    assert!(client.session().is_authenticated());

    let cart = client.get_cart().await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, Decimal::from(100));
    assert_eq!(cart.items[0].subtotal(), Some(Decimal::from(100)));

    let seen = seen.0.lock().clone();
    assert_eq!(seen[0], ("POST /api/auth/login".to_string(), None));
    assert_eq!(seen[1], ("GET /api/cart".to_string(), Some("Bearer tok-1".to_string())));
}

#[tokio::test]
async fn test_error_details_surface_verbatim() {
    let (base_url, _) = serve(Arc::new(market)).await;
    let client = HttpClient::new(&ClientConfig::new(base_url), SessionContext::in_memory()).unwrap();
    client.login("b1@example.com", "secret").await.unwrap();

    let request = shared::models::CreateOrderRequest {
        shipping_address: "12 Orchard Lane".into(),
        items: vec![],
    };
    let err = client.create_order(&request, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref m) if m == "Insufficient stock for Apples"));

    let err = client.update_cart_item("c1", 3).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(ref m) if m == "value is not a valid integer"));

    let err = client.get_product("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_payment_decline_is_a_value_not_an_error() {
    let (base_url, _) = serve(Arc::new(market)).await;
    let client = HttpClient::new(&ClientConfig::new(base_url), SessionContext::in_memory()).unwrap();
    client.login("b1@example.com", "secret").await.unwrap();

    let payment = client.process_payment().await.unwrap();
    assert!(!payment.success);
    assert_eq!(payment.transaction_id, None);
    assert_eq!(payment.message.as_deref(), Some("Payment failed. Please try again."));
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::new(serve(Arc::new(market)).await.0)
        .with_token_path(dir.path().join("session.json"));
    let session = config.build_session();
    let client = config.build_http_client(session.clone()).unwrap();
    client.login("b1@example.com", "secret").await.unwrap();
    assert_eq!(session.stored_token().unwrap().as_deref(), Some("tok-1"));

    let err = client.list_orders().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!session.is_authenticated());
    assert_eq!(session.stored_token().unwrap(), None);
}

#[tokio::test]
async fn test_restore_with_rejected_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let config = ClientConfig::new(serve(Arc::new(market)).await.0).with_token_path(&path);

    // A previous run left a token behind
    let previous = config.build_session();
    let user: harvest_client::User = serde_json::from_str(USER).unwrap();
    previous.establish("stale", user).unwrap();

    let session = config.build_session();
    let client = config.build_http_client(session.clone()).unwrap();
    assert_eq!(client.restore().await.unwrap(), None);
    assert!(!session.is_authenticated());
    assert_eq!(session.stored_token().unwrap(), None);
}
