use super::*;
use crate::cart::CartItem;
use crate::storage::MemoryStorage;
use crate::test_support::{BASE_URL, MockTransport, fast_config, json_response};
use serde_json::json;

const TOKEN: &str = "aGVhZA.Ym9keQ.c2ln";

fn storefront(storage: Arc<dyn SessionStorage>, transport: Arc<MockTransport>) -> Storefront {
    Storefront::with_parts(fast_config(0), storage, transport)
}

#[tokio::test]
async fn login_flows_into_store_and_admin_calls() {
    let transport = MockTransport::scripted(vec![
        json_response(200, json!({ "token": TOKEN, "user": { "_id": "a1", "name": "Admin", "email": "a@x.test", "isAdmin": true } })),
        json_response(200, json!({ "totalProducts": 3 })),
    ]);
    let app = storefront(Arc::new(MemoryStorage::new()), transport.clone());

    app.auth().login("a@x.test", "secret1", true).await.unwrap();
    let stats = app.admin().dashboard_stats().await.unwrap();

    assert_eq!(stats.total_products, 3);
    assert_eq!(transport.last().header("Authorization"), Some(&*format!("Bearer {TOKEN}")));
    assert!(app.auth_state().user.is_some_and(|u| u.is_admin));
}

#[tokio::test]
async fn unauthorized_store_call_logs_out_the_facade() {
    let transport = MockTransport::scripted(vec![
        json_response(200, json!({ "token": TOKEN, "user": { "_id": "u1", "isAdmin": false } })),
        json_response(401, json!({ "message": "expired" })),
    ]);
    let app = storefront(Arc::new(MemoryStorage::new()), transport);

    app.auth().login("u1@x.test", "secret1", false).await.unwrap();
    assert!(app.store().list_orders().await.is_err());

    assert!(app.auth_state().user.is_none());
    assert!(!app.sessions().is_authenticated());
}

#[test]
fn cart_and_session_share_storage() {
    let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
    let app = storefront(Arc::clone(&storage), MockTransport::scripted(vec![]));
    app.cart()
        .add(CartItem {
            product_id: "p1".into(),
            name: "Dupatta".into(),
            image: String::new(),
            price: 300.0,
            size: "Free".into(),
            quantity: 1,
        })
        .unwrap();

    let reopened = storefront(storage, MockTransport::scripted(vec![]));
    assert_eq!(reopened.cart().total_items(), 1);
    assert_eq!(reopened.api().base_url(), BASE_URL);
}

#[test]
fn open_uses_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::new(BASE_URL);
    config.storage_path = dir.path().join("storage.json");

    let app = Storefront::open(config).unwrap();
    app.wishlist()
        .add(crate::cart::WishlistItem {
            product_id: "p1".into(),
            name: "Saree".into(),
            image: String::new(),
            price: 10.0,
            sizes: vec![],
        })
        .unwrap();

    assert!(dir.path().join("storage.json").exists());
}

#[test]
fn error_codes_delegate_to_layers() {
    let err = StorefrontError::from(ApiError::Unreachable { attempts: 4, message: "timed out".into() });
    assert_eq!(err.error_code(), "E_UNREACHABLE");
    assert!(err.retryable());
}
