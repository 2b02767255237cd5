use super::*;
use crate::http::{HttpResponse, TransportError};
use crate::session::Session;
use crate::test_support::{MockTransport, fast_config, json_response, sample_user, wired_client};
use reqwest::Method;

const ADMIN_TOKEN: &str = "YWRtaW4.Y2xhaW1z.c2ln";

fn admin_with(outcomes: Vec<Result<HttpResponse, TransportError>>) -> (AdminApi, Arc<MockTransport>, Arc<crate::session::SessionStore>) {
    let transport = MockTransport::scripted(outcomes);
    let (api, sessions) = wired_client(&fast_config(0), transport.clone());
    sessions.establish(Session::backend(ADMIN_TOKEN, sample_user("a1", true))).unwrap();
    (AdminApi::new(api), transport, sessions)
}

#[tokio::test]
async fn admin_requests_carry_bearer() {
    let (admin, transport, _) = admin_with(vec![json_response(200, json!({ "totalProducts": 12, "pendingOrders": 2 }))]);

    let stats = admin.dashboard_stats().await.unwrap();

    assert_eq!(stats.total_products, 12);
    assert_eq!(stats.extra.get("pendingOrders"), Some(&json!(2)));
    assert_eq!(transport.last().header("Authorization"), Some(&*format!("Bearer {ADMIN_TOKEN}")));
}

#[tokio::test]
async fn unauthorized_admin_call_clears_session() {
    let (admin, _, sessions) = admin_with(vec![json_response(401, json!({ "message": "Not authorized, token failed" }))]);
    let err = admin.list_users().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(!sessions.is_authenticated());
}

#[tokio::test]
async fn product_crud_paths() {
    let product = json!({ "_id": "p1", "name": "Kurta", "price": 799 });
    let (admin, transport, _) = admin_with(vec![
        json_response(201, product.clone()),
        json_response(200, product),
        json_response(200, json!({ "message": "Product deleted" })),
    ]);
    let input = ProductInput {
        name: "Kurta".into(),
        description: String::new(),
        price: 799.0,
        category: "kurtas".into(),
        images: vec![],
        sizes: vec![],
        stock: None,
    };

    admin.create_product(&input).await.unwrap();
    admin.update_product("p1", &input).await.unwrap();
    admin.delete_product("p1").await.unwrap();

    assert_eq!(
        transport.paths(),
        vec!["/admin/products".to_owned(), "/admin/products/p1".to_owned(), "/admin/products/p1".to_owned()]
    );
    let methods: Vec<Method> = transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::POST, Method::PUT, Method::DELETE]);
}

#[tokio::test]
async fn invalid_product_is_rejected_locally() {
    let (admin, transport, _) = admin_with(vec![]);
    let input = ProductInput {
        name: String::new(),
        description: String::new(),
        price: 1.0,
        category: String::new(),
        images: vec![],
        sizes: vec![],
        stock: None,
    };
    assert!(matches!(admin.create_product(&input).await, Err(ApiError::InvalidRequest(_))));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn order_status_update_body() {
    let (admin, transport, _) = admin_with(vec![json_response(200, json!({ "_id": "o1", "status": "shipped" }))]);
    admin.update_order_status("o1", OrderStatus::Shipped).await.unwrap();
    let sent = transport.last();
    assert_eq!(transport.paths(), vec!["/admin/orders/o1/status".to_owned()]);
    assert_eq!(sent.body, Some(json!({ "status": "shipped" })));

    assert!(admin.update_order_status("o1", OrderStatus::Unknown).await.is_err());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn analytics_and_reports_send_ranges() {
    let (admin, transport, _) = admin_with(vec![
        json_response(200, json!({ "totalRevenue": 100.5 })),
        json_response(200, json!({ "orderReport": { "totalOrders": 4 } })),
    ]);

    let analytics = admin.analytics(TimeRange::SevenDays).await.unwrap();
    let reports = admin.reports(ReportKind::Order, TimeRange::OneYear).await.unwrap();

    assert!((analytics.total_revenue - 100.5).abs() < f64::EPSILON);
    assert_eq!(reports.order_report.total_orders, Some(4));
    let requests = transport.requests();
    assert_eq!(requests[0].query, vec![("timeRange".to_owned(), "7days".to_owned())]);
    assert_eq!(
        requests[1].query,
        vec![("type".to_owned(), "order".to_owned()), ("dateRange".to_owned(), "1year".to_owned())]
    );
}

#[tokio::test]
async fn export_report_returns_csv_and_file_name() {
    let csv = b"date,revenue\n2024-03-01,100\n".to_vec();
    let (admin, transport, _) = admin_with(vec![Ok(HttpResponse { status: 200, body: csv.clone() })]);
    let date = Date::from_calendar_date(2024, time::Month::March, 7).unwrap();

    let report = admin.export_report_on(ReportKind::Inventory, TimeRange::ThirtyDays, date).await.unwrap();

    assert_eq!(report.file_name, "inventory-report-2024-03-07.csv");
    assert_eq!(report.bytes, csv);
    assert_eq!(transport.paths(), vec!["/admin/reports/export".to_owned()]);
}

#[tokio::test]
async fn users_and_admin_toggle() {
    let (admin, transport, _) = admin_with(vec![
        json_response(200, json!([{ "_id": "u1", "name": "A", "email": "a@b.c", "isAdmin": false, "createdAt": "2024-01-01" }])),
        json_response(200, json!({ "message": "updated" })),
        json_response(200, json!({ "message": "deleted" })),
    ]);

    let users = admin.list_users().await.unwrap();
    admin.set_admin_status("u1", true).await.unwrap();
    admin.delete_user("u1").await.unwrap();

    assert_eq!(users[0].created_at.as_deref(), Some("2024-01-01"));
    let requests = transport.requests();
    assert_eq!(requests[1].body, Some(json!({ "isAdmin": true })));
    assert_eq!(
        transport.paths(),
        vec!["/admin/users".to_owned(), "/admin/users/u1/admin-status".to_owned(), "/admin/users/u1".to_owned()]
    );
}

#[tokio::test]
async fn settings_default_when_backend_has_none() {
    let (admin, _, _) = admin_with(vec![Ok(HttpResponse { status: 200, body: b"null".to_vec() })]);
    assert_eq!(admin.settings().await.unwrap(), SiteSettings::default());
}
