mod common;

use axum::http::{Method, StatusCode};
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use axum::Router;
use digital_menu_backend_rs::{
    app::App,
    modules::{auth, user},
    types::MailContext,
    utils::database,
};
use serde_json::{json, Value};
use std::{str::FromStr, sync::Arc};
use ulid::Ulid;

fn decimal(value: &Value) -> BigDecimal {
    match value {
        Value::String(s) => BigDecimal::from_str(s).unwrap(),
        other => BigDecimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn setup() -> (database::DatabaseConnection, Router) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let db_conn = database::connect(&url, 5).await.unwrap();
    database::migrate(&db_conn).await.unwrap();
    let router = App::new(common::context(db_conn.clone())).into_router();

    (db_conn, router)
}

fn fresh_email(prefix: &str) -> String {
    format!("{}-{}@spicehub.in", prefix, Ulid::new().to_string().to_lowercase())
}

/// Stores a pending code as if send-otp had mailed it.
async fn issue_code(db_conn: &database::DatabaseConnection, email: &str, code: &str) {
    let now = Utc::now().naive_utc();

    user::repository::store_otp(
        &db_conn.pool,
        user::repository::StoreOtpPayload {
            email: email.to_string(),
            otp_hash: auth::service::otp::hash_code(code),
            otp_expires_at: now + Duration::minutes(5),
            otp_sent_at: now,
            resend_after: now,
        },
    )
    .await
    .unwrap()
    .expect("code was throttled");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable postgres database"]
async fn owner_builds_a_menu_and_customer_orders() {
    let (db_conn, router) = setup().await;
    let email = fresh_email("owner");
    issue_code(&db_conn, &email, "482913").await;

    let (status, body) = common::send(
        router.clone(),
        Method::POST,
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": email, "otp": "111111" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");

    let (status, body) = common::send(
        router.clone(),
        Method::POST,
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": email, "otp": "482913" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needs_profile"], true);

    let (status, body) = common::send(
        router.clone(),
        Method::POST,
        "/api/auth/verify-otp",
        None,
        Some(json!({
            "email": email,
            "otp": "482913",
            "name": "Asha",
            "country": "India"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["existing_user"], false);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, restaurant) = common::send(
        router.clone(),
        Method::POST,
        "/api/restaurants",
        Some(&token),
        Some(json!({ "name": "Spice Hub", "location": "Pune" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let restaurant_id = restaurant["id"].as_str().unwrap().to_string();
    assert!(restaurant["slug"].as_str().unwrap().starts_with("spice-hub-"));

    let (status, category) = common::send(
        router.clone(),
        Method::POST,
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Starters", "restaurant_id": restaurant_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dish) = common::send(
        router.clone(),
        Method::POST,
        "/api/dishes",
        Some(&token),
        Some(json!({
            "name": "Paneer Tikka",
            "price": 180,
            "restaurant_id": restaurant_id,
            "category_id": category["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let dish_id = dish["id"].as_str().unwrap().to_string();

    let (status, menu) = common::send(
        router.clone(),
        Method::GET,
        &format!("/api/menu/{}", restaurant_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sections = menu["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["name"], "Starters");
    assert_eq!(sections[0]["dishes"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&sections[0]["dishes"][0]["price"]), BigDecimal::from(180));

    let (status, order) = common::send(
        router.clone(),
        Method::POST,
        "/api/orders",
        None,
        Some(json!({
            "customer_name": "Ravi",
            "table_number": "4",
            "restaurant_id": restaurant_id,
            // a client supplied total is ignored
            "total": 1,
            "items": [{ "dish_id": dish_id, "quantity": 2 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&order["total"]), BigDecimal::from(360));
    assert_eq!(order["status"], "pending");
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, _) = common::send(
        router.clone(),
        Method::PATCH,
        &format!("/api/orders/{}", order_id),
        Some(&token),
        Some(json!({ "status": "shipped" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = common::send(
        router.clone(),
        Method::PATCH,
        &format!("/api/orders/{}", order_id),
        Some(&token),
        Some(json!({ "status": "ready" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["current_status"], "pending");

    let (status, updated) = common::send(
        router.clone(),
        Method::PATCH,
        &format!("/api/orders/{}", order_id),
        Some(&token),
        Some(json!({ "status": "preparing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["order"]["status"], "preparing");

    let (status, first) = common::send(
        router.clone(),
        Method::GET,
        "/api/restaurants",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = common::send(
        router.clone(),
        Method::GET,
        "/api/restaurants",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(first["items"], second["items"]);

    // moving a dish to another category drops its old link
    let (status, mains) = common::send(
        router.clone(),
        Method::POST,
        "/api/categories",
        Some(&token),
        Some(json!({ "name": "Mains", "restaurant_id": restaurant_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::send(
        router.clone(),
        Method::PATCH,
        &format!("/api/dishes/{}", dish_id),
        Some(&token),
        Some(json!({ "category_id": mains["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, dishes) = common::send(
        router.clone(),
        Method::GET,
        &format!("/api/dishes?restaurant_id={}", restaurant_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let categories = dishes["items"][0]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["id"], mains["id"]);
    assert_eq!(categories[0]["name"], "Mains");

    // cart checkout
    let (status, cart) = common::send(
        router.clone(),
        Method::POST,
        "/api/carts",
        None,
        Some(json!({
            "restaurant_id": restaurant_id,
            "customer_name": "Meera",
            "table_number": "7"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let cart_id = cart["id"].as_str().unwrap().to_string();

    let (status, _) = common::send(
        router.clone(),
        Method::POST,
        &format!("/api/carts/{}/checkout", cart_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, priced) = common::send(
        router.clone(),
        Method::PUT,
        &format!("/api/carts/{}/items/{}", cart_id, dish_id),
        None,
        Some(json!({ "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&priced["total"]), BigDecimal::from(540));

    let (status, checked_out) = common::send(
        router.clone(),
        Method::POST,
        &format!("/api/carts/{}/checkout", cart_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&checked_out["total"]), BigDecimal::from(540));
    assert_eq!(checked_out["status"], "pending");
    assert_eq!(checked_out["items"][0]["quantity"], 3);

    let (status, _) = common::send(
        router.clone(),
        Method::POST,
        &format!("/api/carts/{}/checkout", cart_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cart) = common::send(
        router.clone(),
        Method::GET,
        &format!("/api/carts/{}", cart_id),
        None,
        None,
    )
    .await;
    assert_eq!(cart["status"], "CHECKED_OUT");
    assert_eq!(cart["order_id"], checked_out["id"]);

    // signing in again needs no profile
    issue_code(&db_conn, &email, "305127").await;

    let (status, body) = common::send(
        router,
        Method::POST,
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": email, "otp": "305127" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needs_profile"], false);
    assert_eq!(body["existing_user"], true);
    assert_eq!(body["user"]["name"], "Asha");
    assert!(body["access_token"].is_string());
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable postgres database"]
async fn simultaneous_code_requests_issue_one_code() {
    let (_, router) = setup().await;
    let email = fresh_email("burst");

    let requests: Vec<_> = (0..20)
        .map(|_| {
            tokio::spawn(common::send(
                router.clone(),
                Method::POST,
                "/api/auth/send-otp",
                None,
                Some(json!({ "email": email })),
            ))
        })
        .collect();

    let mut statuses = vec![];
    for request in requests {
        statuses.push(request.await.unwrap().0);
    }

    let sent = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let throttled = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(sent, 1);
    assert_eq!(throttled, 19);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable postgres database"]
async fn simultaneous_wrong_codes_all_count_as_attempts() {
    let (db_conn, router) = setup().await;
    let email = fresh_email("guess");
    issue_code(&db_conn, &email, "482913").await;

    let guesses: Vec<_> = (0..10)
        .map(|n| {
            tokio::spawn(common::send(
                router.clone(),
                Method::POST,
                "/api/auth/verify-otp",
                None,
                Some(json!({ "email": email, "otp": format!("10000{}", n) })),
            ))
        })
        .collect();

    for guess in guesses {
        assert_eq!(guess.await.unwrap().0, StatusCode::BAD_REQUEST);
    }

    let user = user::repository::find_by_email_for_update(&db_conn.pool, email.clone())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.otp_attempts, 10);
    assert!(user.otp_hash.is_none());

    // the right code no longer helps once the attempts are spent
    let (status, body) = common::send(
        router,
        Method::POST,
        "/api/auth/verify-otp",
        None,
        Some(json!({ "email": email, "otp": "482913" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OTP");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable postgres database"]
async fn undelivered_code_does_not_throttle_the_next_request() {
    let (db_conn, _) = setup().await;
    let email = fresh_email("bounce");

    let mut ctx = (*common::context(db_conn.clone())).clone();
    ctx.mail = Some(MailContext {
        host: "127.0.0.1".to_string(),
        sender: "not a mailbox".to_string(),
        user: "mailer".to_string(),
        password: "secret".to_string(),
    });
    let router = App::new(Arc::new(ctx)).into_router();

    for _ in 0..2 {
        let (status, _) = common::send(
            router.clone(),
            Method::POST,
            "/api/auth/send-otp",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let user = user::repository::find_by_email_for_update(&db_conn.pool, email)
        .await
        .unwrap()
        .unwrap();
    assert!(user.otp_hash.is_none());
    assert!(user.otp_sent_at.is_none());
}
