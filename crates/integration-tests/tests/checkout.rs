//! Checkout, order detail and cancellation.

use elida_integration_tests::{TestContext, location};
use reqwest::StatusCode;

const ADDRESS: &[(&str, &str)] = &[
    ("name", "Ona Onaitė"),
    ("address", "Gedimino pr. 1"),
    ("city", "Vilnius"),
    ("postalCode", "01103"),
    ("country", "Lietuva"),
];

async fn signed_in() -> TestContext {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;
    ctx.sign_in("ona@elida.lt", "123456").await;
    ctx
}

#[tokio::test]
async fn checkout_needs_a_session() {
    let ctx = TestContext::new().await;
    ctx.post_redirect("/cart/add", &[("product_id", "losjonas")]).await;

    assert_eq!(location(&ctx.get("/checkout").await), "/signin");
    assert_eq!(ctx.post_redirect("/checkout", ADDRESS).await, "/signin");
    assert_eq!(ctx.cart_count().await, 1);
}

#[tokio::test]
async fn empty_cart_cannot_check_out() {
    let ctx = signed_in().await;

    assert_eq!(location(&ctx.get("/checkout").await), "/cart?error=cart_empty");
    assert_eq!(ctx.post_redirect("/checkout", ADDRESS).await, "/cart?error=cart_empty");
    assert!(ctx.store.document("orders", "orders-000001").await.is_none());
}

#[tokio::test]
async fn missing_address_fields_are_reported() {
    let ctx = signed_in().await;
    ctx.post_redirect("/cart/add", &[("product_id", "losjonas")]).await;

    let body = ctx.page("/checkout").await;
    assert!(body.contains("29.99€"));

    let target = ctx
        .post_redirect("/checkout", &[("name", "Ona"), ("city", "Vilnius")])
        .await;
    assert_eq!(target, "/checkout?error=fields_required");
    assert_eq!(ctx.cart_count().await, 1);
}

#[tokio::test]
async fn placing_an_order_empties_the_cart() {
    let ctx = signed_in().await;
    ctx.post_redirect("/cart/add", &[("product_id", "losjonas"), ("quantity", "2")])
        .await;
    ctx.post_redirect("/cart/add", &[("product_id", "pirstine")]).await;

    let target = ctx.post_redirect("/checkout", ADDRESS).await;
    assert_eq!(target, "/profile/orders/orders-000001?notice=order_placed");
    assert_eq!(ctx.cart_count().await, 0);

    let stored = ctx.store.document("orders", "orders-000001").await.unwrap();
    assert_eq!(stored["status"], "pending");
    assert_eq!(stored["total"].as_f64(), Some(69.48));
    assert_eq!(stored["shippingAddress"]["postalCode"], "01103");
    assert_eq!(stored["items"].as_array().map(Vec::len), Some(2));

    let body = ctx.page(&target).await;
    assert!(body.contains("Užsakymas pateiktas. Ačiū!"));
    assert!(body.contains("Laukiama"));
    assert!(body.contains("69.48€"));
    assert!(body.contains("Gedimino pr. 1"));

    let profile = ctx.page("/profile").await;
    assert!(profile.contains("/profile/orders/orders-000001"));
}

#[tokio::test]
async fn only_pending_orders_can_be_cancelled() {
    let ctx = signed_in().await;
    ctx.post_redirect("/cart/add", &[("product_id", "losjonas")]).await;
    ctx.post_redirect("/checkout", ADDRESS).await;

    let target = ctx
        .post_redirect("/profile/orders/orders-000001/cancel", &[])
        .await;
    assert_eq!(target, "/profile/orders/orders-000001?notice=order_cancelled");

    let body = ctx.page(&target).await;
    assert!(body.contains("Atšaukta"));
    assert!(!body.contains("/cancel\""));

    let target = ctx
        .post_redirect("/profile/orders/orders-000001/cancel", &[])
        .await;
    assert_eq!(
        target,
        "/profile/orders/orders-000001?error=order_not_cancellable"
    );
}

#[tokio::test]
async fn orders_are_private() {
    let ctx = signed_in().await;
    ctx.post_redirect("/cart/add", &[("product_id", "losjonas")]).await;
    ctx.post_redirect("/checkout", ADDRESS).await;

    let other = ctx.other_visitor();
    other.register("jonas@elida.lt", "123456").await;
    other.sign_in("jonas@elida.lt", "123456").await;

    let response = other.get("/profile/orders/orders-000001").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = other
        .post("/profile/orders/orders-000001/cancel", &[])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = ctx.store.document("orders", "orders-000001").await.unwrap();
    assert_eq!(stored["status"], "pending");
}
