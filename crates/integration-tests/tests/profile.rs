//! Profile page: account details and order and booking history.

use elida_core::UserId;
use elida_integration_tests::{TestContext, location};
use serde_json::{Map, Value, json};

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("document literals are objects"),
    }
}

async fn seed_history(ctx: &TestContext, uid: &UserId) {
    for (id, created_at, total) in [
        ("old", "2024-01-01T10:00:00Z", 29.99),
        ("new", "2024-03-01T10:00:00Z", 45.0),
    ] {
        ctx.store
            .insert(
                "orders",
                id,
                fields(json!({
                    "userId": uid.as_str(),
                    "items": [{
                        "productId": "losjonas",
                        "quantity": 1,
                        "price": total,
                        "name": "Bronzinis losjonas"
                    }],
                    "total": total,
                    "status": "completed",
                    "createdAt": created_at,
                    "updatedAt": created_at
                })),
            )
            .await;
    }

    for (id, date, time) in [("feb", "2024-02-10", "10:00"), ("may", "2024-05-20", "14:30")] {
        ctx.store
            .insert(
                "bookings",
                id,
                fields(json!({
                    "userId": uid.as_str(),
                    "date": date,
                    "time": time,
                    "status": "confirmed",
                    "service": "Purškiamas įdegis"
                })),
            )
            .await;
    }

    // Someone else's history never shows up.
    ctx.store
        .insert(
            "bookings",
            "foreign",
            fields(json!({
                "userId": "someone-else",
                "date": "2024-06-01",
                "time": "09:00",
                "status": "confirmed"
            })),
        )
        .await;
}

#[tokio::test]
async fn history_lists_newest_first() {
    let ctx = TestContext::new().await;
    let uid = ctx.register("ona@elida.lt", "123456").await;
    seed_history(&ctx, &uid).await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    let body = ctx.page("/profile").await;

    let new = body.find("2024-03-01").unwrap();
    let old = body.find("2024-01-01").unwrap();
    assert!(new < old);
    assert!(body.contains("45.00€"));
    assert!(body.contains("Įvykdyta"));

    let may = body.find("2024-05-20").unwrap();
    let feb = body.find("2024-02-10").unwrap();
    assert!(may < feb);
    assert!(body.contains("Purškiamas įdegis"));
    assert!(!body.contains("2024-06-01"));
}

#[tokio::test]
async fn empty_history_has_its_own_text() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    let body = ctx.page("/profile").await;
    assert!(body.contains("Užsakymų dar neturite"));
    assert!(body.contains("Rezervacijų dar neturite"));
}

#[tokio::test]
async fn one_failing_list_does_not_hide_the_other() {
    let ctx = TestContext::new().await;
    let uid = ctx.register("ona@elida.lt", "123456").await;
    seed_history(&ctx, &uid).await;
    ctx.store.fail_collection("bookings").await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    let body = ctx.page("/profile").await;
    assert!(body.contains("Nepavyko užkrauti rezervacijų"));
    assert!(!body.contains("Nepavyko užkrauti užsakymų"));
    assert!(body.contains("2024-03-01"));
}

#[tokio::test]
async fn display_name_can_be_changed() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    let target = ctx.post_redirect("/profile", &[("display_name", " Ona ")]).await;
    assert_eq!(target, "/profile?notice=profile_updated");
    assert_eq!(
        ctx.identity.display_name("ona@elida.lt").await.as_deref(),
        Some("Ona")
    );

    let body = ctx.page(&target).await;
    assert!(body.contains("Profilis atnaujintas"));
    assert!(body.contains(r#"value="Ona""#));

    let target = ctx.post_redirect("/profile", &[("display_name", "  ")]).await;
    assert_eq!(target, "/profile?error=fields_required");
    assert_eq!(
        ctx.identity.display_name("ona@elida.lt").await.as_deref(),
        Some("Ona")
    );
}

#[tokio::test]
async fn profile_update_needs_a_session() {
    let ctx = TestContext::new().await;
    let response = ctx.post("/profile", &[("display_name", "Ona")]).await;
    assert_eq!(location(&response), "/signin");
}
