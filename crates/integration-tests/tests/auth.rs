//! Email, password and Google authentication flows.

use elida_integration_tests::{TestContext, location};

#[tokio::test]
async fn sign_up_enforces_minimum_password_length() {
    let ctx = TestContext::new().await;

    let target = ctx
        .post_redirect(
            "/signup",
            &[
                ("email", "ona@elida.lt"),
                ("password", "12345"),
                ("password_confirm", "12345"),
            ],
        )
        .await;
    assert_eq!(target, "/signin?mode=signup&error=password_too_short");

    let body = ctx.page(&target).await;
    assert!(body.contains("Slaptažodis turi būti bent 6 simbolių ilgio"));
    assert!(body.contains("Registracija"));

    // Nothing was created.
    let target = ctx
        .post_redirect("/signin", &[("email", "ona@elida.lt"), ("password", "12345")])
        .await;
    assert_eq!(target, "/signin?error=sign_in_failed");

    let target = ctx
        .post_redirect(
            "/signup",
            &[
                ("email", "ona@elida.lt"),
                ("password", "123456"),
                ("password_confirm", "123456"),
            ],
        )
        .await;
    assert_eq!(target, "/profile");

    let body = ctx.page("/profile").await;
    assert!(body.contains("ona@elida.lt"));
}

#[tokio::test]
async fn sign_up_form_errors_are_reported() {
    let ctx = TestContext::new().await;

    let target = ctx
        .post_redirect(
            "/signup",
            &[
                ("email", "ona@elida.lt"),
                ("password", "123456"),
                ("password_confirm", "654321"),
            ],
        )
        .await;
    assert_eq!(target, "/signin?mode=signup&error=password_mismatch");

    let target = ctx
        .post_redirect("/signup", &[("email", " "), ("password", "123456")])
        .await;
    assert_eq!(target, "/signin?mode=signup&error=fields_required");

    ctx.register("ona@elida.lt", "123456").await;
    let target = ctx
        .post_redirect(
            "/signup",
            &[
                ("email", "ona@elida.lt"),
                ("password", "123456"),
                ("password_confirm", "123456"),
            ],
        )
        .await;
    assert_eq!(target, "/signin?mode=signup&error=sign_up_failed");
}

#[tokio::test]
async fn wrong_password_is_refused() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;

    let target = ctx
        .post_redirect("/signin", &[("email", "ona@elida.lt"), ("password", "wrong1")])
        .await;
    assert_eq!(target, "/signin?error=sign_in_failed");

    let body = ctx.page(&target).await;
    assert!(body.contains("Neteisingas el. paštas arba slaptažodis."));
}

#[tokio::test]
async fn signed_in_users_skip_auth_pages() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    assert_eq!(location(&ctx.get("/signin").await), "/profile");
    assert_eq!(location(&ctx.get("/password-reset").await), "/profile");
}

#[tokio::test]
async fn protected_pages_send_visitors_to_sign_in() {
    let ctx = TestContext::new().await;

    assert_eq!(location(&ctx.get("/profile").await), "/signin");
    assert_eq!(location(&ctx.get("/checkout").await), "/signin");
    assert_eq!(location(&ctx.get("/profile/orders/x").await), "/signin");
}

#[tokio::test]
async fn sign_out_keeps_cart_and_wishlist() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;

    ctx.post_redirect("/cart/add", &[("product_id", "losjonas")]).await;
    ctx.post_redirect("/wishlist/toggle", &[("product_id", "pirstine")])
        .await;
    ctx.sign_in("ona@elida.lt", "123456").await;

    // Sign-in replaced the session id but kept its contents.
    assert_eq!(ctx.cart_count().await, 1);

    assert_eq!(ctx.post_redirect("/signout", &[]).await, "/");
    assert_eq!(location(&ctx.get("/profile").await), "/signin");
    assert_eq!(ctx.cart_count().await, 1);

    let body = ctx.page("/wishlist").await;
    assert!(body.contains("Aplikavimo pirštinė"));
}

#[tokio::test]
async fn password_reset_reports_both_outcomes() {
    let ctx = TestContext::new().await;
    ctx.register("ona@elida.lt", "123456").await;

    let target = ctx
        .post_redirect("/password-reset", &[("email", " ona@elida.lt ")])
        .await;
    assert_eq!(target, "/password-reset?notice=reset_sent");
    assert_eq!(ctx.identity.reset_requests().await, vec!["ona@elida.lt"]);

    let body = ctx.page(&target).await;
    assert!(body.contains("Slaptažodžio atstatymo nuoroda išsiųsta."));

    let target = ctx
        .post_redirect("/password-reset", &[("email", "nera@elida.lt")])
        .await;
    assert_eq!(target, "/password-reset?error=reset_failed");
}

#[tokio::test]
async fn google_popup_flow_signs_in_and_closes() {
    let ctx = TestContext::new().await;

    let auth_uri = location(&ctx.get("/auth/google?flow=popup").await);
    assert!(auth_uri.starts_with(&format!("{}/auth/google/callback", ctx.base_url)));

    let done = ctx.page(&auth_uri).await;
    assert!(done.contains(r#"content="/profile""#));
    assert!(done.contains("window.close()"));

    let body = ctx.page("/profile").await;
    assert!(body.contains("google.demo@elida.lt"));
    assert!(body.contains("Google Demo"));
}

#[tokio::test]
async fn google_redirect_flow_answers_with_redirects() {
    let ctx = TestContext::new().await;

    let auth_uri = location(&ctx.get("/auth/google?flow=redirect").await);
    assert_eq!(location(&ctx.get(&auth_uri).await), "/profile");

    // The pending flow is single use.
    let done = ctx.page(&auth_uri).await;
    assert!(done.contains("/signin?error=google_failed"));
}

#[tokio::test]
async fn unauthorized_domain_has_its_own_message() {
    let ctx = TestContext::builder()
        .identity(|identity| identity.with_authorized_domains(&["elida.lt"]))
        .spawn()
        .await;

    let target = location(&ctx.get("/auth/google?flow=redirect").await);
    assert_eq!(target, "/signin?error=unauthorized_domain");

    let body = ctx.page(&target).await;
    assert!(body.contains("Šis domenas nėra autorizuotas autentifikacijai."));
}
