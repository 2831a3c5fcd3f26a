mod support;

use std::time::SystemTime;

use actix_web::http::StatusCode;
use actix_web::test;
use backend::auth::jwt::{mint_token, TokenScope};
use backend::state::security_config::SecurityConfig;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_email;
use serde_json::json;
use support::{create_test_app, create_user, login, test_state};

fn email_token(email: &str, security: &SecurityConfig) -> String {
    mint_token(email, TokenScope::Email, SystemTime::now(), security)
        .expect("minting should succeed")
}

fn reset_token(email: &str, security: &SecurityConfig) -> String {
    mint_token(email, TokenScope::PasswordReset, SystemTime::now(), security)
        .expect("minting should succeed")
}

#[actix_web::test]
async fn email_confirmation_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let security = state.security.clone();
    let email = unique_email("confirm");
    create_user(&state, &email, "hunter22", false).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let token = email_token(&email, &security);

    let req = test::TestRequest::get()
        .uri(&format!("/api/auth/confirmed_email/{token}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Email confirmed");

    // Confirming again is a no-op, not an error.
    let req = test::TestRequest::get()
        .uri(&format!("/api/auth/confirmed_email/{token}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Your email is already confirmed");

    // And the user can now log in.
    login(&app, &email, "hunter22").await;
    Ok(())
}

#[actix_web::test]
async fn confirmation_rejects_bad_tokens() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let security = state.security.clone();
    let email = unique_email("badtoken");
    create_user(&state, &email, "hunter22", false).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    // Garbage token
    let req = test::TestRequest::get()
        .uri("/api/auth/confirmed_email/not-a-jwt")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_EMAIL_TOKEN",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    // Wrong scope
    let access = mint_token(&email, TokenScope::Access, SystemTime::now(), &security)?;
    let req = test::TestRequest::get()
        .uri(&format!("/api/auth/confirmed_email/{access}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_EMAIL_TOKEN",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    // Valid token for an account that does not exist
    let ghost = email_token(&unique_email("ghost"), &security);
    let req = test::TestRequest::get()
        .uri(&format!("/api/auth/confirmed_email/{ghost}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "VERIFICATION_FAILED",
        StatusCode::BAD_REQUEST,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn request_email_and_reset_password_answer_neutrally(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let confirmed = unique_email("neutral-confirmed");
    create_user(&state, &confirmed, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    // Confirmed account asking for another confirmation email
    let req = test::TestRequest::post()
        .uri("/api/auth/request_email")
        .set_json(json!({ "email": confirmed }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Your email is already confirmed");

    // Unknown address gets the same neutral answer as a known one.
    for email in [unique_email("ghost"), confirmed.clone()] {
        let req = test::TestRequest::post()
            .uri("/api/auth/reset_password")
            .set_json(json!({ "email": email }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("Check your email"));
    }
    Ok(())
}

#[actix_web::test]
async fn password_reset_updates_hash_and_invalidates_old_password(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let security = state.security.clone();
    let email = unique_email("reset");
    create_user(&state, &email, "old-password", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let token = reset_token(&email, &security);
    let req = test::TestRequest::post()
        .uri(&format!("/api/auth/reset_password/confirm/{token}"))
        .set_json(json!({ "password": "new-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], email.as_str());

    // Old password no longer works, new one does.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "old-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    login(&app, &email, "new-password").await;
    Ok(())
}

#[actix_web::test]
async fn password_reset_confirm_rejects_bad_token_and_unknown_user(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let security = state.security.clone();
    let email = unique_email("reset-bad");
    create_user(&state, &email, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    // Wrong scope (an email confirmation token)
    let wrong_scope = mint_token(&email, TokenScope::Email, SystemTime::now(), &security)?;
    let req = test::TestRequest::post()
        .uri(&format!("/api/auth/reset_password/confirm/{wrong_scope}"))
        .set_json(json!({ "password": "new-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_RESET_TOKEN",
        StatusCode::UNPROCESSABLE_ENTITY,
        None,
    )
    .await;

    // Valid token for an account that does not exist
    let ghost = reset_token(&unique_email("ghost"), &security);
    let req = test::TestRequest::post()
        .uri(&format!("/api/auth/reset_password/confirm/{ghost}"))
        .set_json(json!({ "password": "new-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "USER_NOT_FOUND",
        StatusCode::SERVICE_UNAVAILABLE,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn reset_info_pages_answer_in_json() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    for uri in ["/api/auth/reset_password/done", "/api/auth/reset_password/complete"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["message"].is_string());
    }
    Ok(())
}
