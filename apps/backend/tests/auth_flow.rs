mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_email;
use serde_json::json;
use support::{bearer, create_test_app, create_user, login, test_state};

#[actix_web::test]
async fn signup_creates_user_and_rejects_duplicates() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let email = unique_email("signup");
    let payload = json!({
        "username": "alice",
        "email": email,
        "password": "hunter22",
    });

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["confirmed"], false);
    assert!(body["user"].get("password_hash").is_none());

    // New accounts start with a Gravatar-derived avatar.
    let avatar = body["user"]["avatar_url"].as_str().unwrap();
    assert!(avatar.starts_with("https://www.gravatar.com/avatar/"));

    // Same email again is a conflict.
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ACCOUNT_EXISTS",
        StatusCode::CONFLICT,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn signup_validates_input() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "username": "bob", "email": "not-an-email", "password": "hunter22" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "VALIDATION_ERROR",
        StatusCode::UNPROCESSABLE_ENTITY,
        Some("email"),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "username": "bob", "email": unique_email("short"), "password": "abc" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "VALIDATION_ERROR",
        StatusCode::UNPROCESSABLE_ENTITY,
        Some("Password"),
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn login_rejects_unknown_unconfirmed_and_wrong_password(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let unconfirmed = unique_email("unconfirmed");
    let confirmed = unique_email("confirmed");
    create_user(&state, &unconfirmed, "hunter22", false).await;
    create_user(&state, &confirmed, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    // Unknown email
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": unique_email("ghost"), "password": "hunter22" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_CREDENTIALS",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;

    // Unconfirmed account
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": unconfirmed, "password": "hunter22" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "EMAIL_NOT_CONFIRMED",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": confirmed, "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_CREDENTIALS",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn login_returns_bearer_pair_and_me_works() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let email = unique_email("login");
    create_user(&state, &email, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": "hunter22" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
    let access = body["access_token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let me: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(me["email"], email.as_str());
    assert!(me.get("password_hash").is_none());
    Ok(())
}

#[actix_web::test]
async fn refresh_rotates_and_mismatch_clears_stored_token(
) -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let email = unique_email("refresh");
    create_user(&state, &email, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let (_, refresh1) = login(&app, &email, "hunter22").await;

    // Rotation: the first refresh succeeds and stores a new token.
    let req = test::TestRequest::get()
        .uri("/api/auth/refresh_token")
        .insert_header(bearer(&refresh1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let refresh2 = body["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(refresh1, refresh2);

    // Replaying the rotated-out token is rejected and clears the stored one.
    let req = test::TestRequest::get()
        .uri("/api/auth/refresh_token")
        .insert_header(bearer(&refresh1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_REFRESH_TOKEN",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;

    // Even the latest token is now dead: the row was wiped.
    let req = test::TestRequest::get()
        .uri("/api/auth/refresh_token")
        .insert_header(bearer(&refresh2))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_REFRESH_TOKEN",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn access_token_is_not_a_refresh_token() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let email = unique_email("scopes");
    create_user(&state, &email, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;

    let (access, refresh) = login(&app, &email, "hunter22").await;

    // Access token on the refresh endpoint
    let req = test::TestRequest::get()
        .uri("/api/auth/refresh_token")
        .insert_header(bearer(&access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_REFRESH_TOKEN",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;

    // Refresh token on a protected endpoint
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&refresh))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "UNAUTHORIZED_INVALID_JWT",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;

    // No header at all
    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "UNAUTHORIZED_MISSING_BEARER",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;
    Ok(())
}
