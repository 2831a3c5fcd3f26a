mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::{unique_email, unique_phone};
use serde_json::json;
use support::{bearer, contact_json, create_test_app, create_user, login, test_state};

#[actix_web::test]
async fn contact_crud_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let owner = unique_email("owner");
    create_user(&state, &owner, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;
    let (access, _) = login(&app, &owner, "hunter22").await;

    // Create
    let payload = json!({
        "name": "Ada",
        "last_name": "Lovelace",
        "email": unique_email("ada"),
        "phone": unique_phone(),
        "birthday": "1815-12-10",
        "description": "mathematician",
    });
    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(bearer(&access))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);
    let created: serde_json::Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["birthday"], "1815-12-10");
    assert!(created.get("user_id").is_none());

    // Read
    let req = test::TestRequest::get()
        .uri(&format!("/api/contacts/{id}"))
        .insert_header(bearer(&access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);

    // Full update
    let req = test::TestRequest::put()
        .uri(&format!("/api/contacts/{id}"))
        .insert_header(bearer(&access))
        .set_json(json!({
            "name": "Ada",
            "last_name": "King",
            "email": unique_email("ada-king"),
            "phone": unique_phone(),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let updated: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(updated["last_name"], "King");
    assert!(updated["birthday"].is_null());

    // Rename only
    let req = test::TestRequest::patch()
        .uri(&format!("/api/contacts/{id}/name"))
        .insert_header(bearer(&access))
        .set_json(json!({ "name": "Augusta" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let renamed: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(renamed["name"], "Augusta");
    assert_eq!(renamed["last_name"], "King");

    // Delete returns the removed contact, then reads are 404.
    let req = test::TestRequest::delete()
        .uri(&format!("/api/contacts/{id}"))
        .insert_header(bearer(&access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let removed: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(removed["id"].as_i64(), Some(id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/contacts/{id}"))
        .insert_header(bearer(&access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "CONTACT_NOT_FOUND",
        StatusCode::NOT_FOUND,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn contacts_are_owner_scoped() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let owner = unique_email("owner");
    let other = unique_email("other");
    create_user(&state, &owner, "hunter22", true).await;
    create_user(&state, &other, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;
    let (owner_access, _) = login(&app, &owner, "hunter22").await;
    let (other_access, _) = login(&app, &other, "hunter22").await;

    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(bearer(&owner_access))
        .set_json(contact_json("Grace", &unique_email("grace"), &unique_phone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);
    let created: serde_json::Value = test::read_body_json(resp).await;
    let id = created["id"].as_i64().unwrap();

    // Another user sees a 404, exactly like a missing row.
    for build in [
        test::TestRequest::get().uri(&format!("/api/contacts/{id}")),
        test::TestRequest::delete().uri(&format!("/api/contacts/{id}")),
    ] {
        let req = build.insert_header(bearer(&other_access)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_problem_details_from_service_response(
            resp,
            "CONTACT_NOT_FOUND",
            StatusCode::NOT_FOUND,
            None,
        )
        .await;
    }

    // And the other user's list is empty.
    let req = test::TestRequest::get()
        .uri("/api/contacts")
        .insert_header(bearer(&other_access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let page: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(page["total"], 0);
    Ok(())
}

#[actix_web::test]
async fn duplicate_contacts_are_conflicts() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let owner = unique_email("owner");
    let other = unique_email("other");
    create_user(&state, &owner, "hunter22", true).await;
    create_user(&state, &other, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;
    let (owner_access, _) = login(&app, &owner, "hunter22").await;
    let (other_access, _) = login(&app, &other, "hunter22").await;

    let shared_email = unique_email("shared");
    let shared_phone = unique_phone();
    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(bearer(&owner_access))
        .set_json(json!({
            "name": "Alan",
            "last_name": "Turing",
            "email": shared_email,
            "phone": shared_phone,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);

    // Same email, same phone, or same full name for the same owner.
    let duplicates = [
        json!({ "name": "Different", "last_name": "Person", "email": shared_email, "phone": unique_phone() }),
        json!({ "name": "Different", "last_name": "Person", "email": unique_email("x"), "phone": shared_phone }),
        json!({ "name": "Alan", "last_name": "Turing", "email": unique_email("x"), "phone": unique_phone() }),
    ];
    for payload in duplicates {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(bearer(&owner_access))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_problem_details_from_service_response(
            resp,
            "DUPLICATE_CONTACT",
            StatusCode::CONFLICT,
            None,
        )
        .await;
    }

    // A different owner may store the very same contact.
    let req = test::TestRequest::post()
        .uri("/api/contacts")
        .insert_header(bearer(&other_access))
        .set_json(json!({
            "name": "Alan",
            "last_name": "Turing",
            "email": shared_email,
            "phone": shared_phone,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 201);
    Ok(())
}

#[actix_web::test]
async fn contact_validation_errors_are_422() -> Result<(), Box<dyn std::error::Error>> {
    let state = test_state().await;
    let owner = unique_email("owner");
    create_user(&state, &owner, "hunter22", true).await;
    let app = create_test_app(state).with_prod_routes().build().await?;
    let (access, _) = login(&app, &owner, "hunter22").await;

    let bad_payloads = [
        json!({ "name": "", "last_name": "X", "email": unique_email("v"), "phone": unique_phone() }),
        json!({ "name": "A".repeat(31), "last_name": "X", "email": unique_email("v"), "phone": unique_phone() }),
        json!({ "name": "A", "last_name": "X", "email": "nope", "phone": unique_phone() }),
        json!({ "name": "A", "last_name": "X", "email": unique_email("v"), "phone": unique_phone(), "birthday": "17-04-1990" }),
    ];
    for payload in bad_payloads {
        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(bearer(&access))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_problem_details_from_service_response(
            resp,
            "VALIDATION_ERROR",
            StatusCode::UNPROCESSABLE_ENTITY,
            None,
        )
        .await;
    }
    Ok(())
}
