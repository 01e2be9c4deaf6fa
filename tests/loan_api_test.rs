mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use library_api::{lending::ALREADY_RETURNED_MESSAGE, tracing::REQUEST_ID_HEADER};
use serde_json::json;

async fn issue(app: &TestApp, book_id: i32, student_id: i32, quantity: i32) -> axum::response::Response {
    app.as_librarian(
        Method::POST,
        "/api/v1/loans",
        Some(json!({ "book_id": book_id, "student_id": student_id, "quantity": quantity })),
    )
    .await
}

#[tokio::test]
async fn issue_then_return_over_http() {
    let app = TestApp::new().await;
    let book = app.seed_book("9780100000001", 5).await;
    let student = app.seed_student("Lena", "S-500").await;

    let response = issue(&app, book.id, student.id, 3).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["message"],
        json!(format!("Book '{}' issued to 'Lena' (3 copies)", book.title))
    );
    assert_eq!(body["data"]["available_stock"], json!(2));
    assert_eq!(body["data"]["outstanding"], json!(3));
    assert_eq!(body["data"]["status"], json!("active"));
    let loan_id = body["data"]["loan_id"].as_i64().unwrap();

    let response = app
        .as_librarian(
            Method::POST,
            &format!("/api/v1/loans/{}/return", loan_id),
            Some(json!({ "quantity": 3 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        json!(format!("'3' copy/copies of '{}' returned successfully!", book.title))
    );
    assert_eq!(body["data"]["receipt"]["status"], json!("returned"));
    assert_eq!(body["data"]["receipt"]["available_stock"], json!(5));
    assert!(body["data"]["receipt"]["return_date"].is_string());

    let response = app
        .as_librarian(
            Method::POST,
            &format!("/api/v1/loans/{}/return", loan_id),
            Some(json!({ "quantity": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!(ALREADY_RETURNED_MESSAGE));
    assert_eq!(body["data"]["already_returned"], json!(true));
    assert_eq!(body["data"]["returned_quantity"], json!(0));
}

#[tokio::test]
async fn lending_errors_carry_codes_and_counts() {
    let app = TestApp::new().await;
    let book = app.seed_book("9780100000002", 2).await;
    let student = app.seed_student("Milo", "S-501").await;

    let response = issue(&app, book.id, student.id, 3).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("insufficient_stock"));
    assert_eq!(body["details"]["available"], json!(2));

    let response = issue(&app, book.id, student.id, 0).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], json!("invalid_quantity"));

    let response = issue(&app, 9_999, student.id, 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let loan_id = body_json(issue(&app, book.id, student.id, 2).await).await["data"]["loan_id"]
        .as_i64()
        .unwrap();
    let response = app
        .as_librarian(
            Method::POST,
            &format!("/api/v1/loans/{}/return", loan_id),
            Some(json!({ "quantity": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("excess_return"));
    assert_eq!(body["details"]["outstanding"], json!(2));
    assert_eq!(body["message"], json!("Cannot return more than 2 copies!"));
}

#[tokio::test]
async fn librarian_pages_require_identity_and_role() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/loans", None, Some(("Nora", "student")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], json!("forbidden"));

    let response = app
        .request(
            Method::GET,
            "/api/v1/dashboard/student",
            None,
            Some(("Nora", "student")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        json!("No student profile found for your account. Please contact the librarian.")
    );
}

#[tokio::test]
async fn catalog_crud_and_filters_over_http() {
    let app = TestApp::new().await;

    let response = app
        .as_librarian(
            Method::POST,
            "/api/v1/books",
            Some(json!({ "title": "Dune", "author": "Frank Herbert", "isbn": "9780441013593" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("Book 'Dune' created successfully!"));
    assert_eq!(body["data"]["quantity"], json!(1));
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .as_librarian(
            Method::POST,
            "/api/v1/books",
            Some(json!({ "title": "Dune II", "author": "Frank Herbert", "isbn": "9780441013593" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .as_librarian(
            Method::PUT,
            &format!("/api/v1/books/{}", id),
            Some(json!({ "quantity": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(
        app.as_librarian(Method::GET, "/api/v1/books?status=unavailable", None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["filter_status"], json!("unavailable"));
    assert_eq!(body["data"]["books"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["available_books"], json!(0));

    let response = app
        .as_librarian(Method::DELETE, &format!("/api/v1/books/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        json!("Book 'Dune' deleted successfully!")
    );

    let response = app
        .as_librarian(Method::GET, &format!("/api/v1/books/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_echoed_and_health_reports_database() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/health", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = body_json(response).await;
    assert_eq!(body["database"], json!("up"));

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/v1/loans"].is_object());
}

#[tokio::test]
async fn malformed_quantities_use_the_error_body() {
    let app = TestApp::new().await;
    let book = app.seed_book("9780100000003", 3).await;
    let student = app.seed_student("Ona", "S-502").await;

    let response = app
        .as_librarian(
            Method::POST,
            "/api/v1/loans",
            Some(json!({ "book_id": book.id, "student_id": student.id, "quantity": "two" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("invalid_quantity"));
    assert!(body["request_id"].is_string());

    let loan_id = body_json(issue(&app, book.id, student.id, 1).await).await["data"]["loan_id"]
        .as_i64()
        .unwrap();
    let response = app
        .as_librarian(
            Method::POST,
            &format!("/api/v1/loans/{}/return", loan_id),
            Some(json!({ "quantity": 1.5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], json!("invalid_quantity"));

    let response = app
        .as_librarian(
            Method::POST,
            "/api/v1/loans",
            Some(json!({ "book_id": book.id, "quantity": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], json!("validation_error"));

    let response = app.as_librarian(Method::GET, "/api/v1/loans/abc", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], json!("validation_error"));

    let shelf = app.state.services.catalog.get_book(book.id).await.unwrap();
    assert_eq!(shelf.quantity, 2);
}

#[tokio::test]
async fn issuing_to_an_unknown_student_is_not_found_and_lends_nothing() {
    let app = TestApp::new().await;
    let book = app.seed_book("9780100000004", 3).await;

    let response = issue(&app, book.id, 4_242, 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("not_found"));
    assert_eq!(body["message"], json!("Not found: Student 4242 not found"));

    let shelf = app.state.services.catalog.get_book(book.id).await.unwrap();
    assert_eq!(shelf.quantity, 3);
}
