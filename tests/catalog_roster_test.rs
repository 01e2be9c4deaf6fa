mod common;

use assert_matches::assert_matches;
use common::{lending_day, TestApp};
use library_api::{
    commands::loans::IssueBookCommand,
    entities::{Department, IssuedBook},
    errors::ServiceError,
    repositories::BookAvailability,
    services::{CreateBookRequest, UpdateBookRequest, UpdateStudentRequest},
    services::dashboard::NO_STUDENT_PROFILE_MESSAGE,
};
use sea_orm::EntityTrait;

#[tokio::test]
async fn duplicate_isbn_and_id_number_conflict() {
    let app = TestApp::new().await;
    app.seed_book("9781111111111", 1).await;
    app.seed_student("Fay", "S-100").await;

    let err = app
        .state
        .services
        .catalog
        .create_book(CreateBookRequest {
            title: "Another".into(),
            author: "Someone".into(),
            isbn: "9781111111111".into(),
            quantity: 2,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let other = app.seed_student("Gus", "S-101").await;
    let err = app
        .state
        .services
        .roster
        .update_student(
            other.id,
            UpdateStudentRequest {
                id_number: Some("S-100".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn blank_title_fails_validation() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .catalog
        .create_book(CreateBookRequest {
            title: "   ".into(),
            author: "Someone".into(),
            isbn: "9782222222222".into(),
            quantity: 1,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn availability_filter_splits_the_catalog() {
    let app = TestApp::new().await;
    let stocked = app.seed_book("9783333333331", 2).await;
    let empty = app.seed_book("9783333333332", 0).await;
    let catalog = &app.state.services.catalog;

    let all = catalog.list_books(BookAvailability::All).await.unwrap();
    assert_eq!(all.books.len(), 2);
    assert_eq!(all.total_books, 2);
    assert_eq!(all.available_books, 1);
    // Newest first
    assert_eq!(all.books[0].id, empty.id);

    let available = catalog.list_books(BookAvailability::Available).await.unwrap();
    assert_eq!(available.books.len(), 1);
    assert_eq!(available.books[0].id, stocked.id);

    let unavailable = catalog.list_books(BookAvailability::Unavailable).await.unwrap();
    assert_eq!(unavailable.books.len(), 1);
    assert_eq!(unavailable.books[0].id, empty.id);
}

#[tokio::test]
async fn librarian_edit_sets_shelf_count() {
    let app = TestApp::new().await;
    let book = app.seed_book("9784444444444", 2).await;

    let updated = app
        .state
        .services
        .catalog
        .update_book(
            book.id,
            UpdateBookRequest {
                quantity: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.quantity, 7);
    assert_eq!(updated.title, book.title);
}

#[tokio::test]
async fn deleting_a_book_or_student_removes_their_loans() {
    let app = TestApp::new().await;
    let book = app.seed_book("9785555555555", 5).await;
    let other_book = app.seed_book("9785555555556", 5).await;
    let student = app.seed_student("Hal", "S-200").await;
    let loans = &app.state.services.loans;

    loans
        .issue_book_on(IssueBookCommand::new(book.id, student.id, 1), lending_day())
        .await
        .unwrap();
    loans
        .issue_book_on(IssueBookCommand::new(other_book.id, student.id, 1), lending_day())
        .await
        .unwrap();

    app.state.services.catalog.delete_book(book.id).await.unwrap();
    let remaining = IssuedBook::find().all(app.state.db.as_ref()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].book_id, other_book.id);

    app.state.services.roster.delete_student(student.id).await.unwrap();
    assert!(IssuedBook::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .is_empty());

    let err = app.state.services.catalog.get_book(book.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
    let err = app.state.services.roster.delete_student(student.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn student_detail_separates_active_loans() {
    let app = TestApp::new().await;
    let book = app.seed_book("9786666666666", 5).await;
    let student = app.seed_student("Ivy", "S-300").await;
    let loans = &app.state.services.loans;

    let first = loans
        .issue_book_on(IssueBookCommand::new(book.id, student.id, 1), lending_day())
        .await
        .unwrap();
    loans
        .issue_book_on(IssueBookCommand::new(book.id, student.id, 2), lending_day())
        .await
        .unwrap();
    loans
        .return_book_on(first.loan.id, 1, lending_day())
        .await
        .unwrap();

    let detail = app.state.services.roster.student_detail(student.id).await.unwrap();
    assert_eq!(detail.loans.len(), 2);
    assert_eq!(detail.active_count(), 1);
    assert_eq!(detail.student.department, Department::Science);
}

#[tokio::test]
async fn dashboards_summarise_the_library() {
    let app = TestApp::new().await;
    let book = app.seed_book("9787777777777", 3).await;
    app.seed_book("9787777777778", 0).await;
    let student = app.seed_student("Jo", "S-400").await;
    app.seed_student("Kim", "S-401").await;

    app.state
        .services
        .loans
        .issue_book_on(IssueBookCommand::new(book.id, student.id, 2), lending_day())
        .await
        .unwrap();

    let dashboard = app
        .state
        .services
        .dashboard
        .librarian_dashboard()
        .await
        .unwrap();
    assert_eq!(dashboard.total_books, 2);
    assert_eq!(dashboard.total_students, 2);
    assert_eq!(dashboard.available_books, 1);
    assert_eq!(dashboard.active_issues, 1);
    assert_eq!(dashboard.recent_issues.len(), 1);
    assert_eq!(dashboard.recent_issues[0].student_name.as_deref(), Some("Jo"));
    assert_eq!(
        dashboard.recent_issues[0].book_title.as_deref(),
        Some(book.title.as_str())
    );

    let mine = app
        .state
        .services
        .dashboard
        .student_dashboard("Jo", BookAvailability::Available)
        .await
        .unwrap();
    assert!(mine.message.is_none());
    assert_eq!(mine.total_borrowed, 1);
    assert_eq!(mine.active_loans.len(), 1);
    assert_eq!(mine.books.len(), 1);

    let stranger = app
        .state
        .services
        .dashboard
        .student_dashboard("nobody", BookAvailability::All)
        .await
        .unwrap();
    assert!(stranger.student.is_none());
    assert_eq!(stranger.message.as_deref(), Some(NO_STUDENT_PROFILE_MESSAGE));
    assert_eq!(stranger.books.len(), 2);
}
