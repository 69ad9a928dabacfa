//! Catalog flows driven through the HTTP router

mod common;

use axum::{http::StatusCode, Router};
use serde_json::{json, Value};

use common::{body_json, build_app_with, build_test_app, get, id_of, location, post_json};
use lectern_server::config::AppConfig;

async fn create(app: &Router, uri: &str, body: Value) -> String {
    let response = post_json(app, uri, body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "POST {} was not saved", uri);
    id_of(&location(&response))
}

async fn create_author(app: &Router, first: &str, family: &str) -> String {
    create(
        app,
        "/catalog/author/create",
        json!({"first_name": first, "family_name": family, "date_of_birth": "1929-10-21"}),
    )
    .await
}

async fn create_genre(app: &Router, name: &str) -> String {
    create(app, "/catalog/genre/create", json!({"name": name})).await
}

async fn create_book(app: &Router, title: &str, author: &str, genre: Value) -> String {
    create(
        app,
        "/catalog/book/create",
        json!({"title": title, "summary": "S", "isbn": "123", "author": author, "genre": genre}),
    )
    .await
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_test_app();
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn author_without_books_can_be_deleted() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;

    let response = post_json(&app, &format!("/catalog/author/{}/delete", author), json!({})).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/catalog/authors");

    let response = get(&app, &format!("/catalog/author/{}", author)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Author not found");
}

#[tokio::test]
async fn author_with_books_is_not_deleted() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let first = create_book(&app, "The Dispossessed", &author, json!([])).await;
    let second = create_book(&app, "The Word for World Is Forest", &author, json!([])).await;

    let response = post_json(&app, &format!("/catalog/author/{}/delete", author), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(page["view"], "author_delete");
    let mut blocking: Vec<&str> = page["data"]["author_books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_str().unwrap())
        .collect();
    blocking.sort();
    let mut expected = vec![first.as_str(), second.as_str()];
    expected.sort();
    assert_eq!(blocking, expected);

    let response = get(&app, &format!("/catalog/author/{}", author)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn genre_create_reuses_existing_name() {
    let app = build_test_app();
    let first = create_genre(&app, "Fantasy").await;
    let second = create_genre(&app, " Fantasy ").await;
    assert_eq!(first, second);

    let page = body_json(get(&app, "/catalog/genres").await).await;
    assert_eq!(page["data"]["genre_list"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_book_form_keeps_selected_genres() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let fantasy = create_genre(&app, "Fantasy").await;
    let _poetry = create_genre(&app, "Poetry").await;
    let scifi = create_genre(&app, "Science Fiction").await;

    let submission = json!({
        "title": "",
        "summary": "S",
        "isbn": "123",
        "author": author,
        "genre": [fantasy, scifi],
    });

    let mut pages = Vec::new();
    for _ in 0..2 {
        let response = post_json(&app, "/catalog/book/create", submission.clone()).await;
        assert_eq!(response.status(), StatusCode::OK);
        pages.push(body_json(response).await);
    }
    assert_eq!(pages[0], pages[1]);

    let page = &pages[0];
    assert_eq!(page["view"], "book_form");
    let mut selected: Vec<&str> = page["data"]["genres"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|genre| genre["selected"] == true)
        .map(|genre| genre["id"].as_str().unwrap())
        .collect();
    selected.sort();
    let mut expected = vec![fantasy.as_str(), scifi.as_str()];
    expected.sort();
    assert_eq!(selected, expected);

    let errors = page["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "title");
    assert_eq!(errors[0]["message"], "Book must have title");

    let candidate = &page["data"]["book"];
    assert_eq!(candidate["summary"], "S");
    assert_eq!(candidate["isbn"], "123");
    assert_eq!(candidate["author"], author.as_str());

    let books = body_json(get(&app, "/catalog/books").await).await;
    assert!(books["data"]["book_list"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_book_without_genres_has_empty_selection() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    create_genre(&app, "Fantasy").await;

    let response = post_json(
        &app,
        "/catalog/book/create",
        json!({"title": "", "summary": "S", "isbn": "123", "author": author, "genre": []}),
    )
    .await;
    let page = body_json(response).await;

    assert_eq!(page["data"]["book"]["genre"], json!([]));
    assert!(page["data"]["genres"]
        .as_array()
        .unwrap()
        .iter()
        .all(|genre| genre["selected"] == false));
}

#[tokio::test]
async fn single_genre_value_is_accepted() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let fantasy = create_genre(&app, "Fantasy").await;
    let book = create_book(&app, "A Wizard of Earthsea", &author, json!(fantasy)).await;

    let page = body_json(get(&app, &format!("/catalog/book/{}", book)).await).await;
    assert_eq!(page["view"], "book_detail");
    assert_eq!(page["data"]["book"]["genre"][0]["name"], "Fantasy");
    assert_eq!(page["data"]["book"]["author"]["name"], "LeGuin, Ursula");
}

#[tokio::test]
async fn book_instance_list_expands_book() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let book = create_book(&app, "Earthsea", &author, json!([])).await;
    for status in ["Available", "Loaned"] {
        create(
            &app,
            "/catalog/bookinstance/create",
            json!({"book": book, "imprint": "Parnassus, 1968", "status": status, "due_back": "2024-03-09"}),
        )
        .await;
    }

    let page = body_json(get(&app, "/catalog/bookinstances").await).await;
    let copies = page["data"]["bookinstance_list"].as_array().unwrap();
    assert_eq!(copies.len(), 2);
    for copy in copies {
        assert_eq!(copy["book"]["title"], "Earthsea");
        assert_eq!(copy["due_back_formatted"], "Mar 9, 2024");
    }

    let index = body_json(get(&app, "/catalog").await).await;
    assert_eq!(index["view"], "index");
    assert_eq!(index["data"]["book_instance_count"], 2);
    assert_eq!(index["data"]["book_instance_available_count"], 1);
}

#[tokio::test]
async fn missing_author_detail_is_not_found() {
    let app = build_test_app();
    let response = get(
        &app,
        "/catalog/author/6a0f4c54-2f0e-4b8c-9a53-1d3c8a7e9b10",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Author not found");
}

#[tokio::test]
async fn book_with_copies_is_guarded() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let book = create_book(&app, "Earthsea", &author, json!([])).await;
    create(
        &app,
        "/catalog/bookinstance/create",
        json!({"book": book, "imprint": "Parnassus, 1968", "status": "Available"}),
    )
    .await;

    let response = post_json(&app, &format!("/catalog/book/{}/delete", book), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["view"], "book_delete");
}

#[tokio::test]
async fn lenient_policy_allows_dangling_references() {
    let mut config = AppConfig::default();
    config.catalog.strict_references = false;
    config.catalog.guard_book_removal = false;
    let app = build_app_with(config);

    let book = create_book(
        &app,
        "Orphan",
        "6a0f4c54-2f0e-4b8c-9a53-1d3c8a7e9b10",
        json!(["0e7b2a9c-5d1f-4f7e-8a6b-3c2d1e0f9a8b"]),
    )
    .await;
    create(
        &app,
        "/catalog/bookinstance/create",
        json!({"book": book, "imprint": "Self, 2024", "status": "Reserved"}),
    )
    .await;

    let response = post_json(&app, &format!("/catalog/book/{}/delete", book), json!({})).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn strict_policy_rejects_unknown_author() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/catalog/book/create",
        json!({
            "title": "Orphan",
            "summary": "S",
            "isbn": "123",
            "author": "6a0f4c54-2f0e-4b8c-9a53-1d3c8a7e9b10",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["data"]["errors"][0]["message"], "Author does not exist");
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = build_test_app();
    let response = get(&app, "/catalog/author/not-a-uuid").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "BadValue");
}

#[tokio::test]
async fn non_object_form_body_is_rejected() {
    let app = build_test_app();
    let response = post_json(&app, "/catalog/genre/create", json!(["Fantasy"])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = get(&app, "/catalog/genres").await;
    assert_eq!(body_json(response).await["data"]["genre_list"], json!([]));
}

#[tokio::test]
async fn null_due_back_reads_as_absent() {
    let app = build_test_app();
    let author = create_author(&app, "Ursula", "LeGuin").await;
    let book = create_book(&app, "The Lathe of Heaven", &author, json!([])).await;

    let copy = create(
        &app,
        "/catalog/bookinstance/create",
        json!({"book": book, "imprint": "Scribner, 1971", "status": "Available", "due_back": null}),
    )
    .await;

    let page = body_json(get(&app, &format!("/catalog/bookinstance/{}", copy)).await).await;
    assert_eq!(page["data"]["bookinstance"]["due_back"], Value::Null);
}
