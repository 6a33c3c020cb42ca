//! Chapter reorder API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use std::collections::BTreeSet;

use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::fixtures;
use common::TestContext;
use toc_core::{ReorderItem, DEFAULT_RENUMBER_OFFSET, MAX_CHAPTER_NUMBER};

fn mapping(body: &Value) -> Vec<(i64, i64)> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            (
                item["id"].as_i64().unwrap(),
                item["chapter_number"].as_i64().unwrap(),
            )
        })
        .collect()
}

/// Reversing the rotation of three chapters renumbers every row.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_rotates_chapters() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 3).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [{ "id": c }, { "id": a }, { "id": b }] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(mapping(&body), vec![(c, 1), (a, 2), (b, 3)]);

    let rows = ctx.chapter_rows(book_id).await;
    let stored: Vec<(i64, i32)> = rows.iter().map(|(id, n, _)| (*id, *n)).collect();
    assert_eq!(stored, vec![(c, 1), (a, 2), (b, 3)]);

    ctx.cleanup_book(book_id).await;
}

/// A permutation leaves numbers 1..=N with no gaps or duplicates.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_permutation_is_dense() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 6).await;
    let order: Vec<i64> = vec![ids[4], ids[0], ids[5], ids[2], ids[1], ids[3]];

    server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!(order))
        .await
        .assert_status_ok();

    let rows = ctx.chapter_rows(book_id).await;
    let numbers: BTreeSet<i32> = rows.iter().map(|(_, n, _)| *n).collect();
    assert_eq!(numbers, (1..=6).collect::<BTreeSet<i32>>());
    for (position, id) in order.iter().enumerate() {
        let row = rows.iter().find(|(row_id, _, _)| row_id == id).unwrap();
        assert_eq!(row.1, position as i32 + 1);
    }

    ctx.cleanup_book(book_id).await;
}

/// Submitting the same ordering twice yields the same mapping.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_is_idempotent() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 4).await;
    let payload = json!({ "items": [ids[3], ids[1], ids[0], ids[2]] });
    let url = format!("/api/admin/books/{}/chapters/reorder", book_id);

    let first: Value = server.put(&url).json(&payload).await.json();
    let second: Value = server.put(&url).json(&payload).await.json();

    assert_eq!(mapping(&first), mapping(&second));

    ctx.cleanup_book(book_id).await;
}

/// Content numbering follows the row after a reorder.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_syncs_content() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 3).await;

    server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [ids[2], ids[1], ids[0]] }))
        .await
        .assert_status_ok();

    for (id, number, content) in ctx.chapter_rows(book_id).await {
        assert_eq!(content["chapterNumber"], number);
        assert_eq!(content["chapter_number"], number);
        assert_eq!(content["meta"]["chapterNumber"], number);
        assert_eq!(content["meta"]["chapter_number"], number);
        assert_eq!(content["meta"]["chapter_id"], id);
        // Untouched keys survive.
        assert!(content["chapterTitle"].is_string());
    }

    ctx.cleanup_book(book_id).await;
}

/// Chapters missing from the payload are appended in their old order.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_appends_unmentioned() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 4).await;

    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [{ "id": ids[2] }] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        mapping(&body),
        vec![(ids[2], 1), (ids[0], 2), (ids[1], 3), (ids[3], 4)]
    );

    ctx.cleanup_book(book_id).await;
}

/// Explicit numbers are honored; the TOC follows the new numbering.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_explicit_numbers_rebuilds_toc() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx
        .create_test_book(Some(&fixtures::toc_with_phases(&[&[1, 2], &[3]])))
        .await;
    let ids = ctx.insert_chapters(book_id, 3).await;

    server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [
            { "id": ids[0], "chapter_number": 1 },
            { "id": ids[1], "chapter_number": 2 },
            { "id": ids[2], "chapter_number": 10 },
        ] }))
        .await
        .assert_status_ok();

    let toc = ctx.stored_toc(book_id).await.unwrap();
    assert_eq!(fixtures::phase_numbers(&toc), vec![vec![1, 2], vec![10]]);
    assert_eq!(toc["totalChapters"], 3);

    ctx.cleanup_book(book_id).await;
}

/// Malformed payloads are rejected before anything is written.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_bad_request() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    ctx.insert_chapters(book_id, 2).await;
    let url = format!("/api/admin/books/{}/chapters/reorder", book_id);

    for payload in [json!({ "items": [] }), json!({ "order": [1] }), json!("1,2")] {
        let response = server.put(&url).json(&payload).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let numbers: Vec<i32> = ctx.chapter_rows(book_id).await.iter().map(|r| r.1).collect();
    assert_eq!(numbers, vec![1, 2]);

    ctx.cleanup_book(book_id).await;
}

/// Two items claiming the same number conflict and roll back.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_duplicate_number_conflicts() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 2).await;

    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [
            { "id": ids[0], "chapter_number": 5 },
            { "id": ids[1], "chapter_number": 5 },
        ] }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let stored: Vec<(i64, i32)> = ctx
        .chapter_rows(book_id)
        .await
        .iter()
        .map(|(id, n, _)| (*id, *n))
        .collect();
    assert_eq!(stored, vec![(ids[0], 1), (ids[1], 2)]);

    ctx.cleanup_book(book_id).await;
}

/// A book without chapters cannot be reordered.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_empty_book() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;

    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [1] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
    assert_eq!(
        body["message"],
        format!("Not found: No chapters found for book {}", book_id)
    );

    ctx.cleanup_book(book_id).await;
}

/// A missing book is reported as such, not as an empty one.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_missing_book() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", i64::MAX))
        .json(&json!({ "items": [1] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], format!("Not found: Book {}", i64::MAX));
}

/// A failure after the bump phase leaves numbers, content and TOC untouched.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_failure_after_bump_rolls_back() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx
        .create_test_book(Some(&fixtures::toc_with_phases(&[&[1, 2], &[3]])))
        .await;
    let ids = ctx.insert_chapters(book_id, 3).await;
    ctx.db.rebuild_toc(book_id).await.unwrap();

    let rows_before = ctx.chapter_rows(book_id).await;
    let toc_before = ctx.stored_toc(book_id).await;

    ctx.reject_chapter_writes_below(book_id, DEFAULT_RENUMBER_OFFSET).await;
    let response = server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [ids[2], ids[1], ids[0]] }))
        .await;
    ctx.allow_chapter_writes(book_id).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "database_error");

    assert_eq!(ctx.chapter_rows(book_id).await, rows_before);
    assert_eq!(ctx.stored_toc(book_id).await, toc_before);

    // The same reorder succeeds once writes are allowed again.
    server
        .put(&format!("/api/admin/books/{}/chapters/reorder", book_id))
        .json(&json!({ "items": [ids[2], ids[1], ids[0]] }))
        .await
        .assert_status_ok();

    ctx.cleanup_book(book_id).await;
}

/// Concurrent reorders of one book serialize; the result is one of them, dense.
#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_reorders_serialize() {
    let ctx = TestContext::new().await;
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 5).await;

    let reversed: Vec<ReorderItem> = ids
        .iter()
        .rev()
        .map(|&id| ReorderItem { id, chapter_number: None })
        .collect();
    let rotated: Vec<ReorderItem> = ids[1..]
        .iter()
        .chain(&ids[..1])
        .map(|&id| ReorderItem { id, chapter_number: None })
        .collect();

    let (first, second) = tokio::join!(
        ctx.db.reorder_chapters(book_id, &reversed),
        ctx.db.reorder_chapters(book_id, &rotated),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    let rows = ctx.chapter_rows(book_id).await;
    let numbers: BTreeSet<i32> = rows.iter().map(|(_, n, _)| *n).collect();
    assert_eq!(numbers, (1..=5).collect::<BTreeSet<i32>>());

    let mut stored: Vec<(i64, i32)> = rows.iter().map(|(id, n, _)| (*id, *n)).collect();
    stored.sort();
    let sorted = |plan: &toc_core::ReorderPlan| {
        let mut pairs: Vec<(i64, i32)> = plan
            .assignments
            .iter()
            .map(|a| (a.id, a.chapter_number))
            .collect();
        pairs.sort();
        pairs
    };
    assert!(stored == sorted(&first) || stored == sorted(&second));

    for (id, number, content) in rows {
        assert_eq!(content["chapterNumber"], number);
        assert_eq!(content["meta"]["chapter_id"], id);
    }

    let toc = ctx.stored_toc(book_id).await.unwrap();
    assert_eq!(fixtures::phase_numbers(&toc), vec![vec![1, 2, 3, 4, 5]]);

    ctx.cleanup_book(book_id).await;
}

/// Explicit numbers beyond the allowed range are rejected before any write.
#[tokio::test]
#[ignore = "requires database"]
async fn test_reorder_number_out_of_range() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let book_id = ctx.create_test_book(None).await;
    let ids = ctx.insert_chapters(book_id, 3).await;
    let url = format!("/api/admin/books/{}/chapters/reorder", book_id);

    let response = server
        .put(&url)
        .json(&json!({ "items": [{ "id": ids[0], "chapter_number": i32::MAX }] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let numbers: Vec<i32> = ctx.chapter_rows(book_id).await.iter().map(|r| r.1).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    let response = server
        .put(&url)
        .json(&json!({ "items": [{ "id": ids[0], "chapter_number": MAX_CHAPTER_NUMBER }] }))
        .await;
    response.assert_status_ok();
    let numbers: Vec<i32> = ctx.chapter_rows(book_id).await.iter().map(|r| r.1).collect();
    assert_eq!(numbers, vec![2, 3, MAX_CHAPTER_NUMBER]);

    ctx.cleanup_book(book_id).await;
}
