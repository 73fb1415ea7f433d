//! E2E tests for quizzes and flashcards

mod common;

use common::TestServer;
use serde_json::{Value, json};

fn sample_quiz() -> Value {
    json!({
        "title": "Monastery basics",
        "category": "History",
        "difficulty": "easy",
        "questions": [
            {
                "prompt": "Which lineage does Rumtek belong to?",
                "options": ["Nyingma", "Kagyu", "Gelug"],
                "correct_index": 1,
                "explanation": "Rumtek is the seat of the Karmapa."
            },
            {
                "prompt": "What is a mani wheel?",
                "options": ["A prayer wheel", "A drum"],
                "correct_index": 0
            }
        ]
    })
}

#[tokio::test]
async fn test_quiz_lifecycle() {
    let server = TestServer::new().await;
    let admin_token = server.admin_token().await;

    let response = server
        .client
        .post(server.url("/education/quizzes"))
        .bearer_auth(&admin_token)
        .json(&sample_quiz())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let json: Value = response.json().await.unwrap();
    let id = json["data"]["id"].as_str().unwrap().to_string();

    // Public view hides answers
    let response = server
        .client
        .get(server.url(&format!("/education/quizzes/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    let questions = json["data"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        assert!(question.get("correct_index").is_none());
        assert!(question.get("explanation").is_none());
    }

    let response = server
        .client
        .post(server.url(&format!("/education/quizzes/{}/submit", id)))
        .json(&json!({ "answers": [1, 1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["score"], 1);
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["percentage"], 50.0);
    assert_eq!(json["data"]["results"][0]["correct"], true);
    assert_eq!(
        json["data"]["results"][0]["explanation"],
        "Rumtek is the seat of the Karmapa."
    );
    assert_eq!(json["data"]["results"][1]["correct"], false);

    let response = server
        .client
        .get(server.url("/education/quizzes?category=history"))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["count"], 1);

    let response = server
        .client
        .delete(server.url(&format!("/education/quizzes/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_invalid_quiz_is_rejected() {
    let server = TestServer::new().await;
    let admin_token = server.admin_token().await;

    let bad_quizzes = [
        json!({ "title": "Empty", "category": "History", "questions": [] }),
        json!({
            "title": "One option",
            "category": "History",
            "questions": [{ "prompt": "?", "options": ["Only"], "correct_index": 0 }]
        }),
        json!({
            "title": "Out of range",
            "category": "History",
            "questions": [{ "prompt": "?", "options": ["A", "B"], "correct_index": 2 }]
        }),
    ];

    for quiz in bad_quizzes {
        let response = server
            .client
            .post(server.url("/education/quizzes"))
            .bearer_auth(&admin_token)
            .json(&quiz)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "quiz: {}", quiz["title"]);
    }
}

#[tokio::test]
async fn test_quiz_creation_requires_admin() {
    let server = TestServer::new().await;
    let (_, monk_token) = server.create_monk("Lama Quiz", "Rumtek Monastery").await;

    let response = server
        .client
        .post(server.url("/education/quizzes"))
        .bearer_auth(&monk_token)
        .json(&sample_quiz())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_flashcards() {
    let server = TestServer::new().await;
    let admin_token = server.admin_token().await;

    for (front, category) in [("Thangka", "Art"), ("Chorten", "Architecture")] {
        let response = server
            .client
            .post(server.url("/education/flashcards"))
            .bearer_auth(&admin_token)
            .json(&json!({ "front": front, "back": "Explained", "category": category }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let response = server
        .client
        .get(server.url("/education/flashcards?category=art"))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["front"], "Thangka");

    let id = json["data"][0]["id"].as_str().unwrap().to_string();
    let response = server
        .client
        .get(server.url(&format!("/education/flashcards/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = server
        .client
        .get(server.url("/education/flashcards"))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["count"], 2);
}
