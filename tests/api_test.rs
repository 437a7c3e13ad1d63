mod common;

use axum::http::StatusCode;
use common::{diabetes_form, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["models"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_signup_login_logout() {
    let app = TestApp::new();
    let token = app.signup("alice").await;

    let (status, me) = app.get("/v1/accounts/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert!(me.get("password_hash").is_none());

    // Usernames are unique regardless of case
    let (status, _) = app
        .post(
            "/v1/accounts/signup",
            None,
            json!({"username": "Alice", "email": "a2@example.com", "password": "another-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            "/v1/accounts/login",
            None,
            json!({"username": "alice", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/v1/accounts/login",
            None,
            json!({"username": "alice", "password": "correct-horse-battery"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(axum::http::Method::POST, "/v1/accounts/logout", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/v1/accounts/me", Some(&second)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The first session is unaffected
    let (status, _) = app.get("/v1/accounts/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_public_disease_pages() {
    let app = TestApp::new();

    let (status, diseases) = app.get("/v1/diseases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(diseases.as_array().unwrap().len(), 5);

    let (status, detail) = app.get("/v1/diseases/heart_disease", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["disease"]["name"], "Heart Disease");
    assert_eq!(detail["form"].as_array().unwrap().len(), 6);
    assert_eq!(detail["average_rating"], 0.0);
    assert!(!detail["symptoms"].as_array().unwrap().is_empty());

    let (status, _) = app.get("/v1/diseases/influenza", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, stats) = app.get("/v1/diseases/asthma/stats/asia", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["region"], "Asia");

    let (status, _) = app.get("/v1/diseases/asthma/stats/atlantis", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, home) = app.get("/v1/home", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(home["diseases_stats"].as_array().unwrap().len(), 5);
    assert_eq!(home["trending_diseases"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_predict_requires_login_and_valid_form() {
    let app = TestApp::new();

    let (status, _) = app
        .post("/v1/diseases/diabetes/predict", None, diabetes_form())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.signup("bob").await;
    let mut form = diabetes_form();
    form["glucose"] = json!(450.0);
    let (status, body) = app
        .post("/v1/diseases/diabetes/predict", Some(&token), form)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .post(
            "/v1/diseases/diabetes/predict",
            Some(&token),
            json!({"glucose": 120.0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_prediction_history_and_reviews() {
    let app = TestApp::new();
    let token = app.signup("carol").await;

    let (status, body) = app
        .post("/v1/diseases/diabetes/predict", Some(&token), diabetes_form())
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let prediction_id = body["prediction"]["id"].as_str().unwrap().to_string();
    let confidence = body["prediction"]["confidence_score"].as_f64().unwrap();
    assert!((50.0..=100.0).contains(&confidence));
    assert!(["low", "medium", "high"].contains(&body["prediction"]["risk_level"].as_str().unwrap()));

    let (status, history) = app.get("/v1/predictions?page=7", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total_predictions"], 1);
    assert_eq!(history["page"], 1);
    assert_eq!(history["predictions"][0]["id"], prediction_id.as_str());

    // Another user cannot see or review it
    let other = app.signup("dave").await;
    let uri = format!("/v1/predictions/{}", prediction_id);
    let (status, _) = app.get(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let reviews_uri = format!("/v1/predictions/{}/reviews", prediction_id);
    let review = json!({"rating": 5, "comment": "Accurate and quick assessment"});
    let (status, _) = app.post(&reviews_uri, Some(&other), review.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = app.post(&reviews_uri, Some(&token), review.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = created["id"].as_str().unwrap().to_string();

    let (status, conflict) = app.post(&reviews_uri, Some(&token), review).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"]["existing_id"], review_id.as_str());

    let (status, _) = app
        .post(&reviews_uri, Some(&token), json!({"rating": 0, "comment": "bad"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let review_uri = format!("/v1/reviews/{}", review_id);
    let (status, updated) = app
        .put(&review_uri, Some(&token), json!({"rating": 3, "comment": "Decent"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 3);

    let (status, detail) = app.get("/v1/diseases/diabetes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["average_rating"], 3.0);
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&review_uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&review_uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_admin_routes_require_staff() {
    let app = TestApp::new();
    let user = app.signup("erin").await;
    let staff = app.signup_staff("frank").await;

    let (status, _) = app.get("/v1/admin/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/v1/admin/dashboard", Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/v1/diseases/diabetes/predict", Some(&user), diabetes_form())
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dashboard) = app.get("/v1/admin/dashboard", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["totals"]["users"], 2);
    assert_eq!(dashboard["totals"]["staff_users"], 1);
    assert_eq!(dashboard["totals"]["predictions"], 1);
    assert_eq!(dashboard["daily_predictions"].as_array().unwrap().len(), 7);

    let (status, page) = app
        .get("/v1/admin/predictions?disease=diabetes&page_size=5", Some(&staff))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, users) = app.get("/v1/admin/users", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    let erin_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "erin")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, promoted) = app
        .put(
            &format!("/v1/admin/users/{}/staff", erin_id),
            Some(&staff),
            json!({"is_staff": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["is_staff"], true);

    let (status, _) = app.get("/v1/admin/dashboard", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_review_moderation_hides_flagged_reviews() {
    let app = TestApp::new();
    let user = app.signup("gina").await;
    let staff = app.signup_staff("hank").await;

    let (_, body) = app
        .post("/v1/diseases/diabetes/predict", Some(&user), diabetes_form())
        .await;
    let prediction_id = body["prediction"]["id"].as_str().unwrap().to_string();
    let (_, review) = app
        .post(
            &format!("/v1/predictions/{}/reviews", prediction_id),
            Some(&user),
            json!({"rating": 1, "comment": "spam spam spam"}),
        )
        .await;
    let review_id = review["id"].as_str().unwrap().to_string();

    let (_, cloud) = app.get("/v1/reviews/wordcloud", None).await;
    assert_eq!(cloud[0]["word"], "spam");
    assert_eq!(cloud[0]["count"], 3);

    let (status, moderated) = app
        .put(
            &format!("/v1/admin/reviews/{}", review_id),
            Some(&staff),
            json!({"flagged": true}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moderated["flagged"], true);

    let (_, cloud) = app.get("/v1/reviews/wordcloud", None).await;
    assert!(cloud.as_array().unwrap().is_empty());

    let (_, detail) = app.get("/v1/diseases/diabetes", None).await;
    assert!(detail["reviews"].as_array().unwrap().is_empty());

    let (status, flagged) = app
        .get("/v1/admin/reviews?flagged=true", Some(&staff))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flagged["total"], 1);

    // Staff may delete any review
    let (status, _) = app
        .delete(&format!("/v1/reviews/{}", review_id), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_chat_with_mock_responses() {
    let app = TestApp::new();
    let token = app.signup("ivan").await;

    let (_, body) = app
        .post("/v1/diseases/diabetes/predict", Some(&token), diabetes_form())
        .await;
    let prediction_id = body["prediction"]["id"].as_str().unwrap().to_string();

    let (status, started) = app
        .post(
            &format!("/v1/chat/predictions/{}/start", prediction_id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(started["response"].as_str().unwrap().contains("Diabetes"));
    let conversation_id = started["conversation_id"].as_str().unwrap().to_string();

    let (status, reply) = app
        .post(
            "/v1/chat/messages",
            Some(&token),
            json!({"message": "How can I prevent this?", "conversation_id": conversation_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["is_health_related"], true);
    assert_eq!(reply["conversation_id"], conversation_id.as_str());

    let (status, reply) = app
        .post(
            "/v1/chat/messages",
            Some(&token),
            json!({"message": "Recommend a good movie", "conversation_id": conversation_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["is_health_related"], false);

    let (status, _) = app
        .post("/v1/chat/messages", Some(&token), json!({"message": ""}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/v1/chat/conversations/{}", conversation_id);
    let (status, conversation) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 5);

    let (_, list) = app.get("/v1/chat/conversations", Some(&token)).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let other = app.signup("judy").await;
    let (status, _) = app.delete(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) = app.delete(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted_messages"], 5);

    let (status, _) = app.get(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_routes_hidden_when_disabled() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = TestApp::new();
    let router = symptoscan::api::build_router(app.state.clone().with_chat_enabled(false));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/v1/chat/conversations")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
