use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::config::Config;
use crate::handlers;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler));

    let protected_routes = Router::new()
        // Profile
        .route(
            "/api/me",
            get(handlers::users::get_profile).post(handlers::users::ensure_profile),
        )
        // Diaries
        .route(
            "/api/diaries",
            get(handlers::diaries::get_diary_day).post(handlers::diaries::create_diary),
        )
        .route(
            "/api/diaries/calendar",
            get(handlers::diaries::get_calendar),
        )
        // Insights
        .route(
            "/api/insights/weekly",
            get(handlers::insights::get_weekly_insight),
        )
        // Quests
        .route("/api/quests", get(handlers::quests::list_quests))
        .route(
            "/api/quests/:quest_id/claim",
            post(handlers::quests::claim_quest),
        )
        // Community
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route("/api/posts/:id/like", post(handlers::posts::toggle_like))
        // Shop
        .route("/api/shop/items", get(handlers::shop::list_items))
        .route("/api/shop/purchase", post(handlers::shop::purchase))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn allowed_origins(config: &Config) -> Vec<HeaderValue> {
    std::iter::once(&config.frontend_url)
        .chain(&config.cors_extra_origins)
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}

fn cors_layer(config: &Config) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins(config))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::{create_token, TokenType};
    use crate::auth::rate_limit::RateLimitState;
    use crate::error::{AppError, AppResult};
    use crate::events::EventBus;
    use crate::services::inflight::InFlight;
    use crate::services::sentiment::{Analysis, SentimentAnalyzer};
    use crate::store::MemoryStore;

    struct StubAnalyzer;

    #[async_trait]
    impl SentimentAnalyzer for StubAnalyzer {
        async fn analyze(&self, text: &str) -> AppResult<Analysis> {
            if text.contains("offline") {
                return Err(AppError::Upstream("connection refused".into()));
            }
            Ok(Analysis {
                mood: "happiness".into(),
                sentiment_score: 8,
                suggestion: "Keep walking".into(),
                emotional_reflection: "A calm day".into(),
                keywords: "walk,park".into(),
            })
        }
    }

    struct TestApp {
        state: AppState,
        config: Config,
    }

    impl TestApp {
        fn new() -> Self {
            let config = Config::for_tests();
            let state = AppState {
                store: Arc::new(MemoryStore::new()),
                analyzer: Arc::new(StubAnalyzer),
                config: Arc::new(config.clone()),
                events: EventBus::new(),
                rate_limiter: RateLimitState::new(),
                inflight: InFlight::new(),
            };
            Self { state, config }
        }

        fn token(&self, user_id: Uuid) -> String {
            create_token(user_id, Some("Mina"), TokenType::Access, &self.config)
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }

        async fn signed_up(&self) -> String {
            let token = self.token(Uuid::new_v4());
            let (status, _) = self
                .call(Method::POST, "/api/me", Some(&token), Some(json!({})))
                .await;
            assert_eq!(status, StatusCode::OK);
            token
        }
    }

    #[test]
    fn test_allowed_origins_come_from_config() {
        let mut config = Config::for_tests();
        config.cors_extra_origins = vec!["http://192.168.1.5:3000".into(), "bad\norigin".into()];

        let origins = allowed_origins(&config);
        assert_eq!(
            origins,
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://192.168.1.5:3000"),
            ]
        );
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = app.call(Method::GET, "/readyz", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_access_token() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/quests", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 401);

        let refresh = create_token(Uuid::new_v4(), None, TokenType::Refresh, &app.config);
        let (status, _) = app
            .call(Method::GET, "/api/quests", Some(&refresh), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_uses_token_name_and_waits_for_creation() {
        let app = TestApp::new();
        let token = app.token(Uuid::new_v4());

        let (status, _) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .call(Method::POST, "/api/me", Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["display_name"], "Mina");
        assert_eq!(body["coins"], 0);

        let (status, body) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["owned_items"], json!([]));
    }

    #[tokio::test]
    async fn test_diary_is_analyzed_and_listed_for_today() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        let (status, saved) = app
            .call(
                Method::POST,
                "/api/diaries",
                Some(&token),
                Some(json!({ "content": "Went for a walk in the park" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["mood"], "happiness");
        assert_eq!(saved["sentiment_score"], 8);

        let (status, day) = app
            .call(Method::GET, "/api/diaries", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(day["is_empty"], false);
        assert_eq!(day["entries"][0]["id"], saved["id"]);
    }

    #[tokio::test]
    async fn test_failed_analysis_saves_nothing() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        let (status, body) = app
            .call(
                Method::POST,
                "/api/diaries",
                Some(&token),
                Some(json!({ "content": "the analyzer is offline" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["message"], "Analysis service unavailable");

        let (_, day) = app
            .call(Method::GET, "/api/diaries", Some(&token), None)
            .await;
        assert_eq!(day["is_empty"], true);
    }

    #[tokio::test]
    async fn test_analysis_is_rate_limited_per_user() {
        let app = TestApp::new();
        let token = app.signed_up().await;
        let body = json!({ "content": "another entry" });

        for _ in 0..app.config.analyze_max_per_minute {
            let (status, _) = app
                .call(Method::POST, "/api/diaries", Some(&token), Some(body.clone()))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = app
            .call(Method::POST, "/api/diaries", Some(&token), Some(body))
            .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_calendar_marks_diary_days() {
        let app = TestApp::new();
        let token = app.signed_up().await;
        app.call(
            Method::POST,
            "/api/diaries",
            Some(&token),
            Some(json!({ "content": "calendar day" })),
        )
        .await;

        let (status, body) = app
            .call(Method::GET, "/api/diaries/calendar", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["window"].as_array().unwrap().len(), 7);
        assert_eq!(body["grid"].as_array().unwrap().len(), 42);
        let marked = body["grid"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|d| d["has_diary"] == true)
            .count();
        assert_eq!(marked, 1);

        let (status, _) = app
            .call(
                Method::GET,
                "/api/diaries/calendar?month=2026-13",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_weekly_insight_rejects_future_weeks() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        let (status, _) = app
            .call(
                Method::GET,
                "/api/insights/weekly?week_offset=1",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = app
            .call(
                Method::GET,
                "/api/insights/weekly?week_offset=-1",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mood"]["display_name"], "No Data");
    }

    #[tokio::test]
    async fn test_extreme_dates_and_offsets_are_unprocessable() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        for uri in [
            "/api/insights/weekly?week_offset=-20000000",
            "/api/insights/weekly?week_offset=-2147483648",
            "/api/diaries/calendar?selected=%2B262142-12-31",
            "/api/quests?date=%2B262142-12-31",
            "/api/diaries?tz_offset_minutes=-2147483648",
            "/api/insights/weekly?tz_offset_minutes=2147483647",
        ] {
            let (status, body) = app.call(Method::GET, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
            assert_eq!(body["error"]["code"], 422, "{}", uri);
        }

        // Far past weeks are still served
        let (status, body) = app
            .call(
                Method::GET,
                "/api/insights/weekly?week_offset=-5200",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mood"]["display_name"], "No Data");
    }

    #[tokio::test]
    async fn test_quest_rewards_fund_purchases() {
        let app = TestApp::new();
        let token = app.signed_up().await;
        let today = chrono::Utc::now().date_naive().format("%Y%m%d").to_string();

        app.call(
            Method::POST,
            "/api/diaries",
            Some(&token),
            Some(json!({ "content": "quest day" })),
        )
        .await;
        app.call(
            Method::POST,
            "/api/posts",
            Some(&token),
            Some(json!({ "content": "hello everyone" })),
        )
        .await;

        let (status, _) = app
            .call(
                Method::POST,
                "/api/shop/purchase",
                Some(&token),
                Some(json!({ "item_id": "sticker-cloud" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        for kind in ["diary", "post"] {
            let uri = format!("/api/quests/{}-{}/claim", kind, today);
            let (status, body) = app.call(Method::POST, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["granted"], true);
        }

        let uri = format!("/api/quests/diary-{}/claim", today);
        let (_, body) = app.call(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(body["granted"], false);
        assert_eq!(body["balance"], 35);

        let (status, body) = app
            .call(
                Method::POST,
                "/api/shop/purchase",
                Some(&token),
                Some(json!({ "item_id": "sticker-cloud" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 5);

        let (_, me) = app.call(Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(me["owned_items"], json!(["sticker-cloud"]));
    }

    #[tokio::test]
    async fn test_unknown_quest_and_item_are_not_found() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        let (status, _) = app
            .call(Method::POST, "/api/quests/bogus/claim", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/shop/purchase",
                Some(&token),
                Some(json!({ "item_id": "nope" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_like_toggles_and_shows_in_feed() {
        let app = TestApp::new();
        let token = app.signed_up().await;

        let (_, post) = app
            .call(
                Method::POST,
                "/api/posts",
                Some(&token),
                Some(json!({ "content": "sunny" })),
            )
            .await;
        assert_eq!(post["author_name"], "Mina");
        let uri = format!("/api/posts/{}/like", post["id"].as_str().unwrap());

        let (status, like) = app.call(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(like, json!({ "liked": true, "like_count": 1 }));

        let (_, feed) = app.call(Method::GET, "/api/posts", Some(&token), None).await;
        assert_eq!(feed[0]["liked_by_me"], true);
        assert_eq!(feed[0]["like_count"], 1);

        let (_, like) = app.call(Method::POST, &uri, Some(&token), None).await;
        assert_eq!(like, json!({ "liked": false, "like_count": 0 }));

        let missing = format!("/api/posts/{}/like", Uuid::new_v4());
        let (status, _) = app.call(Method::POST, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shop_lists_catalog() {
        let app = TestApp::new();
        let token = app.signed_up().await;
        let (status, body) = app
            .call(Method::GET, "/api/shop/items", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);
    }
}
