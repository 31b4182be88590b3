mod routes;
mod stamp;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use fishroom_broker::{Broker, RedisBroker};
use fishroom_core::FishroomConfig;
use fishroom_stores::BrokerApiClientRegistry;
use tower_http::trace::TraceLayer;

use state::AppState;

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/messages", get(routes::poll_messages))
        .route("/api/messages/{room}/", post(routes::post_api_message))
        .route("/messages/{room}/", post(routes::post_web_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = FishroomConfig::from_env()?;
    let broker: Arc<dyn Broker> = Arc::new(RedisBroker::connect(&config.redis_url).await?);
    let api_clients = Arc::new(BrokerApiClientRegistry::new(broker.clone(), config.key_prefix.clone()));
    let state = Arc::new(AppState::new(broker, &config.key_prefix, api_clients, config.baseurl.clone()));

    let span = tracing::info_span!("api", bind = %config.api_bind);
    let _enter = span.enter();

    let listener = tokio::net::TcpListener::bind(&config.api_bind).await?;
    tracing::info!("listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fishroom_broker::InMemoryBroker;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let api_clients = Arc::new(BrokerApiClientRegistry::new(broker.clone(), "fishroom"));
        Arc::new(AppState::new(broker, "fishroom", api_clients, "https://fish.example".to_string()))
    }

    #[tokio::test]
    async fn post_api_message_rejects_a_bad_token() {
        let state = test_state();
        let app = build_router(state);
        let req = Request::builder()
            .method("POST")
            .uri("/api/messages/lounge/")
            .header("content-type", "application/json")
            .header("X-TOKEN-ID", "abc")
            .header("X-TOKEN-KEY", "wrong")
            .body(Body::from(r#"{"content":"hi"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn post_api_message_accepts_a_correct_token_and_publishes() {
        let state = test_state();
        state.api_clients.add("abc", "secret", "webbot").await.unwrap();
        let mut ingress = state.ingress.subscribe().await.unwrap();

        let app = build_router(state);
        let req = Request::builder()
            .method("POST")
            .uri("/api/messages/lounge/")
            .header("content-type", "application/json")
            .header("X-TOKEN-ID", "abc")
            .header("X-TOKEN-KEY", "secret")
            .body(Body::from(r#"{"content":"hi"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        use futures::StreamExt;
        let published = ingress.next().await.unwrap();
        assert_eq!(published.channel.as_str(), "api-webbot");
        assert_eq!(published.content, "hi");
    }

    #[tokio::test]
    async fn post_api_message_rejects_empty_content() {
        let state = test_state();
        state.api_clients.add("abc", "secret", "webbot").await.unwrap();
        let app = build_router(state);
        let req = Request::builder()
            .method("POST")
            .uri("/api/messages/lounge/")
            .header("content-type", "application/json")
            .header("X-TOKEN-ID", "abc")
            .header("X-TOKEN-KEY", "secret")
            .body(Body::from(r#"{"content":"   "}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_web_message_rejects_a_nickname_starting_with_punctuation() {
        let state = test_state();
        let app = build_router(state);
        let req = Request::builder()
            .method("POST")
            .uri("/messages/lounge/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content":"hi","nickname":"!bad"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_web_message_publishes_a_web_tagged_message() {
        let state = test_state();
        let mut ingress = state.ingress.subscribe().await.unwrap();
        let app = build_router(state);
        let req = Request::builder()
            .method("POST")
            .uri("/messages/lounge/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"content":"hi","nickname":"alice"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        use futures::StreamExt;
        let published = ingress.next().await.unwrap();
        assert_eq!(published.channel.as_str(), "web");
        assert_eq!(published.sender, "alice");
    }
}
