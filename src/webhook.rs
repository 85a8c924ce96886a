use std::sync::Arc;

use anyhow::Result;
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use tracing::{debug, error, warn};

use crate::bot::{self, AppState};
use crate::platform::IncomingUpdate;

/// The single webhook route: `POST /<secret>`.
pub fn router(state: Arc<AppState>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(receive_update))
        .with_state(state)
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    match process_update(&state, &body).await {
        Ok(()) => Ok("OK"),
        Err(e) => {
            error!("Failed to handle update: {:#}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn process_update(state: &AppState, body: &[u8]) -> Result<()> {
    let messenger = state.connector.connect().await?;

    let update: IncomingUpdate = match serde_json::from_slice(body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring malformed update: {}", e);
            return Ok(());
        }
    };

    let Some(message) = update.message else {
        debug!("Update without message, ignoring");
        return Ok(());
    };

    let mut store = state.store.lock().await;
    bot::handle_message(&mut store, messenger.as_ref(), &message).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataPaths;
    use crate::platform::testing::{RecordingConnector, RecordingMessenger};
    use crate::store::ConfigStore;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use teloxide::types::ChatId;
    use tower::ServiceExt as _;

    const PATH: &str = "/s3cret";

    async fn setup(
        keywords: &str,
        whitelist: &str,
    ) -> (TempDir, Arc<RecordingMessenger>, Router) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("keywords.txt"), keywords).unwrap();
        std::fs::write(dir.path().join("whitelist.txt"), whitelist).unwrap();
        std::fs::write(dir.path().join("base_chat.txt"), "-999").unwrap();
        let store = ConfigStore::open(DataPaths::in_dir(dir.path()))
            .await
            .unwrap();

        let messenger = Arc::new(RecordingMessenger::default());
        let connector = Arc::new(RecordingConnector {
            messenger: messenger.clone(),
        });
        let state = Arc::new(AppState::new(connector, store));
        (dir, messenger, router(state, PATH))
    }

    async fn send_update(app: Router, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn update(chat: &str, from_id: u64, text: &str) -> String {
        serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 42,
                "chat": serde_json::from_str::<serde_json::Value>(chat).unwrap(),
                "from": {"id": from_id, "is_bot": false, "first_name": "U"},
                "text": text,
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_show_keywords_from_whitelisted_user() {
        let (_dir, messenger, app) = setup("foo\nbar", "100").await;
        let (status, body) =
            send_update(app, PATH, &update(r#"{"id": -5}"#, 100, "/show_keywords")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert_eq!(
            messenger.sent().await,
            vec![(ChatId(-5), "foo\nbar".to_string())]
        );
    }

    #[tokio::test]
    async fn test_set_keywords_then_show() {
        let (dir, messenger, app) = setup("old", "100").await;
        let (status, _) = send_update(
            app.clone(),
            PATH,
            &update(r#"{"id": -5}"#, 100, "/set_keywords\nFoo\nBar"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let on_disk = std::fs::read_to_string(dir.path().join("keywords.txt")).unwrap();
        assert_eq!(on_disk, "foo\nbar");

        send_update(app, PATH, &update(r#"{"id": -5}"#, 100, "/show_keywords")).await;
        let sent = messenger.sent().await;
        assert_eq!(sent.last().unwrap().1, "foo\nbar");
    }

    #[tokio::test]
    async fn test_keyword_in_public_group_sends_link() {
        let (_dir, messenger, app) = setup("foo", "").await;
        let chat = r#"{"id": -100500, "type": "supergroup", "username": "mygroup"}"#;
        send_update(app, PATH, &update(chat, 7, "who has FOO?")).await;

        assert_eq!(
            messenger.sent().await,
            vec![(ChatId(-999), "https://t.me/mygroup/42".to_string())]
        );
    }

    #[tokio::test]
    async fn test_keyword_in_private_group_sends_text() {
        let (_dir, messenger, app) = setup("foo", "").await;
        send_update(app, PATH, &update(r#"{"id": -100500}"#, 7, "who has FOO?")).await;

        let sent = messenger.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChatId(-999));
        assert!(sent[0].1.contains("-100500"));
        assert!(sent[0].1.contains("who has foo?"));
    }

    #[tokio::test]
    async fn test_non_whitelisted_make_base_is_silent() {
        let (dir, messenger, app) = setup("foo", "100").await;
        let (status, body) =
            send_update(app, PATH, &update(r#"{"id": -5}"#, 200, "/make_this_chat_base")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert!(messenger.sent().await.is_empty());
        let on_disk = std::fs::read_to_string(dir.path().join("base_chat.txt")).unwrap();
        assert_eq!(on_disk, "-999");
    }

    #[tokio::test]
    async fn test_malformed_body_still_ok() {
        let (_dir, messenger, app) = setup("foo", "").await;
        let (status, body) = send_update(app, PATH, "not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert!(messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_message_or_text_is_ok() {
        let (_dir, messenger, app) = setup("foo", "").await;
        let (status, _) = send_update(app.clone(), PATH, r#"{"update_id": 3}"#).await;
        assert_eq!(status, StatusCode::OK);

        let no_text = r#"{"message": {"message_id": 1, "chat": {"id": 1}}}"#;
        let (status, _) = send_update(app, PATH, no_text).await;
        assert_eq!(status, StatusCode::OK);
        assert!(messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_returns_500() {
        let (dir, _messenger, app) = setup("foo", "").await;
        std::fs::remove_file(dir.path().join("keywords.txt")).unwrap();
        let (status, _) = send_update(app, PATH, &update(r#"{"id": -5}"#, 7, "foo")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_path_is_not_found() {
        let (_dir, _messenger, app) = setup("foo", "").await;
        let (status, _) = send_update(app, "/guess", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
