//! HTTP server for filechain.
//!
//! Accepts file uploads into a content-addressed blob store, seals a record
//! of each into the proof-of-work ledger, and serves lookup, download,
//! deletion, chain export, and verification endpoints.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{DeleteResponse, UploadResponse};
pub use server::FileChainServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use filechain_ledger::{DeletionPolicy, Difficulty, Ledger, SharedLedger};
    use filechain_store::InMemoryBlobStore;

    use super::*;

    fn config(policy: DeletionPolicy) -> ServerConfig {
        ServerConfig {
            difficulty: Difficulty::try_from(1).unwrap(),
            deletion_policy: policy,
            ..ServerConfig::default()
        }
    }

    fn app() -> (Router, AppState) {
        app_with(config(DeletionPolicy::Tombstone))
    }

    fn app_with(config: ServerConfig) -> (Router, AppState) {
        let state = AppState::new(config);
        (router::build_router(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(app, Method::GET, uri, Body::empty()).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn upload(app: &Router, name: &str, bytes: &'static [u8]) -> (StatusCode, Value) {
        let uri = format!("/api/files?name={name}&uploader=professor_smith");
        let (status, body) = send(app, Method::POST, &uri, Body::from(bytes)).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (app, _) = app();
        let (status, body) = get_json(&app, "/v1/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (app, _) = app();
        let (status, body) = get_json(&app, "/v1/info").await;
        assert_eq!(status, 200);
        assert_eq!(body["name"], "filechain-server");
        assert_eq!(body["difficulty"], 1);
        assert_eq!(body["deletion_policy"], "tombstone");
        assert_eq!(body["blocks"], 1);
    }

    #[tokio::test]
    async fn upload_then_lookup_and_download() {
        let (app, state) = app();
        let (status, created) = upload(&app, "research_paper.pdf", b"%PDF-1.7 data").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["block_index"], 1);
        assert_eq!(created["filename"], "research_paper.pdf");
        assert!(created["digest"].as_str().unwrap().starts_with('0'));
        let address = created["content_address"].as_str().unwrap().to_string();
        assert!(state.store.contains(&address).unwrap());

        let (status, record) = get_json(&app, &format!("/api/files/{address}")).await;
        assert_eq!(status, 200);
        assert_eq!(record["name"], "research_paper.pdf");
        assert_eq!(record["extension"], "pdf");
        assert_eq!(record["size_bytes"], 13);
        assert_eq!(record["uploader"], "professor_smith");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/files/{address}/content"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"research_paper.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7 data");
    }

    #[tokio::test]
    async fn list_and_chain_follow_uploads() {
        let (app, _) = app();
        upload(&app, "a.txt", b"alpha").await;
        upload(&app, "b.txt", b"beta").await;

        let (_, files) = get_json(&app, "/api/files").await;
        let names: Vec<_> = files.as_array().unwrap().iter().map(|f| f["name"].clone()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);

        let (_, chain) = get_json(&app, "/api/blockchain").await;
        let chain = chain.as_array().unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0]["payload"]["kind"], "genesis");
        assert_eq!(chain[2]["previous_digest"], chain[1]["digest"]);

        let (_, report) = get_json(&app, "/api/verify").await;
        assert_eq!(report["is_valid"], true);
        assert_eq!(report["total_blocks"], 3);
    }

    #[tokio::test]
    async fn upload_rejects_missing_name_or_body() {
        let (app, state) = app();
        let (status, body) = send(&app, Method::POST, "/api/files?name=x.txt", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("no file uploaded"));

        let (status, _) = send(&app, Method::POST, "/api/files", Body::from("data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.ledger.block_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn upload_rejects_control_characters_in_name() {
        let (app, state) = app();
        for uri in ["/api/files?name=a%0Ab.txt", "/api/files?name=a%00b.txt"] {
            let (status, body) = send(&app, Method::POST, uri, Body::from("data")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert!(body["error"].as_str().unwrap().contains("control characters"));
        }
        assert_eq!(state.ledger.block_count().unwrap(), 1);
        assert!(state.ledger.list_records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_over_limit_is_rejected() {
        let (app, state) = app_with(ServerConfig {
            max_upload_bytes: 8,
            ..config(DeletionPolicy::Tombstone)
        });
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/files?name=big.bin",
            Body::from(vec![7u8; 64]),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.ledger.block_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_address_is_404() {
        let (app, _) = app();
        for uri in ["/api/files/b3-missing", "/api/files/b3-missing/content"] {
            let (status, body) = send(&app, Method::GET, uri, Body::empty()).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let body: Value = serde_json::from_slice(&body).unwrap();
            assert!(body["error"].is_string());
        }
        let (status, _) = send(&app, Method::DELETE, "/api/files/b3-missing", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_with_tombstone_keeps_history() {
        let (app, state) = app();
        let (_, created) = upload(&app, "a.txt", b"alpha").await;
        let address = created["content_address"].as_str().unwrap().to_string();

        let (status, body) =
            send(&app, Method::DELETE, &format!("/api/files/{address}"), Body::empty()).await;
        assert_eq!(status, 200);
        let body: DeleteResponse = serde_json::from_slice(&body).unwrap();
        assert!(body.removed);
        assert_eq!(body.policy, DeletionPolicy::Tombstone);

        assert_eq!(state.ledger.block_count().unwrap(), 3);
        assert!(!state.store.contains(&address).unwrap());
        let (status, _) = get_json(&app, &format!("/api/files/{address}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, report) = get_json(&app, "/api/verify").await;
        assert_eq!(report["is_valid"], true);
    }

    #[tokio::test]
    async fn reupload_racing_delete_keeps_content() {
        let (app, _) = app();
        let (_, created) = upload(&app, "a.txt", b"alpha").await;
        let address = created["content_address"].as_str().unwrap().to_string();

        let delete_uri = format!("/api/files/{address}");
        let (deleted, reuploaded) = tokio::join!(
            send(&app, Method::DELETE, &delete_uri, Body::empty()),
            upload(&app, "a.txt", b"alpha"),
        );
        assert_eq!(deleted.0, 200);
        assert_eq!(reuploaded.0, StatusCode::CREATED);

        let (status, _) = get_json(&app, &format!("/api/files/{address}")).await;
        if status == StatusCode::OK {
            let (status, bytes) = send(
                &app,
                Method::GET,
                &format!("/api/files/{address}/content"),
                Body::empty(),
            )
            .await;
            assert_eq!(status, 200);
            assert_eq!(bytes, b"alpha");
        }
    }

    #[tokio::test]
    async fn delete_with_rebuild_shrinks_chain() {
        let (app, state) = app_with(config(DeletionPolicy::Rebuild));
        let (_, first) = upload(&app, "a.txt", b"alpha").await;
        upload(&app, "b.txt", b"beta").await;
        let address = first["content_address"].as_str().unwrap().to_string();

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/files/{address}"), Body::empty()).await;
        assert_eq!(status, 200);
        assert_eq!(state.ledger.block_count().unwrap(), 2);
        let (_, report) = get_json(&app, "/api/verify").await;
        assert_eq!(report["is_valid"], true);
    }

    #[tokio::test]
    async fn mining_timeout_is_503_and_links_nothing() {
        // Difficulty 64 cannot be met, so the deadline always fires.
        let genesis_only = Ledger::new(Difficulty::ZERO).export();
        let ledger =
            SharedLedger::new(Ledger::from_snapshots(Difficulty::try_from(64).unwrap(), genesis_only).unwrap());
        let state = AppState::from_parts(
            ledger,
            Arc::new(InMemoryBlobStore::new()),
            ServerConfig {
                mining_timeout_ms: 20,
                ..ServerConfig::default()
            },
        );
        let app = router::build_router(state.clone());

        let (status, body) = upload(&app, "slow.bin", b"bytes").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("timed out"));
        assert_eq!(state.ledger.block_count().unwrap(), 1);
    }
}
