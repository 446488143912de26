#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::reconstruction::payload::{view_urls, MultiviewShape};
    use crate::routes::build_router;
    use crate::state::AppState;
    use crate::scene::image_data_uri;
    use crate::store::{ScanId, RECONSTRUCTED_GLB, RECONSTRUCTED_GLTF};
    use crate::tests::support::{
        body_bytes, body_json, create_model_request, fake_jpeg, get_request, multipart_body, reconstruction_config,
        test_client, test_config, test_state, NoDelay, BOUNDARY, TASK_PATH,
    };

    fn setup_app() -> (TempDir, AppState, Router) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(test_config(dir.path()), None);
        let app = build_router(state.clone());
        (dir, state, app)
    }

    fn images_body(images: &[Vec<u8>]) -> Vec<u8> {
        let names: Vec<String> = (1..=images.len()).map(|i| format!("photo-{}.jpg", i)).collect();
        let parts: Vec<(&str, Option<&str>, &[u8])> = images
            .iter()
            .zip(&names)
            .map(|(bytes, name)| ("images", Some(name.as_str()), bytes.as_slice()))
            .collect();
        multipart_body(BOUNDARY, &parts)
    }

    fn scan_files(dir: &TempDir, scan_id: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("scans").join(scan_id))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_create_model_without_boundary_is_rejected() {
        let (_dir, _state, app) = setup_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/create-model")
            .header(header::CONTENT_TYPE, "multipart/form-data")
            .body(Body::from(images_body(&[fake_jpeg(1)])))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing multipart boundary");
        assert_eq!(body["code"], "MALFORMED_MULTIPART");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_create_model_without_images_is_rejected() {
        let (dir, _state, app) = setup_app();
        let body = multipart_body(BOUNDARY, &[("note", None, b"hello"), ("images", Some("empty.jpg"), b"")]);

        let response = app.oneshot(create_model_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
        assert_eq!(body["code"], "NO_IMAGES_PROVIDED");
        assert!(!dir.path().join("scans").exists());
    }

    #[tokio::test]
    async fn test_create_model_stores_every_capture() {
        let (dir, state, app) = setup_app();
        let images = vec![fake_jpeg(1), fake_jpeg(2), fake_jpeg(3)];

        let response = app.oneshot(create_model_request(images_body(&images))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        let body = body_json(response).await;
        assert_eq!(body["scanId"], "scan-test-1");
        assert_eq!(body["modelUrl"], "http://localhost:3000/scans/scan-test-1/model.gltf");

        assert_eq!(scan_files(&dir, "scan-test-1"), ["capture-1.jpg", "capture-2.jpg", "capture-3.jpg", "model.gltf"]);
        for (i, image) in images.iter().enumerate() {
            let stored = std::fs::read(dir.path().join("scans/scan-test-1").join(format!("capture-{}.jpg", i + 1)));
            assert_eq!(&stored.unwrap(), image);
        }

        let metrics = state.metrics.get_snapshot();
        assert_eq!(metrics.scans_created, 1);
        assert_eq!(metrics.images_received, 3);
        assert_eq!(metrics.reconstructions_attempted, 0);
    }

    #[tokio::test]
    async fn test_model_url_uses_configured_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.server.public_url = Some("https://snap.example/".to_string());
        let app = build_router(test_state(config, None));

        let response = app.oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["modelUrl"], "https://snap.example/scans/scan-test-1/model.gltf");
    }

    #[tokio::test]
    async fn test_fallback_document_references_first_capture() {
        let (_dir, _state, app) = setup_app();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(4)]))).await.unwrap();

        let response = app.oneshot(get_request("/scans/scan-test-1/model.gltf")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf+json");
        let document = body_json(response).await;
        assert_eq!(document["asset"]["version"], "2.0");
        assert_eq!(document["images"][0]["uri"], "capture-1.jpg");
    }

    #[tokio::test]
    async fn test_get_model_embeds_first_capture() {
        let (_dir, state, app) = setup_app();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(5), fake_jpeg(6)]))).await.unwrap();

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf+json");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let document = body_json(response).await;
        let expected = image_data_uri(&fake_jpeg(5));
        assert_eq!(document["images"][0]["uri"], Value::from(expected));
        assert_eq!(state.metrics.get_snapshot().fallback_models_served, 1);
    }

    #[tokio::test]
    async fn test_get_model_prefers_binary_reconstruction() {
        let (_dir, state, app) = setup_app();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();
        let id = ScanId::parse("scan-test-1").unwrap();
        state.store.write_artifact(&id, "reconstructed.gltf", b"{}").await.unwrap();
        state.store.write_artifact(&id, "reconstructed.glb", b"glTF-binary").await.unwrap();

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(body_bytes(response).await, b"glTF-binary");
    }

    #[tokio::test]
    async fn test_get_model_for_unknown_scan() {
        let (_dir, _state, app) = setup_app();

        let response = app.oneshot(get_request("/api/model/scan-unknown")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "SCAN_NOT_FOUND");
        assert_eq!(body["details"]["scan_id"], "scan-unknown");
    }

    #[tokio::test]
    async fn test_artifact_content_types() {
        let (_dir, _state, app) = setup_app();
        let image = fake_jpeg(9);
        app.clone().oneshot(create_model_request(images_body(&[image.clone()]))).await.unwrap();

        let response = app.clone().oneshot(get_request("/scans/scan-test-1/capture-1.jpg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(body_bytes(response).await, image);

        let response = app.oneshot(get_request("/scans/scan-test-1/capture-7.jpg")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_artifact_traversal_is_not_found() {
        let (dir, _state, app) = setup_app();
        std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();

        for uri in [
            "/scans/scan-test-1/../../secret.txt",
            "/scans/scan-test-1/..%2F..%2Fsecret.txt",
            "/scans/../secret.txt",
            "/scans/scan-test-1//etc/passwd",
        ] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            let body = body_bytes(response).await;
            assert!(!String::from_utf8_lossy(&body).contains("top secret"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_reconstruction_timeout_still_returns_link() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH);
                then.status(200).json_body(json!({ "data": { "task_id": "t-slow" } }));
            })
            .await;
        let poll = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-slow", TASK_PATH));
                then.status(200).json_body(json!({ "data": { "status": "queued" } }));
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let client = test_client(&reconstruction_config(server.url(TASK_PATH)), Arc::new(NoDelay::default()));
        let state = test_state(config, Some(client));
        let app = build_router(state.clone());

        let response = app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["scanId"], "scan-test-1");
        poll.assert_hits_async(3).await;
        assert_eq!(scan_files(&dir, "scan-test-1"), ["capture-1.jpg", "model.gltf"]);

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf+json");

        let metrics = state.metrics.get_snapshot();
        assert_eq!(metrics.reconstructions_attempted, 1);
        assert_eq!(metrics.reconstructions_failed, 1);
        assert_eq!(metrics.fallback_models_served, 1);
    }

    #[tokio::test]
    async fn test_successful_reconstruction_is_served() {
        let server = MockServer::start_async().await;
        let image = fake_jpeg(2);
        let data_uri = image_data_uri(&image);
        let model_url = server.url("/files/model.glb");
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body(json!({ "type": "image_to_model", "image_url": data_uri }));
                then.status(200).json_body(json!({ "data": { "task_id": "t-ok" } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-ok", TASK_PATH));
                then.status(200)
                    .json_body(json!({ "data": { "status": "success", "output": { "model": model_url } } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/model.glb");
                then.status(200).body(b"glTF-from-service");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&reconstruction_config(server.url(TASK_PATH)), Arc::new(NoDelay::default()));
        let state = test_state(test_config(dir.path()), Some(client));
        let app = build_router(state.clone());

        let response = app.clone().oneshot(create_model_request(images_body(&[image]))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        create.assert_hits_async(1).await;

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(body_bytes(response).await, b"glTF-from-service");
        assert_eq!(state.metrics.get_snapshot().reconstructions_succeeded, 1);
    }

    #[tokio::test]
    async fn test_multiview_falls_back_to_first_image_url() {
        let server = MockServer::start_async().await;
        let base = "https://public.example";
        let views = view_urls(base, "scan-test-1", 2);
        let first_url = format!("{}/scans/scan-test-1/capture-1.jpg", base);
        let model_url = server.url("/files/scan.gltf");

        let nested = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body(MultiviewShape::Nested.build(&views));
                then.status(400).json_body(json!({ "code": 1004, "message": "invalid parameter" }));
            })
            .await;
        let flat = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body(MultiviewShape::Flat.build(&views));
                then.status(500).json_body(json!({ "code": 1000, "message": "server busy" }));
            })
            .await;
        let single = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "image_url": first_url }));
                then.status(200).json_body(json!({ "task_id": "t-single" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-single", TASK_PATH));
                then.status(200).json_body(json!({ "status": "success", "output": { "model_mesh": model_url } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/scan.gltf");
                then.status(200).body(r#"{"asset":{"version":"2.0"}}"#);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut reconstruction = reconstruction_config(server.url(TASK_PATH));
        reconstruction.public_base_url = Some(base.to_string());
        let client = test_client(&reconstruction, Arc::new(NoDelay::default()));
        let app = build_router(test_state(test_config(dir.path()), Some(client)));

        let response = app
            .clone()
            .oneshot(create_model_request(images_body(&[fake_jpeg(1), fake_jpeg(2)])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        nested.assert_hits_async(1).await;
        flat.assert_hits_async(1).await;
        single.assert_hits_async(1).await;

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf+json");
        assert_eq!(body_json(response).await, json!({ "asset": { "version": "2.0" } }));
    }

    #[tokio::test]
    async fn test_cascade_ends_with_first_image_bytes() {
        let server = MockServer::start_async().await;
        let base = "https://public.example";
        let images = vec![fake_jpeg(1), fake_jpeg(2)];
        let views = view_urls(base, "scan-test-1", 2);
        let first_url = format!("{}/scans/scan-test-1/capture-1.jpg", base);
        let first_bytes = image_data_uri(&images[0]);
        let busy = json!({ "code": 2000, "message": "server busy" });
        let model_url = server.url("/files/tail.glb");

        let nested = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body(MultiviewShape::Nested.build(&views));
                then.status(500).json_body(busy.clone());
            })
            .await;
        let flat = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body(MultiviewShape::Flat.build(&views));
                then.status(200).json_body(json!({ "task_id": "t-never" }));
            })
            .await;
        let by_url = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "image_url": first_url }));
                then.status(500).json_body(busy.clone());
            })
            .await;
        let by_url_nested = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "input": { "image_url": first_url } }));
                then.status(200).json_body(json!({ "task_id": "t-never" }));
            })
            .await;
        let by_bytes = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "image_url": first_bytes }));
                then.status(200).json_body(json!({ "task_id": "t-bytes" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-bytes", TASK_PATH));
                then.status(200).json_body(json!({ "data": { "status": "success", "output": { "model": model_url } } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/tail.glb");
                then.status(200).body(b"GLB-tail");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut reconstruction = reconstruction_config(server.url(TASK_PATH));
        reconstruction.public_base_url = Some(base.to_string());
        let client = test_client(&reconstruction, Arc::new(NoDelay::default()));
        let app = build_router(test_state(test_config(dir.path()), Some(client)));

        let response = app.clone().oneshot(create_model_request(images_body(&images))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        nested.assert_hits_async(1).await;
        flat.assert_hits_async(0).await;
        by_url.assert_hits_async(1).await;
        by_url_nested.assert_hits_async(0).await;
        by_bytes.assert_hits_async(1).await;

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(body_bytes(response).await, b"GLB-tail");
    }

    #[tokio::test]
    async fn test_several_images_without_public_url_send_first_image_bytes() {
        let server = MockServer::start_async().await;
        let images = vec![fake_jpeg(3), fake_jpeg(4)];
        let first_bytes = image_data_uri(&images[0]);
        let second_bytes = image_data_uri(&images[1]);
        let model_url = server.url("/files/first.gltf");

        let multiview = server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH).json_body_partial(r#"{ "type": "multiview_to_model" }"#);
                then.status(200).json_body(json!({ "task_id": "t-never" }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "image_url": second_bytes }));
                then.status(200).json_body(json!({ "task_id": "t-never" }));
            })
            .await;
        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TASK_PATH)
                    .json_body(json!({ "type": "image_to_model", "image_url": first_bytes }));
                then.status(200).json_body(json!({ "task_id": "t-first" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-first", TASK_PATH));
                then.status(200).json_body(json!({ "status": "success", "output": { "model": model_url } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/first.gltf");
                then.status(200).body(r#"{"asset":{"version":"2.0"},"scene":0}"#);
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&reconstruction_config(server.url(TASK_PATH)), Arc::new(NoDelay::default()));
        let state = test_state(test_config(dir.path()), Some(client));
        let app = build_router(state.clone());

        let response = app.oneshot(create_model_request(images_body(&images))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        multiview.assert_hits_async(0).await;
        second.assert_hits_async(0).await;
        first.assert_hits_async(1).await;
        let id = ScanId::parse("scan-test-1").unwrap();
        assert!(state.store.exists(&id, RECONSTRUCTED_GLTF).await);
    }

    #[tokio::test]
    async fn test_background_reconstruction_lands_after_response() {
        let server = MockServer::start_async().await;
        let model_url = server.url("/files/bg.glb");
        server
            .mock_async(|when, then| {
                when.method(POST).path(TASK_PATH);
                then.status(200).json_body(json!({ "data": { "task_id": "t-bg" } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{}/t-bg", TASK_PATH));
                then.status(200).json_body(json!({ "data": { "status": "success", "output": { "model": model_url } } }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/bg.glb");
                then.status(200).body(b"GLB-background");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut reconstruction = reconstruction_config(server.url(TASK_PATH));
        reconstruction.await_result = false;
        let client = test_client(&reconstruction, Arc::new(NoDelay::default()));
        let state = test_state(test_config(dir.path()), Some(client));
        let app = build_router(state.clone());

        let response = app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = ScanId::parse("scan-test-1").unwrap();
        assert!(state.store.exists(&id, "model.gltf").await);

        let mut finished = false;
        for _ in 0..500 {
            if state.metrics.get_snapshot().reconstructions_succeeded == 1 {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(finished, "background reconstruction did not finish");
        assert!(state.store.exists(&id, RECONSTRUCTED_GLB).await);

        let response = app.oneshot(get_request("/api/model/scan-test-1")).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(body_bytes(response).await, b"GLB-background");
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let (_dir, _state, app) = setup_app();
        let response = app.oneshot(get_request("/healthz")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(body_bytes(response).await, b"ok");
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (_dir, _state, app) = setup_app();
        let response = app.oneshot(get_request("/version")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(body["reconstruction"]["enabled"], false);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (_dir, _state, app) = setup_app();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1)]))).await.unwrap();

        let response = app.oneshot(get_request("/metrics")).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["scans_created"], 1);
        assert_eq!(body["images_received"], 1);
        assert!(body["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn test_prometheus_metrics_endpoint() {
        let (_dir, _state, app) = setup_app();
        app.clone().oneshot(create_model_request(images_body(&[fake_jpeg(1), fake_jpeg(2)]))).await.unwrap();

        let response = app.oneshot(get_request("/metrics/prometheus")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("# TYPE snap3d_scans_created counter\nsnap3d_scans_created 1\n"));
        assert!(text.contains("snap3d_images_received 2\n"));
        assert!(text.contains("# TYPE snap3d_uptime_seconds gauge"));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (_dir, _state, app) = setup_app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/create-model")
            .header(header::ORIGIN, "http://viewer.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let (dir, _state, app) = setup_app();
        std::fs::create_dir_all(dir.path().join("public")).unwrap();
        std::fs::write(dir.path().join("public/index.html"), "<h1>snap3d</h1>").unwrap();

        let response = app.oneshot(get_request("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<h1>snap3d</h1>");
    }
}
