//! End-to-end integration tests

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt;

    use crate::integration::fixtures::*;
    use crate::subtitle::{parse_srt, RawSegment, SubtitleDocument};

    async fn send(app: &TestApp, request: Request<Body>) -> Response {
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(app: &TestApp, uri: &str) -> Response {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_multipart(app: &TestApp, uri: &str, form: MultipartBody) -> Response {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        send(app, request).await
    }

    async fn post_json(app: &TestApp, uri: &str, value: serde_json::Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    /// (start, end, text) triples from a `segments` array
    fn triples(value: &serde_json::Value) -> Vec<(f64, f64, String)> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                (
                    s["start"].as_f64().unwrap(),
                    s["end"].as_f64().unwrap(),
                    s["text"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let app = TestApp::with_defaults().await;

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Backend is running!");

        let response = get(&app, "/health").await;
        assert_eq!(body_bytes(response).await, b"OK");
    }

    #[tokio::test]
    async fn test_save_and_download_normalized_srt() {
        let app = TestApp::with_defaults().await;

        let response = post_json(
            &app,
            "/save-subtitles",
            serde_json::json!({
                "segments": [
                    {"start": 0, "end": 2, "text": "Hello"},
                    {"start": 1.5, "end": 3, "text": "World"},
                    {"start": 3, "end": 4, "text": "   "},
                    {"start": "00:00:05,000", "end": "00:00:05,000", "text": "Zero"}
                ],
                "filename": "my song.srt"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["srt_url"], "/download/my_song.srt");
        assert_eq!(json["segments_written"], 2);
        assert_eq!(json["segments_dropped"], 2);

        let response = get(&app, "/download/my_song.srt").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-subrip"
        );
        let srt = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:02,000\nHello\n\n2\n00:00:02,000 --> 00:00:03,000\nWorld"
        );

        let artifacts = body_json(get(&app, "/debug/artifacts").await).await;
        assert_eq!(artifacts["count"], 1);
        assert_eq!(artifacts["artifacts"][0]["kind"], "subtitle");
    }

    #[tokio::test]
    async fn test_save_uses_default_filename() {
        let app = TestApp::with_defaults().await;
        let response = post_json(
            &app,
            "/save-subtitles",
            serde_json::json!({"segments": [{"start": 0, "end": 1, "text": "Hi"}]}),
        )
        .await;
        let json = body_json(response).await;
        assert_eq!(json["srt_url"], "/download/edited_subtitles.srt");
        assert!(app.dir.path().join("subtitles/edited_subtitles.srt").exists());
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let app = TestApp::with_defaults().await;
        let raw = vec![
            RawSegment::new(0.0, 2.25, "One"),
            RawSegment::new(1.0, 2.5, "Two\nlines"),
            RawSegment::new(2.5, 2.5, "gone"),
            RawSegment::new(4.0, 6.0, "Four"),
        ];
        let doc = SubtitleDocument::from_raw(&raw);

        let form = MultipartBody::new().file("srt", "edit.srt", doc.srt.as_bytes());
        let response = post_multipart(&app, "/upload-srt", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let expected: Vec<(f64, f64, String)> = doc
            .segments
            .iter()
            .map(|s| (s.start, s.end, s.text.clone()))
            .collect();
        assert_eq!(triples(&json["segments"]), expected);
        let again = SubtitleDocument::from_srt(&doc.srt);
        assert_eq!(again.segments, doc.segments);
        assert_eq!(again.srt, doc.srt);
    }

    #[tokio::test]
    async fn test_upload_srt_skips_malformed_block() {
        let app = TestApp::with_defaults().await;
        let form = MultipartBody::new().file("srt", "broken.srt", MALFORMED_SRT.as_bytes());
        let response = post_multipart(&app, "/upload-srt", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            triples(&json["segments"]),
            vec![(1.0, 2.0, "One".to_string()), (3.0, 4.0, "Three".to_string())]
        );
        assert_eq!(app.state.stats.snapshot().srt_blocks_skipped, 1);
        // Nothing is stored for plain parsing
        assert!(app.state.list_artifacts().is_empty());
    }

    #[tokio::test]
    async fn test_upload_srt_rejects_other_types() {
        let app = TestApp::with_defaults().await;
        let form = MultipartBody::new().file("srt", "notes.txt", b"hello");
        let response = post_multipart(&app, "/upload-srt", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let form = MultipartBody::new().file("other", "a.srt", b"");
        let response = post_multipart(&app, "/upload-srt", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_process_lrc() {
        let app = TestApp::with_defaults().await;
        let form = MultipartBody::new().file("file", "lyrics.lrc", SAMPLE_LRC.as_bytes());
        let response = post_multipart(&app, "/process-subtitles", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["srt_url"], "/download/lyrics.srt");
        assert_eq!(
            triples(&json["segments"]),
            vec![
                (9.5, 16.0, "Hello".to_string()),
                (16.0, 24.0, "World".to_string())
            ]
        );

        let srt = body_bytes(get(&app, "/download/lyrics.srt").await).await;
        assert_eq!(String::from_utf8(srt).unwrap(), SAMPLE_LRC_AS_SRT);
    }

    #[tokio::test]
    async fn test_generate_subtitles_from_audio() {
        let transcriber = Arc::new(FakeTranscriber::returning(vec![
            RawSegment::new(0.0, 2.5, " Hello "),
            RawSegment::new(2.0, 4.0, "world"),
            RawSegment::new(4.0, 4.0, "gone"),
        ]));
        let app = TestApp::new(transcriber.clone(), Arc::new(FakeMuxer::default())).await;

        let form = MultipartBody::new().file("audio", "voice memo.wav", &wav_bytes(500));
        let response = post_multipart(&app, "/generate-subtitles", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["srt_url"], "/download/voice_memo.srt");
        assert_eq!(
            triples(&json["segments"]),
            vec![(0.0, 2.5, "Hello".to_string()), (2.5, 4.0, "world".to_string())]
        );
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        // The audio is transient for this endpoint
        assert_eq!(app.upload_count(), 0);

        let srt = String::from_utf8(body_bytes(get(&app, "/download/voice_memo.srt").await).await)
            .unwrap();
        assert_eq!(parse_srt(&srt).len(), 2);

        let stats = app.state.stats.snapshot();
        assert_eq!(stats.transcriptions, 1);
        assert_eq!(stats.segments_dropped, 1);
    }

    #[tokio::test]
    async fn test_generate_subtitles_transcriber_failure() {
        let transcriber = Arc::new(FakeTranscriber::failing("model not loaded"));
        let app = TestApp::new(transcriber, Arc::new(FakeMuxer::default())).await;

        let form = MultipartBody::new().file("audio", "voice.wav", &wav_bytes(200));
        let response = post_multipart(&app, "/generate-subtitles", form).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"],
            "Transcription failed: model not loaded"
        );
        assert_eq!(app.state.stats.snapshot().transcription_failures, 1);
        assert_eq!(app.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_subtitles_rejects_bad_uploads() {
        let transcriber = Arc::new(FakeTranscriber::returning(Vec::new()));
        let app = TestApp::new(transcriber.clone(), Arc::new(FakeMuxer::default())).await;

        let form = MultipartBody::new().file("audio", "voice.txt", b"words");
        let response = post_multipart(&app, "/generate-subtitles", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let form = MultipartBody::new().file("image", "voice.wav", &wav_bytes(100));
        let response = post_multipart(&app, "/generate-subtitles", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_files_prefers_srt() {
        let transcriber = Arc::new(FakeTranscriber::returning(vec![RawSegment::new(
            0.0, 1.0, "unused",
        )]));
        let app = TestApp::new(transcriber.clone(), Arc::new(FakeMuxer::default())).await;

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(200))
            .file("srt", "song.srt", MALFORMED_SRT.as_bytes());
        let response = post_multipart(&app, "/upload-files", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["srt_filename"], "song.srt");
        assert_eq!(triples(&json["segments"]).len(), 2);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        // The audio is kept and served back
        let audio_name = json["audio_filename"].as_str().unwrap().to_string();
        assert!(audio_name.ends_with(".wav"));
        let response = get(&app, &format!("/download-audio/{}", audio_name)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(body_bytes(response).await, wav_bytes(200));
    }

    #[tokio::test]
    async fn test_upload_files_transcribes_audio_only() {
        let transcriber = Arc::new(FakeTranscriber::returning(vec![RawSegment::new(
            "0.5", "1.5", "spoken",
        )]));
        let app = TestApp::new(transcriber.clone(), Arc::new(FakeMuxer::default())).await;

        let form = MultipartBody::new().file("audio", "talk.wav", &wav_bytes(200));
        let response = post_multipart(&app, "/upload-files", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["srt_filename"], "talk.srt");
        assert_eq!(
            triples(&json["segments"]),
            vec![(0.5, 1.5, "spoken".to_string())]
        );
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.upload_count(), 1);

        let form = MultipartBody::new();
        let response = post_multipart(&app, "/upload-files", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mux_with_lrc_subtitles() {
        let muxer = Arc::new(FakeMuxer::default());
        let app = TestApp::new(Arc::new(FakeTranscriber::returning(Vec::new())), muxer.clone()).await;

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(300))
            .file("image", "cover.png", &PNG_1X1)
            .file("subtitle", "song.lrc", SAMPLE_LRC.as_bytes());
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Video generated successfully");
        let output_url = json["output_url"].as_str().unwrap().to_string();
        assert!(output_url.starts_with("/download-video/"));

        // The muxer saw the converted SRT, not the LRC
        let requests = muxer.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let subs = requests[0].subtitles.clone().unwrap();
        assert_eq!(std::fs::read_to_string(subs).unwrap(), SAMPLE_LRC_AS_SRT);

        let response = get(&app, &output_url).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(body_bytes(response).await, FAKE_VIDEO);
        assert_eq!(app.state.stats.snapshot().videos_muxed, 1);
    }

    #[tokio::test]
    async fn test_mux_without_subtitles() {
        let muxer = Arc::new(FakeMuxer::default());
        let app = TestApp::new(Arc::new(FakeTranscriber::returning(Vec::new())), muxer.clone()).await;

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(300))
            .file("image", "cover.png", &PNG_1X1);
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(muxer.requests.lock().unwrap()[0].subtitles.is_none());
    }

    #[tokio::test]
    async fn test_mux_failure_is_verbatim() {
        let diagnostic = "[image2 @ 0x1] Could not open file: cover.png\n";
        let app = TestApp::new(
            Arc::new(FakeTranscriber::returning(Vec::new())),
            Arc::new(FakeMuxer::failing(diagnostic)),
        )
        .await;

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(300))
            .file("image", "cover.png", &PNG_1X1);
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], diagnostic);
        assert_eq!(app.state.stats.snapshot().mux_failures, 1);
    }

    #[tokio::test]
    async fn test_failed_mux_leaves_nothing_behind() {
        let muxer = Arc::new(FakeMuxer::failing("Conversion failed!"));
        let app = TestApp::new(Arc::new(FakeTranscriber::returning(Vec::new())), muxer.clone()).await;
        let uploads_before = app.upload_count();

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(300))
            .file("image", "cover.png", &PNG_1X1)
            .file("srt", "lyrics.srt", b"1\n00:00:00,000 --> 00:00:01,000\nHi\n");
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        // The muxer did run and left a partial output
        let requests = muxer.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].output.exists());

        assert_eq!(app.upload_count(), uploads_before);
        assert_eq!(app.output_count(), 0);
        assert_eq!(app.subtitle_count(), 0);
        assert!(app.state.list_artifacts().is_empty());
    }

    #[tokio::test]
    async fn test_mux_requires_audio_and_image() {
        let app = TestApp::with_defaults().await;
        let form = MultipartBody::new().file("audio", "song.wav", &wav_bytes(100));
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let form = MultipartBody::new()
            .file("audio", "song.wav", &wav_bytes(100))
            .file("image", "cover.gif", b"GIF89a");
        let response = post_multipart(&app, "/upload", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_downloads_stay_in_their_directory() {
        let app = TestApp::with_defaults().await;
        std::fs::write(app.dir.path().join("secret.srt"), "x").unwrap();

        for uri in [
            "/download/..secret.srt",
            "/download/missing.srt",
            "/download-video/%2E%2E%2Fsecret.srt",
            "/uploads/..",
        ] {
            let response = get(&app, uri).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }
}
