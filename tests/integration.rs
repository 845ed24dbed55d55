use nano_banana_studio::{
    ai::{GeminiImageClient, MockImageApi, MockOutcome},
    models::{Config, ImagePayload, Mode, Status, UPLOADED_IMAGE_PROMPT},
    session::{Studio, Submission},
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

fn gemini_studio(server: &MockServer) -> Studio {
    let config = Config::new("test-key").with_base_url(server.uri());
    Studio::new(Box::new(GeminiImageClient::from_config(&config)))
}

fn image_body(mime_type: &str, data: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": data } },
                    { "text": "Here is the image you asked for." }
                ]
            },
            "finishReason": "STOP"
        }]
    })
}

/// Generate from text, then edit: the edit request carries the generated image.
#[tokio::test]
async fn test_generate_then_edit_against_gemini() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{ "parts": [{ "text": "a banana on the moon" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("image/png", "AQID")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(serde_json::json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "AQID" } },
                    { "text": "Add a retro filter" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("image/jpeg", "BAUG")))
        .expect(1)
        .mount(&server)
        .await;

    let studio = gemini_studio(&server);

    let generated = match studio.submit_prompt("a banana on the moon").await {
        Submission::Completed(record) => record,
        other => panic!("generation failed: {other:?}"),
    };
    assert_eq!(generated.payload().bytes(), &[1, 2, 3]);
    assert_eq!(studio.mode(), Mode::Edit);

    let edited = match studio.submit_prompt("Add a retro filter").await {
        Submission::Completed(record) => record,
        other => panic!("edit failed: {other:?}"),
    };
    assert_eq!(edited.payload().media_type(), "image/jpeg");
    assert_eq!(edited.payload().bytes(), &[4, 5, 6]);

    let history = studio.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id(), edited.id());
    assert_eq!(history[1], generated);
    assert_eq!(studio.status(), Status::Idle);
}

#[tokio::test]
async fn test_provider_error_becomes_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let studio = gemini_studio(&server);
    let submission = studio.submit_prompt("anything").await;

    assert!(matches!(submission, Submission::Failed(_)));
    let error = studio.last_error().expect("error recorded");
    assert!(error.contains("500"));
    assert!(studio.current().is_none());
    assert_eq!(studio.status(), Status::Idle);
}

#[tokio::test]
async fn test_refusal_text_reaches_the_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't edit faces." }] } }]
        })))
        .mount(&server)
        .await;

    let studio = gemini_studio(&server);
    let upload = studio
        .submit_upload_data_uri("data:image/webp;base64,AQID")
        .unwrap()
        .unwrap();

    studio.submit_prompt("swap the faces").await;

    assert_eq!(
        studio.last_error().as_deref(),
        Some("Model returned text instead of an image: I can't edit faces.")
    );
    assert_eq!(studio.current(), Some(upload));
}

#[tokio::test]
async fn test_upload_then_edit_with_mock_api() {
    let api = MockImageApi::new().with_outcome(MockOutcome::Image(ImagePayload::new(
        vec![9, 9],
        "image/png",
    )));
    let studio = Studio::new(Box::new(api.clone()));

    let upload = studio.submit_upload(vec![1, 2, 3], "image/png").unwrap();
    assert_eq!(upload.prompt(), UPLOADED_IMAGE_PROMPT);
    assert_eq!(studio.status(), Status::Idle);

    studio.submit_prompt("Turn into a line drawing").await;

    assert_eq!(api.get_call_count(), 1);
    let history = studio.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].prompt(), "Turn into a line drawing");
    assert_eq!(history[1], upload);
}

#[tokio::test]
async fn test_save_current_writes_edited_image() {
    let dir = tempfile::tempdir().unwrap();
    let api = MockImageApi::new().with_image_response(vec![5, 6, 7], "image/webp");
    let studio = Studio::new(Box::new(api));

    studio.submit_prompt("a tiny webp").await;
    let saved = studio.save_current(dir.path()).await.unwrap().unwrap();

    assert_eq!(saved.extension().and_then(|e| e.to_str()), Some("webp"));
    assert_eq!(std::fs::read(saved).unwrap(), vec![5, 6, 7]);
}
