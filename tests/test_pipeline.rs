mod common;

use agrirobo::acquisition::{CAPTURE_FILE_NAME, CAPTURE_MIME};
use agrirobo::classifier::DETECT_PATH;
use agrirobo::presenter::{ConfidenceBand, Medal};
use agrirobo::{PanelView, present};
use common::*;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run one submission through the classifier and feed the reply back
async fn submit(
    pipeline: &mut DetectionPipeline<FakeCamera>,
    client: &ClassifierClient,
) -> bool {
    let Some(submission) = pipeline.begin_submit() else {
        return false;
    };
    assert_eq!(pipeline.state(), UiState::Submitting);
    let result = client.classify(Some(&submission.image)).await;
    pipeline.complete(submission.id, result)
}

#[tokio::test]
async fn test_upload_and_classify() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .and(body_string_contains("Content-Type: image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(early_blight_response()))
        .expect(1)
        .mount(&server)
        .await;
    let client = ClassifierClient::new(&config_for(&server))?;

    let image = create_test_image("png");
    let mut pipeline = DetectionPipeline::new(FakeCamera::default(), CameraRequest::default());
    pipeline.select_file(Some(SelectedFile::from_path(image.path())?));
    assert_eq!(pipeline.state(), UiState::Previewing);

    assert!(submit(&mut pipeline, &client).await);

    let view = match present(&pipeline.state()) {
        PanelView::Result(view) => view,
        other => panic!("unexpected view {:?}", other),
    };
    assert_eq!(view.label, "Early Blight");
    assert_eq!(view.band, ConfidenceBand::Green);
    assert_eq!(view.predictions[0].medal, Some(Medal::Gold));
    assert!(view.low_confidence_advisory.is_none());
    Ok(())
}

#[tokio::test]
async fn test_capture_and_classify() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .and(body_string_contains(&format!("filename=\"{}\"", CAPTURE_FILE_NAME)))
        .and(body_string_contains(&format!("Content-Type: {}", CAPTURE_MIME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(early_blight_response()))
        .expect(1)
        .mount(&server)
        .await;
    let client = ClassifierClient::new(&config_for(&server))?;

    let (camera, counters) = FakeCamera::new();
    let mut pipeline = DetectionPipeline::new(camera, CameraRequest::default());
    pipeline.open_camera();
    assert!(pipeline.camera_active());
    assert!(pipeline.poll_frame().is_some());

    pipeline.capture();
    assert!(!pipeline.camera_active());
    assert_eq!(counters.stopped(), 1);
    assert_eq!(pipeline.state(), UiState::Previewing);

    assert!(submit(&mut pipeline, &client).await);
    assert!(matches!(pipeline.state(), UiState::Succeeded(_)));
    Ok(())
}

#[tokio::test]
async fn test_server_rejection_then_retry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(serde_json::json!({ "detail": "corrupt image" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(early_blight_response()))
        .mount(&server)
        .await;
    let client = ClassifierClient::new(&config_for(&server))?;

    let mut pipeline = DetectionPipeline::new(FakeCamera::default(), CameraRequest::default());
    pipeline.select_file(Some(SelectedFile::new("leaf.jpg", vec![0xff, 0xd8, 0xff, 0xd9])));

    assert!(submit(&mut pipeline, &client).await);
    assert_eq!(
        present(&pipeline.state()),
        PanelView::Error {
            message: "corrupt image".to_string(),
            cause: ErrorCause::Server,
        }
    );

    // The selected image survives a failure and can be resubmitted
    assert!(pipeline.can_submit());
    assert!(submit(&mut pipeline, &client).await);
    assert!(matches!(pipeline.state(), UiState::Succeeded(_)));
    Ok(())
}

#[tokio::test]
async fn test_response_for_replaced_image_is_discarded() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DETECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(early_blight_response()))
        .mount(&server)
        .await;
    let client = ClassifierClient::new(&config_for(&server))?;

    let mut pipeline = DetectionPipeline::new(FakeCamera::default(), CameraRequest::default());
    pipeline.select_file(Some(SelectedFile::new("first.jpg", vec![1, 2, 3])));
    let stale = pipeline.begin_submit().expect("submission should start");
    assert!(pipeline.begin_submit().is_none());

    pipeline.select_file(Some(SelectedFile::new("second.jpg", vec![4, 5, 6])));
    let result = client.classify(Some(&stale.image)).await;
    assert!(!pipeline.complete(stale.id, result));
    assert_eq!(pipeline.state(), UiState::Previewing);
    assert_eq!(pipeline.payload().map(|p| p.data().file_name.as_str()), Some("second.jpg"));
    Ok(())
}

#[tokio::test]
async fn test_network_failure_is_reported() -> anyhow::Result<()> {
    let client = ClassifierClient::new(&unreachable_config())?;
    let mut pipeline = DetectionPipeline::new(FakeCamera::default(), CameraRequest::default());
    pipeline.select_file(Some(SelectedFile::new("leaf.jpg", vec![1, 2, 3])));

    assert!(submit(&mut pipeline, &client).await);
    match pipeline.state() {
        UiState::Failed(err) => assert_eq!(err.cause, ErrorCause::Network),
        other => panic!("unexpected state {:?}", other),
    }
    Ok(())
}

#[test]
fn test_denied_camera_reports_device_error() {
    let mut pipeline = DetectionPipeline::new(FakeCamera::denied(), CameraRequest::default());
    pipeline.open_camera();
    assert!(!pipeline.camera_active());
    match present(&pipeline.state()) {
        PanelView::Error { message, cause } => {
            assert_eq!(cause, ErrorCause::Device);
            assert!(message.starts_with("Unable to access camera"));
        }
        other => panic!("unexpected view {:?}", other),
    }
}

#[test]
fn test_non_image_file_is_rejected() -> anyhow::Result<()> {
    let notes = tempfile::Builder::new().suffix(".txt").tempfile()?;
    let err = SelectedFile::from_path(notes.path()).unwrap_err();
    assert_eq!(err.cause, ErrorCause::ClientValidation);
    Ok(())
}

#[test]
fn test_previews_do_not_accumulate() -> anyhow::Result<()> {
    let (camera, counters) = FakeCamera::new();
    let mut pipeline = DetectionPipeline::new(camera, CameraRequest::default());
    let image = create_test_image("jpg");

    for round in 0..25 {
        if round % 2 == 0 {
            pipeline.select_file(Some(SelectedFile::from_path(image.path())?));
        } else {
            pipeline.open_camera();
            pipeline.capture();
        }
        assert_eq!(pipeline.acquisition().live_previews(), 1);
    }
    assert_eq!(counters.opened(), counters.stopped());

    pipeline.teardown();
    assert_eq!(pipeline.acquisition().live_previews(), 0);
    assert!(pipeline.is_torn_down());
    Ok(())
}

#[test]
fn test_dropping_pipeline_releases_camera() {
    let (camera, counters) = FakeCamera::new();
    let mut pipeline = DetectionPipeline::new(camera, CameraRequest::default());
    pipeline.open_camera();
    assert_eq!(counters.opened(), 1);
    drop(pipeline);
    assert_eq!(counters.stopped(), 1);
}
