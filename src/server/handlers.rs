use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::core::constants::http;
use crate::core::error::{ReportError, Result};
use crate::render::{HtmlReport, ReportView};
use crate::report::ReportPayload;
use crate::reporting::logging;
use crate::server::pipeline::ReportPipeline;
use crate::upload::{StagingArea, UploadedCapture};

pub type AppState = Arc<ReportPipeline>;

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = if matches!(self, ReportError::UploadTooLarge(_)) {
            StatusCode::PAYLOAD_TOO_LARGE
        } else if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        logging::log_error(&format!("Request failed ({status})"), Some(&self));
        (status, self.to_string()).into_response()
    }
}

/// `POST /upload-pcap`: the payload as JSON
pub async fn upload_pcap(
    State(pipeline): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ReportPayload>> {
    let payload = handle_upload(pipeline, multipart).await?;
    Ok(Json(payload))
}

/// `POST /upload-pcap/report`: the payload drawn as a page
pub async fn upload_pcap_report(
    State(pipeline): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>> {
    let payload = handle_upload(pipeline, multipart).await?;

    let mut view = ReportView::new();
    view.apply(&payload);
    Ok(Html(HtmlReport::generate_page(&view, "/")))
}

/// Receive and process one upload on its own task
///
/// The task keeps running when the client goes away, so the staged capture
/// and the request scope are still cleaned up.
async fn handle_upload(pipeline: AppState, multipart: Multipart) -> Result<ReportPayload> {
    let task = tokio::spawn(async move {
        let capture = receive_capture(pipeline.staging(), multipart).await?;
        pipeline.process(&capture).await
    });

    task.await.map_err(|e| {
        ReportError::Io(std::io::Error::other(format!("upload task failed: {e}")))
    })?
}

/// Stream the single `pcapfile` file part into the staging area
///
/// Text fields are skipped. Any other file part, a second capture or an empty
/// file name rejects the whole upload.
pub async fn receive_capture(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> Result<UploadedCapture> {
    let mut capture: Option<UploadedCapture> = None;

    let outcome = loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break Ok(()),
            Err(e) => break Err(multipart_error(e)),
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name != http::CAPTURE_FIELD {
            break Err(ReportError::Multipart(format!(
                "unexpected file field '{field_name}', expected '{}'",
                http::CAPTURE_FIELD
            )));
        }
        if capture.is_some() {
            break Err(ReportError::Multipart(format!(
                "more than one '{}' file part",
                http::CAPTURE_FIELD
            )));
        }
        if file_name.is_empty() {
            break Err(ReportError::MissingUpload("no file selected".to_string()));
        }

        let mut staged = match staging.begin(&field_name, &file_name).await {
            Ok(staged) => staged,
            Err(e) => break Err(e),
        };
        let streamed = loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = staged.write_chunk(&chunk).await {
                        break Err(e);
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(multipart_error(e)),
            }
        };
        if let Err(e) = streamed {
            staged.discard().await;
            break Err(e);
        }

        match staged.finish().await {
            Ok(staged) => capture = Some(staged),
            Err(e) => break Err(e),
        }
    };

    match (outcome, capture) {
        (Ok(()), Some(capture)) => Ok(capture),
        (Ok(()), None) => Err(ReportError::MissingUpload(format!(
            "no '{}' file part in request",
            http::CAPTURE_FIELD
        ))),
        (Err(e), capture) => {
            if let Some(capture) = capture
                && let Err(remove_error) = capture.remove().await
            {
                logging::log_warning(&format!(
                    "Could not remove rejected upload {}: {remove_error}",
                    capture.staged_path.display()
                ));
            }
            Err(e)
        }
    }
}

fn multipart_error(e: MultipartError) -> ReportError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ReportError::UploadTooLarge(e.body_text())
    } else {
        ReportError::Multipart(e.body_text())
    }
}
