use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, http::StatusCode, web};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::TryStreamExt;
use futures_util::StreamExt;
use log::{error, info, warn};
use shared::{AnalyzeRequest, AnalyzeResponse, ErrorKind, ErrorResponse, UploadResponse};
use std::path::PathBuf;

use crate::pipeline::{Submission, SubmissionError, UploadPipeline};
use crate::storage::{FALLBACK_CONTENT_TYPE, detect_content_type};

#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub upload_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, settings: &RouteSettings) {
    // base64 inflates by 4/3; leave room for the JSON envelope
    let json_limit = json_body_limit(settings.max_upload_bytes);

    cfg.app_data(web::Data::new(settings.clone()))
        .service(web::resource("/upload").route(web::post().to(handle_upload)))
        .service(
            web::resource("/api/analyze")
                .app_data(web::JsonConfig::default().limit(json_limit))
                .route(web::post().to(handle_analyze)),
        );

    if let Some(upload_dir) = &settings.upload_dir {
        cfg.service(Files::new("/uploads", upload_dir.clone()));
    }
}

fn json_body_limit(max_upload_bytes: usize) -> usize {
    (max_upload_bytes / 3)
        .saturating_add(1)
        .saturating_mul(4)
        .saturating_add(1024)
}

fn error_json(status: StatusCode, kind: ErrorKind, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: message,
        kind,
    })
}

fn submission_error_response(e: &SubmissionError) -> HttpResponse {
    let status = match e {
        SubmissionError::Input(_) => StatusCode::BAD_REQUEST,
        SubmissionError::Storage(_) => StatusCode::BAD_GATEWAY,
    };
    error_json(status, e.kind(), e.to_string())
}

struct UploadForm {
    file: Vec<u8>,
    declared_type: Option<String>,
    uploader: Option<String>,
}

enum FormError {
    TooLarge,
    Multipart(Error),
}

async fn read_upload_form(mut payload: Multipart, limit: usize) -> Result<UploadForm, FormError> {
    let mut form = UploadForm {
        file: Vec::new(),
        declared_type: None,
        uploader: None,
    };

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| FormError::Multipart(e.into()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let declared_type = field.content_type().map(|mime| mime.essence_str().to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| FormError::Multipart(e.into()))?;
            if form.file.len() + data.len() + chunk.len() > limit {
                return Err(FormError::TooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => {
                form.file = data;
                form.declared_type = declared_type;
            }
            "uploader" => form.uploader = Some(String::from_utf8_lossy(&data).into_owned()),
            other => log::debug!("Ignoring unexpected form field: {}", other),
        }
    }
    Ok(form)
}

async fn handle_upload(
    pipeline: web::Data<UploadPipeline>,
    settings: web::Data<RouteSettings>,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let form = match read_upload_form(payload, settings.max_upload_bytes).await {
        Ok(form) => form,
        Err(FormError::TooLarge) => {
            warn!("Rejected upload larger than {} bytes", settings.max_upload_bytes);
            return Ok(error_json(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorKind::Input,
                format!("File exceeds {} bytes", settings.max_upload_bytes),
            ));
        }
        Err(FormError::Multipart(e)) => return Err(e),
    };

    let content_type = detect_content_type(form.declared_type.as_deref(), &form.file);
    let submission = Submission::new(form.file, form.uploader, content_type);

    match pipeline.submit(submission).await {
        Ok(submitted) => {
            submitted.enrichment.detach();
            let receipt = submitted.receipt;
            info!("Upload {} accepted", receipt.tracker_id);
            Ok(HttpResponse::Ok().json(UploadResponse {
                message: "File uploaded successfully".to_string(),
                file_url: receipt.retrieval_url,
                tracker_id: receipt.tracker_id,
            }))
        }
        Err(e) => {
            error!("Upload rejected: {}", e);
            Ok(submission_error_response(&e))
        }
    }
}

/// Every `/api/analyze` reply uses the `AnalyzeResponse` shape.
fn analyze_failure(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(AnalyzeResponse {
        success: false,
        analysis: None,
        error: Some(message.to_string()),
    })
}

/// Accepts raw base64 or a `data:` URL.
fn decode_image(encoded: &str) -> Option<Vec<u8>> {
    let encoded = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    STANDARD
        .decode(encoded.trim())
        .ok()
        .filter(|bytes| !bytes.is_empty())
}

async fn handle_analyze(
    pipeline: web::Data<UploadPipeline>,
    body: web::Json<AnalyzeRequest>,
) -> HttpResponse {
    let Some(analyzer) = pipeline.analyzer() else {
        return analyze_failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "Image analysis is not configured",
        );
    };

    let Some(bytes) = body.image_base64.as_deref().and_then(decode_image) else {
        return analyze_failure(StatusCode::BAD_REQUEST, "Base64 image is missing");
    };

    let mut content_type = detect_content_type(None, &bytes);
    if content_type == FALLBACK_CONTENT_TYPE {
        content_type = "image/jpeg".to_string();
    }

    match analyzer.analyze(&bytes, &content_type, pipeline.prompt()).await {
        Ok(analysis) => HttpResponse::Ok().json(AnalyzeResponse {
            success: true,
            analysis: Some(analysis),
            error: None,
        }),
        Err(e) => {
            error!("AI analysis failed: {}", e);
            analyze_failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get AI analysis")
        }
    }
}
