use std::{net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing, Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;

pub const SEND_ROUTE: &str = "/api/v1.0/email/send";

/// Credentials the fake EmailJS API accepts.
#[derive(Debug, Clone)]
pub struct EmailJsCredentials {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

pub async fn start_server(
    host: IpAddr,
    port: u16,
    credentials: EmailJsCredentials,
) -> anyhow::Result<()> {
    info!("Starting emailjs testing server on {host}:{port}");
    info!("EmailJS send endpoint: http://{host}:{port}{SEND_ROUTE}");
    info!("Service ID: {:?}", credentials.service_id);
    info!("Template ID: {:?}", credentials.template_id);
    info!("Public key: {:?}", credentials.public_key);
    info!("Messages are accepted if all template params are set and not blank.");

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(credentials))
        .await
        .context("Failed to start HTTP server")
}

pub fn router(credentials: EmailJsCredentials) -> Router<()> {
    Router::new()
        .route(SEND_ROUTE, routing::post(send))
        .with_state(credentials.into())
}

#[derive(Deserialize)]
struct SendRequest {
    service_id: String,
    template_id: String,
    user_id: String,
    template_params: TemplateParams,
}

#[derive(Deserialize)]
struct TemplateParams {
    from_name: Option<String>,
    from_email: Option<String>,
    message: Option<String>,
}

async fn send(
    state: State<Arc<EmailJsCredentials>>,
    Json(request): Json<SendRequest>,
) -> (StatusCode, &'static str) {
    if request.user_id != state.public_key {
        return (StatusCode::BAD_REQUEST, "The Public Key is invalid");
    }
    if request.service_id != state.service_id {
        return (StatusCode::BAD_REQUEST, "The service ID is invalid");
    }
    if request.template_id != state.template_id {
        return (StatusCode::BAD_REQUEST, "The template ID is invalid");
    }

    let TemplateParams {
        from_name,
        from_email,
        message,
    } = request.template_params;
    let (Some(from_name), Some(from_email), Some(message)) = (
        from_name.filter(|x| !x.trim().is_empty()),
        from_email.filter(|x| !x.trim().is_empty()),
        message.filter(|x| !x.trim().is_empty()),
    ) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            "One or more template variables are missing",
        );
    };

    info!("Received message from {from_name} <{from_email}>:\n{message}");

    (StatusCode::OK, "OK")
}
