use adapter::CommandEnvelope;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use domain::{
    ActorId, AlertError, AlertTrigger, AppCommand, AttachmentRef, CommunityId, DeliveryReport,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::state::AppState;

// 外部触发（如封禁钩子）：调用方已知来源社区
// 什么情况值得调用是调用方的策略，这个端点只负责跑管线
#[derive(Deserialize)]
pub struct RaiseAlertRequest {
    pub user_id: String,
    pub reason: String,
    pub origin: String, // 发起警报的接收警报社区 id
    pub attachment: Option<String>,
}

#[derive(Serialize)]
pub struct RaiseAlertResponse {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
    pub summary: String,
}

pub async fn raise_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RaiseAlertRequest>,
) -> Result<Json<RaiseAlertResponse>, (StatusCode, String)> {
    authorize(&headers, &state.trigger_token)?;

    let actor =
        ActorId::new(payload.user_id).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    if payload.reason.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "A reason for the alert is required.".to_string(),
        ));
    }

    let cmd = AppCommand::RaiseAlert {
        actor,
        reason: payload.reason,
        attachment: payload.attachment.map(AttachmentRef::new),
        trigger: AlertTrigger::External {
            origin: CommunityId::new(payload.origin),
        },
    };

    let (tx, rx) = oneshot::channel();
    if state
        .sender
        .send(CommandEnvelope { cmd, resp: tx })
        .await
        .is_err()
    {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Worker closed".to_string(),
        ));
    }

    let result = rx.await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Worker dropped the invocation".to_string(),
        )
    })?;

    match result {
        Ok(report) => Ok(Json(to_response(report))),
        Err(e) => Err((status_for(&e), e.to_string())),
    }
}

fn authorize(headers: &HeaderMap, token: &str) -> Result<(), (StatusCode, String)> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match provided {
        Some(p) if p == token => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            "Invalid trigger token".to_string(),
        )),
    }
}

fn to_response(report: DeliveryReport) -> RaiseAlertResponse {
    RaiseAlertResponse {
        summary: report.summary(),
        delivered: report
            .delivered
            .iter()
            .map(|id| id.as_str().to_string())
            .collect(),
        failed: report
            .failed
            .iter()
            .map(|(id, reason)| format!("{}: {}", id, reason))
            .collect(),
    }
}

fn status_for(err: &AlertError) -> StatusCode {
    match err {
        AlertError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AlertError::NoOriginFound | AlertError::OriginUnresolved | AlertError::Selector(_) => {
            StatusCode::CONFLICT
        }
        AlertError::Registry(_) => StatusCode::BAD_GATEWAY,
    }
}
