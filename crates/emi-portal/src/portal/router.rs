use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::activity::LogId;
use super::domain::{ApplicationDraft, ApplicationId, ApplicationStatus, MerchantContext, StoreDraft};
use super::lifecycle::ApplicationPatch;
use super::report;
use super::repository::{
    ActivityLogStore, ApplicationRepository, RepositoryError, StoreDirectory,
};
use super::service::{PortalService, PortalServiceError};

/// Router builder exposing the portal's HTTP surface.
pub fn portal_router<R, L, S>(service: Arc<PortalService<R, L, S>>) -> Router
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<R, L, S>).get(list_handler::<R, L, S>),
        )
        .route(
            "/api/v1/applications/:id",
            get(detail_handler::<R, L, S>)
                .put(edit_handler::<R, L, S>)
                .delete(delete_handler::<R, L, S>),
        )
        .route(
            "/api/v1/applications/:id/status",
            post(status_handler::<R, L, S>),
        )
        .route(
            "/api/v1/applications/:id/notes",
            post(note_handler::<R, L, S>),
        )
        .route("/api/v1/activity", get(activity_handler::<R, L, S>))
        .route(
            "/api/v1/activity/clear",
            post(clear_activity_handler::<R, L, S>),
        )
        .route("/api/v1/emi/quote", post(quote_handler::<R, L, S>))
        .route(
            "/api/v1/reports/summary",
            get(summary_handler::<R, L, S>),
        )
        .route(
            "/api/v1/reports/applications.csv",
            get(applications_csv_handler::<R, L, S>),
        )
        .route(
            "/api/v1/reports/activity.csv",
            get(activity_csv_handler::<R, L, S>),
        )
        .route(
            "/api/v1/stores",
            post(register_store_handler::<R, L, S>).get(list_stores_handler::<R, L, S>),
        )
        .route(
            "/api/v1/stores/:id/status",
            post(store_status_handler::<R, L, S>),
        )
        .with_state(service)
}

fn error_response(error: PortalServiceError) -> Response {
    let status = match &error {
        PortalServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        PortalServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PortalServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PortalServiceError::Draft(_)
        | PortalServiceError::Terms(_)
        | PortalServiceError::Emi(_)
        | PortalServiceError::Lifecycle(_)
        | PortalServiceError::Recorder(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn csv_response(rendered: Result<String, report::ReportError>) -> Response {
    match rendered {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            body,
        )
            .into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(flatten)]
    pub(crate) draft: ApplicationDraft,
    pub(crate) store: String,
    pub(crate) merchant: String,
    pub(crate) actor: String,
}

pub(crate) async fn submit_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    let context = MerchantContext {
        store: request.store,
        merchant: request.merchant,
    };
    match service.submit(request.draft, context, &request.actor) {
        Ok(application) => (StatusCode::ACCEPTED, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.list() {
        Ok(applications) => {
            let views: Vec<_> = applications.iter().map(|app| app.list_view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.get(&ApplicationId(id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditRequest {
    #[serde(flatten)]
    pub(crate) patch: ApplicationPatch,
    pub(crate) actor: String,
}

pub(crate) async fn edit_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
    Json(request): Json<EditRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.edit_fields(&ApplicationId(id), &request.patch, &request.actor) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) note: Option<String>,
    pub(crate) actor: String,
}

pub(crate) async fn status_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    let new_status = match ApplicationStatus::parse(&request.status) {
        Ok(status) => status,
        Err(err) => return error_response(PortalServiceError::Lifecycle(err)),
    };

    match service.update_status(&ApplicationId(id), new_status, &request.actor, request.note) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    pub(crate) note: String,
    pub(crate) actor: String,
}

pub(crate) async fn note_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.add_note(&ApplicationId(id), &request.note, &request.actor) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorParams {
    pub(crate) actor: String,
}

pub(crate) async fn delete_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
    Query(params): Query<ActorParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    let id = ApplicationId(id);
    match service.delete(&id, &params.actor) {
        Ok(()) => {
            let payload = json!({ "deleted": id.0 });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityParams {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

pub(crate) async fn activity_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Query(params): Query<ActivityParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.activity(params.limit) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClearActivityRequest {
    pub(crate) ids: Vec<String>,
}

pub(crate) async fn clear_activity_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Json(request): Json<ClearActivityRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    let ids: Vec<LogId> = request.ids.into_iter().map(LogId).collect();
    match service.clear_activity(&ids) {
        Ok(removed) => {
            let payload = json!({ "removed": removed });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteRequest {
    pub(crate) amount: f64,
    pub(crate) tenure_months: u32,
    #[serde(default)]
    pub(crate) annual_rate_percent: Option<f64>,
}

pub(crate) async fn quote_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Json(request): Json<QuoteRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.quote(
        request.amount,
        request.tenure_months,
        request.annual_rate_percent,
    ) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.summary() {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn applications_csv_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.list() {
        Ok(applications) => csv_response(report::applications_csv(&applications)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn activity_csv_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.activity(None) {
        Ok(entries) => csv_response(report::activity_csv(&entries)),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterStoreRequest {
    #[serde(flatten)]
    pub(crate) draft: StoreDraft,
    pub(crate) actor: String,
}

pub(crate) async fn register_store_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Json(request): Json<RegisterStoreRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.register_store(request.draft, &request.actor) {
        Ok(store) => (StatusCode::CREATED, Json(store)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_stores_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.list_stores() {
        Ok(stores) => (StatusCode::OK, Json(stores)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoreStatusRequest {
    pub(crate) status: super::domain::StoreStatus,
    pub(crate) actor: String,
}

pub(crate) async fn store_status_handler<R, L, S>(
    State(service): State<Arc<PortalService<R, L, S>>>,
    Path(id): Path<String>,
    Json(request): Json<StoreStatusRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    match service.set_store_status(&id, request.status, &request.actor) {
        Ok(store) => (StatusCode::OK, Json(store)).into_response(),
        Err(err) => error_response(err),
    }
}
