use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::{AccessError, OperatorContext, OperatorDirectory};
use super::archive::{ArchiveReceipt, ExportFailure, ExportSink};
use super::domain::{NewCustomer, OnboardingError, Product};
use super::expiry::PurgedBlock;
use super::service::{OnboardingService, OnboardingServiceError};
use super::store::RecordStore;
use super::table::RecordFilter;

pub const OPERATOR_HEADER: &str = "x-operator";
pub const SECRET_HEADER: &str = "x-operator-secret";

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Shared state for the onboarding endpoints.
pub struct OnboardingApi<S, E> {
    service: Arc<OnboardingService<S, E>>,
    operators: Arc<OperatorDirectory>,
    clock: Clock,
}

impl<S, E> Clone for OnboardingApi<S, E> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            operators: Arc::clone(&self.operators),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, E> OnboardingApi<S, E> {
    pub fn new(service: Arc<OnboardingService<S, E>>, operators: Arc<OperatorDirectory>) -> Self {
        Self {
            service,
            operators,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replaces the wall clock, e.g. to evaluate the board as of a fixed instant.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<OperatorContext, AccessError> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
        };
        self.operators
            .authenticate(header(OPERATOR_HEADER), header(SECRET_HEADER))
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product: Product,
    /// Defaults to today; any other date is rejected.
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationSummary {
    pub remaining_rows: usize,
    pub purged: Vec<PurgedBlock>,
    pub archived: Vec<ArchiveReceipt>,
    pub export_failures: Vec<ExportFailure>,
}

/// Router builder exposing the board, insertion, toggle, report and evaluation endpoints.
pub fn onboarding_router<S, E>(api: OnboardingApi<S, E>) -> Router
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/customers",
            get(board_handler::<S, E>).post(insert_handler::<S, E>),
        )
        .route(
            "/api/v1/customers/:customer/toggle",
            post(toggle_handler::<S, E>),
        )
        .route("/api/v1/report", get(report_handler::<S, E>))
        .route("/api/v1/evaluate", post(evaluate_handler::<S, E>))
        .with_state(api)
}

pub(crate) async fn board_handler<S, E>(
    State(api): State<OnboardingApi<S, E>>,
    headers: HeaderMap,
    Query(filter): Query<RecordFilter>,
) -> Response
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    let context = match api.authenticate(&headers) {
        Ok(context) => context,
        Err(err) => return access_error_response(err),
    };

    match api.service.board(&context, &filter, api.now()) {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn insert_handler<S, E>(
    State(api): State<OnboardingApi<S, E>>,
    headers: HeaderMap,
    Json(customer): Json<NewCustomer>,
) -> Response
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    let context = match api.authenticate(&headers) {
        Ok(context) => context,
        Err(err) => return access_error_response(err),
    };

    match api.service.insert_customer(&context, customer, api.now()) {
        Ok(rows) => (StatusCode::CREATED, Json(rows)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn toggle_handler<S, E>(
    State(api): State<OnboardingApi<S, E>>,
    headers: HeaderMap,
    Path(customer): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> Response
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    let context = match api.authenticate(&headers) {
        Ok(context) => context,
        Err(err) => return access_error_response(err),
    };

    let now = api.now();
    let scheduled_date = request.scheduled_date.unwrap_or_else(|| now.date());
    match api
        .service
        .toggle_product(&context, &customer, scheduled_date, request.product, now)
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn report_handler<S, E>(
    State(api): State<OnboardingApi<S, E>>,
    headers: HeaderMap,
    Query(filter): Query<RecordFilter>,
) -> Response
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    let context = match api.authenticate(&headers) {
        Ok(context) => context,
        Err(err) => return access_error_response(err),
    };

    match api.service.report(&context, &filter, api.now()) {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn evaluate_handler<S, E>(
    State(api): State<OnboardingApi<S, E>>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    E: ExportSink + 'static,
{
    if let Err(err) = api.authenticate(&headers) {
        return access_error_response(err);
    }

    match api.service.evaluate(api.now()) {
        Ok(outcome) => {
            let summary = EvaluationSummary {
                remaining_rows: outcome.table.len(),
                purged: outcome.purged,
                archived: outcome.archived,
                export_failures: outcome.export_failures,
            };
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) fn access_error_response(err: AccessError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

pub(crate) fn service_error_response(err: OnboardingServiceError) -> Response {
    let status = match &err {
        OnboardingServiceError::Validation(validation) => validation_status(validation),
        OnboardingServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) fn validation_status(err: &OnboardingError) -> StatusCode {
    match err {
        OnboardingError::NotCurrentDay { .. } | OnboardingError::MissingField(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OnboardingError::DuplicateCustomer(_) => StatusCode::CONFLICT,
        OnboardingError::CustomerNotFound(_) | OnboardingError::RowNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        OnboardingError::OutOfScope(_) => StatusCode::FORBIDDEN,
    }
}
