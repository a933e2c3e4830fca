use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::domain::{RegistrantId, RegistrantSummary};
use super::intake::RegistrationForm;
use super::notification::{NotificationReport, Notifier};
use super::repository::RegistrantRepository;
use super::roster::{ProgramOccupancy, RosterFilter};
use super::service::{RegistrationReceipt, RegistrationService, WithdrawalReceipt};
use crate::error::AppError;

type SharedService<R, N> = State<Arc<RegistrationService<R, N>>>;

/// Router builder exposing registration, withdrawal, and roster endpoints.
pub fn registration_router<R, N>(service: Arc<RegistrationService<R, N>>) -> Router
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/registrations",
            post(register_handler::<R, N>).get(roster_handler::<R, N>),
        )
        .route(
            "/api/v1/registrations/:email",
            get(status_handler::<R, N>).delete(withdraw_handler::<R, N>),
        )
        .route(
            "/api/v1/registrations/:email/notifications",
            post(resend_handler::<R, N>),
        )
        .route("/api/v1/programs", get(programs_handler::<R, N>))
        .with_state(service)
}

pub(crate) async fn register_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegistrationReceipt>), AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    let receipt = service.submit(form)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub(crate) async fn roster_handler<R, N>(
    State(service): SharedService<R, N>,
    Query(filter): Query<RosterFilter>,
) -> Result<Json<Vec<RegistrantSummary>>, AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    Ok(Json(service.roster(&filter)?))
}

pub(crate) async fn status_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(email): Path<String>,
) -> Result<Json<RegistrantSummary>, AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    let registrant = service.get(&RegistrantId::new(email))?;
    Ok(Json(registrant.summary()))
}

pub(crate) async fn withdraw_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(email): Path<String>,
) -> Result<Json<WithdrawalReceipt>, AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    Ok(Json(service.withdraw(&RegistrantId::new(email))?))
}

pub(crate) async fn resend_handler<R, N>(
    State(service): SharedService<R, N>,
    Path(email): Path<String>,
) -> Result<Json<NotificationReport>, AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    Ok(Json(
        service.resend_notification(&RegistrantId::new(email))?,
    ))
}

pub(crate) async fn programs_handler<R, N>(
    State(service): SharedService<R, N>,
) -> Result<Json<Vec<ProgramOccupancy>>, AppError>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    Ok(Json(service.occupancy()?))
}
