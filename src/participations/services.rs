use anyhow::Context;
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateParticipationRequest, UpdatePlaceRequest},
    repo::{Participation, ParticipationDetails},
};
use crate::{
    athletes::repo::AthleteStore,
    auth::claims::Identity,
    competitions::repo::CompetitionStore,
    error::{AppError, AppResult},
    state::AppState,
};

fn positive_id(value: Option<i64>, field: &str) -> AppResult<i64> {
    match value {
        None => Err(AppError::validation(format!("{field} is required"))),
        Some(id) if id <= 0 => Err(AppError::validation(format!(
            "{field} must be a positive integer"
        ))),
        Some(id) => Ok(id),
    }
}

/// Looks up both referenced entities concurrently and succeeds only if both
/// exist. Both lookups are awaited before deciding; the athlete is reported
/// first when both are missing.
pub async fn ensure_references_exist(
    athletes: &dyn AthleteStore,
    competitions: &dyn CompetitionStore,
    athlete_id: i64,
    competition_id: i64,
) -> AppResult<()> {
    let (athlete, competition) = tokio::join!(
        athletes.find_by_id(athlete_id),
        competitions.find_by_id(competition_id),
    );

    if athlete.context("look up athlete")?.is_none() {
        return Err(AppError::validation(format!(
            "athlete with ID {athlete_id} not found"
        )));
    }
    if competition.context("look up competition")?.is_none() {
        return Err(AppError::validation(format!(
            "competition with ID {competition_id} not found"
        )));
    }
    Ok(())
}

/// Registers an athlete for a competition. Nothing is written unless both
/// references resolve. Registering the same pair twice is accepted.
#[instrument(skip(state, actor), fields(caller = %actor.username))]
pub async fn create(
    state: &AppState,
    actor: &Identity,
    req: CreateParticipationRequest,
) -> AppResult<Participation> {
    let athlete_id = positive_id(req.athlete_id, "athlete_id")?;
    let competition_id = positive_id(req.competition_id, "competition_id")?;

    if let Err(e) = ensure_references_exist(
        state.athletes.as_ref(),
        state.competitions.as_ref(),
        athlete_id,
        competition_id,
    )
    .await
    {
        warn!(athlete_id, competition_id, error = %e, "participation rejected");
        return Err(e);
    }

    let participation = state
        .participations
        .insert(athlete_id, competition_id)
        .await?;
    info!(
        participation_id = participation.id,
        athlete_id, competition_id, "participation created"
    );
    Ok(participation)
}

pub async fn list(state: &AppState) -> AppResult<Vec<ParticipationDetails>> {
    Ok(state.participations.list().await?)
}

pub async fn get(state: &AppState, id: i64) -> AppResult<ParticipationDetails> {
    state
        .participations
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("participation not found"))
}

/// Records a result. `place` must be present and at least 1; an unset place
/// is how "no result yet" is represented, so 0 is never stored.
#[instrument(skip(state, actor), fields(caller = %actor.username))]
pub async fn update_place(
    state: &AppState,
    actor: &Identity,
    id: i64,
    req: UpdatePlaceRequest,
) -> AppResult<ParticipationDetails> {
    let place = match req.place {
        None => return Err(AppError::validation("place is required")),
        Some(p) if p <= 0 => {
            return Err(AppError::validation("place must be a positive integer"))
        }
        Some(p) => p,
    };

    if !state.participations.update_place(id, place).await? {
        return Err(AppError::not_found("participation not found"));
    }
    info!(participation_id = id, place, "place updated");
    get(state, id).await
}

#[instrument(skip(state, actor), fields(caller = %actor.username))]
pub async fn delete(state: &AppState, actor: &Identity, id: i64) -> AppResult<()> {
    if !state.participations.delete(id).await? {
        return Err(AppError::not_found("participation not found"));
    }
    info!(participation_id = id, "participation deleted");
    Ok(())
}
