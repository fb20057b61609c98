use serde::Deserialize;

/// Both ids are optional at the JSON level so that a missing field gets a
/// field-specific validation message instead of a generic decode error.
#[derive(Debug, Deserialize)]
pub struct CreateParticipationRequest {
    pub athlete_id: Option<i64>,
    pub competition_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaceRequest {
    pub place: Option<i32>,
}
