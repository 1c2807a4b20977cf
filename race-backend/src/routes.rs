use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use race_utils::{
    Store,
    api::{
        CreateUserRequest, CreateUserResponse, ToggleUnitRequest, ToggleUnitResponse,
        UpdatePlayerRequest, UpdatePlayerResponse,
    },
};
use serde_json::Value;

use crate::{error::AppError, state::AppState};

/// Unwraps a JSON body, turning any rejection (bad syntax, wrong content
/// type) into a 400 rather than axum's default status codes.
fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

pub async fn get_progress(State(state): State<Arc<AppState>>) -> Result<Json<Store>, AppError> {
    let store = state.store.get_all().await?;
    Ok(Json(store))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, AppError> {
    let CreateUserRequest { player } = body(payload)?.try_into()?;

    let outcome = state.store.create_user(&player).await?;

    Ok(Json(CreateUserResponse {
        success: true,
        exists: outcome.exists,
        data: outcome.player,
    }))
}

pub async fn toggle_unit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ToggleUnitResponse>, AppError> {
    let ToggleUnitRequest {
        player,
        index,
        value,
    } = body(payload)?.try_into()?;

    let completed = state
        .store
        .toggle_unit(&player, index, value)
        .await
        .inspect_err(|e| log::debug!("Toggle of unit {index} for {player:?} failed: {e}"))?;
    log::debug!("{player:?} set unit {index} to {value}, now {completed} completed");

    Ok(Json(ToggleUnitResponse {
        success: true,
        index,
        value,
        completed,
    }))
}

pub async fn update_player(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdatePlayerResponse>, AppError> {
    let UpdatePlayerRequest { player, units } = body(payload)?.try_into()?;

    state.store.replace_player(&player, units).await?;
    log::info!("Replaced progress for {player:?}");

    Ok(Json(UpdatePlayerResponse { success: true }))
}
