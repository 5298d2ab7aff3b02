use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use strivex_core::hydration::HydrationOutcome;
use strivex_core::models::*;
use strivex_core::progression::{CompletionOutcome, XpAward};
use strivex_core::EngineError;

use super::AppEngine;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
/// The full error is logged server-side, clients only see a generic message.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Rejected requests are returned as-is; storage failures go through [`internal_error`].
fn engine_error(e: EngineError) -> (StatusCode, String) {
    if e.is_not_found() {
        tracing::warn!("Not found: {}", e);
        return (StatusCode::NOT_FOUND, e.to_string());
    }
    if e.is_validation() {
        tracing::warn!("Validation error: {}", e);
        return (StatusCode::BAD_REQUEST, e.to_string());
    }
    internal_error(e)
}

/// A result paired with the line shown to the hunter.
#[derive(Debug, Serialize)]
pub struct Feedback<T> {
    #[serde(flatten)]
    pub result: T,
    pub message: String,
}

// ============================================================
// Request bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct BonusInput {
    pub amount: u64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteQuestInput {
    pub category: String,
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct SetDayInput {
    /// `None` or `"Rest"` makes the day a rest day.
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustInput {
    pub field: ExerciseField,
    pub delta: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanDay {
    pub day: u8,
    pub name: String,
    /// `None` on a rest day.
    pub category: Option<String>,
}

fn plan_days(plan: &WorkoutPlan) -> Vec<PlanDay> {
    plan.week()
        .into_iter()
        .map(|(day, category)| PlanDay {
            day: day.index(),
            name: day.name().to_string(),
            category: category.map(str::to_string),
        })
        .collect()
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Profile
// ============================================================

pub async fn get_profile(
    State(engine): State<AppEngine>,
) -> Result<Json<ProfileView>, (StatusCode, String)> {
    engine.profile_view().await.map(Json).map_err(engine_error)
}

pub async fn grant_bonus(
    State(engine): State<AppEngine>,
    Json(input): Json<BonusInput>,
) -> Result<Json<Feedback<XpAward>>, (StatusCode, String)> {
    let reason = input.reason.as_deref().unwrap_or("bonus");
    let award = engine
        .progression
        .grant_bonus_xp(input.amount, reason)
        .await
        .map_err(internal_error)?;

    Ok(Json(Feedback {
        message: award.message(),
        result: award,
    }))
}

pub async fn reset(State(engine): State<AppEngine>) -> Result<StatusCode, (StatusCode, String)> {
    engine.progression.reset().await.map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Quests
// ============================================================

pub async fn todays_quest(
    State(engine): State<AppEngine>,
) -> Result<Json<TodaysQuest>, (StatusCode, String)> {
    engine.todays_quest().await.map(Json).map_err(engine_error)
}

pub async fn complete_quest(
    State(engine): State<AppEngine>,
    Json(input): Json<CompleteQuestInput>,
) -> Result<Json<Feedback<CompletionOutcome>>, (StatusCode, String)> {
    let outcome = engine
        .complete_quest(&input.category, input.index)
        .await
        .map_err(engine_error)?;

    Ok(Json(Feedback {
        message: outcome.message(),
        result: outcome,
    }))
}

// ============================================================
// Weekly plan
// ============================================================

pub async fn get_plan(
    State(engine): State<AppEngine>,
) -> Result<Json<Vec<PlanDay>>, (StatusCode, String)> {
    let plan = engine.plan.plan().await.map_err(engine_error)?;
    Ok(Json(plan_days(&plan)))
}

pub async fn set_plan_day(
    State(engine): State<AppEngine>,
    Path(day): Path<u8>,
    Json(input): Json<SetDayInput>,
) -> Result<Json<Vec<PlanDay>>, (StatusCode, String)> {
    let day = DayOfWeek::new(day).ok_or((
        StatusCode::BAD_REQUEST,
        format!("Day must be 0-6, got {}", day),
    ))?;

    let plan = engine
        .plan
        .set_day(day, input.category.as_deref())
        .await
        .map_err(engine_error)?;
    Ok(Json(plan_days(&plan)))
}

// ============================================================
// Categories
// ============================================================

pub async fn list_categories(
    State(engine): State<AppEngine>,
) -> Result<Json<Vec<CustomCategory>>, (StatusCode, String)> {
    let mut categories = Vec::new();
    for name in engine.plan.categories().await.map_err(engine_error)? {
        let icon = engine.plan.category_icon(&name).await.map_err(engine_error)?;
        categories.push(CustomCategory { name, icon });
    }
    Ok(Json(categories))
}

pub async fn list_custom_categories(
    State(engine): State<AppEngine>,
) -> Result<Json<Vec<CustomCategory>>, (StatusCode, String)> {
    engine
        .plan
        .custom_categories()
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn add_custom_category(
    State(engine): State<AppEngine>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<(StatusCode, Json<CustomCategory>), (StatusCode, String)> {
    let icon = input.icon.as_deref().unwrap_or(FALLBACK_ICON);
    engine
        .plan
        .add_custom_category(&input.name, icon)
        .await
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(engine_error)
}

pub async fn delete_custom_category(
    State(engine): State<AppEngine>,
    Path(name): Path<String>,
) -> Result<Json<DeletedCategory>, (StatusCode, String)> {
    engine
        .plan
        .delete_custom_category(&name)
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn restore_custom_category(
    State(engine): State<AppEngine>,
    Json(deleted): Json<DeletedCategory>,
) -> Result<Json<Vec<PlanDay>>, (StatusCode, String)> {
    let plan = engine
        .plan
        .restore_custom_category(&deleted)
        .await
        .map_err(engine_error)?;
    Ok(Json(plan_days(&plan)))
}

pub async fn list_exercises(
    State(engine): State<AppEngine>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Exercise>>, (StatusCode, String)> {
    engine
        .plan
        .exercises(&name)
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn replace_exercises(
    State(engine): State<AppEngine>,
    Path(name): Path<String>,
    Json(exercises): Json<Vec<Exercise>>,
) -> Result<Json<Vec<Exercise>>, (StatusCode, String)> {
    engine
        .plan
        .set_exercises(&name, exercises)
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn adjust_exercise(
    State(engine): State<AppEngine>,
    Path((name, index)): Path<(String, usize)>,
    Json(input): Json<AdjustInput>,
) -> Result<Json<Exercise>, (StatusCode, String)> {
    engine
        .plan
        .adjust_exercise(&name, index, input.field, input.delta)
        .await
        .map(Json)
        .map_err(engine_error)
}

// ============================================================
// Custom exercise library
// ============================================================

pub async fn list_library(
    State(engine): State<AppEngine>,
) -> Result<Json<Vec<Exercise>>, (StatusCode, String)> {
    engine.plan.library().await.map(Json).map_err(engine_error)
}

pub async fn save_to_library(
    State(engine): State<AppEngine>,
    Json(exercise): Json<Exercise>,
) -> Result<(StatusCode, Json<Vec<Exercise>>), (StatusCode, String)> {
    engine
        .plan
        .save_to_library(exercise)
        .await
        .map(|library| (StatusCode::CREATED, Json(library)))
        .map_err(engine_error)
}

pub async fn remove_from_library(
    State(engine): State<AppEngine>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if engine
        .plan
        .remove_from_library(&name)
        .await
        .map_err(engine_error)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Exercise not found".to_string()))
    }
}

// ============================================================
// Hydration
// ============================================================

pub async fn hydration_status(
    State(engine): State<AppEngine>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let level = engine.hydration.level().await.map_err(internal_error)?;
    let state = engine.hydration.state().await.map_err(internal_error)?;
    Ok(Json(serde_json::json!({
        "level": level,
        "streak": state.streak,
        "lastHydrated": state.last_hydrated,
    })))
}

pub async fn hydration_tap(
    State(engine): State<AppEngine>,
) -> Result<Json<HydrationOutcome>, (StatusCode, String)> {
    engine.hydration.tap().await.map(Json).map_err(internal_error)
}

// ============================================================
// Debug
// ============================================================

pub async fn storage_preview(
    State(engine): State<AppEngine>,
) -> Result<Json<BTreeMap<String, String>>, (StatusCode, String)> {
    engine.storage_preview().await.map(Json).map_err(engine_error)
}
