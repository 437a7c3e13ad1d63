//! Staff-only back-office endpoints

use crate::api::handlers::ensure_disease;
use crate::api::{AppState, StaffUser};
use crate::error::{AppError, Result};
use crate::insights::{self, DashboardData, DashboardProvider, WordCount};
use crate::metrics::REVIEWS_TOTAL;
use crate::ml::{ModelMetadata, ModelStatus};
use crate::models::*;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE_SIZE: u32 = 25;
const MAX_PAGE_SIZE: u32 = 100;

/// Paged listing of any record type
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// 0-based
    pub page: u32,
    pub page_size: u32,
}

fn page_bounds(page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
    (
        page.unwrap_or(0),
        page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
    )
}

fn parse_disease(raw: Option<&str>) -> Result<Option<DiseaseKind>> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            DiseaseKind::from_slug(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown disease: {}", s)))
        })
        .transpose()
}

pub async fn dashboard(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
) -> Result<Json<DashboardData>> {
    let data = DashboardProvider::new(state.store.as_ref()).snapshot().await?;
    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
pub struct WordCloudQuery {
    pub disease: Option<String>,
}

/// Word cloud over all reviews, flagged ones included
pub async fn word_cloud(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Query(params): Query<WordCloudQuery>,
) -> Result<Json<Vec<WordCount>>> {
    let filter = ReviewFilter {
        disease: parse_disease(params.disease.as_deref())?,
        ..Default::default()
    };
    let reviews = state.store.list_reviews(&filter, 0, u32::MAX).await?;
    Ok(Json(insights::review_word_cloud(&reviews)))
}

// ============================================================================
// Diseases
// ============================================================================

pub async fn list_diseases(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
) -> Result<Json<Vec<Disease>>> {
    Ok(Json(state.store.list_diseases().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDiseaseRequest {
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub symptoms: Option<String>,
    #[validate(length(min = 1))]
    pub prevention: Option<String>,
    pub global_cases: Option<u64>,
}

pub async fn update_disease(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(name): Path<String>,
    Json(request): Json<UpdateDiseaseRequest>,
) -> Result<Json<Disease>> {
    request.validate()?;
    let kind = DiseaseKind::from_slug(&name)
        .ok_or_else(|| AppError::NotFound(format!("Disease {} not found", name)))?;
    let mut disease = ensure_disease(&state, kind).await?;

    if let Some(description) = request.description {
        disease.description = description;
    }
    if let Some(symptoms) = request.symptoms {
        disease.symptoms = symptoms;
    }
    if let Some(prevention) = request.prevention {
        disease.prevention = prevention;
    }
    if let Some(global_cases) = request.global_cases {
        disease.global_cases = global_cases;
    }

    state.store.save_disease(&disease).await?;
    tracing::info!(disease = %kind, by = %staff.username, "Disease record updated");
    Ok(Json(disease))
}

// ============================================================================
// Predictions & reviews
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    pub user_id: Option<Uuid>,
    pub disease: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_predictions(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Query(params): Query<PredictionQuery>,
) -> Result<Json<Page<Prediction>>> {
    let filter = PredictionFilter {
        user_id: params.user_id,
        disease: parse_disease(params.disease.as_deref())?,
        risk_level: params.risk_level,
    };
    let (page, page_size) = page_bounds(params.page, params.page_size);

    let items = state.store.list_predictions(&filter, page, page_size).await?;
    let total = state.store.count_predictions(&filter).await?;

    Ok(Json(Page {
        items,
        total,
        page,
        page_size,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub user_id: Option<Uuid>,
    pub disease: Option<String>,
    pub flagged: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Query(params): Query<ReviewQuery>,
) -> Result<Json<Page<Review>>> {
    let filter = ReviewFilter {
        user_id: params.user_id,
        disease: parse_disease(params.disease.as_deref())?,
        prediction_id: None,
        flagged: params.flagged,
    };
    let (page, page_size) = page_bounds(params.page, params.page_size);

    let items = state.store.list_reviews(&filter, page, page_size).await?;
    let total = state.store.count_reviews(&filter).await?;

    Ok(Json(Page {
        items,
        total,
        page,
        page_size,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModerateReviewRequest {
    pub flagged: bool,
}

pub async fn moderate_review(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ModerateReviewRequest>,
) -> Result<Json<Review>> {
    let mut review = state
        .store
        .get_review(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))?;

    review.set_flagged(request.flagged);
    state.store.update_review(&review).await?;

    let action = if request.flagged { "flagged" } else { "unflagged" };
    REVIEWS_TOTAL.with_label_values(&[action]).inc();
    tracing::info!(review_id = %id, by = %staff.username, action, "Review moderated");

    Ok(Json(review))
}

// ============================================================================
// Users
// ============================================================================

pub async fn list_users(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
) -> Result<Json<Vec<UserSummary>>> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SetStaffRequest {
    pub is_staff: bool,
}

pub async fn set_staff(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStaffRequest>,
) -> Result<Json<UserSummary>> {
    if id == staff.id && !request.is_staff {
        return Err(AppError::Validation(
            "Staff users cannot revoke their own staff flag".to_string(),
        ));
    }
    let user = state.accounts.set_staff_by_id(&id, request.is_staff).await?;
    Ok(Json(UserSummary::from(&user)))
}

// ============================================================================
// Models
// ============================================================================

pub async fn model_status(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
) -> Json<Vec<ModelStatus>> {
    Json(state.predictions.status())
}

/// Retrain one disease from its CSV and swap the shared handle
pub async fn retrain_model(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(name): Path<String>,
) -> Result<Json<ModelMetadata>> {
    let kind = DiseaseKind::from_slug(&name)
        .ok_or_else(|| AppError::NotFound(format!("Disease {} not found", name)))?;

    tracing::info!(disease = %kind, by = %staff.username, "Retrain requested");
    let metadata = state.predictions.retrain(kind).await?;

    // Keep the catalog's artifact reference current
    let mut disease = ensure_disease(&state, kind).await?;
    disease.model_path = Some(state.classifiers().artifact_path(kind).display().to_string());
    state.store.save_disease(&disease).await?;

    Ok(Json(metadata))
}
