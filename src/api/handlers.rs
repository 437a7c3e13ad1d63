use crate::accounts::{LoginRequest, SignupRequest};
use crate::api::{AppState, AuthUser};
use crate::catalog;
use crate::error::{AppError, Result};
use crate::forms;
use crate::insights::{self, DiseaseStats, Region, RegionalStats, TrendingTopic, WordCount};
use crate::metrics::REVIEWS_TOTAL;
use crate::ml::{schema_for, FeatureDomain, ModelStatus};
use crate::models::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Predictions per history page
pub const HISTORY_PAGE_SIZE: u32 = 10;

/// Reviews shown on a disease page
pub const DISEASE_REVIEW_LIMIT: u32 = 10;

/// Reviews shown on the home page
pub const HOME_REVIEW_LIMIT: u32 = 6;

// ============================================================================
// Health & metrics
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Readiness: every classifier that failed to initialize is listed
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let models = state.predictions.status();
    let unavailable: Vec<DiseaseKind> = models
        .iter()
        .filter(|m| !m.loaded)
        .map(|m| m.disease)
        .collect();

    let status = if unavailable.is_empty() { "ready" } else { "degraded" };
    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: status.to_string(),
            models,
            unavailable,
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub models: Vec<ModelStatus>,
    pub unavailable: Vec<DiseaseKind>,
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    crate::metrics::UPTIME_SECONDS.set(state.started_at.elapsed().as_secs_f64());
    (StatusCode::OK, crate::metrics::gather_metrics())
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let password = request.password.clone();
    let user = state.accounts.signup(request).await?;

    // Signing up logs the new user in
    let (session, user) = state
        .accounts
        .login(LoginRequest {
            username: user.username,
            password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token: session.token,
            user: UserSummary::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let (session, user) = state.accounts.login(request).await?;
    Ok(Json(SessionResponse {
        token: session.token,
        user: UserSummary::from(&user),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    state.accounts.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserSummary,
}

// ============================================================================
// Home & diseases
// ============================================================================

pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let recent_reviews = state
        .store
        .list_reviews(
            &ReviewFilter {
                flagged: Some(false),
                ..Default::default()
            },
            0,
            HOME_REVIEW_LIMIT,
        )
        .await?;

    Ok(Json(HomeResponse {
        diseases_stats: insights::all_disease_stats(),
        recent_reviews,
        trending_diseases: insights::trending_topics(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub diseases_stats: Vec<DiseaseStats>,
    pub recent_reviews: Vec<Review>,
    pub trending_diseases: Vec<TrendingTopic>,
}

fn parse_kind(name: &str) -> Result<DiseaseKind> {
    DiseaseKind::from_slug(name)
        .ok_or_else(|| AppError::NotFound(format!("Disease {} not found", name)))
}

/// Stored record for a disease, created from the catalog when missing
pub(crate) async fn ensure_disease(state: &AppState, kind: DiseaseKind) -> Result<Disease> {
    if let Some(disease) = state.store.get_disease_by_kind(kind).await? {
        return Ok(disease);
    }
    let disease = catalog::entry(kind).to_disease();
    state.store.save_disease(&disease).await?;
    Ok(disease)
}

pub async fn list_diseases(State(state): State<AppState>) -> Result<Json<Vec<Disease>>> {
    let mut diseases = Vec::new();
    for kind in DiseaseKind::all() {
        diseases.push(ensure_disease(&state, kind).await?);
    }
    diseases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(diseases))
}

pub async fn disease_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DiseaseDetailResponse>> {
    let kind = parse_kind(&name)?;
    let disease = ensure_disease(&state, kind).await?;

    let reviews = state
        .store
        .list_reviews(
            &ReviewFilter {
                disease: Some(kind),
                flagged: Some(false),
                ..Default::default()
            },
            0,
            DISEASE_REVIEW_LIMIT,
        )
        .await?;

    let stats = insights::disease_stats(kind);
    let regional = insights::disease_stats::regional_stats_from(&stats, Region::Global);

    Ok(Json(DiseaseDetailResponse {
        slug: kind.slug(),
        symptoms: disease.symptom_list(),
        prevention: disease.prevention_list(),
        average_rating: average_rating(&reviews),
        form: form_fields(kind),
        disease,
        stats,
        regional,
        reviews,
    }))
}

#[derive(Debug, Serialize)]
pub struct DiseaseDetailResponse {
    pub slug: String,
    pub disease: Disease,
    pub symptoms: Vec<String>,
    pub prevention: Vec<String>,
    pub stats: DiseaseStats,
    pub regional: RegionalStats,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub form: Vec<FormField>,
}

/// Describes one input of a disease's prediction form
#[derive(Debug, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<FormChoice>,
}

#[derive(Debug, Serialize)]
pub struct FormChoice {
    pub value: u8,
    pub label: &'static str,
}

fn form_fields(kind: DiseaseKind) -> Vec<FormField> {
    schema_for(kind)
        .features
        .iter()
        .map(|spec| match spec.domain {
            FeatureDomain::Range { min, max } => FormField {
                name: spec.name,
                label: spec.label,
                min: Some(min),
                max: Some(max),
                choices: Vec::new(),
            },
            FeatureDomain::Choice(choices) => FormField {
                name: spec.name,
                label: spec.label,
                min: None,
                max: None,
                choices: choices
                    .iter()
                    .map(|&(value, label)| FormChoice { value, label })
                    .collect(),
            },
        })
        .collect()
}

pub async fn disease_stats(Path(name): Path<String>) -> Result<Json<DiseaseStats>> {
    let kind = parse_kind(&name)?;
    Ok(Json(insights::disease_stats(kind)))
}

pub async fn regional_stats(
    Path((name, region)): Path<(String, String)>,
) -> Result<Json<RegionalStats>> {
    let kind = parse_kind(&name)?;
    let region = Region::parse(&region)?;
    Ok(Json(insights::regional_stats(kind, region)))
}

pub async fn public_word_cloud(State(state): State<AppState>) -> Result<Json<Vec<WordCount>>> {
    let reviews = state
        .store
        .list_reviews(
            &ReviewFilter {
                flagged: Some(false),
                ..Default::default()
            },
            0,
            u32::MAX,
        )
        .await?;
    Ok(Json(insights::review_word_cloud(&reviews)))
}

// ============================================================================
// Predictions
// ============================================================================

/// Validate the form, run the classifier and persist the prediction
pub async fn predict(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<PredictionResponse>)> {
    let kind = parse_kind(&name)?;
    let input = forms::parse_form(kind, body)?;
    let disease = ensure_disease(&state, kind).await?;

    let assessment = state.predictions.assess(kind, input.clone()).await?;

    let prediction = Prediction::new(
        user.id,
        disease.id,
        kind,
        input,
        assessment.risk_level,
        assessment.confidence,
    );
    state.store.save_prediction(&prediction).await?;

    tracing::info!(
        prediction_id = %prediction.id,
        user_id = %user.id,
        disease = %kind,
        risk_level = %assessment.risk_level,
        confidence = assessment.confidence,
        "🩺 Prediction recorded"
    );

    Ok((
        StatusCode::CREATED,
        Json(PredictionResponse {
            risk_label: assessment.risk_level.label().to_string(),
            predicted_class: assessment.predicted_class,
            probabilities: assessment.probabilities,
            disease_name: disease.name,
            prediction,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: Prediction,
    pub disease_name: String,
    pub risk_label: String,
    pub predicted_class: u8,
    pub probabilities: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 1-based
    pub page: Option<u32>,
}

/// The caller's predictions, newest first
pub async fn prediction_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<PredictionHistoryResponse>> {
    let filter = PredictionFilter::for_user(user.id);
    let all = state.store.list_predictions(&filter, 0, u32::MAX).await?;

    let total = all.len() as u64;
    let num_pages = total.div_ceil(HISTORY_PAGE_SIZE as u64).max(1) as u32;
    // Out-of-range pages clamp to the nearest valid page
    let page = params.page.unwrap_or(1).clamp(1, num_pages);

    let risk_distribution: RiskDistribution = all.iter().collect();
    let predictions = all
        .into_iter()
        .skip(((page - 1) * HISTORY_PAGE_SIZE) as usize)
        .take(HISTORY_PAGE_SIZE as usize)
        .collect();

    Ok(Json(PredictionHistoryResponse {
        predictions,
        total_predictions: total,
        risk_distribution,
        page,
        num_pages,
        page_size: HISTORY_PAGE_SIZE,
    }))
}

#[derive(Debug, Serialize)]
pub struct PredictionHistoryResponse {
    pub predictions: Vec<Prediction>,
    pub total_predictions: u64,
    pub risk_distribution: RiskDistribution,
    pub page: u32,
    pub num_pages: u32,
    pub page_size: u32,
}

/// Prediction visible to its owner or to staff
pub(crate) async fn visible_prediction(
    state: &AppState,
    user: &UserProfile,
    id: &Uuid,
) -> Result<Prediction> {
    match state.store.get_prediction(id).await? {
        Some(p) if p.user_id == user.id || user.is_staff => Ok(p),
        _ => Err(AppError::NotFound(format!("Prediction {} not found", id))),
    }
}

/// Prediction owned by the caller
pub(crate) async fn owned_prediction(
    state: &AppState,
    user: &UserProfile,
    id: &Uuid,
) -> Result<Prediction> {
    match state.store.get_prediction(id).await? {
        Some(p) if p.user_id == user.id => Ok(p),
        _ => Err(AppError::NotFound(format!("Prediction {} not found", id))),
    }
}

pub async fn get_prediction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Prediction>> {
    Ok(Json(visible_prediction(&state, &user, &id).await?))
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[validate(length(min = 1, max = 2000))]
    pub comment: String,
}

impl ReviewRequest {
    fn checked(self) -> Result<(u8, String)> {
        self.validate()?;
        let comment = self.comment.trim().to_string();
        if comment.is_empty() {
            return Err(AppError::Validation("comment cannot be blank".to_string()));
        }
        Ok((self.rating, comment))
    }
}

pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(prediction_id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let (rating, comment) = request.checked()?;
    let prediction = owned_prediction(&state, &user, &prediction_id).await?;

    let review = Review::new(
        user.id,
        prediction.disease_id,
        prediction.disease,
        prediction.id,
        rating,
        comment,
    );
    state.store.create_review(&review).await?;
    REVIEWS_TOTAL.with_label_values(&["created"]).inc();

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn prediction_reviews(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(prediction_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>> {
    let prediction = visible_prediction(&state, &user, &prediction_id).await?;
    let reviews = state
        .store
        .list_reviews(
            &ReviewFilter {
                prediction_id: Some(prediction.id),
                ..Default::default()
            },
            0,
            u32::MAX,
        )
        .await?;
    Ok(Json(reviews))
}

async fn owned_review(state: &AppState, user: &UserProfile, id: &Uuid) -> Result<Review> {
    match state.store.get_review(id).await? {
        Some(review) if review.user_id == user.id => Ok(review),
        _ => Err(AppError::NotFound(format!("Review {} not found", id))),
    }
}

pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    let (rating, comment) = request.checked()?;
    let mut review = owned_review(&state, &user, &id).await?;

    review.edit(rating, comment);
    state.store.update_review(&review).await?;
    REVIEWS_TOTAL.with_label_values(&["updated"]).inc();

    Ok(Json(review))
}

/// Owners delete their own reviews; staff may delete any
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let review = match state.store.get_review(&id).await? {
        Some(review) if review.user_id == user.id || user.is_staff => review,
        _ => return Err(AppError::NotFound(format!("Review {} not found", id))),
    };

    state.store.delete_review(&review.id).await?;
    REVIEWS_TOTAL.with_label_values(&["deleted"]).inc();
    tracing::info!(review_id = %review.id, by = %user.id, "Review deleted");

    Ok(StatusCode::NO_CONTENT)
}
