//! # Discount Routes
//!
//! HTTP handlers for the discount ledger.
//!
//! ## Routes
//! ```text
//! GET    /discounts                 list (isActive, type, page, limit)
//! GET    /discounts/active          currently active discounts
//! GET    /discounts/code/{code}     lookup by code
//! GET    /discounts/{id}            get
//! POST   /discounts                 create            → 201
//! PUT    /discounts/{id}            partial update
//! PATCH  /discounts/{id}/toggle     flip isActive
//! DELETE /discounts/{id}            delete
//! POST   /discounts/{id}/usage      record one use    { "amount": 250 }
//! ```
//!
//! Bodies are camelCase JSON. Money and `minPurchaseAmount` are integer
//! cents. `value` is a percent (0 to 100, fractions allowed) for
//! `PERCENTAGE` and whole cents for `FIXED_AMOUNT`.
//!
//! ## Status Codes
//! ```text
//! malformed JSON, wrong JSON types     400 BAD_REQUEST
//! field rules (empty code, value > 100) 400 BAD_REQUEST   + fields
//! unknown type / applicableTo          422 VALIDATION_ERROR + fields
//! ```
//!
//! In `PUT`, sending `null` for `description`, `minPurchaseAmount` or
//! `usageLimit` clears it; leaving the key out keeps it.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::caller::Caller;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use ledger_core::{
    ApplicableTo, CoreError, CreateDiscountInput, Discount, DiscountFilter, DiscountType,
    IncrementUsageInput, Money, PageRequest, UpdateDiscountInput, ValidationError,
};

// =============================================================================
// DTOs
// =============================================================================

/// Discount as returned over HTTP.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDto {
    pub id: String,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_purchase_amount: Option<i64>,
    pub applicable_to: ApplicableTo,
    pub products: Vec<String>,
    pub categories: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: bool,
    pub store: String,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub total_discount_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Discount> for DiscountDto {
    fn from(d: Discount) -> Self {
        DiscountDto {
            id: d.id,
            name: d.name,
            code: d.code,
            description: d.description,
            discount_type: d.discount_type,
            value: d.discount_type.value_from_units(d.value),
            min_purchase_amount: d.min_purchase_cents,
            applicable_to: d.applicable_to,
            products: d.products,
            categories: d.categories,
            valid_from: d.valid_from,
            valid_to: d.valid_to,
            is_active: d.is_active,
            store: d.store_id,
            usage_limit: d.usage_limit,
            usage_count: d.usage_count,
            total_discount_amount: d.total_discount,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

fn to_dtos(discounts: Vec<Discount>) -> Vec<DiscountDto> {
    discounts.into_iter().map(DiscountDto::from).collect()
}

/// Body of `POST /discounts`.
///
/// Enum fields arrive as text so an unknown name is reported as a field
/// error rather than a body parse failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub discount_type: String,
    pub value: f64,
    pub min_purchase_amount: Option<i64>,
    pub applicable_to: Option<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: Option<bool>,
    pub store: Option<String>,
    pub usage_limit: Option<i64>,
}

impl TryFrom<CreateDiscountRequest> for CreateDiscountInput {
    type Error = Vec<ValidationError>;

    fn try_from(req: CreateDiscountRequest) -> Result<Self, Self::Error> {
        let discount_type = req.discount_type.parse::<DiscountType>();
        let applicable_to = req
            .applicable_to
            .as_deref()
            .map(str::parse::<ApplicableTo>)
            .transpose();

        let (discount_type, applicable_to) = match (discount_type, applicable_to) {
            (Ok(t), Ok(a)) => (t, a.unwrap_or_default()),
            (t, a) => return Err(t.err().into_iter().chain(a.err()).collect()),
        };

        Ok(CreateDiscountInput {
            name: req.name,
            code: req.code,
            description: req.description,
            discount_type,
            value: req.value,
            min_purchase_cents: req.min_purchase_amount,
            applicable_to,
            products: req.products,
            categories: req.categories,
            valid_from: req.valid_from,
            valid_to: req.valid_to,
            is_active: req.is_active,
            store_id: req.store,
            usage_limit: req.usage_limit,
        })
    }
}

/// Body of `PUT /discounts/{id}`. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub discount_type: Option<String>,
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub min_purchase_amount: Option<Option<i64>>,
    pub applicable_to: Option<String>,
    pub products: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub usage_limit: Option<Option<i64>>,
}

impl TryFrom<UpdateDiscountRequest> for UpdateDiscountInput {
    type Error = Vec<ValidationError>;

    fn try_from(req: UpdateDiscountRequest) -> Result<Self, Self::Error> {
        let discount_type = req
            .discount_type
            .as_deref()
            .map(str::parse::<DiscountType>)
            .transpose();
        let applicable_to = req
            .applicable_to
            .as_deref()
            .map(str::parse::<ApplicableTo>)
            .transpose();

        let (discount_type, applicable_to) = match (discount_type, applicable_to) {
            (Ok(t), Ok(a)) => (t, a),
            (t, a) => return Err(t.err().into_iter().chain(a.err()).collect()),
        };

        Ok(UpdateDiscountInput {
            name: req.name,
            code: req.code,
            description: req.description,
            discount_type,
            value: req.value,
            min_purchase_cents: req.min_purchase_amount,
            applicable_to,
            products: req.products,
            categories: req.categories,
            valid_from: req.valid_from,
            valid_to: req.valid_to,
            is_active: req.is_active,
            usage_limit: req.usage_limit,
        })
    }
}

/// Tells an explicit `null` apart from an absent key. Paired with
/// `#[serde(default)]`: absent stays `None`, `null` becomes `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `POST /discounts/{id}/usage`.
#[derive(Debug, Deserialize)]
pub struct UsageRequest {
    /// Cents taken off the sale.
    pub amount: i64,
}

/// Query of `GET /discounts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub is_active: Option<bool>,
    #[serde(rename = "type")]
    pub discount_type: Option<DiscountType>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query of `GET /discounts/active`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Response of `DELETE /discounts/{id}`.
#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub id: String,
    pub deleted: bool,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Unknown enum names, reported as a schema violation.
fn schema_error(errors: Vec<ValidationError>) -> ApiError {
    let message = CoreError::InvalidFields(errors.clone()).to_string();
    ApiError::validation(message, &errors)
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /discounts`
pub async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<DiscountDto>>> {
    let params = query(params)?;
    let filter = DiscountFilter {
        is_active: params.is_active,
        discount_type: params.discount_type,
        page: PageRequest::new(params.page, params.limit),
    };

    let discounts = state.ledger.list(&filter, &caller).await?;
    Ok(Json(to_dtos(discounts)))
}

/// `GET /discounts/active`
pub async fn list_active(
    State(state): State<AppState>,
    Caller(caller): Caller,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<DiscountDto>>> {
    let params = query(params)?;
    let page = PageRequest::new(params.page, params.limit);

    let discounts = state.ledger.list_active(&caller, page).await?;
    Ok(Json(to_dtos(discounts)))
}

/// `GET /discounts/{id}`
pub async fn get(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<DiscountDto>> {
    let discount = state.ledger.get_by_id(&id, &caller).await?;
    Ok(Json(discount.into()))
}

/// `GET /discounts/code/{code}`
pub async fn get_by_code(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(code): Path<String>,
) -> ApiResult<Json<DiscountDto>> {
    let discount = state.ledger.get_by_code(&code, &caller).await?;
    Ok(Json(discount.into()))
}

/// `POST /discounts`
pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CreateDiscountRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DiscountDto>)> {
    let request = json_body(body)?;
    debug!(code = %request.code, "Create discount requested");

    let input = CreateDiscountInput::try_from(request).map_err(schema_error)?;
    let discount = state.ledger.create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(discount.into())))
}

/// `PUT /discounts/{id}`
pub async fn update(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<UpdateDiscountRequest>, JsonRejection>,
) -> ApiResult<Json<DiscountDto>> {
    let request = json_body(body)?;

    let input = UpdateDiscountInput::try_from(request).map_err(schema_error)?;
    let discount = state.ledger.update(&id, input, &caller).await?;
    Ok(Json(discount.into()))
}

/// `PATCH /discounts/{id}/toggle`
pub async fn toggle(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<DiscountDto>> {
    let discount = state.ledger.toggle_active(&id, &caller).await?;
    Ok(Json(discount.into()))
}

/// `DELETE /discounts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedDto>> {
    state.ledger.delete(&id, &caller).await?;
    Ok(Json(DeletedDto { id, deleted: true }))
}

/// `POST /discounts/{id}/usage`
pub async fn increment_usage(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<UsageRequest>, JsonRejection>,
) -> ApiResult<Json<DiscountDto>> {
    let request = json_body(body)?;
    let input = IncrementUsageInput::new(Money::from_cents(request.amount));

    let discount = state.ledger.increment_usage(&id, input, &caller).await?;
    Ok(Json(discount.into()))
}
