//! HTTP boundary: axum router, handlers, and the admin session extractor.
//!
//! The boundary is the only place that reads request state. It resolves the
//! `admin_token` cookie into an [`AdminIdentity`] and passes it explicitly
//! into the admin-gated service calls; public endpoints (catalog reads,
//! booking creation, contact messages) never touch the extractor.

use crate::auth::{self, AdminIdentity, SESSION_COOKIE};
use crate::booking;
use crate::catalog::{self, resolver};
use crate::contact;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    BookingCreate, BookingStatusUpdate, CategoryCreate, CategoryId, CategoryUpdate,
    ContactMessageCreate, LocationCreate, LocationId, LocationUpdate, LoginRequest,
    ProviderCreate, ProviderId, ProviderUpdate, SubcategoryCreate, SubcategoryId,
    SubcategoryUpdate,
};
use crate::seed;
use crate::state::AppState;
use crate::with_metrics;
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/locations",
            get(list_locations)
                .post(create_location)
                .put(update_location)
                .delete(delete_location),
        )
        .route(
            "/api/categories",
            get(list_categories)
                .post(create_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route(
            "/api/subcategories",
            get(list_subcategories)
                .post(create_subcategory)
                .put(update_subcategory)
                .delete(delete_subcategory),
        )
        .route("/api/subcategories/{slug}", get(get_subcategory_by_slug))
        .route(
            "/api/providers",
            get(list_providers)
                .post(create_provider)
                .put(update_provider)
                .delete(delete_provider),
        )
        .route(
            "/api/bookings",
            get(list_bookings).post(create_booking).put(update_booking),
        )
        .route(
            "/api/contact-messages",
            get(list_contact_messages).post(create_contact_message),
        )
        .route("/api/seed", post(seed_demo_data))
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/check-auth", get(check_auth))
        .route("/health", get(crate::health::liveness_handler))
        .route("/health/components", get(crate::health::components_handler))
        .route("/ready", get(crate::health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Resolve the `admin_token` cookie into an authenticated identity.
impl FromRequestParts<Arc<AppState>> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            cookie_value(&parts.headers, SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
        state.sessions.verify(&token).ok_or(ApiError::Unauthorized)
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

#[derive(Debug, Deserialize)]
struct IdBody<T> {
    id: T,
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

async fn list_locations(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    with_metrics!("locations", {
        let locations = catalog::locations::list_active(&state.store);
        Ok::<_, ApiError>(Json(json!({ "locations": locations })).into_response())
    })
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<LocationCreate>,
) -> ApiResult<Response> {
    with_metrics!("locations", {
        let location = catalog::locations::create_location(&state.store, &admin, payload)?;
        Ok(created(json!({ "location": location })))
    })
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<LocationUpdate>,
) -> ApiResult<Response> {
    with_metrics!("locations", {
        let location = catalog::locations::update_location(&state.store, &admin, payload)?;
        Ok(Json(json!({ "location": location })).into_response())
    })
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(body): Json<IdBody<LocationId>>,
) -> ApiResult<Response> {
    with_metrics!("locations", {
        catalog::locations::delete_location(&state.store, &admin, &body.id)?;
        Ok(Json(json!({ "success": true })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    slug: Option<String>,
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Response> {
    with_metrics!("categories", {
        let categories =
            catalog::categories::list_categories(&state.store, query.slug.as_deref());
        Ok::<_, ApiError>(Json(json!({ "categories": categories })).into_response())
    })
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<CategoryCreate>,
) -> ApiResult<Response> {
    with_metrics!("categories", {
        let category = catalog::categories::create_category(&state.store, &admin, payload)?;
        Ok(created(json!({ "category": category })))
    })
}

async fn update_category(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<CategoryUpdate>,
) -> ApiResult<Response> {
    with_metrics!("categories", {
        let category = catalog::categories::update_category(&state.store, &admin, payload)?;
        Ok(Json(json!({ "category": category })).into_response())
    })
}

async fn delete_category(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(body): Json<IdBody<CategoryId>>,
) -> ApiResult<Response> {
    with_metrics!("categories", {
        catalog::categories::delete_category(&state.store, &admin, &body.id)?;
        Ok(Json(json!({ "success": true })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Subcategories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubcategoryQuery {
    category_id: Option<CategoryId>,
    /// Location slug; also accepted as the category slug filter `category`.
    location: Option<String>,
    category: Option<String>,
}

async fn list_subcategories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubcategoryQuery>,
) -> ApiResult<Response> {
    with_metrics!("subcategories", {
        let category_id = match (&query.category_id, &query.category) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(slug)) => Some(resolver::resolve_category(&state.store, slug)?.id),
            (None, None) => None,
        };
        let subcategories = resolver::resolve_subcategories(
            &state.store,
            category_id.as_ref(),
            query.location.as_deref(),
        );
        Ok(Json(json!({ "subcategories": subcategories })).into_response())
    })
}

async fn get_subcategory_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    with_metrics!("subcategories", {
        let subcategory = resolver::resolve_subcategory_by_slug(&state.store, &slug)?;
        Ok(Json(json!({ "subcategory": subcategory })).into_response())
    })
}

async fn create_subcategory(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<SubcategoryCreate>,
) -> ApiResult<Response> {
    with_metrics!("subcategories", {
        let subcategory = catalog::subcategories::create_subcategory(
            &state.store,
            &admin,
            payload,
            &state.config.default_location,
        )?;
        Ok(created(json!({ "subcategory": subcategory })))
    })
}

async fn update_subcategory(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<SubcategoryUpdate>,
) -> ApiResult<Response> {
    with_metrics!("subcategories", {
        let subcategory = catalog::subcategories::update_subcategory(
            &state.store,
            &admin,
            payload,
            &state.config.default_location,
        )?;
        Ok(Json(json!({ "subcategory": subcategory })).into_response())
    })
}

async fn delete_subcategory(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(body): Json<IdBody<SubcategoryId>>,
) -> ApiResult<Response> {
    with_metrics!("subcategories", {
        catalog::subcategories::delete_subcategory(&state.store, &admin, &body.id)?;
        Ok(Json(json!({ "success": true })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Providers (admin-only, including reads)
// ---------------------------------------------------------------------------

async fn list_providers(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
) -> ApiResult<Response> {
    with_metrics!("providers", {
        let providers = catalog::providers::list_providers(&state.store, &admin);
        Ok::<_, ApiError>(Json(json!({ "providers": providers })).into_response())
    })
}

async fn create_provider(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<ProviderCreate>,
) -> ApiResult<Response> {
    with_metrics!("providers", {
        let provider = catalog::providers::create_provider(
            &state.store,
            &admin,
            payload,
            &state.config.default_location,
        )?;
        Ok(created(json!({ "provider": provider })))
    })
}

async fn update_provider(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<ProviderUpdate>,
) -> ApiResult<Response> {
    with_metrics!("providers", {
        let provider = catalog::providers::update_provider(
            &state.store,
            &admin,
            payload,
            &state.config.default_location,
        )?;
        Ok(Json(json!({ "provider": provider })).into_response())
    })
}

async fn delete_provider(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(body): Json<IdBody<ProviderId>>,
) -> ApiResult<Response> {
    with_metrics!("providers", {
        catalog::providers::delete_provider(&state.store, &admin, &body.id)?;
        Ok(Json(json!({ "success": true })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingCreate>,
) -> ApiResult<Response> {
    with_metrics!("bookings", {
        let view = booking::create_booking(&state.store, payload)?;
        Ok(created(json!({ "booking": view })))
    })
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
) -> ApiResult<Response> {
    with_metrics!("bookings", {
        let bookings = booking::list_bookings(&state.store, &admin);
        Ok::<_, ApiError>(Json(json!({ "bookings": bookings })).into_response())
    })
}

async fn update_booking(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
    Json(payload): Json<BookingStatusUpdate>,
) -> ApiResult<Response> {
    with_metrics!("bookings", {
        let view = booking::update_booking_status(&state.store, &admin, payload)?;
        Ok(Json(json!({ "booking": view })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Contact messages
// ---------------------------------------------------------------------------

async fn create_contact_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactMessageCreate>,
) -> ApiResult<Response> {
    with_metrics!("contact_messages", {
        let message = contact::create_contact_message(&state.store, payload)?;
        Ok(created(json!({ "message": message })))
    })
}

async fn list_contact_messages(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
) -> ApiResult<Response> {
    with_metrics!("contact_messages", {
        let messages = contact::list_contact_messages(&state.store, &admin);
        Ok::<_, ApiError>(Json(json!({ "messages": messages })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

async fn seed_demo_data(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
) -> ApiResult<Response> {
    with_metrics!("seed", {
        let summary = seed::seed_demo_data(&state.store, &admin, &state.config)?;
        Ok(Json(json!({ "success": true, "seeded": summary })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Admin auth
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Response> {
    with_metrics!("admin_auth", {
        let (token, admin) = auth::login(&state.store, &state.sessions, &request)?;
        let cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            state.config.session_ttl_secs
        );
        let mut response = Json(json!({ "success": true, "admin": admin })).into_response();
        response.headers_mut().insert(
            header::SET_COOKIE,
            HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.into()))?,
        );
        Ok(response)
    })
}

async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<Response> {
    with_metrics!("admin_auth", {
        if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
            state.sessions.revoke(&token);
        }
        let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        let mut response = Json(json!({ "success": true })).into_response();
        response.headers_mut().insert(
            header::SET_COOKIE,
            HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.into()))?,
        );
        Ok::<_, ApiError>(response)
    })
}

async fn check_auth(
    State(state): State<Arc<AppState>>,
    admin: AdminIdentity,
) -> ApiResult<Response> {
    with_metrics!("admin_auth", {
        let view = auth::check(&state.store, &admin)?;
        Ok(Json(json!({ "authenticated": true, "admin": view })).into_response())
    })
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

async fn metrics_handler() -> Response {
    let body = crate::metrics::METRICS.encode();
    (
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response()
}

fn created(body: serde_json::Value) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}
