use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use entity::empleados::Sex;
use platform_api::{ApiError, ApiResult};
use platform_db::{
    DbPool,
    empleados::{self, EmpleadoFilter, EmpleadoUpdate, NewEmpleado},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

const SEX_INVALID: &str = "El sexo debe ser 'M' o 'F'";
const EMPLEADO_NOT_FOUND: &str = "No se encontró un empleado con el DNI proporcionado.";
const EMPLEADO_UPDATED: &str = "Empleado modificado con éxito.";

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "nominas server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/empleados", get(list_empleados).post(create_empleado))
        .route("/api/empleados/filtrar", get(filter_empleados))
        .route("/api/empleados/{id}/salario", get(salary_by_id))
        .route(
            "/api/empleados/{id}",
            put(update_empleado).delete(delete_empleado),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEmpleadoRequest {
    #[serde(rename = "id")]
    national_id: String,
    name: String,
    sex: String,
    category: i32,
    years_of_service: i32,
    salary: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEmpleadoRequest {
    name: String,
    sex: String,
    category: i32,
    years_of_service: i32,
}

#[derive(Debug, Deserialize)]
struct FilterQuery {
    name: Option<String>,
    id: Option<String>,
    sex: Option<String>,
    category: Option<i32>,
    years: Option<i32>,
}

fn parse_sex(raw: &str) -> ApiResult<Sex> {
    Sex::parse(raw).ok_or_else(|| ApiError::invalid_input(SEX_INVALID))
}

/// 204 when the set is empty, 200 with the array otherwise.
fn list_response(empleados: Vec<empleados::Model>) -> Response {
    if empleados.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Json(empleados).into_response()
    }
}

async fn list_empleados(State(state): State<AppState>) -> ApiResult<Response> {
    let todos = empleados::list_all(&state.pool).await?;
    Ok(list_response(todos))
}

async fn salary_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let salario = empleados::salary_by_national_id(&state.pool, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(EMPLEADO_NOT_FOUND))?;
    Ok(Json(salario).into_response())
}

async fn filter_empleados(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Response> {
    let filtro = EmpleadoFilter {
        name: query.name,
        national_id: query.id,
        sex: query.sex.as_deref().map(parse_sex).transpose()?,
        category: query.category,
        years_of_service: query.years,
    };
    let matches = empleados::filter(&state.pool, &filtro).await?;
    Ok(list_response(matches))
}

async fn create_empleado(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmpleadoRequest>,
) -> ApiResult<impl IntoResponse> {
    let sex = parse_sex(&payload.sex)?;
    let creado = empleados::create(
        &state.pool,
        NewEmpleado {
            national_id: payload.national_id,
            name: payload.name,
            sex,
            category: payload.category,
            years_of_service: payload.years_of_service,
            salary: payload.salary,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(creado)))
}

async fn update_empleado(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmpleadoRequest>,
) -> ApiResult<&'static str> {
    let sex = parse_sex(&payload.sex)?;
    if empleados::find_by_national_id(&state.pool, &id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found(EMPLEADO_NOT_FOUND));
    }
    empleados::update(
        &state.pool,
        &id,
        EmpleadoUpdate {
            name: payload.name,
            sex,
            category: payload.category,
            years_of_service: payload.years_of_service,
        },
    )
    .await?;
    Ok(EMPLEADO_UPDATED)
}

async fn delete_empleado(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    // Absence short-circuits to 404; deletion never runs against a record
    // that was not fetched first.
    let Some(empleado) = empleados::find_by_national_id(&state.pool, &id).await? else {
        return Err(ApiError::not_found(EMPLEADO_NOT_FOUND));
    };
    empleados::delete(&state.pool, empleado).await?;
    Ok(StatusCode::OK)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.pool.ping().await.is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
