use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ClientProfile, ClientProfileRepository, DEFAULT_AGE, DividendMode, FinancialSnapshot,
    ProjectionAssumption, ProjectionError, ProjectionPoint, RepositoryError, RetirementInputs,
    RetirementPlan, SmartAsset, TrajectorySummary, aggregate_snapshot, category_breakdown,
    check_age, check_horizon, plan_retirement, round_points, round_snapshot, sample_points,
    simulate_projection, summarize,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Projection(_) | ApiError::Json(_) => StatusCode::BAD_REQUEST,
            ApiError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Repository(RepositoryError::MissingId) => StatusCode::BAD_REQUEST,
            ApiError::Repository(RepositoryError::Poisoned) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("rejected request: {self}");
        }
        error_response(status, &self.to_string())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliDividendMode {
    Independent,
    NetOfPayout,
}

impl From<CliDividendMode> for DividendMode {
    fn from(value: CliDividendMode) -> Self {
        match value {
            CliDividendMode::Independent => DividendMode::Independent,
            CliDividendMode::NetOfPayout => DividendMode::NetOfPayout,
        }
    }
}

impl From<DividendMode> for CliDividendMode {
    fn from(value: DividendMode) -> Self {
        match value {
            DividendMode::Independent => CliDividendMode::Independent,
            DividendMode::NetOfPayout => CliDividendMode::NetOfPayout,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProjectionArgs {
    #[arg(long, default_value_t = 0.0)]
    total_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    total_liabilities: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_income: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_expense: f64,
    #[arg(long, default_value_t = DEFAULT_AGE)]
    current_age: u32,
    #[arg(long, help = "Birth year; defaults to this year minus current-age")]
    birth_year: Option<i32>,
    #[arg(
        long,
        default_value_t = 30,
        allow_negative_numbers = true,
        help = "Years to project beyond the current one"
    )]
    horizon_years: i64,
    #[arg(
        long,
        default_value_t = 2.5,
        allow_negative_numbers = true,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_negative_numbers = true,
        help = "Annual growth of existing assets in percent"
    )]
    asset_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_negative_numbers = true,
        help = "Annual return on newly saved money in percent"
    )]
    new_money_return_rate: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_negative_numbers = true,
        help = "Annual passive yield on invested assets in percent"
    )]
    general_yield_rate: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Monthly contribution; defaults to income minus expense, floored at zero"
    )]
    monthly_contribution: Option<f64>,
    #[arg(long, value_enum, default_value_t = CliDividendMode::Independent)]
    dividend_mode: CliDividendMode,
    #[arg(long, help = "Sample the trajectory down to at most this many points")]
    max_points: Option<usize>,
    #[arg(
        long,
        help = "Monthly spending passive income must cover; defaults to monthly-expense"
    )]
    fire_expense_target: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct RetirementArgs {
    #[arg(long, default_value_t = DEFAULT_AGE)]
    current_age: u32,
    #[arg(long, default_value_t = 60)]
    target_retirement_age: u32,
    #[arg(long, default_value_t = 85)]
    life_expectancy: u32,
    #[arg(
        long,
        default_value_t = 30000.0,
        help = "Desired monthly retirement income in today's money"
    )]
    desired_monthly_income: f64,
    #[arg(long, default_value_t = 2.5, allow_negative_numbers = true)]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        allow_negative_numbers = true,
        help = "Annual return before retirement in percent"
    )]
    pre_retirement_return: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        allow_negative_numbers = true,
        help = "Annual return during retirement in percent"
    )]
    post_retirement_return: f64,
    #[arg(long, default_value_t = 0.0)]
    current_investable_assets: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    monthly_contribution: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    total_assets: Option<f64>,
    total_liabilities: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expense: Option<f64>,
    current_age: Option<u32>,
    birth_year: Option<i32>,
    #[serde(flatten)]
    assumptions: AssumptionPayload,
    smart_assets: Vec<SmartAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssumptionPayload {
    horizon_years: Option<i64>,
    inflation_rate: Option<f64>,
    asset_growth_rate: Option<f64>,
    new_money_return_rate: Option<f64>,
    general_yield_rate: Option<f64>,
    monthly_contribution: Option<f64>,
    dividend_mode: Option<DividendMode>,
    max_points: Option<usize>,
    fire_expense_target: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ClientProjectionPayload {
    as_of: Option<NaiveDate>,
    #[serde(flatten)]
    assumptions: AssumptionPayload,
    extra_smart_assets: Vec<SmartAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    current_age: Option<u32>,
    target_retirement_age: Option<u32>,
    life_expectancy: Option<u32>,
    desired_monthly_income: Option<f64>,
    inflation_rate: Option<f64>,
    pre_retirement_return: Option<f64>,
    post_retirement_return: Option<f64>,
    current_investable_assets: Option<f64>,
    monthly_contribution: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AsOfQuery {
    as_of: Option<NaiveDate>,
}

#[derive(Debug)]
struct ProjectionRequest {
    snapshot: FinancialSnapshot,
    assumption: ProjectionAssumption,
    smart_assets: Vec<SmartAsset>,
    max_points: Option<usize>,
    fire_expense_target: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResponse {
    snapshot: FinancialSnapshot,
    assumption: ProjectionAssumption,
    summary: Option<TrajectorySummary>,
    points: Vec<ProjectionPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    snapshot: FinancialSnapshot,
    net_worth: f64,
    monthly_savings: f64,
    breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SmartAssetCreated {
    id: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn ClientProfileRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ClientProfileRepository>) -> Self {
        Self { repository }
    }
}

fn default_projection_args() -> ProjectionArgs {
    ProjectionArgs {
        total_assets: 0.0,
        total_liabilities: 0.0,
        monthly_income: 0.0,
        monthly_expense: 0.0,
        current_age: DEFAULT_AGE,
        birth_year: None,
        horizon_years: 30,
        inflation_rate: 2.5,
        asset_growth_rate: 5.0,
        new_money_return_rate: 5.0,
        general_yield_rate: 3.0,
        monthly_contribution: None,
        dividend_mode: CliDividendMode::Independent,
        max_points: None,
        fire_expense_target: None,
    }
}

fn default_retirement_args() -> RetirementArgs {
    RetirementArgs {
        current_age: DEFAULT_AGE,
        target_retirement_age: 60,
        life_expectancy: 85,
        desired_monthly_income: 30_000.0,
        inflation_rate: 2.5,
        pre_retirement_return: 6.0,
        post_retirement_return: 4.0,
        current_investable_assets: 0.0,
        monthly_contribution: 0.0,
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn build_assumption(
    args: &ProjectionArgs,
    snapshot: &FinancialSnapshot,
) -> Result<ProjectionAssumption, ProjectionError> {
    let horizon_years = check_horizon("horizonYears", args.horizon_years)?;

    Ok(ProjectionAssumption {
        horizon_years,
        inflation_rate_pct: args.inflation_rate,
        asset_growth_rate_pct: args.asset_growth_rate,
        new_money_return_rate_pct: args.new_money_return_rate,
        general_yield_rate_pct: args.general_yield_rate,
        monthly_contribution: args
            .monthly_contribution
            .unwrap_or_else(|| snapshot.monthly_savings()),
        dividend_mode: args.dividend_mode.into(),
    })
}

fn build_projection(
    args: ProjectionArgs,
    smart_assets: Vec<SmartAsset>,
    as_of: NaiveDate,
) -> Result<ProjectionRequest, ProjectionError> {
    for (name, value) in [
        ("totalAssets", args.total_assets),
        ("totalLiabilities", args.total_liabilities),
        ("monthlyIncome", args.monthly_income),
        ("monthlyExpense", args.monthly_expense),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ProjectionError::InvalidInput {
                name,
                reason: format!("must be a non-negative amount, got {value}"),
            });
        }
    }
    check_age("currentAge", args.current_age)?;

    let snapshot = FinancialSnapshot {
        total_assets: args.total_assets,
        total_liabilities: args.total_liabilities,
        monthly_income: args.monthly_income,
        monthly_expense: args.monthly_expense,
        current_age: args.current_age,
        birth_year: args
            .birth_year
            .unwrap_or(as_of.year() - args.current_age as i32),
    };
    let assumption = build_assumption(&args, &snapshot)?;
    let fire_expense_target = args.fire_expense_target.unwrap_or(snapshot.monthly_expense);

    Ok(ProjectionRequest {
        snapshot,
        assumption,
        smart_assets,
        max_points: args.max_points,
        fire_expense_target,
    })
}

fn build_retirement_inputs(args: RetirementArgs) -> Result<RetirementInputs, ProjectionError> {
    for (name, value) in [
        ("desiredMonthlyIncome", args.desired_monthly_income),
        ("currentInvestableAssets", args.current_investable_assets),
    ] {
        if value < 0.0 {
            return Err(ProjectionError::InvalidInput {
                name,
                reason: format!("must be >= 0, got {value}"),
            });
        }
    }

    Ok(RetirementInputs {
        current_age: args.current_age,
        target_retirement_age: args.target_retirement_age,
        life_expectancy: args.life_expectancy,
        desired_monthly_income_pv: args.desired_monthly_income,
        inflation_rate_pct: args.inflation_rate,
        pre_retirement_return_pct: args.pre_retirement_return,
        post_retirement_return_pct: args.post_retirement_return,
        current_investable_assets: args.current_investable_assets,
        monthly_contribution: args.monthly_contribution,
    })
}

fn run_projection(request: ProjectionRequest) -> Result<ProjectionResponse, ProjectionError> {
    let points = simulate_projection(
        &request.snapshot,
        &request.assumption,
        &request.smart_assets,
    )?;
    let summary = summarize(&points, request.fire_expense_target);
    let rounded = round_points(&points);
    let points = match request.max_points {
        Some(max_points) => sample_points(&rounded, max_points)?,
        None => rounded,
    };

    Ok(ProjectionResponse {
        snapshot: round_snapshot(&request.snapshot),
        assumption: request.assumption,
        summary,
        points,
    })
}

pub fn project_from_args(args: ProjectionArgs) -> Result<ProjectionResponse, ProjectionError> {
    run_projection(build_projection(args, Vec::new(), today())?)
}

pub fn retire_from_args(args: RetirementArgs) -> Result<RetirementPlan, ProjectionError> {
    plan_retirement(&build_retirement_inputs(args)?)
}

pub fn snapshot_from_file(
    path: &FsPath,
    as_of: Option<NaiveDate>,
) -> Result<SnapshotResponse, ApiError> {
    let raw = std::fs::read_to_string(path)?;
    let profile: ClientProfile = serde_json::from_str(&raw)?;
    Ok(snapshot_response(&profile, as_of.unwrap_or_else(today)))
}

fn snapshot_response(profile: &ClientProfile, as_of: NaiveDate) -> SnapshotResponse {
    let snapshot = aggregate_snapshot(profile, as_of);
    SnapshotResponse {
        net_worth: snapshot.net_worth().round(),
        monthly_savings: snapshot.monthly_savings().round(),
        breakdown: category_breakdown(profile)
            .into_iter()
            .map(|(category, value)| (category, value.round()))
            .collect(),
        snapshot: round_snapshot(&snapshot),
    }
}

fn apply_assumption_payload(args: &mut ProjectionArgs, payload: AssumptionPayload) {
    if let Some(v) = payload.horizon_years {
        args.horizon_years = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.asset_growth_rate {
        args.asset_growth_rate = v;
    }
    if let Some(v) = payload.new_money_return_rate {
        args.new_money_return_rate = v;
    }
    if let Some(v) = payload.general_yield_rate {
        args.general_yield_rate = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = Some(v);
    }
    if let Some(v) = payload.dividend_mode {
        args.dividend_mode = v.into();
    }
    if let Some(v) = payload.max_points {
        args.max_points = Some(v);
    }
    if let Some(v) = payload.fire_expense_target {
        args.fire_expense_target = Some(v);
    }
}

fn projection_request_from_payload(
    payload: ProjectionPayload,
    as_of: NaiveDate,
) -> Result<ProjectionRequest, ProjectionError> {
    let mut args = default_projection_args();

    if let Some(v) = payload.total_assets {
        args.total_assets = v;
    }
    if let Some(v) = payload.total_liabilities {
        args.total_liabilities = v;
    }
    if let Some(v) = payload.monthly_income {
        args.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expense {
        args.monthly_expense = v;
    }
    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.birth_year {
        args.birth_year = Some(v);
    }
    apply_assumption_payload(&mut args, payload.assumptions);

    build_projection(args, payload.smart_assets, as_of)
}

fn client_projection_request(
    profile: &ClientProfile,
    payload: ClientProjectionPayload,
) -> Result<ProjectionRequest, ProjectionError> {
    let as_of = payload.as_of.unwrap_or_else(today);
    let snapshot = aggregate_snapshot(profile, as_of);

    let mut args = default_projection_args();
    args.total_assets = snapshot.total_assets;
    args.total_liabilities = snapshot.total_liabilities;
    args.monthly_income = snapshot.monthly_income;
    args.monthly_expense = snapshot.monthly_expense;
    args.current_age = snapshot.current_age;
    args.birth_year = Some(snapshot.birth_year);
    apply_assumption_payload(&mut args, payload.assumptions);

    let mut smart_assets = profile.smart_assets.clone();
    smart_assets.extend(payload.extra_smart_assets);
    build_projection(args, smart_assets, as_of)
}

fn retirement_inputs_from_payload(
    payload: RetirementPayload,
) -> Result<RetirementInputs, ProjectionError> {
    let mut args = default_retirement_args();

    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.target_retirement_age {
        args.target_retirement_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        args.life_expectancy = v;
    }
    if let Some(v) = payload.desired_monthly_income {
        args.desired_monthly_income = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.pre_retirement_return {
        args.pre_retirement_return = v;
    }
    if let Some(v) = payload.post_retirement_return {
        args.post_retirement_return = v;
    }
    if let Some(v) = payload.current_investable_assets {
        args.current_investable_assets = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }

    build_retirement_inputs(args)
}

fn validate_smart_asset(asset: &SmartAsset) -> Result<(), ProjectionError> {
    for (name, value) in [
        ("growthRatePct", asset.growth_rate_pct),
        ("dividendRatePct", asset.dividend_rate_pct),
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::InvalidInput {
                name,
                reason: format!("must be a finite number, got {value}"),
            });
        }
        if value <= -100.0 {
            return Err(ProjectionError::InvalidRate { name, value });
        }
    }
    if !asset.initial_value.is_finite() || asset.initial_value < 0.0 {
        return Err(ProjectionError::InvalidInput {
            name: "initialValue",
            reason: format!("must be a non-negative amount, got {}", asset.initial_value),
        });
    }
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/retirement", post(retirement_handler))
        .route("/api/clients", get(list_clients_handler))
        .route(
            "/api/clients/:id",
            get(get_client_handler).put(put_client_handler),
        )
        .route("/api/clients/:id/snapshot", get(client_snapshot_handler))
        .route("/api/clients/:id/projection", post(client_projection_handler))
        .route("/api/clients/:id/smart-assets", post(add_smart_asset_handler))
        .route(
            "/api/clients/:id/smart-assets/:asset_id",
            delete(delete_smart_asset_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(
    port: u16,
    repository: Arc<dyn ClientProfileRepository>,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::new(repository));

    let listener = TcpListener::bind(addr).await?;
    log::info!("wealthplan HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(Json(payload): Json<ProjectionPayload>) -> Result<Response, ApiError> {
    let request = projection_request_from_payload(payload, today())?;
    let response = run_projection(request)?;
    Ok(json_response(StatusCode::OK, response))
}

async fn retirement_handler(Json(payload): Json<RetirementPayload>) -> Result<Response, ApiError> {
    let inputs = retirement_inputs_from_payload(payload)?;
    let plan = plan_retirement(&inputs)?;
    Ok(json_response(StatusCode::OK, plan))
}

async fn list_clients_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let profiles = state.repository.list()?;
    Ok(json_response(StatusCode::OK, profiles))
}

async fn get_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let profile = state.repository.get(&id)?;
    Ok(json_response(StatusCode::OK, profile))
}

async fn put_client_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut profile): Json<ClientProfile>,
) -> Result<Response, ApiError> {
    for asset in &profile.smart_assets {
        validate_smart_asset(asset)?;
    }
    profile.id = id;
    state.repository.save(&profile)?;
    log::info!("saved client profile {}", profile.id);
    Ok(json_response(StatusCode::OK, profile))
}

async fn client_snapshot_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Result<Response, ApiError> {
    let profile = state.repository.get(&id)?;
    let response = snapshot_response(&profile, query.as_of.unwrap_or_else(today));
    Ok(json_response(StatusCode::OK, response))
}

async fn client_projection_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ClientProjectionPayload>,
) -> Result<Response, ApiError> {
    let profile = state.repository.get(&id)?;
    let request = client_projection_request(&profile, payload)?;
    let response = run_projection(request)?;
    Ok(json_response(StatusCode::OK, response))
}

async fn add_smart_asset_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(asset): Json<SmartAsset>,
) -> Result<Response, ApiError> {
    validate_smart_asset(&asset)?;
    let mut profile = state.repository.get(&id)?;
    let asset_id = profile.add_smart_asset(asset)?;
    state.repository.save(&profile)?;
    log::info!("pinned smart asset {asset_id} on client {id}");
    Ok(json_response(
        StatusCode::CREATED,
        SmartAssetCreated { id: asset_id },
    ))
}

async fn delete_smart_asset_handler(
    State(state): State<AppState>,
    Path((id, asset_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let mut profile = state.repository.get(&id)?;
    if !profile.remove_smart_asset(&asset_id) {
        return Ok(error_response(
            StatusCode::NOT_FOUND,
            &format!("smart asset {asset_id} not found"),
        ));
    }
    state.repository.save(&profile)?;
    log::info!("removed smart asset {asset_id} from client {id}");
    Ok(with_cache_control(StatusCode::NO_CONTENT))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
