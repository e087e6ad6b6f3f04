use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{resolve_now, ApiError};
use crate::calculate::{
    champion_deck_distribution, count_decks, host_weekly_extract, pie_chart, rank_top_players,
    PaletteSeed, PieSlice, CHAMPION_WINDOW_MONTHS,
};
use crate::listing::SortOrder;
use crate::models::{
    DeckCount, DistributionGroup, EventRecord, MonthBucket, StandingsGroup, WeekColumn, YearMonth,
};

/// Default window of the top players table.
pub const DEFAULT_TOP_PLAYER_MONTHS: u32 = 1;

/// Default window of the deck distribution charts.
pub const DEFAULT_DISTRIBUTION_MONTHS: u32 = 6;

/// Load enough months to cover `months`, never less than the configured window.
async fn load_events(state: &AppState, now: NaiveDate, months: u32) -> Vec<EventRecord> {
    let window = months.max(state.config.window_months);
    state.loader.load_window(now, window).await
}

fn require_months(state: &AppState, months: Option<u32>, default: u32) -> Result<u32, ApiError> {
    let max = state.config.max_window_months;
    match months.unwrap_or(default) {
        0 => Err(ApiError::BadRequest("months must be at least 1".to_string())),
        n if n > max => Err(ApiError::BadRequest(format!(
            "months must be at most {}",
            max
        ))),
        n => Ok(n),
    }
}

fn palette(state: &AppState) -> Result<PaletteSeed, ApiError> {
    state
        .config
        .charts
        .palette_seed()
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct TopPlayersParams {
    pub months: Option<u32>,
    pub now: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TopPlayersResponse {
    pub now: NaiveDate,
    pub months: u32,
    pub groups: Vec<StandingsGroup>,
}

pub async fn top_players(
    State(state): State<AppState>,
    Query(params): Query<TopPlayersParams>,
) -> Result<Json<TopPlayersResponse>, ApiError> {
    let now = resolve_now(params.now.as_deref(), state.today())?;
    let months = require_months(&state, params.months, DEFAULT_TOP_PLAYER_MONTHS)?;

    let events = load_events(&state, now, months).await;
    let groups = rank_top_players(&events, months, now);

    Ok(Json(TopPlayersResponse {
        now,
        months,
        groups,
    }))
}

#[derive(Debug, Serialize)]
pub struct MonthView {
    pub month: YearMonth,
    pub label: String,
    pub total: u32,
    pub decks: Vec<DeckCount>,
    pub chart: Vec<PieSlice>,
}

/// A distribution group shaped for charts.
#[derive(Debug, Serialize)]
pub struct GroupView {
    pub format: String,
    pub official: bool,
    pub total: usize,

    /// Counts across every month in the window
    pub decks: Vec<DeckCount>,
    pub chart: Vec<PieSlice>,
    pub months: Vec<MonthView>,
}

fn month_view(bucket: MonthBucket, seed: PaletteSeed, max_items: usize) -> MonthView {
    MonthView {
        total: bucket.total(),
        chart: pie_chart(&bucket.decks, seed, max_items),
        month: bucket.month,
        label: bucket.label,
        decks: bucket.decks,
    }
}

fn group_view(group: DistributionGroup, seed: PaletteSeed, max_items: usize) -> GroupView {
    let decks = count_decks(&group.participants);
    GroupView {
        format: group.format,
        official: group.official,
        total: group.participants.len(),
        chart: pie_chart(&decks, seed, max_items),
        decks,
        months: group
            .months
            .into_iter()
            .map(|m| month_view(m, seed, max_items))
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub now: NaiveDate,
    pub months: u32,
    pub official_only: bool,
    pub groups: Vec<GroupView>,
}

#[derive(Debug, Deserialize)]
pub struct DistributionParams {
    pub months: Option<u32>,
    #[serde(default)]
    pub official_only: bool,
    pub now: Option<String>,
}

pub async fn deck_distribution(
    State(state): State<AppState>,
    Query(params): Query<DistributionParams>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let now = resolve_now(params.now.as_deref(), state.today())?;
    let months = require_months(&state, params.months, DEFAULT_DISTRIBUTION_MONTHS)?;
    let seed = palette(&state)?;
    let max_items = state.config.charts.max_items;

    let events = load_events(&state, now, months).await;
    let groups = crate::calculate::deck_distribution(&events, months, params.official_only, now)
        .into_iter()
        .map(|g| group_view(g, seed, max_items))
        .collect();

    Ok(Json(DistributionResponse {
        now,
        months,
        official_only: params.official_only,
        groups,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChampionParams {
    pub now: Option<String>,
}

pub async fn champion_decks(
    State(state): State<AppState>,
    Query(params): Query<ChampionParams>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let now = resolve_now(params.now.as_deref(), state.today())?;
    let seed = palette(&state)?;
    let max_items = state.config.charts.max_items;

    let events = load_events(&state, now, CHAMPION_WINDOW_MONTHS).await;
    let groups = champion_deck_distribution(&events, now)
        .into_iter()
        .map(|g| group_view(g, seed, max_items))
        .collect();

    Ok(Json(DistributionResponse {
        now,
        months: CHAMPION_WINDOW_MONTHS,
        official_only: false,
        groups,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HostsParams {
    pub now: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HostsResponse {
    pub hosts: Vec<String>,
    pub weeks: Vec<WeekColumn>,
}

pub async fn hosts(
    State(state): State<AppState>,
    Query(params): Query<HostsParams>,
) -> Result<Json<HostsResponse>, ApiError> {
    let now = resolve_now(params.now.as_deref(), state.today())?;
    let order = match params.order.as_deref() {
        None => SortOrder::Desc,
        Some(raw) => raw.parse::<SortOrder>().map_err(ApiError::BadRequest)?,
    };

    let events = load_events(&state, now, state.config.window_months).await;
    let table = host_weekly_extract(&events);

    let weeks = match order {
        SortOrder::Desc => table.weeks.clone(),
        SortOrder::Asc => table.chronological().cloned().collect(),
    };

    Ok(Json(HostsResponse {
        hosts: table.hosts,
        weeks,
    }))
}
