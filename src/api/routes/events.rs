use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{resolve_now, ApiError, Pagination, PaginationMeta};
use crate::listing::{EventQuery, SortKey, SortOrder};
use crate::models::{EventRecord, Winner, YearMonth};

#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    pub q: Option<String>,
    pub host: Option<String>,
    pub format: Option<String>,
    pub official: Option<bool>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,

    /// First month, `YYYY-MM`; defaults to the configured window
    pub from: Option<String>,
    /// Last month, `YYYY-MM`; defaults to the month of `now`
    pub to: Option<String>,
    pub now: Option<String>,
}

impl ListEventsParams {
    fn query(&self) -> Result<EventQuery, ApiError> {
        let sort = match self.sort.as_deref() {
            Some(raw) => raw.parse::<SortKey>().map_err(ApiError::BadRequest)?,
            None => SortKey::default(),
        };
        let order = match self.order.as_deref() {
            Some(raw) => raw.parse::<SortOrder>().map_err(ApiError::BadRequest)?,
            None => SortOrder::default(),
        };

        Ok(EventQuery {
            search: self.q.clone(),
            host: self.host.clone(),
            format: self.format.clone(),
            official: self.official,
            sort,
            order,
        })
    }
}

fn parse_month(raw: &str) -> Result<YearMonth, ApiError> {
    raw.parse::<YearMonth>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub host: String,
    pub when: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    pub format: String,
    pub official: bool,
    pub champion: Option<Winner>,
}

impl From<&EventRecord> for EventSummary {
    fn from(event: &EventRecord) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title.clone(),
            host: event.host.clone(),
            when: event.when().to_string(),
            date: event.date(),
            location: event.location.clone(),
            format: event.format.clone(),
            official: event.official,
            champion: event.champions().next().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
    pub pagination: PaginationMeta,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<EventListResponse>, ApiError> {
    let now = resolve_now(params.now.as_deref(), state.today())?;
    let query = params.query()?;

    let end = match params.to.as_deref() {
        Some(raw) => parse_month(raw)?,
        None => YearMonth::from_date(now),
    };
    let start = match params.from.as_deref() {
        Some(raw) => parse_month(raw)?,
        None => end.months_back(state.config.window_months.saturating_sub(1)),
    };
    if start > end {
        return Err(ApiError::BadRequest(format!(
            "from ({}) is after to ({})",
            start, end
        )));
    }
    let max = state.config.max_window_months;
    if end.months_since(start) >= i64::from(max) {
        return Err(ApiError::BadRequest(format!(
            "from..to may span at most {} months",
            max
        )));
    }

    let events = query.apply(state.loader.load_range(start, end).await);

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, events.len() as u32);
    let summaries = pagination
        .slice(&events)
        .iter()
        .map(EventSummary::from)
        .collect();

    Ok(Json(EventListResponse {
        events: summaries,
        pagination: meta,
    }))
}

#[derive(Debug, Serialize)]
pub struct WinnerDetail {
    #[serde(flatten)]
    pub winner: Winner,

    /// Public URL of the deck photo, when one is recorded
    pub deck_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventRecord,
    pub date: Option<NaiveDate>,
    pub winner_details: Vec<WinnerDetail>,
    pub image_urls: Vec<String>,
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailResponse>, ApiError> {
    let events = match state.loader.load_all().await? {
        Some((events, _)) => events,
        None => {
            state
                .loader
                .load_window(state.today(), state.config.window_months)
                .await
        }
    };

    let event = events
        .into_iter()
        .find(|e| e.id.as_str() == id)
        .ok_or_else(|| ApiError::NotFound(format!("Event {} not found", id)))?;

    let winner_details = event
        .winners
        .iter()
        .map(|w| WinnerDetail {
            deck_image_url: (!w.deck_image_path.is_empty())
                .then(|| state.assets.event_image_url(&event.id, &w.deck_image_path)),
            winner: w.clone(),
        })
        .collect();
    let image_urls = event
        .images
        .iter()
        .map(|img| state.assets.event_image_url(&event.id, img))
        .collect();

    Ok(Json(EventDetailResponse {
        date: event.date(),
        winner_details,
        image_urls,
        event,
    }))
}
