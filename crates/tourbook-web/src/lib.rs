//! Axum + Askama web UI: tour catalog with HTMX filtering and the booking dialog.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tokio::net::TcpListener;
use tourbook_catalog::{CatalogFacets, TourCatalog};
use tourbook_core::{
    compute_total, format_date_ru, format_rubles, BookingDialog, BoundRange, CatalogSession,
    DraftEdit, FilterCriteria, Notification, ParticipantCount, SubmitOutcome, Tour, TourOffer,
    UnknownLabel, DEFAULT_DURATION_RANGE, DEFAULT_PRICE_RANGE, DURATION_STEP, PRICE_STEP,
};
use tracing::{info, warn};

pub const CRATE_NAME: &str = "tourbook-web";

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub workspace_root: PathBuf,
    pub tours_path: PathBuf,
}

impl WebConfig {
    pub fn from_env() -> Self {
        let workspace_root = std::env::var("TOURBOOK_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self {
            bind_addr: std::env::var("TOURBOOK_BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: std::env::var("TOURBOOK_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            tours_path: std::env::var("TOURBOOK_TOURS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| workspace_root.join("fixtures/tours.yaml")),
            workspace_root,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub workspace_root: PathBuf,
    pub catalog: TourCatalog,
    fixed_today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(workspace_root: impl Into<PathBuf>, catalog: TourCatalog) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            catalog,
            fixed_today: None,
        }
    }

    pub fn from_config(config: &WebConfig) -> anyhow::Result<Self> {
        let catalog = TourCatalog::load_yaml(&config.tours_path)
            .with_context(|| format!("loading tours from {}", config.tours_path.display()))?;
        Ok(Self::new(config.workspace_root.clone(), catalog))
    }

    /// Pins "today" for booking-date validation.
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Filter controls as submitted by the catalog form. Empty or `all` means
/// "no constraint"; unparseable bounds fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub region: Option<String>,
    pub activity: Option<String>,
    pub difficulty: Option<String>,
    pub season: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub duration_min: Option<String>,
    pub duration_max: Option<String>,
}

impl CatalogQuery {
    pub fn apply(&self, session: &mut CatalogSession<'_>) {
        session.set_region(selected(self.region.as_deref()).map(str::to_string));
        session.set_activity(selected(self.activity.as_deref()).map(str::to_string));
        session.set_difficulty(parse_label(self.difficulty.as_deref()));
        session.set_season(parse_label(self.season.as_deref()));
        session.set_price_range(BoundRange::new(
            bound(self.price_min.as_deref(), DEFAULT_PRICE_RANGE.min),
            bound(self.price_max.as_deref(), DEFAULT_PRICE_RANGE.max),
        ));
        session.set_duration_range(BoundRange::new(
            bound(self.duration_min.as_deref(), DEFAULT_DURATION_RANGE.min),
            bound(self.duration_max.as_deref(), DEFAULT_DURATION_RANGE.max),
        ));
    }
}

fn selected(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

fn parse_label<T: FromStr<Err = UnknownLabel>>(value: Option<&str>) -> Option<T> {
    let raw = selected(value)?;
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(%err, "ignoring filter value");
            None
        }
    }
}

fn bound(value: Option<&str>, default: u32) -> u32 {
    selected(value).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Booking form fields. Every field is optional on the wire; the validator
/// decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub date: Option<String>,
    pub participants: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
}

impl BookingForm {
    pub fn apply(self, dialog: &mut BookingDialog) -> Result<(), tourbook_core::DialogError> {
        let date = self
            .date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
        dialog.edit(DraftEdit::Date(date))?;
        dialog.edit(DraftEdit::Participants(self.participants.unwrap_or_default()))?;
        dialog.edit(DraftEdit::Name(self.name.unwrap_or_default()))?;
        dialog.edit(DraftEdit::Email(self.email.unwrap_or_default()))?;
        dialog.edit(DraftEdit::Phone(self.phone.unwrap_or_default()))?;
        dialog.edit(DraftEdit::Comment(self.comment.unwrap_or_default()))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct OptionView {
    value: String,
    label: String,
    count: usize,
    selected: bool,
}

#[derive(Debug, Clone)]
struct FilterView {
    regions: Vec<OptionView>,
    activities: Vec<OptionView>,
    difficulties: Vec<OptionView>,
    seasons: Vec<OptionView>,
    price_min: u32,
    price_max: u32,
    ranges: RangeLabelsView,
    price_floor: u32,
    price_ceiling: u32,
    price_step: u32,
    duration_min: u32,
    duration_max: u32,
    duration_floor: u32,
    duration_ceiling: u32,
    duration_step: u32,
}

impl FilterView {
    fn build(facets: &CatalogFacets, criteria: &FilterCriteria) -> Self {
        let strings = |facet: &[tourbook_catalog::FacetCount<String>], current: Option<&str>| {
            facet
                .iter()
                .map(|f| OptionView {
                    value: f.value.clone(),
                    label: f.value.clone(),
                    count: f.count,
                    selected: current == Some(f.value.as_str()),
                })
                .collect::<Vec<_>>()
        };
        Self {
            regions: strings(&facets.regions, criteria.region.as_deref()),
            activities: strings(&facets.activities, criteria.activity.as_deref()),
            difficulties: facets
                .difficulties
                .iter()
                .map(|f| OptionView {
                    value: f.value.label().to_string(),
                    label: f.value.label().to_string(),
                    count: f.count,
                    selected: criteria.difficulty == Some(f.value),
                })
                .collect(),
            seasons: facets
                .seasons
                .iter()
                .map(|f| OptionView {
                    value: f.value.label().to_string(),
                    label: f.value.label().to_string(),
                    count: f.count,
                    selected: criteria.season == Some(f.value),
                })
                .collect(),
            price_min: criteria.price_range.min,
            price_max: criteria.price_range.max,
            ranges: RangeLabelsView::from_criteria(criteria),
            price_floor: DEFAULT_PRICE_RANGE.min,
            price_ceiling: DEFAULT_PRICE_RANGE.max,
            price_step: PRICE_STEP,
            duration_min: criteria.duration_range.min,
            duration_max: criteria.duration_range.max,
            duration_floor: DEFAULT_DURATION_RANGE.min,
            duration_ceiling: DEFAULT_DURATION_RANGE.max,
            duration_step: DURATION_STEP,
        }
    }
}

/// Text shown beside the price and duration sliders.
#[derive(Debug, Clone)]
struct RangeLabelsView {
    price: String,
    duration: String,
}

impl RangeLabelsView {
    fn from_criteria(criteria: &FilterCriteria) -> Self {
        Self {
            price: format!(
                "{} - {}",
                tourbook_core::group_thousands(u64::from(criteria.price_range.min)),
                format_rubles(u64::from(criteria.price_range.max))
            ),
            duration: format!(
                "{} - {} дней",
                criteria.duration_range.min, criteria.duration_range.max
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct TourCardView {
    id: u32,
    title: String,
    region: String,
    activity: String,
    difficulty: &'static str,
    badge_class: &'static str,
    duration_label: String,
    price_label: String,
    image_url: String,
    description: String,
    delay_ms: usize,
}

impl TourCardView {
    fn from_tour(tour: &Tour, index: usize) -> Self {
        Self {
            id: tour.id,
            title: tour.title.clone(),
            region: tour.region.clone(),
            activity: tour.activity.clone(),
            difficulty: tour.difficulty.label(),
            badge_class: tour.difficulty.badge_class(),
            duration_label: tour.duration_label(),
            price_label: tour.price_label(),
            image_url: tour.image_url.clone(),
            description: tour.description.clone(),
            delay_ms: index * 100,
        }
    }
}

#[derive(Debug, Clone)]
struct PriceSummaryView {
    unit_price_label: String,
    participants: u8,
    total_label: String,
}

#[derive(Debug, Clone)]
struct ToastView {
    title: String,
    description: String,
    destructive: bool,
    reference: Option<String>,
}

impl ToastView {
    fn from_notification(notification: &Notification, reference: Option<String>) -> Self {
        Self {
            title: notification.title.clone(),
            description: notification.description.clone(),
            destructive: notification.is_destructive(),
            reference,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    filters: FilterView,
    tours: Vec<TourCardView>,
    count: usize,
    filtered: bool,
}

#[derive(Template)]
#[template(path = "tours_list_response.html")]
struct ToursListTemplate {
    tours: Vec<TourCardView>,
    count: usize,
    filtered: bool,
    ranges: RangeLabelsView,
}

#[derive(Template)]
#[template(path = "booking_dialog_partial.html")]
struct BookingDialogTemplate {
    tour_id: u32,
    subtitle: String,
    min_date: String,
    date: String,
    date_label: String,
    participants: Vec<OptionView>,
    name: String,
    email: String,
    phone: String,
    comment: String,
    summary: PriceSummaryView,
    notification: Option<ToastView>,
}

#[derive(Template)]
#[template(path = "booking_total_partial.html")]
struct BookingTotalTemplate {
    summary: PriceSummaryView,
}

#[derive(Template)]
#[template(path = "toast_partial.html")]
struct ToastTemplate {
    toast: ToastView,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/tours/list", get(tours_list_handler))
        .route("/tours/{id}/booking", get(booking_dialog_handler).post(booking_submit_handler))
        .route("/tours/{id}/booking/total", post(booking_total_handler))
        .route("/api/tours", get(api_tours_handler))
        .route("/assets/static/app.css", get(app_css_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(Arc::new(state))
}

pub async fn serve(config: WebConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let listener = TcpListener::bind((config.bind_addr, config.port)).await?;
    info!(addr = %listener.local_addr()?, tours = state.catalog.len(), "serving tour catalog");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

pub async fn serve_from_env() -> anyhow::Result<()> {
    serve(WebConfig::from_env()).await
}

fn session_for<'a>(catalog: &'a TourCatalog, query: &CatalogQuery) -> CatalogSession<'a> {
    let mut session = CatalogSession::new(catalog.tours());
    query.apply(&mut session);
    session
}

fn card_views(tours: &[&Tour]) -> Vec<TourCardView> {
    tours
        .iter()
        .enumerate()
        .map(|(idx, tour)| TourCardView::from_tour(tour, idx))
        .collect()
}

async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let session = session_for(&state.catalog, &query);
    let visible = session.visible();
    render_html(IndexTemplate {
        filters: FilterView::build(&state.catalog.facets(), session.criteria()),
        count: visible.len(),
        tours: card_views(&visible),
        filtered: session.is_filtered(),
    })
}

async fn tours_list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let session = session_for(&state.catalog, &query);
    let visible = session.visible();
    render_html(ToursListTemplate {
        count: visible.len(),
        tours: card_views(&visible),
        filtered: session.is_filtered(),
        ranges: RangeLabelsView::from_criteria(session.criteria()),
    })
}

async fn api_tours_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let session = session_for(&state.catalog, &query);
    let visible = session.visible();
    Json(serde_json::json!({
        "count": visible.len(),
        "filtered": session.is_filtered(),
        "criteria": session.criteria(),
        "tours": visible,
    }))
    .into_response()
}

async fn booking_dialog_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<u32>,
) -> Response {
    let Some(tour) = state.catalog.get(id) else {
        return tour_not_found();
    };
    let mut dialog = BookingDialog::new(TourOffer::from(tour));
    dialog.open();
    render_html(dialog_template(&dialog, state.today(), None))
}

async fn booking_total_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<u32>,
    Form(form): Form<BookingForm>,
) -> Response {
    let Some(tour) = state.catalog.get(id) else {
        return tour_not_found();
    };
    let raw = form.participants.unwrap_or_default();
    render_html(BookingTotalTemplate {
        summary: PriceSummaryView {
            unit_price_label: format_rubles(u64::from(tour.price)),
            participants: ParticipantCount::from_input(&raw).get(),
            total_label: format_rubles(compute_total(tour.price, &raw)),
        },
    })
}

async fn booking_submit_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<u32>,
    Form(form): Form<BookingForm>,
) -> Response {
    let Some(tour) = state.catalog.get(id) else {
        return tour_not_found();
    };
    match submit_booking(tour, form, state.today()) {
        Ok(resp) => resp,
        Err(err) => server_error(err),
    }
}

fn submit_booking(tour: &Tour, form: BookingForm, today: NaiveDate) -> anyhow::Result<Response> {
    let mut dialog = BookingDialog::new(TourOffer::from(tour));
    dialog.open();
    form.apply(&mut dialog)?;

    match dialog.submit(today)? {
        SubmitOutcome::Accepted(confirmation) => {
            info!(
                request_id = %confirmation.request_id,
                tour_id = confirmation.tour_id,
                date = %confirmation.date,
                participants = confirmation.participants.get(),
                total = confirmation.total,
                "booking request accepted"
            );
            let mut resp = render_html(ToastTemplate {
                toast: ToastView::from_notification(
                    &confirmation.notification,
                    Some(confirmation.request_id.to_string()),
                ),
            });
            resp.headers_mut().insert(
                header::HeaderName::from_static("hx-trigger"),
                header::HeaderValue::from_static("bookingAccepted"),
            );
            Ok(resp)
        }
        SubmitOutcome::Rejected {
            reason,
            notification,
        } => {
            warn!(tour_id = tour.id, %reason, "booking request rejected");
            let toast = ToastView::from_notification(&notification, None);
            Ok(render_html(dialog_template(&dialog, today, Some(toast))))
        }
    }
}

fn dialog_template(
    dialog: &BookingDialog,
    today: NaiveDate,
    notification: Option<ToastView>,
) -> BookingDialogTemplate {
    let offer = dialog.offer();
    let draft = dialog.draft().cloned().unwrap_or_default();
    BookingDialogTemplate {
        tour_id: offer.tour_id,
        subtitle: offer.subtitle(),
        min_date: today.format("%Y-%m-%d").to_string(),
        date: draft
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        date_label: draft
            .date
            .map(format_date_ru)
            .unwrap_or_else(|| "Выберите дату".to_string()),
        participants: ParticipantCount::options()
            .map(|p| OptionView {
                value: p.to_string(),
                label: p.label(),
                count: 0,
                selected: p == draft.participants,
            })
            .collect(),
        summary: PriceSummaryView {
            unit_price_label: format_rubles(u64::from(offer.unit_price)),
            participants: draft.participants.get(),
            total_label: format_rubles(dialog.total()),
        },
        name: draft.name,
        email: draft.email,
        phone: draft.phone,
        comment: draft.comment,
        notification,
    }
}

async fn app_css_handler(State(state): State<Arc<AppState>>) -> Response {
    let css_path = state.workspace_root.join("assets/static/app.css");
    match tokio::fs::read_to_string(&css_path).await {
        Ok(css) => ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("/* missing app.css */".to_string())).into_response(),
    }
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn tour_not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("Тур не найден".to_string())).into_response()
}

fn server_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {}", err)),
    )
        .into_response()
}
