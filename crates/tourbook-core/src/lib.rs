//! Core domain model, catalog filtering and booking rules for Tourbook.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const CRATE_NAME: &str = "tourbook-core";

pub const DEFAULT_PRICE_RANGE: BoundRange = BoundRange { min: 0, max: 100_000 };
pub const DEFAULT_DURATION_RANGE: BoundRange = BoundRange { min: 1, max: 14 };
pub const PRICE_STEP: u32 = 5_000;
pub const DURATION_STEP: u32 = 1;

pub const DAY_FORMS: [&str; 3] = ["день", "дня", "дней"];
pub const PERSON_FORMS: [&str; 3] = ["человек", "человека", "человек"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Легкий")]
    Easy,
    #[serde(rename = "Средний")]
    Medium,
    #[serde(rename = "Сложный")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Легкий",
            Difficulty::Medium => "Средний",
            Difficulty::Hard => "Сложный",
        }
    }

    /// CSS class used for the difficulty badge on a tour card.
    pub fn badge_class(self) -> &'static str {
        match self {
            Difficulty::Easy => "badge-easy",
            Difficulty::Medium => "badge-medium",
            Difficulty::Hard => "badge-hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.label() == trimmed || format!("{d:?}").eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                kind: "difficulty",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Лето")]
    Summer,
    #[serde(rename = "Зима")]
    Winter,
    #[serde(rename = "Весна")]
    Spring,
    #[serde(rename = "Осень")]
    Autumn,
}

impl Season {
    /// Order in which the season selector lists its options.
    pub const ALL: [Season; 4] = [Season::Summer, Season::Winter, Season::Spring, Season::Autumn];

    pub fn label(self) -> &'static str {
        match self {
            Season::Summer => "Лето",
            Season::Winter => "Зима",
            Season::Spring => "Весна",
            Season::Autumn => "Осень",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Season::ALL
            .into_iter()
            .find(|season| season.label() == trimmed || format!("{season:?}").eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                kind: "season",
                value: s.to_string(),
            })
    }
}

/// Static catalog entry. Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    pub id: u32,
    pub title: String,
    pub region: String,
    pub activity: String,
    pub difficulty: Difficulty,
    pub duration: u32,
    pub price: u32,
    pub season: Vec<Season>,
    pub image_url: String,
    pub description: String,
}

impl Tour {
    pub fn has_season(&self, season: Season) -> bool {
        self.season.contains(&season)
    }

    pub fn duration_label(&self) -> String {
        format!("{} {}", self.duration, pluralize(u64::from(self.duration), DAY_FORMS))
    }

    pub fn price_label(&self) -> String {
        format_rubles(u64::from(self.price))
    }
}

/// Inclusive `[min, max]` bound. An inverted bound (`min > max`) contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundRange {
    pub min: u32,
    pub max: u32,
}

impl BoundRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// Active catalog constraints. `None` means "no constraint" for the categorical fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub activity: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub season: Option<Season>,
    pub price_range: BoundRange,
    pub duration_range: BoundRange,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            region: None,
            activity: None,
            difficulty: None,
            season: None,
            price_range: DEFAULT_PRICE_RANGE,
            duration_range: DEFAULT_DURATION_RANGE,
        }
    }
}

impl FilterCriteria {
    /// True when the tour satisfies all six predicates.
    pub fn matches(&self, tour: &Tour) -> bool {
        if self.region.as_deref().is_some_and(|r| r != tour.region) {
            return false;
        }
        if self.activity.as_deref().is_some_and(|a| a != tour.activity) {
            return false;
        }
        if self.difficulty.is_some_and(|d| d != tour.difficulty) {
            return false;
        }
        if self.season.is_some_and(|s| !tour.has_season(s)) {
            return false;
        }
        self.price_range.contains(tour.price) && self.duration_range.contains(tour.duration)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Returns the tours passing `criteria`, in input order.
pub fn filter<'a>(tours: &'a [Tour], criteria: &FilterCriteria) -> Vec<&'a Tour> {
    tours.iter().filter(|tour| criteria.matches(tour)).collect()
}

/// Filter state owned by one catalog view. Criteria change only through the setters.
#[derive(Debug, Clone)]
pub struct CatalogSession<'a> {
    tours: &'a [Tour],
    criteria: FilterCriteria,
}

impl<'a> CatalogSession<'a> {
    pub fn new(tours: &'a [Tour]) -> Self {
        Self {
            tours,
            criteria: FilterCriteria::default(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_region(&mut self, region: Option<String>) {
        self.criteria.region = region;
    }

    pub fn set_activity(&mut self, activity: Option<String>) {
        self.criteria.activity = activity;
    }

    pub fn set_difficulty(&mut self, difficulty: Option<Difficulty>) {
        self.criteria.difficulty = difficulty;
    }

    pub fn set_season(&mut self, season: Option<Season>) {
        self.criteria.season = season;
    }

    pub fn set_price_range(&mut self, range: BoundRange) {
        self.criteria.price_range = range;
    }

    pub fn set_duration_range(&mut self, range: BoundRange) {
        self.criteria.duration_range = range;
    }

    /// Restores every criterion to its default.
    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    pub fn is_filtered(&self) -> bool {
        !self.criteria.is_default()
    }

    pub fn visible(&self) -> Vec<&'a Tour> {
        filter(self.tours, &self.criteria)
    }

    pub fn visible_count(&self) -> usize {
        self.tours.iter().filter(|tour| self.criteria.matches(tour)).count()
    }
}

/// Number of people on one booking, always within `[MIN, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantCount(u8);

impl ParticipantCount {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(count: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&count).then_some(Self(count))
    }

    /// Lenient parse of a form value: anything that is not a positive integer
    /// becomes 1, and counts above the selector maximum clamp to `MAX`.
    pub fn from_input(input: &str) -> Self {
        match input.trim().parse::<i64>() {
            Ok(n) if n >= i64::from(Self::MAX) => Self(Self::MAX),
            Ok(n) if n >= i64::from(Self::MIN) => Self(n as u8),
            _ => Self::default(),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("{} {}", self.0, pluralize(u64::from(self.0), PERSON_FORMS))
    }

    pub fn total_for(self, unit_price: u32) -> u64 {
        u64::from(unit_price) * u64::from(self.0)
    }

    /// Every selectable count, in ascending order.
    pub fn options() -> impl Iterator<Item = ParticipantCount> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl Default for ParticipantCount {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for ParticipantCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking total for a raw participant-count form value. Never rejects.
pub fn compute_total(unit_price: u32, participants: &str) -> u64 {
    ParticipantCount::from_input(participants).total_for(unit_price)
}

/// In-progress booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub date: Option<NaiveDate>,
    pub participants: ParticipantCount,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub comment: String,
}

impl BookingDraft {
    pub fn total(&self, unit_price: u32) -> u64 {
        self.participants.total_for(unit_price)
    }

    pub fn missing_fields(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push(RequiredField::Date);
        }
        for (field, value) in [
            (RequiredField::Name, &self.name),
            (RequiredField::Email, &self.email),
            (RequiredField::Phone, &self.phone),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Date,
    Name,
    Email,
    Phone,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::Date => "date",
            RequiredField::Name => "name",
            RequiredField::Email => "email",
            RequiredField::Phone => "phone",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {}", join_fields(.missing))]
    MissingRequiredField { missing: Vec<RequiredField> },
    #[error("tour start date {date} is before {today}")]
    DateInPast { date: NaiveDate, today: NaiveDate },
}

fn join_fields(fields: &[RequiredField]) -> String {
    fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

impl ValidationError {
    pub fn notification(&self) -> Notification {
        let description = match self {
            ValidationError::MissingRequiredField { .. } => {
                "Пожалуйста, заполните все обязательные поля"
            }
            ValidationError::DateInPast { .. } => "Дата начала тура не может быть в прошлом",
        };
        Notification {
            title: "Ошибка".to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Destructive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted,
    Rejected(ValidationError),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }
}

/// Presence check on date/name/email/phone plus "date not before today".
/// Contact values are collected as-is; no format checks.
pub fn validate(draft: &BookingDraft, today: NaiveDate) -> ValidationResult {
    let missing = draft.missing_fields();
    if !missing.is_empty() {
        return ValidationResult::Rejected(ValidationError::MissingRequiredField { missing });
    }
    match draft.date {
        Some(date) if date < today => {
            ValidationResult::Rejected(ValidationError::DateInPast { date, today })
        }
        _ => ValidationResult::Accepted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Success,
    Destructive,
}

/// Transient toast shown after a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn booking_accepted(tour_title: &str) -> Self {
        Self {
            title: "Заявка отправлена!".to_string(),
            description: format!(
                "Мы свяжемся с вами в ближайшее время для подтверждения бронирования тура \"{tour_title}\""
            ),
            variant: NotificationVariant::Success,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

/// The subset of a tour the booking dialog is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourOffer {
    pub tour_id: u32,
    pub title: String,
    pub unit_price: u32,
    pub duration: u32,
}

impl From<&Tour> for TourOffer {
    fn from(tour: &Tour) -> Self {
        Self {
            tour_id: tour.id,
            title: tour.title.clone(),
            unit_price: tour.price,
            duration: tour.duration,
        }
    }
}

impl TourOffer {
    /// Dialog subtitle, e.g. `Горные вершины Алтая • 7 дней`.
    pub fn subtitle(&self) -> String {
        format!(
            "{} • {} {}",
            self.title,
            self.duration,
            pluralize(u64::from(self.duration), DAY_FORMS)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Date(Option<NaiveDate>),
    Participants(String),
    Name(String),
    Email(String),
    Phone(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Editing(BookingDraft),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DialogError {
    #[error("booking dialog is closed")]
    Closed,
}

/// Accepted submission. The draft it came from has already been discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub request_id: Uuid,
    pub tour_id: u32,
    pub tour_title: String,
    pub date: NaiveDate,
    pub participants: ParticipantCount,
    pub total: u64,
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(BookingConfirmation),
    Rejected {
        reason: ValidationError,
        notification: Notification,
    },
}

/// Booking dialog for one tour: `Closed` until opened, `Editing` while the
/// form is shown. Reusable indefinitely.
#[derive(Debug, Clone)]
pub struct BookingDialog {
    offer: TourOffer,
    state: DialogState,
}

impl BookingDialog {
    pub fn new(offer: TourOffer) -> Self {
        Self {
            offer,
            state: DialogState::Closed,
        }
    }

    pub fn offer(&self) -> &TourOffer {
        &self.offer
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Editing(_))
    }

    pub fn draft(&self) -> Option<&BookingDraft> {
        match &self.state {
            DialogState::Editing(draft) => Some(draft),
            DialogState::Closed => None,
        }
    }

    /// Opens with a fresh draft. Opening an already open dialog keeps its draft.
    pub fn open(&mut self) {
        if !self.is_open() {
            self.state = DialogState::Editing(BookingDraft::default());
        }
    }

    /// Closes and discards the draft without warning.
    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
    }

    pub fn edit(&mut self, edit: DraftEdit) -> Result<(), DialogError> {
        let DialogState::Editing(draft) = &mut self.state else {
            return Err(DialogError::Closed);
        };
        match edit {
            DraftEdit::Date(date) => draft.date = date,
            DraftEdit::Participants(raw) => draft.participants = ParticipantCount::from_input(&raw),
            DraftEdit::Name(name) => draft.name = name,
            DraftEdit::Email(email) => draft.email = email,
            DraftEdit::Phone(phone) => draft.phone = phone,
            DraftEdit::Comment(comment) => draft.comment = comment,
        }
        Ok(())
    }

    /// Current total. A closed dialog quotes the default single participant.
    pub fn total(&self) -> u64 {
        self.draft()
            .map(|draft| draft.total(self.offer.unit_price))
            .unwrap_or_else(|| ParticipantCount::default().total_for(self.offer.unit_price))
    }

    /// Validates the draft. Accepted closes the dialog and drops the draft;
    /// Rejected leaves state untouched.
    pub fn submit(&mut self, today: NaiveDate) -> Result<SubmitOutcome, DialogError> {
        let DialogState::Editing(draft) = &self.state else {
            return Err(DialogError::Closed);
        };
        match validate(draft, today) {
            ValidationResult::Rejected(reason) => {
                let notification = reason.notification();
                Ok(SubmitOutcome::Rejected {
                    reason,
                    notification,
                })
            }
            ValidationResult::Accepted => {
                let confirmation = BookingConfirmation {
                    request_id: Uuid::new_v4(),
                    tour_id: self.offer.tour_id,
                    tour_title: self.offer.title.clone(),
                    date: draft.date.unwrap_or(today),
                    participants: draft.participants,
                    total: draft.total(self.offer.unit_price),
                    notification: Notification::booking_accepted(&self.offer.title),
                };
                self.state = DialogState::Closed;
                Ok(SubmitOutcome::Accepted(confirmation))
            }
        }
    }
}

/// Picks the Russian plural form (`[one, few, many]`) for `count`.
pub fn pluralize<'a>(count: u64, forms: [&'a str; 3]) -> &'a str {
    let [one, few, many] = forms;
    let last_two = count % 100;
    let last = count % 10;
    if last == 1 && last_two != 11 {
        one
    } else if (2..=4).contains(&last) && !(12..=14).contains(&last_two) {
        few
    } else {
        many
    }
}

/// `45000` -> `45 000` with a non-breaking space between groups.
pub fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 2);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(ch);
    }
    out
}

pub fn format_rubles(amount: u64) -> String {
    format!("{} ₽", group_thousands(amount))
}

const MONTHS_GENITIVE: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
    "октября", "ноября", "декабря",
];

/// Long Russian date, e.g. `7 июля 2026 г.`
pub fn format_date_ru(date: NaiveDate) -> String {
    format!(
        "{} {} {} г.",
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize],
        date.year()
    )
}
