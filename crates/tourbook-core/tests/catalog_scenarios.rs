use chrono::NaiveDate;
use tourbook_core::{
    compute_total, filter, validate, BookingDraft, BoundRange, CatalogSession, Difficulty,
    FilterCriteria, ParticipantCount, Season, Tour, ValidationResult,
};

fn tour(
    id: u32,
    title: &str,
    region: &str,
    activity: &str,
    difficulty: Difficulty,
    duration: u32,
    price: u32,
    season: &[Season],
) -> Tour {
    Tour {
        id,
        title: title.to_string(),
        region: region.to_string(),
        activity: activity.to_string(),
        difficulty,
        duration,
        price,
        season: season.to_vec(),
        image_url: format!("https://example.invalid/{id}.jpg"),
        description: String::new(),
    }
}

fn dataset() -> Vec<Tour> {
    use Difficulty::{Easy, Hard, Medium};
    use Season::{Autumn, Spring, Summer, Winter};
    vec![
        tour(1, "Горные вершины Алтая", "Алтай", "Треккинг", Hard, 7, 45_000, &[Summer, Autumn]),
        tour(2, "Сплав по диким рекам", "Карелия", "Сплав", Medium, 5, 28_000, &[Summer]),
        tour(3, "Фрирайд в Хибинах", "Кольский полуостров", "Лыжи", Medium, 4, 35_000, &[Winter]),
        tour(4, "Велотур по Байкалу", "Байкал", "Велосипед", Easy, 6, 32_000, &[Summer, Autumn]),
        tour(5, "Треккинг к вулканам", "Камчатка", "Треккинг", Hard, 10, 85_000, &[Summer]),
        tour(6, "Прогулка по тайге", "Алтай", "Пеший поход", Easy, 3, 18_000, &[Summer, Autumn, Spring]),
    ]
}

fn ids(tours: &[&Tour]) -> Vec<u32> {
    tours.iter().map(|t| t.id).collect()
}

fn criteria_grid() -> Vec<FilterCriteria> {
    let mut grid = Vec::new();
    for region in [None, Some("Алтай"), Some("Камчатка"), Some("Нигде")] {
        for difficulty in [None, Some(Difficulty::Easy), Some(Difficulty::Hard)] {
            for season in [None, Some(Season::Autumn), Some(Season::Winter)] {
                for price_range in [BoundRange::new(0, 100_000), BoundRange::new(20_000, 50_000), BoundRange::new(60_000, 10_000)] {
                    grid.push(FilterCriteria {
                        region: region.map(str::to_string),
                        activity: None,
                        difficulty,
                        season,
                        price_range,
                        duration_range: BoundRange::new(4, 10),
                    });
                }
            }
        }
    }
    grid.push(FilterCriteria {
        activity: Some("Треккинг".to_string()),
        ..FilterCriteria::default()
    });
    grid
}

fn violates_some_predicate(tour: &Tour, c: &FilterCriteria) -> bool {
    c.region.as_deref().is_some_and(|r| r != tour.region)
        || c.activity.as_deref().is_some_and(|a| a != tour.activity)
        || c.difficulty.is_some_and(|d| d != tour.difficulty)
        || c.season.is_some_and(|s| !tour.season.contains(&s))
        || !(c.price_range.min <= tour.price && tour.price <= c.price_range.max)
        || !(c.duration_range.min <= tour.duration && tour.duration <= c.duration_range.max)
}

#[test]
fn default_criteria_return_full_dataset_in_order() {
    let tours = dataset();
    let result = filter(&tours, &FilterCriteria::default());
    assert_eq!(ids(&result), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn results_satisfy_all_predicates_and_exclusions_violate_one() {
    let tours = dataset();
    for criteria in criteria_grid() {
        let result = filter(&tours, &criteria);
        let kept = ids(&result);
        for t in &tours {
            if kept.contains(&t.id) {
                assert!(!violates_some_predicate(t, &criteria), "tour {} kept for {criteria:?}", t.id);
            } else {
                assert!(violates_some_predicate(t, &criteria), "tour {} dropped for {criteria:?}", t.id);
            }
        }
    }
}

#[test]
fn filtering_is_idempotent_and_order_preserving() {
    let tours = dataset();
    for criteria in criteria_grid() {
        let once: Vec<Tour> = filter(&tours, &criteria).into_iter().cloned().collect();
        let twice: Vec<Tour> = filter(&once, &criteria).into_iter().cloned().collect();
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0].id < w[1].id));
    }
}

#[test]
fn scenario_region_altai_returns_two_tours_in_order() {
    let tours = dataset();
    let mut session = CatalogSession::new(&tours);
    session.set_region(Some("Алтай".to_string()));
    assert_eq!(ids(&session.visible()), vec![1, 6]);
}

#[test]
fn scenario_explicit_default_ranges_return_all_six() {
    let tours = dataset();
    let mut session = CatalogSession::new(&tours);
    session.set_price_range(BoundRange::new(0, 100_000));
    session.set_duration_range(BoundRange::new(1, 14));
    assert_eq!(session.visible_count(), 6);
    assert!(!session.is_filtered());
}

#[test]
fn scenario_three_participants_at_45000() {
    assert_eq!(compute_total(45_000, "3"), 135_000);
}

#[test]
fn scenario_missing_email_is_rejected_and_draft_is_untouched() {
    let draft = BookingDraft {
        date: NaiveDate::from_ymd_opt(2026, 12, 1),
        participants: ParticipantCount::default(),
        name: "Иван".to_string(),
        email: String::new(),
        phone: "123".to_string(),
        comment: String::new(),
    };
    let before = draft.clone();
    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    assert!(matches!(validate(&draft, today), ValidationResult::Rejected(_)));
    assert_eq!(draft, before);
}

#[test]
fn validate_accepts_with_or_without_comment() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let mut draft = BookingDraft {
        date: Some(today),
        participants: ParticipantCount::default(),
        name: "Иван".to_string(),
        email: "ivan@example.com".to_string(),
        phone: "123".to_string(),
        comment: String::new(),
    };
    assert!(validate(&draft, today).is_accepted());
    draft.comment = "Нужен трансфер".to_string();
    assert!(validate(&draft, today).is_accepted());

    let clears: [fn(&mut BookingDraft); 4] = [
        |d| d.date = None,
        |d| d.name.clear(),
        |d| d.email.clear(),
        |d| d.phone.clear(),
    ];
    for clear in clears {
        let mut incomplete = draft.clone();
        clear(&mut incomplete);
        assert!(!validate(&incomplete, today).is_accepted());
    }
}

#[test]
fn scenario_reset_restores_every_default() {
    let tours = dataset();
    let mut session = CatalogSession::new(&tours);
    session.set_region(Some("Карелия".to_string()));
    session.set_activity(Some("Сплав".to_string()));
    session.set_difficulty(Some(Difficulty::Hard));
    session.set_season(Some(Season::Winter));
    session.set_price_range(BoundRange::new(5_000, 10_000));
    session.set_duration_range(BoundRange::new(2, 3));
    assert_eq!(session.visible_count(), 0);

    session.reset();
    let c = session.criteria();
    assert_eq!(c.region, None);
    assert_eq!(c.activity, None);
    assert_eq!(c.difficulty, None);
    assert_eq!(c.season, None);
    assert_eq!(c.price_range, BoundRange::new(0, 100_000));
    assert_eq!(c.duration_range, BoundRange::new(1, 14));
    assert_eq!(session.visible_count(), 6);
}
