use std::path::Path;

use tourbook_catalog::TourCatalog;
use tourbook_core::{filter, CatalogSession, FilterCriteria, Season};

fn fixture_catalog() -> TourCatalog {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    TourCatalog::load_yaml(root.join("fixtures/tours.yaml")).expect("fixture loads")
}

#[test]
fn fixture_default_filter_shows_every_tour() {
    let catalog = fixture_catalog();
    assert_eq!(filter(catalog.tours(), &FilterCriteria::default()).len(), catalog.len());
}

#[test]
fn fixture_winter_tours_are_the_freeride_trip_only() {
    let catalog = fixture_catalog();
    let mut session = CatalogSession::new(catalog.tours());
    session.set_season(Some(Season::Winter));
    let titles: Vec<&str> = session.visible().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Фрирайд в Хибинах"]);
}
