//! Tour fixture loading, dataset checks and filter facets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tourbook_core::{Difficulty, Season, Tour};
use tracing::info;

pub const CRATE_NAME: &str = "tourbook-catalog";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("reading tour fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing tour fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate tour id {0}")]
    DuplicateId(u32),
    #[error("tour {id}: {field} must be positive")]
    NotPositive { id: u32, field: &'static str },
    #[error("tour {id}: {field} must not be empty")]
    EmptyField { id: u32, field: &'static str },
}

#[derive(Debug, Deserialize)]
struct ToursYaml {
    tours: Vec<Tour>,
}

/// Read-only tour dataset, cheap to clone and share across handlers.
#[derive(Debug, Clone)]
pub struct TourCatalog {
    tours: Arc<[Tour]>,
}

impl TourCatalog {
    pub fn from_tours(tours: Vec<Tour>) -> Result<Self, CatalogError> {
        check_tours(&tours)?;
        Ok(Self {
            tours: tours.into(),
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let parsed: ToursYaml = serde_yaml::from_str(yaml)?;
        Self::from_tours(parsed.tours)
    }

    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), tours = catalog.len(), "loaded tour catalog");
        Ok(catalog)
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn get(&self, id: u32) -> Option<&Tour> {
        self.tours.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn facets(&self) -> CatalogFacets {
        CatalogFacets::from_tours(&self.tours)
    }
}

fn check_tours(tours: &[Tour]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(tours.len());
    for tour in tours {
        if !seen.insert(tour.id) {
            return Err(CatalogError::DuplicateId(tour.id));
        }
        if tour.price == 0 {
            return Err(CatalogError::NotPositive { id: tour.id, field: "price" });
        }
        if tour.duration == 0 {
            return Err(CatalogError::NotPositive { id: tour.id, field: "duration" });
        }
        for (field, value) in [
            ("title", &tour.title),
            ("region", &tour.region),
            ("activity", &tour.activity),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::EmptyField { id: tour.id, field });
            }
        }
        if tour.season.is_empty() {
            return Err(CatalogError::EmptyField { id: tour.id, field: "season" });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCount<T> {
    pub value: T,
    pub count: usize,
}

/// Selectable filter options with the number of tours carrying each value.
/// Regions and activities keep dataset order; difficulty and season follow
/// their enum order and may carry zero counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFacets {
    pub regions: Vec<FacetCount<String>>,
    pub activities: Vec<FacetCount<String>>,
    pub difficulties: Vec<FacetCount<Difficulty>>,
    pub seasons: Vec<FacetCount<Season>>,
}

impl CatalogFacets {
    pub fn from_tours(tours: &[Tour]) -> Self {
        Self {
            regions: distinct_counts(tours.iter().map(|t| t.region.as_str())),
            activities: distinct_counts(tours.iter().map(|t| t.activity.as_str())),
            difficulties: Difficulty::ALL
                .into_iter()
                .map(|value| FacetCount {
                    value,
                    count: tours.iter().filter(|t| t.difficulty == value).count(),
                })
                .collect(),
            seasons: Season::ALL
                .into_iter()
                .map(|value| FacetCount {
                    value,
                    count: tours.iter().filter(|t| t.has_season(value)).count(),
                })
                .collect(),
        }
    }
}

fn distinct_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FacetCount<String>> {
    let mut out: Vec<FacetCount<String>> = Vec::new();
    for value in values {
        match out.iter_mut().find(|f| f.value == value) {
            Some(existing) => existing.count += 1,
            None => out.push(FacetCount {
                value: value.to_string(),
                count: 1,
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn workspace_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/tours.yaml")
    }

    const TWO_TOURS: &str = r#"
tours:
  - id: 1
    title: A
    region: Алтай
    activity: Треккинг
    difficulty: Сложный
    duration: 7
    price: 45000
    season: [Лето]
    image_url: a.jpg
    description: ""
  - id: 2
    title: B
    region: Алтай
    activity: Сплав
    difficulty: Легкий
    duration: 3
    price: 18000
    season: [Лето, Весна]
    image_url: b.jpg
    description: ""
"#;

    #[test]
    fn loads_workspace_fixture() {
        let catalog = TourCatalog::load_yaml(workspace_fixture()).expect("fixture loads");
        assert_eq!(catalog.len(), 6);
        let ids: Vec<u32> = catalog.tours().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        let altai = catalog.get(6).expect("tour 6");
        assert_eq!(altai.region, "Алтай");
        assert_eq!(altai.season, vec![Season::Summer, Season::Autumn, Season::Spring]);
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn facets_keep_dataset_order_and_count() {
        let catalog = TourCatalog::load_yaml(workspace_fixture()).unwrap();
        let facets = catalog.facets();
        let regions: Vec<(&str, usize)> = facets
            .regions
            .iter()
            .map(|f| (f.value.as_str(), f.count))
            .collect();
        assert_eq!(
            regions,
            vec![
                ("Алтай", 2),
                ("Карелия", 1),
                ("Кольский полуостров", 1),
                ("Байкал", 1),
                ("Камчатка", 1)
            ]
        );
        assert_eq!(facets.activities.first().map(|f| f.count), Some(2));
        assert_eq!(
            facets.seasons.iter().map(|f| f.count).collect::<Vec<_>>(),
            vec![5, 1, 1, 3]
        );
        assert_eq!(
            facets.difficulties.iter().map(|f| f.count).collect::<Vec<_>>(),
            vec![2, 2, 2]
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = TWO_TOURS.replace("id: 2", "id: 1");
        let err = TourCatalog::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(1)));
    }

    #[test]
    fn rejects_zero_price_and_empty_season() {
        let err = TourCatalog::from_yaml_str(&TWO_TOURS.replace("price: 18000", "price: 0")).unwrap_err();
        assert!(matches!(err, CatalogError::NotPositive { id: 2, field: "price" }));

        let err = TourCatalog::from_yaml_str(&TWO_TOURS.replace("[Лето, Весна]", "[]")).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyField { id: 2, field: "season" }));
    }

    #[test]
    fn unknown_difficulty_label_is_a_yaml_error() {
        let err = TourCatalog::from_yaml_str(&TWO_TOURS.replace("Легкий", "Простой")).unwrap_err();
        assert!(matches!(err, CatalogError::Yaml(_)));
    }

    #[test]
    fn load_from_temp_file_and_missing_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(TWO_TOURS.as_bytes()).expect("write");
        let catalog = TourCatalog::load_yaml(file.path()).expect("load");
        assert_eq!(catalog.len(), 2);

        let err = TourCatalog::load_yaml(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
