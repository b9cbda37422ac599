use std::path::PathBuf;

use crate::branding::Branding;
use crate::charts::{self, ChartSpec, ChartView};
use crate::data::loader::CachedLoader;
use crate::data::registry::{Registry, Section};
use crate::data::selector::YearSelector;
use crate::error::Result;

/// Sections whose years drive the year slider.
const YEAR_SECTIONS: [Section; 2] = [Section::UnitsByPegi, Section::MarketShareByGenre];

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loader of the current dataset file (None until a file is opened).
    pub loader: Option<CachedLoader>,

    /// Tables of the loaded document.
    pub registry: Option<Registry>,

    /// The user-chosen year (None if no table provides a year range).
    pub selector: Option<YearSelector>,

    /// Sidebar identity.
    pub branding: Branding,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Reject datasets with an absent or malformed section instead of
    /// disabling the charts that need it.
    pub strict: bool,
}

impl AppState {
    pub fn new(branding: Branding) -> Self {
        Self {
            loader: None,
            registry: None,
            selector: None,
            branding,
            status_message: None,
            strict: false,
        }
    }

    /// Load a dataset file, replacing the current one on success.
    pub fn open(&mut self, path: PathBuf) {
        let loader = CachedLoader::new(path);
        let registry = loader.get_or_load().and_then(|doc| {
            if self.strict {
                Registry::build(doc)
            } else {
                Ok(Registry::build_partial(doc))
            }
        });
        match registry {
            Ok(registry) => {
                log::info!(
                    "Loaded {} with {} of {} sections",
                    loader.path().display(),
                    registry.len(),
                    Section::ALL.len()
                );
                self.set_registry(registry);
                self.loader = Some(loader);
            }
            Err(e) => {
                let err = anyhow::Error::new(e);
                log::error!("Failed to load dataset: {err:#}");
                self.status_message = Some(format!("Erreur : {err:#}"));
            }
        }
    }

    /// Ingest a newly built registry and reset the year selection.
    pub fn set_registry(&mut self, registry: Registry) {
        self.selector = YearSelector::covering(
            YEAR_SECTIONS
                .iter()
                .filter_map(|section| registry.table(*section).ok()),
        );
        if let Some(sel) = &self.selector {
            log::debug!("Year selector over {:?}", sel.range());
        }
        self.status_message = None;
        self.registry = Some(registry);
    }

    /// Record a year chosen by the user.
    pub fn select_year(&mut self, year: i32) {
        if let Some(sel) = &mut self.selector {
            sel.select(year);
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.selector.as_ref().map(YearSelector::year)
    }

    /// Project every chart for the current selection.
    pub fn chart_views(&self) -> Vec<(ChartSpec, Result<ChartView>)> {
        match &self.registry {
            Some(registry) => charts::build_all(registry, self.year()),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DATASET: &str = r#"{
        "data_units_pegi": [
            {"Année": 2016, "PEGI3": 4, "PEGI18": 2, "Total": 6},
            {"Année": 2017, "PEGI3": 5, "PEGI18": 3, "Total": 8},
            {"Année": 2018, "PEGI3": 6, "PEGI18": 4, "Total": 10}
        ],
        "data_market_share": [
            {"Année": 2017, "Action": 40, "Sport": 60},
            {"Année": 2018, "Action": 45, "Sport": 55},
            {"Année": 2019, "Action": 50, "Sport": 50}
        ]
    }"#;

    fn write_dataset(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn dataset_file() -> tempfile::NamedTempFile {
        write_dataset(DATASET)
    }

    #[test]
    fn open_builds_registry_and_selector() {
        let file = dataset_file();
        let mut state = AppState::new(Branding::default());
        state.open(file.path().to_path_buf());

        assert!(state.status_message.is_none());
        assert_eq!(state.registry.as_ref().unwrap().len(), 2);
        let sel = state.selector.as_ref().unwrap();
        assert_eq!(sel.range(), 2017..=2018);
        assert_eq!(state.year(), Some(2017));

        state.select_year(2030);
        assert_eq!(state.year(), Some(2018));
    }

    #[test]
    fn charts_fail_independently() {
        let file = dataset_file();
        let mut state = AppState::new(Branding::default());
        state.open(file.path().to_path_buf());

        let views = state.chart_views();
        let ok: Vec<&str> = views
            .iter()
            .filter(|(_, v)| v.is_ok())
            .map(|(spec, _)| spec.id)
            .collect();
        assert_eq!(ok, vec!["pegi_distribution", "market_share"]);
    }

    #[test]
    fn failed_open_keeps_previous_dataset() {
        let file = dataset_file();
        let mut state = AppState::new(Branding::default());
        state.open(file.path().to_path_buf());
        state.open(PathBuf::from("/definitely/not/here.json"));

        assert!(state.status_message.as_deref().unwrap().contains("dataset unavailable"));
        assert!(state.registry.is_some());
        assert!(state.loader.as_ref().unwrap().path() == file.path());
    }

    #[test]
    fn skipped_year_is_never_offered() {
        let file = write_dataset(
            r#"{
                "data_units_pegi": [
                    {"Année": 2016, "PEGI3": 4, "PEGI18": 2},
                    {"Année": 2018, "PEGI3": 6, "PEGI18": 4},
                    {"Année": 2019, "PEGI3": 7, "PEGI18": 5}
                ],
                "data_market_share": [
                    {"Année": 2016, "Action": 40, "Sport": 60},
                    {"Année": 2017, "Action": 42, "Sport": 58},
                    {"Année": 2018, "Action": 45, "Sport": 55},
                    {"Année": 2019, "Action": 50, "Sport": 50}
                ]
            }"#,
        );
        let mut state = AppState::new(Branding::default());
        state.open(file.path().to_path_buf());

        assert_eq!(state.selector.as_ref().unwrap().range(), 2018..=2019);
        state.select_year(2017);
        assert_eq!(state.year(), Some(2018));

        let registry = state.registry.as_ref().unwrap();
        for year in state.selector.as_ref().unwrap().range() {
            assert!(charts::build_pegi_distribution(registry, year).is_ok());
            assert!(charts::build_market_share(registry, year).is_ok());
        }
    }

    #[test]
    fn strict_open_rejects_incomplete_dataset() {
        let file = dataset_file();
        let mut state = AppState::new(Branding::default());
        state.strict = true;
        state.open(file.path().to_path_buf());

        assert!(state.registry.is_none());
        assert!(state.loader.is_none());
        assert!(state.status_message.as_deref().unwrap().contains("missing section"));
    }
}
