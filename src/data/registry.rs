use std::collections::BTreeMap;
use std::fmt;

use super::model::{Document, Table};
use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// Known sections of the dataset
// ---------------------------------------------------------------------------

/// Every section the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    RevenueByPlatform,
    PlatformShare,
    RevenueBySegment,
    SegmentShare,
    RevenueByEcosystem,
    EcosystemShare,
    SoftwareRevenueByPlatform,
    SoftwarePlatformShare,
    UnitsByGenre,
    RevenueByGenre,
    MarketShareByGenre,
    AvgPriceByGenre,
    UnitsByPegi,
    SalesByPegi,
    SalesShareByPegi,
    AvgPriceByPegi,
}

impl Section {
    pub const ALL: [Section; 16] = [
        Section::RevenueByPlatform,
        Section::PlatformShare,
        Section::RevenueBySegment,
        Section::SegmentShare,
        Section::RevenueByEcosystem,
        Section::EcosystemShare,
        Section::SoftwareRevenueByPlatform,
        Section::SoftwarePlatformShare,
        Section::UnitsByGenre,
        Section::RevenueByGenre,
        Section::MarketShareByGenre,
        Section::AvgPriceByGenre,
        Section::UnitsByPegi,
        Section::SalesByPegi,
        Section::SalesShareByPegi,
        Section::AvgPriceByPegi,
    ];

    /// Key of the section in the JSON document.
    pub fn key(self) -> &'static str {
        match self {
            Section::RevenueByPlatform => "ca_data_support",
            Section::PlatformShare => "pourcentage_ca_support_repartition_data",
            Section::RevenueBySegment => "data_segment_ca",
            Section::SegmentShare => "data_segment_repartition",
            Section::RevenueByEcosystem => "data_ecosysteme_ca",
            Section::EcosystemShare => "data_ecosysteme_repartition_ca",
            Section::SoftwareRevenueByPlatform => "data_jeu_supports_chiffre_affaires",
            Section::SoftwarePlatformShare => "data_supports_repartition_jeu_ca",
            Section::UnitsByGenre => "data_genre_units",
            Section::RevenueByGenre => "data_genre_revenue",
            Section::MarketShareByGenre => "data_market_share",
            Section::AvgPriceByGenre => "data_avg_price_type",
            Section::UnitsByPegi => "data_units_pegi",
            Section::SalesByPegi => "data_sales_pegi",
            Section::SalesShareByPegi => "data_sales_distribution_pegi",
            Section::AvgPriceByPegi => "data_avg_price_age_pegi",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Registry – section → Table
// ---------------------------------------------------------------------------

/// The tables built from one document, passed explicitly to every chart.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tables: BTreeMap<Section, Table>,
    /// Why each unavailable section could not be built.
    failures: BTreeMap<Section, String>,
}

impl Registry {
    /// Build every known section; the first absent or malformed one aborts.
    pub fn build(doc: &Document) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for section in Section::ALL {
            tables.insert(section, build_table(doc, section)?);
        }
        Ok(Registry {
            tables,
            failures: BTreeMap::new(),
        })
    }

    /// Build every section that can be built and remember the others, so a
    /// broken section only disables the charts that depend on it.
    pub fn build_partial(doc: &Document) -> Self {
        let mut registry = Registry::default();
        for section in Section::ALL {
            match build_table(doc, section) {
                Ok(table) => {
                    registry.tables.insert(section, table);
                }
                Err(e) => {
                    log::warn!("Skipping section {section}: {e}");
                    registry.failures.insert(section, e.to_string());
                }
            }
        }
        registry
    }

    pub fn table(&self, section: Section) -> Result<&Table> {
        self.tables
            .get(&section)
            .ok_or_else(|| DataError::missing_section(section.key()))
    }

    pub fn failures(&self) -> impl Iterator<Item = (Section, &str)> {
        self.failures.iter().map(|(s, msg)| (*s, msg.as_str()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

fn build_table(doc: &Document, section: Section) -> Result<Table> {
    let records = doc
        .section(section.key())
        .ok_or_else(|| DataError::missing_section(section.key()))?;
    Table::from_records(section.key(), records)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value as JsonValue};

    use super::*;
    use crate::data::model::Tabular;

    fn full_document() -> Document {
        let mut root = Map::new();
        for section in Section::ALL {
            root.insert(
                section.key().to_string(),
                json!([
                    {"Année": 2016, "A": 1, "B": 2, "Total": 3},
                    {"Année": 2017, "A": 2, "B": 2, "Total": 4}
                ]),
            );
        }
        Document::from_json(JsonValue::Object(root))
    }

    #[test]
    fn builds_every_known_section() {
        let registry = Registry::build(&full_document()).unwrap();
        assert_eq!(registry.len(), Section::ALL.len());
        let table = registry.table(Section::UnitsByPegi).unwrap();
        assert_eq!(table.name(), "data_units_pegi");
        assert_eq!(table.column_names(), vec!["A", "B", "Total"]);
    }

    #[test]
    fn strict_build_fails_on_missing_section() {
        let doc = Document::from_json(json!({
            "ca_data_support": [{"Année": 2016, "PC": 10}]
        }));
        let err = Registry::build(&doc).unwrap_err();
        assert!(matches!(err, DataError::MissingSection { .. }));
    }

    #[test]
    fn partial_build_isolates_missing_sections() {
        let doc = Document::from_json(json!({
            "ca_data_support": [
                {"Année": 2016, "PC": 10, "Console": 20, "Mobile": 5},
                {"Année": 2017, "PC": 12, "Console": 18, "Mobile": 7}
            ]
        }));
        let registry = Registry::build_partial(&doc);
        assert_eq!(registry.len(), 1);
        assert!(registry.table(Section::RevenueByPlatform).is_ok());
        match registry.table(Section::SalesByPegi) {
            Err(DataError::MissingSection { section }) => assert_eq!(section, "data_sales_pegi"),
            other => panic!("expected MissingSection, got {other:?}"),
        }
        assert_eq!(registry.failures().count(), Section::ALL.len() - 1);
    }

    #[test]
    fn section_keys_are_distinct() {
        let mut keys: Vec<_> = Section::ALL.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Section::ALL.len());
    }
}
