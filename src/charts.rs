//! Chart pipelines: registry (+ selected year) → chart-ready view.
//!
//! Each `build_*` function is pure and independent, so a failure in one
//! chart never prevents the others from being drawn.

use std::f64::consts::TAU;

use eframe::egui::Color32;

use crate::color::{adjust_lightness, ColorMap, CATEGORY20C, SET2};
use crate::data::model::{LongRecord, Ratio, Tabular, Value, TOTAL_COLUMN};
use crate::data::projector::{self, drop_columns};
use crate::data::registry::{Registry, Section};
use crate::error::{DataError, Result};

/// Number of genres kept by the price-variation chart.
pub const TOP_VARIATIONS: usize = 5;

/// Platform groups of the ecosystem chart: name, pastel base colour and the
/// columns stacked for it (bottom to top).
const ECOSYSTEM_GROUPS: [(&str, [f32; 3], &[&str]); 3] = [
    (
        "Console",
        [0.6, 0.8, 1.0],
        &[
            "Matériel Console",
            "Accessoire Console",
            "Logiciel Physique Console",
            "Logiciel Dématérialisé Console",
        ],
    ),
    (
        "PC",
        [1.0, 0.6, 0.6],
        &[
            "Matériel PC",
            "Accessoire PC",
            "Écrans PC",
            "Logiciel Physique PC",
            "Logiciel Dématérialisé PC",
        ],
    ),
    ("Mobile", [0.6, 1.0, 0.6], &["Logiciel Mobile"]),
];

// ---------------------------------------------------------------------------
// Chart configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    StackedBar,
    Line,
    PieWedge,
    StackedArea,
}

/// Static description of a chart handed to the renderer with its view.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

pub const REVENUE_OVERVIEW: ChartSpec = ChartSpec {
    id: "revenue_overview",
    title: "Analyse du chiffre d'affaires sur le marché du jeu vidéo",
    kind: ChartKind::StackedArea,
    x_label: "Année",
    y_label: "Chiffre d'affaires (M€)",
};

pub const GENRE_REVENUE: ChartSpec = ChartSpec {
    id: "genre_revenue",
    title: "Revenus par genre de jeu vidéo",
    kind: ChartKind::StackedBar,
    x_label: "Année",
    y_label: "Revenus (M€)",
};

pub const PRICE_VARIATIONS: ChartSpec = ChartSpec {
    id: "price_variations",
    title: "Évolution du prix moyen des jeux par genre (top 5 variations)",
    kind: ChartKind::Line,
    x_label: "Année",
    y_label: "Prix (€)",
};

pub const ECOSYSTEM_REVENUE: ChartSpec = ChartSpec {
    id: "ecosystem_revenue",
    title: "Chiffre d'affaires par écosystème",
    kind: ChartKind::StackedBar,
    x_label: "Année",
    y_label: "CA (M€)",
};

pub const MARKET_SHARE: ChartSpec = ChartSpec {
    id: "market_share",
    title: "Part de marché par genre",
    kind: ChartKind::Bar,
    x_label: "Genre",
    y_label: "Part de marché (%)",
};

pub const PEGI_DISTRIBUTION: ChartSpec = ChartSpec {
    id: "pegi_distribution",
    title: "Répartition des jeux par classification PEGI",
    kind: ChartKind::PieWedge,
    x_label: "",
    y_label: "",
};

pub const PROFIT_PER_UNIT: ChartSpec = ChartSpec {
    id: "profit_per_unit",
    title: "Profit par unité selon la classification PEGI et l'année",
    kind: ChartKind::Line,
    x_label: "Année",
    y_label: "Profit par unité (€)",
};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// One named series over years; `None` marks a point that cannot be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<(i32, Option<f64>)>,
}

/// Stacked layers with a reference total line.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaView {
    pub total: YearSeries,
    /// Layers from bottom to top.
    pub layers: Vec<YearSeries>,
}

/// Bars stacked per year, layers from bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBarsView {
    pub layers: Vec<YearSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinesView {
    pub series: Vec<YearSeries>,
    pub markers: bool,
}

/// One bar per category for a single year.
#[derive(Debug, Clone, PartialEq)]
pub struct BarsView {
    pub year: i32,
    pub bars: Vec<(String, f64, Color32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wedge {
    pub label: String,
    pub value: f64,
    pub share: Ratio,
    pub color: Color32,
    /// Radians, counter-clockwise from the positive x axis.
    pub start_angle: f64,
    pub end_angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieView {
    pub year: i32,
    pub wedges: Vec<Wedge>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Area(AreaView),
    StackedBars(StackedBarsView),
    Lines(LinesView),
    Bars(BarsView),
    Pie(PieView),
}

impl ChartView {
    /// The kind of chart this view is drawn as.
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartView::Area(_) => ChartKind::StackedArea,
            ChartView::StackedBars(_) => ChartKind::StackedBar,
            ChartView::Lines(_) => ChartKind::Line,
            ChartView::Bars(_) => ChartKind::Bar,
            ChartView::Pie(_) => ChartKind::PieWedge,
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Total revenue as a line, every platform column as a stacked area.
pub fn build_revenue_overview(registry: &Registry) -> Result<AreaView> {
    let table = registry.table(Section::RevenueByPlatform)?;
    let years = table.years();

    let total = YearSeries {
        name: "Chiffre d'affaires total".to_string(),
        color: Color32::BLACK,
        points: zip_years(years, table.numeric_column(TOTAL_COLUMN)?),
    };

    let platforms = drop_columns(table, &[TOTAL_COLUMN]);
    let names = platforms.column_names();
    let colors = ColorMap::new(&names, &SET2);
    let layers = names
        .iter()
        .map(|name| {
            Ok(YearSeries {
                name: name.to_string(),
                color: colors.color_for(name),
                points: zip_years(years, platforms.numeric_column(name)?),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AreaView { total, layers })
}

/// Genre revenue melted to long format and stacked per year, genres ordered
/// by name.
pub fn build_genre_revenue(registry: &Registry) -> Result<StackedBarsView> {
    let table = registry.table(Section::RevenueByGenre)?;
    let long = projector::melt(table);
    let mut grouped = group_numbers(table.name(), table.years(), &long)?;
    grouped.sort_by(|a, b| a.0.cmp(&b.0));

    let names: Vec<&str> = grouped.iter().map(|(n, _)| n.as_str()).collect();
    let colors = ColorMap::new(&names, &SET2);
    let layers = grouped
        .iter()
        .map(|(name, points)| YearSeries {
            name: name.clone(),
            color: colors.color_for(name),
            points: points.clone(),
        })
        .collect();
    Ok(StackedBarsView { layers })
}

/// Average price of the genres whose price moved the most.
pub fn build_price_variations(registry: &Registry) -> Result<LinesView> {
    let table = registry.table(Section::AvgPriceByGenre)?;
    let top = projector::top_n_by_variation(table, TOP_VARIATIONS)?;
    let long = projector::melt(&top);
    let grouped = group_numbers(top.name(), top.years(), &long)?;

    let names: Vec<&str> = grouped.iter().map(|(n, _)| n.as_str()).collect();
    let colors = ColorMap::new(&names, &[]);
    let series = grouped
        .iter()
        .map(|(name, points)| YearSeries {
            name: name.clone(),
            color: colors.color_for(name),
            points: points.clone(),
        })
        .collect();
    Ok(LinesView {
        series,
        markers: false,
    })
}

/// Ecosystem revenue stacked by platform group, each group a shade ramp of
/// its base colour.
pub fn build_ecosystem_revenue(registry: &Registry) -> Result<StackedBarsView> {
    let table = registry.table(Section::RevenueByEcosystem)?;
    let years = table.years();
    let mut layers = Vec::new();
    for (_platform, base, categories) in ECOSYSTEM_GROUPS {
        for (i, category) in categories.iter().enumerate() {
            let color = adjust_lightness(base, 1.0 - i as f32 * 0.1);
            layers.push(YearSeries {
                name: category.to_string(),
                color,
                points: zip_years(years, table.numeric_column(category)?),
            });
        }
    }
    Ok(StackedBarsView { layers })
}

/// Market share of every genre in the selected year.
pub fn build_market_share(registry: &Registry, year: i32) -> Result<BarsView> {
    let table = registry.table(Section::MarketShareByGenre)?;
    let row = projector::slice(table, year)?;
    let names: Vec<&str> = row
        .entries
        .iter()
        .map(|(n, _)| n.as_str())
        .filter(|n| *n != TOTAL_COLUMN)
        .collect();
    let colors = ColorMap::new(&names, &SET2);
    let bars = names
        .iter()
        .map(|name| {
            let value = row
                .get(name)
                .and_then(Value::as_f64)
                .ok_or_else(|| DataError::non_numeric(table.name(), *name))?;
            Ok((name.to_string(), value, colors.color_for(name)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BarsView { year, bars })
}

/// Units sold per PEGI rating in the selected year, as pie wedges.
pub fn build_pegi_distribution(registry: &Registry, year: i32) -> Result<PieView> {
    let table = registry.table(Section::UnitsByPegi)?;
    let row = projector::slice(table, year)?;
    let percentages = projector::normalize_to_percentage(table)?;
    let shares = percentages
        .row(year)
        .ok_or_else(|| DataError::year_not_found(percentages.name(), year))?;

    let names = percentages.column_names();
    let colors = ColorMap::new(&names, &CATEGORY20C);

    let mut angle = 0.0;
    let wedges = names
        .iter()
        .zip(shares)
        .map(|(label, share)| {
            let value = row.get(label).and_then(Value::as_f64).unwrap_or(0.0);
            let sweep = share.value().map_or(0.0, |pct| pct / 100.0 * TAU);
            let wedge = Wedge {
                label: label.to_string(),
                value,
                share: *share,
                color: colors.color_for(label),
                start_angle: angle,
                end_angle: angle + sweep,
            };
            angle += sweep;
            wedge
        })
        .collect();
    Ok(PieView { year, wedges })
}

/// Revenue divided by units sold, per PEGI rating and year.
pub fn build_profit_per_unit(registry: &Registry) -> Result<LinesView> {
    let sales = registry.table(Section::SalesByPegi)?;
    let units = registry.table(Section::UnitsByPegi)?;
    let profit = projector::ratio(sales, units)?;
    let long = projector::melt(&profit);

    let grouped = group_by_variable(&long, |r: &Ratio| r.value());
    let names: Vec<&str> = grouped.iter().map(|(n, _)| n.as_str()).collect();
    let colors = ColorMap::new(&names, &CATEGORY20C);
    let series = grouped
        .iter()
        .map(|(name, points)| YearSeries {
            name: name.clone(),
            color: colors.color_for(name),
            points: points.clone(),
        })
        .collect();
    Ok(LinesView {
        series,
        markers: true,
    })
}

/// Every chart of the dashboard with its view or the error that prevented it.
pub fn build_all(registry: &Registry, year: Option<i32>) -> Vec<(ChartSpec, Result<ChartView>)> {
    vec![
        (
            REVENUE_OVERVIEW,
            build_revenue_overview(registry).map(ChartView::Area),
        ),
        (
            GENRE_REVENUE,
            build_genre_revenue(registry).map(ChartView::StackedBars),
        ),
        (
            PRICE_VARIATIONS,
            build_price_variations(registry).map(ChartView::Lines),
        ),
        (
            ECOSYSTEM_REVENUE,
            build_ecosystem_revenue(registry).map(ChartView::StackedBars),
        ),
        (
            PEGI_DISTRIBUTION,
            for_year(registry, year, |r, y| {
                build_pegi_distribution(r, y).map(ChartView::Pie)
            }),
        ),
        (
            MARKET_SHARE,
            for_year(registry, year, |r, y| {
                build_market_share(r, y).map(ChartView::Bars)
            }),
        ),
        (
            PROFIT_PER_UNIT,
            build_profit_per_unit(registry).map(ChartView::Lines),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn for_year(
    registry: &Registry,
    year: Option<i32>,
    build: fn(&Registry, i32) -> Result<ChartView>,
) -> Result<ChartView> {
    match year {
        Some(y) => build(registry, y),
        None => Err(DataError::NoYearRange),
    }
}

fn zip_years(years: &[i32], values: Vec<f64>) -> Vec<(i32, Option<f64>)> {
    years.iter().copied().zip(values.into_iter().map(Some)).collect()
}

/// Group long records by variable (first-appearance order), converting each
/// value with `f`.
fn group_by_variable<C>(
    records: &[LongRecord<C>],
    f: impl Fn(&C) -> Option<f64>,
) -> Vec<(String, Vec<(i32, Option<f64>)>)> {
    let mut groups: Vec<(String, Vec<(i32, Option<f64>)>)> = Vec::new();
    for rec in records {
        let point = (rec.id, f(&rec.value));
        match groups.iter_mut().find(|(name, _)| *name == rec.variable) {
            Some((_, points)) => points.push(point),
            None => groups.push((rec.variable.clone(), vec![point])),
        }
    }
    groups
}

/// Like [`group_by_variable`] for plain cells, failing on text values.
fn group_numbers(
    table: &str,
    years: &[i32],
    records: &[LongRecord<Value>],
) -> Result<Vec<(String, Vec<(i32, Option<f64>)>)>> {
    if let Some(bad) = records.iter().find(|r| r.value.as_f64().is_none()) {
        return Err(DataError::non_numeric(table, bad.variable.as_str()));
    }
    let grouped = group_by_variable(records, Value::as_f64);
    debug_assert!(grouped.iter().all(|(_, pts)| pts.len() == years.len()));
    Ok(grouped)
}
