use std::f64::consts::TAU;

use eframe::egui::{Color32, Pos2, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, PlotUi, Points, Polygon};

use crate::charts::{
    AreaView, BarsView, ChartSpec, ChartView, LinesView, PieView, StackedBarsView, Wedge,
    YearSeries,
};
use crate::data::model::Ratio;
use crate::error::DataError;

const PLOT_HEIGHT: f32 = 320.0;
const BAR_WIDTH: f64 = 0.6;
const PIE_RADIUS: f32 = 130.0;

// ---------------------------------------------------------------------------
// Chart card (central panel)
// ---------------------------------------------------------------------------

/// Render one chart with its title, or the reason it is unavailable.
pub fn chart_card(ui: &mut Ui, spec: &ChartSpec, view: &Result<ChartView, DataError>) {
    ui.heading(spec.title);
    if let Ok(v) = view {
        debug_assert_eq!(v.kind(), spec.kind, "{}", spec.id);
    }
    match view {
        Ok(ChartView::Area(v)) => area_chart(ui, spec, v),
        Ok(ChartView::StackedBars(v)) => stacked_bar_chart(ui, spec, v),
        Ok(ChartView::Lines(v)) => line_chart(ui, spec, v),
        Ok(ChartView::Bars(v)) => bar_chart(ui, spec, v),
        Ok(ChartView::Pie(v)) => pie_chart(ui, v),
        Err(e) => {
            ui.label(RichText::new(format!("Graphique indisponible : {e}")).color(Color32::RED));
        }
    }
    ui.add_space(12.0);
    ui.separator();
}

fn base_plot(spec: &ChartSpec) -> Plot<'_> {
    Plot::new(spec.id)
        .legend(Legend::default())
        .x_axis_label(spec.x_label)
        .y_axis_label(spec.y_label)
        .height(PLOT_HEIGHT)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_zoom(true)
        // Leave wheel scrolling to the surrounding scroll area.
        .allow_scroll(false)
}

// ---------------------------------------------------------------------------
// Stacked area + total line
// ---------------------------------------------------------------------------

fn area_chart(ui: &mut Ui, spec: &ChartSpec, view: &AreaView) {
    let bands = stack(&view.layers);
    base_plot(spec).include_y(0.0).show(ui, |plot_ui| {
        for (layer, (bottoms, tops)) in view.layers.iter().zip(&bands) {
            // Polygons must be convex, so every year interval is its own quad.
            for i in 1..layer.points.len() {
                let (x0, x1) = (layer.points[i - 1].0 as f64, layer.points[i].0 as f64);
                let quad = vec![
                    [x0, bottoms[i - 1]],
                    [x1, bottoms[i]],
                    [x1, tops[i]],
                    [x0, tops[i - 1]],
                ];
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(quad))
                        .name(&layer.name)
                        .fill_color(layer.color.gamma_multiply(0.6))
                        .stroke(Stroke::NONE),
                );
            }
            let edge: Vec<[f64; 2]> = layer
                .points
                .iter()
                .zip(tops)
                .map(|((year, _), top)| [*year as f64, *top])
                .collect();
            plot_ui.line(Line::new(PlotPoints::from(edge)).name(&layer.name).color(layer.color));
        }
        add_series_lines(plot_ui, &view.total, 2.5, false);
    });
}

/// Bottom and top of every layer at every point, stacking from the first
/// layer up. Undefined values stack as zero.
fn stack(layers: &[YearSeries]) -> Vec<(Vec<f64>, Vec<f64>)> {
    let len = layers.first().map_or(0, |l| l.points.len());
    let mut cumulative = vec![0.0; len];
    layers
        .iter()
        .map(|layer| {
            let bottoms = cumulative.clone();
            for (acc, (_, v)) in cumulative.iter_mut().zip(&layer.points) {
                *acc += v.unwrap_or(0.0);
            }
            (bottoms, cumulative.clone())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Stacked bars
// ---------------------------------------------------------------------------

fn stacked_bar_chart(ui: &mut Ui, spec: &ChartSpec, view: &StackedBarsView) {
    let bands = stack(&view.layers);
    let charts: Vec<BarChart> = view
        .layers
        .iter()
        .zip(&bands)
        .map(|(layer, (bottoms, _))| {
            let bars = layer
                .points
                .iter()
                .zip(bottoms)
                .map(|((year, v), base)| {
                    Bar::new(*year as f64, v.unwrap_or(0.0))
                        .base_offset(*base)
                        .width(BAR_WIDTH)
                        .fill(layer.color)
                        .name(format!("{} {year}", layer.name))
                })
                .collect();
            BarChart::new(bars).name(&layer.name).color(layer.color)
        })
        .collect();

    base_plot(spec).show(ui, |plot_ui| {
        // Top layer first so the legend reads like the stack.
        for chart in charts.into_iter().rev() {
            plot_ui.bar_chart(chart);
        }
    });
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

fn line_chart(ui: &mut Ui, spec: &ChartSpec, view: &LinesView) {
    base_plot(spec).show(ui, |plot_ui| {
        for series in &view.series {
            add_series_lines(plot_ui, series, 2.0, view.markers);
        }
    });
}

/// Draw a series as one line per run of defined points.
fn add_series_lines(plot_ui: &mut PlotUi, series: &YearSeries, width: f32, markers: bool) {
    for run in defined_runs(&series.points) {
        plot_ui.line(
            Line::new(PlotPoints::from(run))
                .name(&series.name)
                .color(series.color)
                .width(width),
        );
    }
    if markers {
        let pts: Vec<[f64; 2]> = series
            .points
            .iter()
            .filter_map(|(year, v)| v.map(|v| [*year as f64, v]))
            .collect();
        plot_ui.points(
            Points::new(PlotPoints::from(pts))
                .name(&series.name)
                .color(series.color)
                .radius(3.5),
        );
    }
}

/// Split a series at undefined points into runs of drawable points.
fn defined_runs(points: &[(i32, Option<f64>)]) -> Vec<Vec<[f64; 2]>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (year, v) in points {
        match v {
            Some(v) => current.push([*year as f64, *v]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

// ---------------------------------------------------------------------------
// Bars for one year
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, spec: &ChartSpec, view: &BarsView) {
    ui.label(format!("Année {}", view.year));
    base_plot(spec).include_y(0.0).show(ui, |plot_ui| {
        for (i, (name, value, color)) in view.bars.iter().enumerate() {
            let bar = Bar::new(i as f64, *value).width(BAR_WIDTH).fill(*color).name(name);
            plot_ui.bar_chart(BarChart::new(vec![bar]).name(name).color(*color));
        }
    });
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, view: &PieView) {
    if view.wedges.iter().all(|w| !w.share.is_defined()) {
        ui.label(format!("Aucune donnée pour {}", view.year));
        return;
    }
    ui.label(format!("Année {}", view.year));

    ui.horizontal(|ui: &mut Ui| {
        let size = Vec2::splat(PIE_RADIUS * 2.0 + 8.0);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let center = response.rect.center();

        for wedge in &view.wedges {
            for tri in wedge_triangles(center, PIE_RADIUS, wedge) {
                painter.add(Shape::convex_polygon(tri, wedge.color, Stroke::NONE));
            }
        }
        for wedge in &view.wedges {
            painter.line_segment(
                [center, polar(center, PIE_RADIUS, wedge.start_angle)],
                Stroke::new(1.5, Color32::WHITE),
            );
        }

        let hovered = response
            .hover_pos()
            .map(|pos| pos - center)
            .filter(|d| d.length() <= PIE_RADIUS)
            .and_then(|d| wedge_at(&view.wedges, screen_angle(d)));
        if let Some(wedge) = hovered {
            response.on_hover_text_at_pointer(format!("{} : {}", wedge.label, share_text(wedge.share)));
        }

        ui.vertical(|ui: &mut Ui| {
            ui.strong("PEGI");
            for wedge in &view.wedges {
                ui.horizontal(|ui: &mut Ui| {
                    ui.colored_label(wedge.color, "■");
                    ui.label(format!("{} ({})", wedge.label, share_text(wedge.share)));
                });
            }
        });
    });
}

fn share_text(share: Ratio) -> String {
    match share {
        Ratio::Defined(pct) => format!("{pct:.1}%"),
        Ratio::Undefined => "n/a".to_string(),
    }
}

/// Triangles filling a wedge, each spanning at most a few degrees.
fn wedge_triangles(center: Pos2, radius: f32, wedge: &Wedge) -> Vec<Vec<Pos2>> {
    let sweep = wedge.end_angle - wedge.start_angle;
    if sweep <= 0.0 {
        return Vec::new();
    }
    let steps = ((sweep / TAU) * 90.0).ceil().max(1.0) as usize;
    (0..steps)
        .map(|i| {
            let a0 = wedge.start_angle + sweep * i as f64 / steps as f64;
            let a1 = wedge.start_angle + sweep * (i + 1) as f64 / steps as f64;
            vec![center, polar(center, radius, a0), polar(center, radius, a1)]
        })
        .collect()
}

/// Point at `angle` (counter-clockwise, y up) on a circle in screen space.
fn polar(center: Pos2, radius: f32, angle: f64) -> Pos2 {
    Pos2::new(
        center.x + radius * angle.cos() as f32,
        center.y - radius * angle.sin() as f32,
    )
}

/// Counter-clockwise angle in `[0, TAU)` of a screen-space offset.
fn screen_angle(d: Vec2) -> f64 {
    (-(d.y as f64)).atan2(d.x as f64).rem_euclid(TAU)
}

fn wedge_at(wedges: &[Wedge], angle: f64) -> Option<&Wedge> {
    wedges
        .iter()
        .find(|w| angle >= w.start_angle && angle < w.end_angle)
}
