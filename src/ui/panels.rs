use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::branding::{self, Logo};
use crate::data::model::Tabular;
use crate::data::registry::Section;
use crate::state::AppState;

use super::charts;

const LOGO_SIZE: f32 = 48.0;

// ---------------------------------------------------------------------------
// Left side panel – identity and year selection
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading(branding::TITLE);
    ui.hyperlink_to("🔗 Source CNC", branding::SOURCE_URL);
    ui.separator();

    ui.heading(branding::AUTHOR);
    ui.label(branding::PROMO);
    ui.separator();

    ui.strong("Année");
    match &state.selector {
        Some(sel) => {
            let mut year = sel.year();
            let response = ui.add(egui::Slider::new(&mut year, sel.range()).text("Choisissez une année"));
            if response.changed() {
                state.select_year(year);
            }
        }
        None => {
            ui.label("Aucune plage d'années disponible.");
        }
    }
    ui.separator();

    if let Some(registry) = &state.registry {
        let failures: Vec<(Section, &str)> = registry.failures().collect();
        if !failures.is_empty() {
            egui::CollapsingHeader::new(
                RichText::new(format!("Sections indisponibles ({})", failures.len())).strong(),
            )
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for (section, reason) in failures {
                    ui.label(RichText::new(section.key()).monospace())
                        .on_hover_text(reason);
                }
            });
            ui.separator();
        }
    }

    ui.horizontal(|ui: &mut Ui| {
        for logo in &state.branding.logos {
            logo_button(ui, logo);
        }
    });
}

fn logo_button(ui: &mut Ui, logo: &Logo) {
    let image = egui::Image::from_bytes(
        logo.uri.clone(),
        egui::load::Bytes::Shared(logo.bytes.clone()),
    )
    .fit_to_exact_size(egui::vec2(LOGO_SIZE, LOGO_SIZE));
    if ui.add(egui::ImageButton::new(image)).clicked() {
        ui.ctx().open_url(egui::OpenUrl::new_tab(logo.link));
    }
}

// ---------------------------------------------------------------------------
// Central panel – every chart, top to bottom
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if state.registry.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Ouvrez un fichier de données  (Fichier → Ouvrir…)");
        });
        return;
    }

    ui.heading(
        "Quelles sont les évolutions marquantes du marché du jeu vidéo, \
         où se trouvent les opportunités à venir ?",
    );
    ui.separator();

    let views = state.chart_views();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (spec, view) in &views {
                charts::chart_card(ui, spec, view);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Fichier", |ui: &mut Ui| {
            if ui.button("Ouvrir…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(loader), Some(registry)) = (&state.loader, &state.registry) {
            let years = registry
                .table(Section::RevenueByPlatform)
                .ok()
                .and_then(|t| Some((t.years().first()?, t.years().last()?)));
            let mut text = format!(
                "{} · {}/{} sections",
                loader.path().display(),
                registry.len(),
                Section::ALL.len()
            );
            if let Some((first, last)) = years {
                text.push_str(&format!(", {first}–{last}"));
            }
            ui.label(text);
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Ouvrir un jeu de données")
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}
