use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

/// Sidebar title.
pub const TITLE: &str = "#datavz2023efrei";

/// Where the dataset comes from.
pub const SOURCE_URL: &str = "https://www.data.gouv.fr/fr/datasets/marche-du-jeu-video/";

/// Author block shown under the source link.
pub const AUTHOR: &str = "SANJIVY Dorian";
pub const PROMO: &str = "Promo 2025 - BI2";

/// Logo files looked up in the assets directory, with the page they open.
const LOGOS: [(&str, &str); 2] = [
    ("linkedin-logo.png", "https://www.linkedin.com/in/dorian-sanjivy/"),
    ("github-logo.png", "https://github.com/DorianSanjivy"),
];

/// An image kept in memory and handed to egui as a `bytes://` source.
#[derive(Debug, Clone)]
pub struct Logo {
    pub uri: String,
    pub bytes: Arc<[u8]>,
    pub link: &'static str,
}

/// Sidebar identity, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct Branding {
    pub logos: Vec<Logo>,
}

impl Branding {
    /// Read every logo found in `assets_dir`. Missing or unreadable images
    /// are logged and left out.
    pub fn load(assets_dir: &Path) -> Self {
        let logos = LOGOS
            .into_iter()
            .filter_map(|(file, link)| match read_logo(&assets_dir.join(file)) {
                Ok(bytes) => Some(Logo {
                    uri: format!("bytes://{file}"),
                    bytes: bytes.into(),
                    link,
                }),
                Err(e) => {
                    log::warn!("Logo skipped: {e:#}");
                    None
                }
            })
            .collect();
        Branding { logos }
    }
}

fn read_logo(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let format = image::guess_format(&bytes)
        .with_context(|| format!("{} is not a known image format", path.display()))?;
    log::debug!("Loaded logo {} ({format:?}, {} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
