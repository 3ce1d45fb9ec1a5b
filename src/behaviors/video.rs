use super::Wiring;
use crate::config::ThemeConfig;
use crate::dom::Page;
use crate::error::Result;
use crate::media;

const CONTENT_REGIONS: &str = ".post-content, .gh-content";

/// Run the fluid media embedder over every content region.
pub fn install(page: &Page, config: &ThemeConfig) -> Result<Wiring> {
    let regions = page.query_all(CONTENT_REGIONS);
    if regions.is_empty() {
        return Ok(Wiring::Skipped("no content regions"));
    }
    let embedder = media::shared(&config.media)?;
    let wrapped: usize = regions.iter().map(|region| embedder.fit(region)).sum();
    log::debug!("[video] wrapped {} embeds in {} regions", wrapped, regions.len());
    Ok(Wiring::Attached)
}
