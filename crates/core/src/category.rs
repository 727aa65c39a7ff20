//! Resource category classification for selective purge.
//!
//! Cached URLs are classified by file extension into tiles (images) or
//! code (script/style/markup). A URL matching neither category is left
//! untouched by selective purge commands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification of a cached URL, used only for selective purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    /// Map tile images, e.g. `https://a.tile.opentopomap.org/11/608/736.png`
    Tile,
    /// Application code: scripts, styles, markup.
    Code,
}

/// Extension-to-category table.
///
/// Configurable; the defaults match the extensions the viewer actually
/// caches. Extensions are stored lowercase without the leading dot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMap {
    #[serde(flatten)]
    extensions: BTreeMap<String, ResourceCategory>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        let mut extensions = BTreeMap::new();
        extensions.insert("png".to_string(), ResourceCategory::Tile);
        extensions.insert("jpg".to_string(), ResourceCategory::Tile);
        extensions.insert("js".to_string(), ResourceCategory::Code);
        extensions.insert("css".to_string(), ResourceCategory::Code);
        extensions.insert("html".to_string(), ResourceCategory::Code);
        Self { extensions }
    }
}

impl CategoryMap {
    /// Build a map from explicit extension/category pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, ResourceCategory)>) -> Self {
        Self {
            extensions: pairs
                .into_iter()
                .map(|(ext, cat)| (ext.trim_start_matches('.').to_lowercase(), cat))
                .collect(),
        }
    }

    /// Classify a URL by the extension of its final path segment.
    ///
    /// Query string and fragment are ignored; matching is
    /// case-insensitive. Returns None for unrecognized extensions and
    /// for URLs that fail to parse.
    pub fn classify(&self, url: &str) -> Option<ResourceCategory> {
        let parsed = url::Url::parse(url).ok()?;
        let segment = parsed.path_segments()?.next_back()?;
        let (_, extension) = segment.rsplit_once('.')?;
        self.extensions.get(&extension.to_lowercase()).copied()
    }
}
