mod labels;
mod templates;

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

pub use labels::{LabelCatalog, LabelEntry, Task};
pub use templates::{ReplyTemplates, GENERIC_OPENING};

/// Loads the label catalog and reply templates, preferring explicit files
/// over the embedded English data.
pub fn load(
    catalog_path: Option<&Path>,
    templates_path: Option<&Path>,
) -> Result<(LabelCatalog, ReplyTemplates)> {
    let catalog = match catalog_path {
        Some(path) => LabelCatalog::from_file(path)?,
        None => LabelCatalog::builtin()?,
    };
    let templates = match templates_path {
        Some(path) => ReplyTemplates::from_file(path)?,
        None => ReplyTemplates::builtin()?,
    };

    for emotion in templates.missing_for(&catalog) {
        warn!(emotion, "no reply template, generic opening will be used");
    }
    info!(
        entries = catalog.len(),
        default = catalog.default_entry().emotion.as_str(),
        "label catalog loaded"
    );

    Ok((catalog, templates))
}
