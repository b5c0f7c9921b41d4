use crate::catalog::{LabelCatalog, LabelEntry};

/// Maps one label token to a catalog entry: exact code first, then emotion
/// name ignoring case, otherwise the default entry.
pub fn resolve_label<'a>(token: &str, catalog: &'a LabelCatalog) -> &'a LabelEntry {
    lookup(token, catalog).unwrap_or_else(|| catalog.default_entry())
}

/// First token that resolves to a real (non-default) entry wins; when none
/// does, the default entry is used.
pub fn resolve_primary<'a, S: AsRef<str>>(tokens: &[S], catalog: &'a LabelCatalog) -> &'a LabelEntry {
    tokens
        .iter()
        .filter_map(|token| lookup(token.as_ref(), catalog))
        .find(|entry| !catalog.is_default(entry))
        .unwrap_or_else(|| catalog.default_entry())
}

/// Resolved emotion name for every token, deduplicated in order. Never empty.
pub fn resolve_names<S: AsRef<str>>(tokens: &[S], catalog: &LabelCatalog) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(tokens.len().max(1));
    for token in tokens {
        let emotion = &resolve_label(token.as_ref(), catalog).emotion;
        if !names.iter().any(|n| n == emotion) {
            names.push(emotion.clone());
        }
    }
    if names.is_empty() {
        names.push(catalog.default_entry().emotion.clone());
    }
    names
}

fn lookup<'a>(token: &str, catalog: &'a LabelCatalog) -> Option<&'a LabelEntry> {
    catalog
        .by_code(token)
        .or_else(|| catalog.by_name(token))
}
