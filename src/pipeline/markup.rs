//! Markup emission: one `<link>` or `<script>` tag per URL.
//!
//! Tags get ids so a page can address them: the first one carries the base
//! id, later ones `base-1`, `base-2`, ... The base is the caller's `id`
//! property if given, the queue name otherwise.

use crate::asset::AssetKind;
use crate::utils::html::{escape_attr, render_attributes};

const ID: &str = "id";

/// Render tags for `urls`, in order.
///
/// `properties` are extra attributes appended to every tag (an empty value
/// renders as a bare attribute).
pub fn emit(
    kind: AssetKind,
    urls: &[String],
    properties: &[(&str, &str)],
    queue: &str,
) -> Vec<String> {
    let base = properties
        .iter()
        .find(|(key, _)| *key == ID)
        .map_or(queue, |(_, value)| *value);
    let attrs = render_attributes(properties.iter().copied().filter(|(key, _)| *key != ID));

    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            let id = match i {
                0 => base.to_owned(),
                n => format!("{base}-{n}"),
            };
            tag(kind, url, &id, &attrs)
        })
        .collect()
}

fn tag(kind: AssetKind, url: &str, id: &str, attrs: &str) -> String {
    let url = escape_attr(url);
    let id = escape_attr(id);
    match kind {
        AssetKind::Css => format!(
            r#"<link rel="stylesheet" type="text/css" href="{url}" id="{id}"{attrs}>"#
        ),
        AssetKind::Js => format!(
            r#"<script type="text/javascript" src="{url}" id="{id}"{attrs}></script>"#
        ),
    }
}
