/// Public path under which fountain photos are served.
pub const IMAGE_BASE: &str = "/fountains/";

/// Split an image cell on `,` `;` `|` into absolute paths or URLs.
///
/// Bare filenames are placed under [`IMAGE_BASE`]; entries that already start
/// with `http://`, `https://` or `/` are kept verbatim. Order is preserved.
pub fn normalize_images(cell: &str) -> Vec<String> {
    cell.split([',', ';', '|'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with("http://") || p.starts_with("https://") || p.starts_with('/') {
                p.to_string()
            } else {
                format!("{IMAGE_BASE}{}", p.trim_start_matches('/'))
            }
        })
        .collect()
}

/// Normalize each cell independently and concatenate in the given order.
pub fn normalize_image_cells<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    cells.into_iter().flat_map(normalize_images).collect()
}
