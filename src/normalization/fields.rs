use crate::ingest::record::{CellValue, RawRecord};

// Accepted source headers per canonical field, in precedence order. Spreadsheet
// exports have used every one of these spellings at some point.
pub const FLOOR_HEADERS: &[&str] = &["Floor", "floor"];
pub const NUMBER_HEADERS: &[&str] = &[
    "Fountain Number",
    "number",
    "Fountain",
    "Fountain #",
    "fountain number",
];
pub const DESCRIPTION_HEADERS: &[&str] = &[
    "Fountain Description/Location",
    "Fountain Description",
    "Location",
    "description",
];
pub const FLAVOR_DESCRIPTION_HEADERS: &[&str] =
    &["Flavor Description", "flavorDescription", "flavordescription"];
pub const FLAVOR_RATING_HEADERS: &[&str] = &["Flavor Rating", "flavorRating", "flavorrating"];
pub const OTHER_HEADERS: &[&str] = &["Other", "Notes"];
pub const VIDEO_HEADERS: &[&str] = &["Video of water", "Video"];
pub const FOUNTAIN_IMAGE_HEADERS: &[&str] = &["Image of Fountain"];
pub const CUP_IMAGE_HEADERS: &[&str] = &["Image of Water in Cup"];

/// First cell satisfying one of `variants`, exact header match first, then
/// case-insensitive. Blank cells never satisfy a variant.
pub fn resolve_cell<'a>(row: &'a RawRecord, variants: &[&str]) -> Option<&'a CellValue> {
    for variant in variants {
        if let Some(cell) = row.get(*variant) {
            if cell.non_blank().is_some() {
                return Some(cell);
            }
        }
    }
    for variant in variants {
        let wanted = variant.to_lowercase();
        let hit = row
            .iter()
            .find(|(header, cell)| header.to_lowercase() == wanted && cell.non_blank().is_some());
        if let Some((_, cell)) = hit {
            return Some(cell);
        }
    }
    None
}

/// Trimmed value of the first matching variant, or an empty string.
pub fn resolve(row: &RawRecord, variants: &[&str]) -> String {
    resolve_cell(row, variants)
        .and_then(CellValue::non_blank)
        .unwrap_or_default()
}
