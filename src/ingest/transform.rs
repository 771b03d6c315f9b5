use crate::normalization::fields::{
    resolve, resolve_cell, CUP_IMAGE_HEADERS, DESCRIPTION_HEADERS, FLAVOR_DESCRIPTION_HEADERS,
    FLAVOR_RATING_HEADERS, FLOOR_HEADERS, FOUNTAIN_IMAGE_HEADERS, NUMBER_HEADERS, OTHER_HEADERS,
    VIDEO_HEADERS,
};
use crate::normalization::images::normalize_image_cells;
use crate::normalization::rating::normalize_rating;

use super::record::{FountainRecord, RawRecord};

/// Prefix of numbers generated for rows that have a location but no number.
pub const AUTO_NUMBER_PREFIX: &str = "AUTO-";

/// Running counter for synthesized fountain numbers, scoped to one import run.
///
/// Starts at 1 and advances only when a number is actually synthesized, so the
/// sequence follows row order of the parsed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoNumber {
    next: u64,
}

impl Default for AutoNumber {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl AutoNumber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }

    fn take(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("{AUTO_NUMBER_PREFIX}{n}")
    }
}

/// Turn one raw row into a fountain record.
///
/// Returns `None` when the row has neither a number nor a location; spreadsheet
/// exports carry such noise rows (titles, totals, stray notes).
pub fn transform(row: &RawRecord, numbers: &mut AutoNumber) -> Option<FountainRecord> {
    let floor = resolve(row, FLOOR_HEADERS);
    let description = resolve(row, DESCRIPTION_HEADERS);
    let location = [floor.as_str(), description.as_str()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" - ");

    let mut number = resolve(row, NUMBER_HEADERS);
    if number.is_empty() {
        if location.is_empty() {
            return None;
        }
        number = numbers.take();
    }

    let fountain_image = resolve(row, FOUNTAIN_IMAGE_HEADERS);
    let cup_image = resolve(row, CUP_IMAGE_HEADERS);

    Some(FountainRecord {
        number,
        location,
        description,
        flavor_description: resolve(row, FLAVOR_DESCRIPTION_HEADERS),
        flavor_rating: normalize_rating(resolve_cell(row, FLAVOR_RATING_HEADERS)),
        images: normalize_image_cells([fountain_image.as_str(), cup_image.as_str()]),
        other: resolve(row, OTHER_HEADERS),
        video: resolve(row, VIDEO_HEADERS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::record::CellValue;

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    #[test]
    fn composes_location_and_synthesizes_numbers_in_row_order() {
        let mut numbers = AutoNumber::new();
        let rows = [
            row(&[("Floor", "2B"), ("Fountain Description/Location", "Near elevator")]),
            row(&[("Fountain Number", "#9"), ("Location", "Annex")]),
            row(&[("Location", "Lobby")]),
        ];
        let out: Vec<FountainRecord> = rows
            .iter()
            .filter_map(|r| transform(r, &mut numbers))
            .collect();

        assert_eq!(out[0].number, "AUTO-1");
        assert_eq!(out[0].location, "2B - Near elevator");
        assert_eq!(out[0].description, "Near elevator");
        assert_eq!(out[1].number, "#9");
        assert_eq!(out[1].location, "Annex");
        // the explicit number on row 2 does not consume a counter value
        assert_eq!(out[2].number, "AUTO-2");
        assert_eq!(numbers.issued(), 2);
    }

    #[test]
    fn floor_alone_is_a_location() {
        let mut numbers = AutoNumber::new();
        let rec = transform(&row(&[("floor", "3")]), &mut numbers).unwrap();
        assert_eq!(rec.location, "3");
        assert_eq!(rec.number, "AUTO-1");
    }

    #[test]
    fn number_without_location_is_kept() {
        let mut numbers = AutoNumber::new();
        let rec = transform(&row(&[("Fountain #", "F-7")]), &mut numbers).unwrap();
        assert_eq!(rec.number, "F-7");
        assert_eq!(rec.location, "");
        assert_eq!(numbers.issued(), 0);
    }

    #[test]
    fn noise_rows_are_discarded_without_consuming_numbers() {
        let mut numbers = AutoNumber::new();
        let noise = row(&[("Flavor Rating", "A"), ("Notes", "exported 2024-03-01")]);
        assert!(transform(&noise, &mut numbers).is_none());
        assert!(transform(&RawRecord::new(), &mut numbers).is_none());
        assert_eq!(numbers.issued(), 0);
    }

    #[test]
    fn rating_and_passthrough_fields_are_raw() {
        let mut numbers = AutoNumber::new();
        let rec = transform(
            &row(&[
                ("Fountain", "12"),
                ("flavorrating", " B-,B+,A, "),
                ("Flavor Description", "Crisp"),
                ("Notes", "low pressure"),
                ("Video", "clip.mp4"),
            ]),
            &mut numbers,
        )
        .unwrap();
        assert_eq!(rec.flavor_rating, "B-,B+,A,");
        assert_eq!(rec.flavor_description, "Crisp");
        assert_eq!(rec.other, "low pressure");
        assert_eq!(rec.video, "clip.mp4");
        assert!(rec.images.is_empty());
    }

    #[test]
    fn images_concatenate_fountain_then_cup() {
        let mut numbers = AutoNumber::new();
        let rec = transform(
            &row(&[
                ("Image of Water in Cup", "cup.jpg"),
                ("Location", "Gym"),
                ("Image of Fountain", "https://img.example.com/f.jpg; side.jpg"),
            ]),
            &mut numbers,
        )
        .unwrap();
        assert_eq!(
            rec.images,
            vec![
                "https://img.example.com/f.jpg",
                "/fountains/side.jpg",
                "/fountains/cup.jpg",
            ]
        );
    }
}
