pub mod fields;
pub mod images;
pub mod rating;
