use std::fmt;
use std::str::FromStr;

use crate::ingest::record::CellValue;

/// Canonical stored form of a rating cell: the source text, trimmed.
///
/// Numbers, letter grades, multi-value lists (`"B-,B+,A,"`) and free text such
/// as `"N/A"` all pass through as written. Interpreting the value is left to
/// whoever displays it (see [`mean_score`] and [`Grade`]).
pub fn normalize_rating(cell: Option<&CellValue>) -> String {
    cell.map(|c| c.as_text().trim().to_string())
        .unwrap_or_default()
}

/// Letter grades shown for flavor ratings, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    D,
    F,
}

impl Grade {
    /// Display order used by pickers and legends.
    pub const ALL: [Grade; 11] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Letter grade for a 0-10 score. Thresholds are exclusive lower bounds.
    /// `None` for NaN, which callers render as a dash.
    pub fn from_score(score: f64) -> Option<Self> {
        if score.is_nan() {
            return None;
        }
        let grade = if score > 9.5 {
            Grade::APlus
        } else if score > 9.0 {
            Grade::A
        } else if score > 8.5 {
            Grade::AMinus
        } else if score > 8.0 {
            Grade::BPlus
        } else if score > 7.0 {
            Grade::B
        } else if score > 6.5 {
            Grade::BMinus
        } else if score > 6.0 {
            Grade::CPlus
        } else if score > 5.0 {
            Grade::C
        } else if score > 4.0 {
            Grade::CMinus
        } else if score > 2.0 {
            Grade::D
        } else {
            Grade::F
        };
        Some(grade)
    }

    /// Representative 0-10 score for a grade.
    ///
    /// Not the exact inverse of [`Grade::from_score`]: `B-` is shown above 6.5
    /// but maps back to 7.0, `D` above 2.0 but back to 3.0.
    pub fn score(&self) -> f64 {
        match self {
            Grade::APlus => 10.0,
            Grade::A => 9.5,
            Grade::AMinus => 9.0,
            Grade::BPlus => 8.5,
            Grade::B => 8.0,
            Grade::BMinus => 7.0,
            Grade::CPlus => 6.5,
            Grade::C => 6.0,
            Grade::CMinus => 5.0,
            Grade::D => 3.0,
            Grade::F => 0.0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGrade(pub String);

impl fmt::Display for UnknownGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown grade {:?}", self.0)
    }
}

impl std::error::Error for UnknownGrade {}

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Grade::ALL
            .into_iter()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| UnknownGrade(s.to_string()))
    }
}

/// Collapse a raw rating cell into one 0-10 score for display.
///
/// Fragments are split on `,` `;` `|`. Numeric fragments are averaged when any
/// exist; otherwise recognised grades are averaged through [`Grade::score`].
pub fn mean_score(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw
        .split([',', ';', '|'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let numbers: Vec<f64> = parts
        .iter()
        .filter_map(|p| p.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect();
    if !numbers.is_empty() {
        return Some(average(&numbers));
    }

    let grades: Vec<f64> = parts
        .iter()
        .filter_map(|p| p.parse::<Grade>().ok())
        .map(|g| g.score())
        .collect();
    (!grades.is_empty()).then(|| average(&grades))
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
