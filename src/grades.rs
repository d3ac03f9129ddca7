use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const V_GRADES: [&str; 19] = [
    "VB", "V0", "V1", "V2", "V3", "V4", "V5", "V6", "V7", "V8", "V9", "V10", "V11", "V12", "V13",
    "V14", "V15", "V16", "V17",
];

// `1` and `2` have neither a V-scale counterpart nor an ordinal.
pub const FONT_GRADES: [&str; 32] = [
    "1", "2", "3", "4a", "4b", "4c", "5a", "5b", "5c", "6a", "6a+", "6b", "6b+", "6c", "6c+", "7a",
    "7a+", "7b", "7b+", "7c", "7c+", "8a", "8a+", "8b", "8b+", "8c", "8c+", "9a", "9a+", "9b",
    "9b+", "9c",
];

const V_TO_FONT: [(&str, &str); 19] = [
    ("VB", "3"),
    ("V0", "4a"),
    ("V1", "4b"),
    ("V2", "5a"),
    ("V3", "5b"),
    ("V4", "6a"),
    ("V5", "6b"),
    ("V6", "6c"),
    ("V7", "7a"),
    ("V8", "7b"),
    ("V9", "7c"),
    ("V10", "8a"),
    ("V11", "8a+"),
    ("V12", "8b"),
    ("V13", "8b+"),
    ("V14", "8c"),
    ("V15", "8c+"),
    ("V16", "9a"),
    ("V17", "9a+"),
];

// Several Font grades collapse onto one V grade.
const FONT_TO_V: [(&str, &str); 30] = [
    ("3", "VB"),
    ("4a", "V0"),
    ("4b", "V1"),
    ("4c", "V1"),
    ("5a", "V2"),
    ("5b", "V3"),
    ("5c", "V3"),
    ("6a", "V4"),
    ("6a+", "V4"),
    ("6b", "V5"),
    ("6b+", "V5"),
    ("6c", "V6"),
    ("6c+", "V6"),
    ("7a", "V7"),
    ("7a+", "V7"),
    ("7b", "V8"),
    ("7b+", "V8"),
    ("7c", "V9"),
    ("7c+", "V9"),
    ("8a", "V10"),
    ("8a+", "V11"),
    ("8b", "V12"),
    ("8b+", "V13"),
    ("8c", "V14"),
    ("8c+", "V15"),
    ("9a", "V16"),
    ("9a+", "V17"),
    ("9b", "V17"),
    ("9b+", "V17"),
    ("9c", "V17"),
];

const FONT_ORDINALS: [(&str, f64); 30] = [
    ("3", -1.0),
    ("4a", 0.0),
    ("4b", 1.0),
    ("4c", 1.5),
    ("5a", 2.0),
    ("5b", 3.0),
    ("5c", 3.5),
    ("6a", 4.0),
    ("6a+", 4.5),
    ("6b", 5.0),
    ("6b+", 5.5),
    ("6c", 6.0),
    ("6c+", 6.5),
    ("7a", 7.0),
    ("7a+", 7.5),
    ("7b", 8.0),
    ("7b+", 8.5),
    ("7c", 9.0),
    ("7c+", 9.5),
    ("8a", 10.0),
    ("8a+", 11.0),
    ("8b", 12.0),
    ("8b+", 13.0),
    ("8c", 14.0),
    ("8c+", 15.0),
    ("9a", 16.0),
    ("9a+", 17.0),
    ("9b", 17.0),
    ("9b+", 17.0),
    ("9c", 17.0),
];

pub type DifficultyOrdinal = f64;

static CONVERTER: Lazy<GradeConverter> = Lazy::new(GradeConverter::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeScale {
    #[serde(rename = "v-scale")]
    VScale,
    #[serde(rename = "font")]
    FontScale,
}

impl GradeScale {
    pub fn of_label(label: &str) -> Self {
        if label.starts_with('V') {
            GradeScale::VScale
        } else {
            GradeScale::FontScale
        }
    }

    pub fn other(self) -> Self {
        match self {
            GradeScale::VScale => GradeScale::FontScale,
            GradeScale::FontScale => GradeScale::VScale,
        }
    }
}

impl fmt::Display for GradeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeScale::VScale => f.write_str("v-scale"),
            GradeScale::FontScale => f.write_str("font"),
        }
    }
}

impl FromStr for GradeScale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v-scale" | "v" | "vscale" => Ok(GradeScale::VScale),
            "font" | "fontainebleau" | "font-scale" => Ok(GradeScale::FontScale),
            other => Err(format!("unknown grade scale '{other}' (expected v-scale or font)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grade {
    pub scale: GradeScale,
    pub label: String,
}

impl Grade {
    pub fn new(scale: GradeScale, label: impl Into<String>) -> Self {
        Self {
            scale,
            label: label.into(),
        }
    }

    pub fn v(label: impl Into<String>) -> Self {
        Self::new(GradeScale::VScale, label)
    }

    pub fn font(label: impl Into<String>) -> Self {
        Self::new(GradeScale::FontScale, label)
    }

    /// The same grade expressed on the other scale. Unknown labels pass through.
    pub fn counterpart(&self) -> Grade {
        let converter = GradeConverter::global();
        match self.scale {
            GradeScale::VScale => Grade::font(converter.to_font_scale(&self.label)),
            GradeScale::FontScale => Grade::v(converter.to_v_scale(&self.label)),
        }
    }

    pub fn is_recognized(&self) -> bool {
        let converter = GradeConverter::global();
        match self.scale {
            GradeScale::VScale => converter.is_valid_v_grade(&self.label),
            GradeScale::FontScale => converter.is_valid_font_grade(&self.label),
        }
    }

    pub fn difficulty(&self) -> DifficultyOrdinal {
        GradeConverter::global().difficulty_ordinal(&self.label)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Lookup tables between the V-scale and the Font scale.
///
/// Conversions never fail: a label missing from the relevant table is returned
/// unchanged. Use [`GradeConverter::is_valid_v_grade`] and
/// [`GradeConverter::is_valid_font_grade`] to tell a conversion from a
/// pass-through.
#[derive(Debug)]
pub struct GradeConverter {
    v_to_font: HashMap<&'static str, &'static str>,
    font_to_v: HashMap<&'static str, &'static str>,
    font_ordinals: HashMap<&'static str, DifficultyOrdinal>,
}

impl GradeConverter {
    pub fn new() -> Self {
        Self {
            v_to_font: V_TO_FONT.into_iter().collect(),
            font_to_v: FONT_TO_V.into_iter().collect(),
            font_ordinals: FONT_ORDINALS.into_iter().collect(),
        }
    }

    pub fn global() -> &'static GradeConverter {
        &CONVERTER
    }

    pub fn to_font_scale<'a>(&self, v_grade: &'a str) -> &'a str {
        match self.v_to_font.get(v_grade) {
            Some(&font) => font,
            None => {
                debug!(grade = v_grade, "unrecognized V grade, passing through");
                v_grade
            }
        }
    }

    pub fn to_v_scale<'a>(&self, font_grade: &'a str) -> &'a str {
        match self.font_to_v.get(font_grade) {
            Some(&v) => v,
            None => {
                debug!(grade = font_grade, "unrecognized Font grade, passing through");
                font_grade
            }
        }
    }

    pub fn is_valid_v_grade(&self, label: &str) -> bool {
        self.v_to_font.contains_key(label)
    }

    pub fn is_valid_font_grade(&self, label: &str) -> bool {
        self.font_to_v.contains_key(label)
    }

    /// Sorting key for a label of either scale.
    ///
    /// V labels are keyed by their number (`VB` is -1), Font labels by the
    /// ordinal table. Anything else, including `V` labels without a number,
    /// lands on 0.
    pub fn difficulty_ordinal(&self, label: &str) -> DifficultyOrdinal {
        if let Some(number) = label.strip_prefix('V') {
            if number == "B" {
                return -1.0;
            }
            return leading_number(number).unwrap_or(0.0);
        }

        self.font_ordinals.get(label).copied().unwrap_or(0.0)
    }
}

impl Default for GradeConverter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn to_font_scale(v_grade: &str) -> &str {
    GradeConverter::global().to_font_scale(v_grade)
}

pub fn to_v_scale(font_grade: &str) -> &str {
    GradeConverter::global().to_v_scale(font_grade)
}

pub fn is_valid_v_grade(label: &str) -> bool {
    GradeConverter::global().is_valid_v_grade(label)
}

pub fn is_valid_font_grade(label: &str) -> bool {
    GradeConverter::global().is_valid_font_grade(label)
}

pub fn difficulty_ordinal(label: &str) -> DifficultyOrdinal {
    GradeConverter::global().difficulty_ordinal(label)
}

// Lenient integer prefix: "12" -> 12, "5+" -> 5, "-2x" -> -2, "B" -> None.
// Read as f64 so very long digit runs keep their order instead of overflowing.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<f64>().ok().map(|n| sign * n)
}
