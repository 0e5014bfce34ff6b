//! Embedded dataset profiles: file names, column prefixes, grade-code jobs,
//! area-to-item mappings, and chart colours.
//!
//! Each profile is a JSON document compiled into the binary:
//! ```json
//! {
//!   "kind": "numeracy",
//!   "label": "numeracy",
//!   "grade_column": "학년",
//!   "output_dir": "figure/numeracy",
//!   "violin_points": 200,
//!   "box_fill": true,
//!   "area_colors": [{ "area": "number & operations", "hex": "#4C78A8" }],
//!   "generations": [{
//!     "year": 2023, "input": "raw_2023.xlsx", "prefix": "sm",
//!     "jobs": [{ "grade": 8, "code": 2 }],
//!     "mapping": [{ "code": 2, "areas": [{ "name": "number & operations", "items": [1, 5] }] }]
//!   }]
//! }
//! ```

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const NUMERACY_JSON: &str = include_str!("../config/numeracy.json");
const LITERACY_JSON: &str = include_str!("../config/literacy.json");

/// Fill colour for any area missing from a profile's colour table.
pub const FALLBACK_RGB: (u8, u8, u8) = (0x77, 0x77, 0x77);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Numeracy,
    Literacy,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Numeracy => f.write_str("numeracy"),
            DatasetKind::Literacy => f.write_str("literacy"),
        }
    }
}

/// One rendering job: the grade shown to readers and the code stored in the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub grade: u8,
    pub code: i64,
}

/// Items belonging to one curriculum area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaItems {
    pub name: String,
    pub items: Vec<u32>,
}

/// Areas defined for a single grade code, in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeMapping {
    pub code: i64,
    pub areas: Vec<AreaItems>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaColor {
    pub area: String,
    pub hex: String,
}

/// A single dataset generation (one assessment year) with its own naming conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub year: u16,
    pub input: String,
    pub prefix: String,
    pub jobs: Vec<Job>,
    pub mapping: Vec<GradeMapping>,
}

impl Generation {
    /// Returns the areas mapped for `code`, if the code is configured.
    pub fn areas_for(&self, code: i64) -> Option<&[AreaItems]> {
        self.mapping
            .iter()
            .find(|m| m.code == code)
            .map(|m| m.areas.as_slice())
    }
}

/// Full profile for one dataset type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub kind: DatasetKind,
    pub label: String,
    pub grade_column: String,
    pub output_dir: String,
    pub violin_points: usize,
    /// White-filled box plots; otherwise only the box outline is drawn.
    #[serde(default)]
    pub box_fill: bool,
    pub area_colors: Vec<AreaColor>,
    pub generations: Vec<Generation>,
}

impl DatasetConfig {
    /// Parses and validates a profile from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: DatasetConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the compiled-in profile for `kind`.
    pub fn builtin(kind: DatasetKind) -> Result<Self> {
        match kind {
            DatasetKind::Numeracy => Self::from_json(NUMERACY_JSON),
            DatasetKind::Literacy => Self::from_json(LITERACY_JSON),
        }
    }

    /// Checks the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Fails on repeated item numbers inside an area, a job whose code has no
    /// mapping entry, or a colour that is not `#RRGGBB`.
    pub fn validate(&self) -> Result<()> {
        if self.violin_points < 2 {
            bail!("{}: violin_points must be at least 2", self.kind);
        }

        for entry in &self.area_colors {
            parse_hex(&entry.hex)?;
        }

        for generation in &self.generations {
            for mapping in &generation.mapping {
                for area in &mapping.areas {
                    let mut seen = HashSet::new();
                    for item in &area.items {
                        if !seen.insert(*item) {
                            bail!(
                                "{} {}: item {} listed twice in area '{}' (code {})",
                                self.kind,
                                generation.year,
                                item,
                                area.name,
                                mapping.code
                            );
                        }
                    }
                }
            }

            for job in &generation.jobs {
                if generation.areas_for(job.code).is_none() {
                    bail!(
                        "{} {}: job for grade {} uses code {} with no area mapping",
                        self.kind,
                        generation.year,
                        job.grade,
                        job.code
                    );
                }
            }
        }

        Ok(())
    }

    /// Fill colour for `area`, falling back to neutral gray.
    pub fn area_rgb(&self, area: &str) -> (u8, u8, u8) {
        self.area_colors
            .iter()
            .find(|c| c.area == area)
            .and_then(|c| parse_hex(&c.hex).ok())
            .unwrap_or(FALLBACK_RGB)
    }

    /// Chart title embedding the year, the dataset label and the displayed grade.
    pub fn title(&self, year: u16, grade: u8) -> String {
        format!("{year} {} accuracy distribution by area (grade {grade})", self.label)
    }
}

/// Parses a `#RRGGBB` colour.
pub fn parse_hex(hex: &str) -> Result<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        bail!("invalid colour '{hex}', expected #RRGGBB");
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => Ok((r, g, b)),
        _ => bail!("invalid colour '{hex}', expected #RRGGBB"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_validate() {
        let numeracy = DatasetConfig::builtin(DatasetKind::Numeracy).unwrap();
        let literacy = DatasetConfig::builtin(DatasetKind::Literacy).unwrap();

        assert_eq!(numeracy.kind, DatasetKind::Numeracy);
        assert_eq!(literacy.kind, DatasetKind::Literacy);
        assert_eq!(numeracy.generations.len(), 2);
        assert_eq!(literacy.generations.len(), 2);
    }

    #[test]
    fn test_grade_code_translation_is_literal() {
        let numeracy = DatasetConfig::builtin(DatasetKind::Numeracy).unwrap();
        let early = &numeracy.generations[0];
        let late = &numeracy.generations[1];

        let codes = |g: &Generation| g.jobs.iter().map(|j| (j.grade, j.code)).collect::<Vec<_>>();
        assert_eq!(codes(early), vec![(4, 4), (6, 6), (8, 2), (10, 1)]);
        assert_eq!(codes(late), vec![(4, 4), (6, 6), (8, 8), (10, 10)]);
        assert_eq!(early.prefix, "sm");
        assert_eq!(late.prefix, "수리력");
    }

    #[test]
    fn test_literacy_prefixes() {
        let literacy = DatasetConfig::builtin(DatasetKind::Literacy).unwrap();
        assert_eq!(literacy.generations[0].prefix, "sk");
        assert_eq!(literacy.generations[1].prefix, "문해력");
        assert!(literacy.generations[0].input.ends_with(".csv"));
    }

    #[test]
    fn test_each_grade_has_four_areas_in_order() {
        let numeracy = DatasetConfig::builtin(DatasetKind::Numeracy).unwrap();
        for generation in &numeracy.generations {
            for job in &generation.jobs {
                let names: Vec<_> = generation
                    .areas_for(job.code)
                    .unwrap()
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect();
                assert_eq!(
                    names,
                    vec![
                        "number & operations",
                        "shape & measurement",
                        "change & relationships",
                        "data & likelihood"
                    ]
                );
            }
        }
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let json = r##"{
            "kind": "numeracy", "label": "numeracy", "grade_column": "g",
            "output_dir": "out", "violin_points": 100, "area_colors": [],
            "generations": [{
                "year": 2023, "input": "a.csv", "prefix": "p",
                "jobs": [{ "grade": 4, "code": 4 }],
                "mapping": [{ "code": 4, "areas": [{ "name": "a", "items": [1, 2, 1] }] }]
            }]
        }"##;
        let err = DatasetConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_job_without_mapping_rejected() {
        let json = r##"{
            "kind": "literacy", "label": "literacy", "grade_column": "g",
            "output_dir": "out", "violin_points": 100, "area_colors": [],
            "generations": [{
                "year": 2024, "input": "a.csv", "prefix": "p",
                "jobs": [{ "grade": 8, "code": 8 }],
                "mapping": [{ "code": 4, "areas": [] }]
            }]
        }"##;
        assert!(DatasetConfig::from_json(json).is_err());
    }

    #[test]
    fn test_area_rgb_fallback() {
        let numeracy = DatasetConfig::builtin(DatasetKind::Numeracy).unwrap();
        assert_eq!(numeracy.area_rgb("number & operations"), (0x4C, 0x78, 0xA8));
        assert_eq!(numeracy.area_rgb("unknown area"), FALLBACK_RGB);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#D9C168").unwrap(), (0xD9, 0xC1, 0x68));
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_title_embeds_year_label_grade() {
        let literacy = DatasetConfig::builtin(DatasetKind::Literacy).unwrap();
        let title = literacy.title(2024, 8);
        assert!(title.contains("2024"));
        assert!(title.contains("literacy"));
        assert!(title.contains("grade 8"));
    }
}
