use egui::Color32;

use crate::error::{Field, Result};
use crate::input::{parse_positive, require};

/// Upper weight bound drawn for the obese band.
pub const OBESE_CEILING_KG: f64 = 300.0;

/// Standard BMI categories used for the chart bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const ALL: [BmiCategory; 4] = [
        BmiCategory::Underweight,
        BmiCategory::Normal,
        BmiCategory::Overweight,
        BmiCategory::Obese,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Opaque band colour as `(r, g, b)`.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            BmiCategory::Underweight => (0xAE, 0xDB, 0x09),
            BmiCategory::Normal => (0x00, 0x80, 0x00),
            BmiCategory::Overweight => (0xDC, 0x9B, 0x08),
            BmiCategory::Obese => (0xFF, 0x00, 0x00),
        }
    }

    /// Band fill at 40% opacity.
    pub fn fill(self) -> Color32 {
        let (r, g, b) = self.rgb();
        Color32::from_rgba_unmultiplied(r, g, b, 102)
    }

    /// Classify a BMI into the half-open range `[lower, upper)` it falls in.
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 24.9 {
            BmiCategory::Normal
        } else if bmi < 29.9 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

/// A BMI together with the height it was computed for.
///
/// Kept only for the running session; plot requests take it explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiProfile {
    pub bmi: f64,
    pub height_cm: f64,
}

impl BmiProfile {
    pub fn category(&self) -> BmiCategory {
        BmiCategory::classify(self.bmi)
    }

    pub fn boundaries(&self) -> RangeBoundaries {
        compute_boundaries(self.height_cm)
    }

    /// Legend text for the weight line, e.g. `Weight (BMI: 22.86)`.
    pub fn series_label(&self) -> String {
        format!("Weight (BMI: {:.2})", self.bmi)
    }
}

/// Weight thresholds in kilograms separating the BMI categories at one height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBoundaries {
    pub underweight: f64,
    pub normal: f64,
    pub overweight: f64,
    pub obese_ceiling: f64,
}

impl RangeBoundaries {
    /// `(lower, upper)` weight bounds of the band for `category`.
    pub fn band(&self, category: BmiCategory) -> (f64, f64) {
        match category {
            BmiCategory::Underweight => (0.0, self.underweight),
            BmiCategory::Normal => (self.underweight, self.normal),
            BmiCategory::Overweight => (self.normal, self.overweight),
            BmiCategory::Obese => (self.overweight, self.obese_ceiling),
        }
    }
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let m = height_cm / 100.0;
    weight_kg / (m * m)
}

/// Validate the weight and height fields and compute the BMI.
pub fn compute_bmi(weight_text: &str, height_text: &str) -> Result<BmiProfile> {
    let weight_text = require(weight_text, Field::Weight)?;
    let height_text = require(height_text, Field::Height)?;
    let weight = parse_positive(weight_text, Field::Weight)?;
    let height_cm = parse_positive(height_text, Field::Height)?;
    let profile = BmiProfile {
        bmi: bmi(weight, height_cm),
        height_cm,
    };
    log::info!(
        "BMI {:.2} ({}) for {weight} kg at {height_cm} cm",
        profile.bmi,
        profile.category().label()
    );
    Ok(profile)
}

pub fn compute_boundaries(height_cm: f64) -> RangeBoundaries {
    let m2 = (height_cm / 100.0).powi(2);
    RangeBoundaries {
        underweight: 18.5 * m2,
        normal: 24.9 * m2,
        overweight: 29.9 * m2,
        obese_ceiling: OBESE_CEILING_KG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;

    #[test]
    fn bmi_for_70kg_175cm() {
        let p = compute_bmi("70", "175").unwrap();
        assert!((p.bmi - 70.0 / 1.75_f64.powi(2)).abs() < 1e-9);
        assert_eq!(format!("{:.2}", p.bmi), "22.86");
        assert_eq!(p.height_cm, 175.0);
        assert_eq!(p.series_label(), "Weight (BMI: 22.86)");
        assert_eq!(p.category(), BmiCategory::Normal);
    }

    #[test]
    fn boundaries_for_175cm() {
        let b = compute_boundaries(175.0);
        assert!((b.underweight - 56.656_25).abs() < 1e-6);
        assert!((b.normal - 76.256_25).abs() < 1e-6);
        assert!((b.overweight - 91.568_75).abs() < 1e-6);
        assert_eq!(b.obese_ceiling, 300.0);
        assert_eq!(b.band(BmiCategory::Underweight), (0.0, b.underweight));
        assert_eq!(b.band(BmiCategory::Obese), (b.overweight, 300.0));
    }

    #[test]
    fn classify_uses_half_open_ranges() {
        assert_eq!(BmiCategory::classify(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::classify(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::classify(24.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::classify(29.9), BmiCategory::Obese);
    }

    #[test]
    fn compute_bmi_validates_fields() {
        assert!(matches!(
            compute_bmi("70", ""),
            Err(TrackerError::MissingField(Field::Height))
        ));
        assert!(matches!(
            compute_bmi("", "175"),
            Err(TrackerError::MissingField(Field::Weight))
        ));
        assert!(matches!(
            compute_bmi("70", "tall"),
            Err(TrackerError::InvalidNumber {
                field: Field::Height,
                ..
            })
        ));
        assert!(matches!(
            compute_bmi("70", "0"),
            Err(TrackerError::InvalidNumber { .. })
        ));
    }
}
