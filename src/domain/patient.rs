//! Clinical input types for cardiovascular risk prediction.
//!
//! Collected per request, encoded into the fixed feature layout the
//! classifier was trained on.

use serde::{Deserialize, Serialize};

/// Number of features consumed by the classifier.
pub const FEATURE_COUNT: usize = 11;

/// Feature names in classifier order.
///
/// This order is the contract with the trained model. A model artifact whose
/// `feature_names` differ is refused at load time.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "height",
    "weight",
    "ap_hi",
    "ap_lo",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
    "age_years",
];

/// Biological sex as recorded by the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Encoded value: male = 1, female = 2.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 2.0,
        }
    }
}

/// Ordinal laboratory level used for cholesterol and glucose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Normal,
    AboveNormal,
    WellAboveNormal,
}

impl Level {
    /// Encoded value: 1, 2 or 3.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Normal => 1.0,
            Self::AboveNormal => 2.0,
            Self::WellAboveNormal => 3.0,
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Raw clinical inputs for a single assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    /// Age in years (form domain 20-80)
    pub age: u32,

    /// Height in cm (form domain 140-210)
    pub height_cm: f64,

    /// Weight in kg (form domain 40-150)
    pub weight_kg: f64,

    /// Systolic blood pressure in mmHg (form domain 80-200)
    pub systolic: u32,

    /// Diastolic blood pressure in mmHg (form domain 50-150)
    pub diastolic: u32,

    pub gender: Gender,
    pub cholesterol: Level,
    pub glucose: Level,

    pub smoker: bool,
    pub drinks_alcohol: bool,
    pub physically_active: bool,
}

impl ClinicalInput {
    /// Body mass index: weight_kg / height_m².
    #[must_use]
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }

    /// Systolic ≥ 140 or diastolic ≥ 90.
    #[must_use]
    pub fn is_hypertensive(&self) -> bool {
        self.systolic >= 140 || self.diastolic >= 90
    }

    /// Encode into the classifier's fixed feature layout.
    ///
    /// Performs no validation.
    #[must_use]
    pub fn to_features(&self) -> FeatureVector {
        FeatureVector([
            self.gender.code(),
            self.height_cm,
            self.weight_kg,
            f64::from(self.systolic),
            f64::from(self.diastolic),
            self.cholesterol.code(),
            self.glucose.code(),
            flag(self.smoker),
            flag(self.drinks_alcohol),
            flag(self.physically_active),
            f64::from(self.age),
        ])
    }

    /// Validate that all numeric fields are within the intake form domains.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(20..=80).contains(&self.age) {
            errors.push(format!("Age {} out of range [20, 80]", self.age));
        }
        if !(140.0..=210.0).contains(&self.height_cm) {
            errors.push(format!("Height {} out of range [140, 210]", self.height_cm));
        }
        if !(40.0..=150.0).contains(&self.weight_kg) {
            errors.push(format!("Weight {} out of range [40, 150]", self.weight_kg));
        }
        if !(80..=200).contains(&self.systolic) {
            errors.push(format!(
                "Systolic BP {} out of range [80, 200]",
                self.systolic
            ));
        }
        if !(50..=150).contains(&self.diastolic) {
            errors.push(format!(
                "Diastolic BP {} out of range [50, 150]",
                self.diastolic
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Fixed-order numeric encoding of a [`ClinicalInput`].
///
/// Layout follows [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Look up a feature by its name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    /// Iterate `(name, value)` pairs in classifier order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[cfg(test)]
pub(crate) fn sample_input() -> ClinicalInput {
    ClinicalInput {
        age: 50,
        height_cm: 170.0,
        weight_kg: 70.0,
        systolic: 120,
        diastolic: 80,
        gender: Gender::Male,
        cholesterol: Level::Normal,
        glucose: Level::Normal,
        smoker: false,
        drinks_alcohol: false,
        physically_active: true,
    }
}
