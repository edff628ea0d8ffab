//! Assessment result types.
//!
//! Represents the outcome of classifying a [`ClinicalInput`](super::ClinicalInput):
//! the predicted label, its confidence, and the factors shown alongside it.

use serde::{Deserialize, Serialize};

/// Binary cardiovascular risk label predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    /// Class 0
    LowRisk,
    /// Class 1
    HighRisk,
}

impl RiskLabel {
    /// Map a classifier class index to a label.
    #[must_use]
    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(Self::LowRisk),
            1 => Some(Self::HighRisk),
            _ => None,
        }
    }

    /// Class index in the classifier's probability vector.
    #[must_use]
    pub fn class_index(self) -> usize {
        match self {
            Self::LowRisk => 0,
            Self::HighRisk => 1,
        }
    }

    #[must_use]
    pub fn headline(self) -> &'static str {
        match self {
            Self::LowRisk => "Low Cardiovascular Risk",
            Self::HighRisk => "Elevated Cardiovascular Risk",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::LowRisk => "No significant risk factors detected",
            Self::HighRisk => "High probability of cardiovascular disease",
        }
    }

    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::LowRisk => {
                "Health Maintenance: Continue preventive care. Annual screenings recommended."
            }
            Self::HighRisk => {
                "Clinical Recommendation: Consult a cardiologist immediately. \
                 Consider lifestyle modifications and diagnostic testing."
            }
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowRisk => write!(f, "LOW"),
            Self::HighRisk => write!(f, "HIGH"),
        }
    }
}

/// A contributing factor listed with an assessment.
///
/// The first four are risk factors (high-risk path), the last three are
/// protective factors (low-risk path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    #[serde(rename = "Age ≥45")]
    Age,
    #[serde(rename = "BMI ≥30")]
    Obesity,
    #[serde(rename = "Hypertension")]
    Hypertension,
    #[serde(rename = "Tobacco use")]
    TobaccoUse,
    #[serde(rename = "Physical activity")]
    PhysicalActivity,
    #[serde(rename = "Non-smoker")]
    NonSmoker,
    #[serde(rename = "Healthy weight")]
    HealthyWeight,
}

impl Factor {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "Age ≥45",
            Self::Obesity => "BMI ≥30",
            Self::Hypertension => "Hypertension",
            Self::TobaccoUse => "Tobacco use",
            Self::PhysicalActivity => "Physical activity",
            Self::NonSmoker => "Non-smoker",
            Self::HealthyWeight => "Healthy weight",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// BMI band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiStatus {
    Normal,
    Overweight,
    Obese,
}

impl BmiStatus {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi >= 30.0 {
            Self::Obese
        } else if bmi >= 25.0 {
            Self::Overweight
        } else {
            Self::Normal
        }
    }
}

impl std::fmt::Display for BmiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Blood pressure band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BpStatus {
    Normal,
    Hypertensive,
}

impl std::fmt::Display for BpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Hypertensive => write!(f, "Hypertensive"),
        }
    }
}

/// Two-level indicator used for age and lifestyle risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indicator {
    Normal,
    /// Lifestyle only: non-smoker, no alcohol, physically active
    Optimal,
    Elevated,
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Optimal => write!(f, "Optimal"),
            Self::Elevated => write!(f, "Elevated"),
        }
    }
}

/// Derived health metrics shown next to the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub bmi: f64,
    pub bmi_status: BmiStatus,
    pub systolic: u32,
    pub diastolic: u32,
    pub bp_status: BpStatus,
    pub age_risk: Indicator,
    pub lifestyle_risk: Indicator,
}

/// Classifier output for a single feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,

    /// Probability the classifier assigns to `label` (0.0 to 1.0)
    pub confidence: f64,

    /// Full class distribution as returned by the classifier
    pub probabilities: Vec<f64>,
}

/// Complete assessment for one request. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub label: RiskLabel,

    /// Probability of the predicted label (0.0 to 1.0)
    pub confidence: f64,

    /// Factors for the predicted label's path, in display order
    pub factors: Vec<Factor>,

    pub metrics: HealthMetrics,
}

impl Assessment {
    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.metrics.bmi
    }

    #[must_use]
    pub fn bmi_status(&self) -> BmiStatus {
        self.metrics.bmi_status
    }

    #[must_use]
    pub fn bp_status(&self) -> BpStatus {
        self.metrics.bp_status
    }

    /// Factor labels in display order.
    #[must_use]
    pub fn factor_labels(&self) -> Vec<&'static str> {
        self.factors.iter().map(|f| f.label()).collect()
    }
}
