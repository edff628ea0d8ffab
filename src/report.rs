//! Plain-text rendering of an [`Assessment`].

use std::fmt;

use crate::domain::{Assessment, RiskLabel};

/// Plain-text view of an assessment: risk message, factor list, confidence
/// and health metrics.
#[derive(Debug, Clone, Copy)]
pub struct TextReport<'a>(pub &'a Assessment);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assessment = self.0;
        let label = assessment.label;

        let (heading, empty) = match label {
            RiskLabel::HighRisk => (
                "Risk Factors Identified:",
                "No significant risk factors identified",
            ),
            RiskLabel::LowRisk => (
                "Protective Factors:",
                "No significant protective factors identified",
            ),
        };

        writeln!(f, "{}", label.headline())?;
        writeln!(f, "Clinical Assessment Prediction: {}", label.description())?;
        writeln!(f)?;

        if assessment.factors.is_empty() {
            writeln!(f, "{empty}")?;
        } else {
            writeln!(f, "{heading}")?;
            for factor in &assessment.factors {
                writeln!(f, "- {factor}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Confidence Level: {:.1}%", assessment.confidence * 100.0)?;
        writeln!(f, "{}", label.recommendation())?;

        let m = &assessment.metrics;
        writeln!(f)?;
        writeln!(f, "Health Metrics")?;
        writeln!(f, "  BMI:             {:.1} ({})", m.bmi, m.bmi_status)?;
        writeln!(
            f,
            "  Blood Pressure:  {}/{} mmHg ({})",
            m.systolic, m.diastolic, m.bp_status
        )?;
        writeln!(f, "  Age Risk:        {}", m.age_risk)?;
        writeln!(f, "  Lifestyle Risk:  {}", m.lifestyle_risk)
    }
}

/// Render the risk message, factor list, confidence and health metrics.
#[must_use]
pub fn render_text(assessment: &Assessment) -> String {
    TextReport(assessment).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BmiStatus, BpStatus, Factor, HealthMetrics, Indicator};

    fn metrics() -> HealthMetrics {
        HealthMetrics {
            bmi: 24.22,
            bmi_status: BmiStatus::Normal,
            systolic: 120,
            diastolic: 80,
            bp_status: BpStatus::Normal,
            age_risk: Indicator::Elevated,
            lifestyle_risk: Indicator::Optimal,
        }
    }

    #[test]
    fn test_render_low_risk() {
        let assessment = Assessment {
            label: RiskLabel::LowRisk,
            confidence: 0.8123,
            factors: vec![Factor::PhysicalActivity, Factor::NonSmoker],
            metrics: metrics(),
        };

        let text = render_text(&assessment);
        assert!(text.starts_with("Low Cardiovascular Risk\n"));
        assert!(text.contains("Protective Factors:\n- Physical activity\n- Non-smoker\n"));
        assert!(text.contains("Confidence Level: 81.2%"));
        assert!(text.contains("BMI:             24.2 (Normal)"));
        assert!(text.contains("120/80 mmHg (Normal)"));
        assert!(text.contains("Lifestyle Risk:  Optimal"));
    }

    #[test]
    fn test_render_high_risk_without_factors() {
        let assessment = Assessment {
            label: RiskLabel::HighRisk,
            confidence: 0.55,
            factors: Vec::new(),
            metrics: metrics(),
        };

        let text = render_text(&assessment);
        assert!(text.starts_with("Elevated Cardiovascular Risk\n"));
        assert!(text.contains("No significant risk factors identified"));
        assert!(!text.contains("Risk Factors Identified:"));
        assert!(text.contains("Consult a cardiologist"));
        assert!(text.ends_with("Lifestyle Risk:  Optimal\n"));
    }

    #[test]
    fn test_text_report_display_matches_render() {
        let assessment = Assessment {
            label: RiskLabel::LowRisk,
            confidence: 0.9,
            factors: vec![Factor::HealthyWeight],
            metrics: metrics(),
        };

        assert_eq!(format!("{}", TextReport(&assessment)), render_text(&assessment));
    }
}
