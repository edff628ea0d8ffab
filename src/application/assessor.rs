//! Risk assessor: Orchestrates classification of a clinical input.
//!
//! This service coordinates:
//! - Feature encoding
//! - Classifier invocation (label + distribution)
//! - Factor explanation
//! - Health metric derivation

use std::sync::Arc;

use crate::domain::{
    Assessment, BmiStatus, BpStatus, ClinicalInput, Factor, FeatureVector, HealthMetrics,
    Indicator, Prediction, RiskLabel,
};
use crate::ports::Classifier;
use crate::CardioriskError;

/// Service producing assessments from an injected classifier.
///
/// The classifier handle is loaded once by the caller and shared read-only;
/// the assessor itself holds no other state.
pub struct RiskAssessor<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
}

impl<C> Clone for RiskAssessor<C>
where
    C: Classifier,
{
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C> RiskAssessor<C>
where
    C: Classifier,
{
    /// Create a new assessor around a loaded classifier.
    pub fn new(classifier: Arc<C>) -> Self {
        Self { classifier }
    }

    /// Encode a clinical input into the classifier's feature layout.
    #[must_use]
    pub fn encode(&self, input: &ClinicalInput) -> FeatureVector {
        input.to_features()
    }

    /// Run the classifier and pick the probability of the predicted class.
    ///
    /// # Errors
    /// Returns `ClassifierInvocation` if the classifier fails or returns a
    /// label or distribution outside the binary contract.
    pub fn classify(&self, features: &FeatureVector) -> Result<Prediction, CardioriskError> {
        let class = self.classifier.predict(features)?;
        let label = RiskLabel::from_class(class).ok_or_else(|| {
            CardioriskError::ClassifierInvocation(format!(
                "Predicted class {class} is not a binary label"
            ))
        })?;

        let probabilities = self.classifier.predict_proba(features)?;
        if probabilities.len() != 2 {
            return Err(CardioriskError::ClassifierInvocation(format!(
                "Expected 2 class probabilities, got {}",
                probabilities.len()
            )));
        }

        let confidence = probabilities[label.class_index()];
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(CardioriskError::ClassifierInvocation(format!(
                "Probability {confidence} for predicted class is outside [0, 1]"
            )));
        }

        Ok(Prediction {
            label,
            confidence,
            probabilities,
        })
    }

    /// Factors for the given label's path, in display order.
    ///
    /// Each rule is an independent predicate on the input; the label only
    /// selects which set of rules is evaluated.
    #[must_use]
    pub fn explain(&self, input: &ClinicalInput, label: RiskLabel) -> Vec<Factor> {
        let bmi = input.bmi();
        let rules = match label {
            RiskLabel::HighRisk => vec![
                (input.age >= 45, Factor::Age),
                (bmi >= 30.0, Factor::Obesity),
                (input.is_hypertensive(), Factor::Hypertension),
                (input.smoker, Factor::TobaccoUse),
            ],
            RiskLabel::LowRisk => vec![
                (input.physically_active, Factor::PhysicalActivity),
                (!input.smoker, Factor::NonSmoker),
                (bmi < 25.0, Factor::HealthyWeight),
            ],
        };

        rules
            .into_iter()
            .filter_map(|(applies, factor)| applies.then_some(factor))
            .collect()
    }

    /// Derived health metrics for display.
    #[must_use]
    pub fn metrics(&self, input: &ClinicalInput) -> HealthMetrics {
        let bmi = input.bmi();
        let lifestyle_elevated =
            input.smoker || input.drinks_alcohol || !input.physically_active;

        HealthMetrics {
            bmi,
            bmi_status: BmiStatus::from_bmi(bmi),
            systolic: input.systolic,
            diastolic: input.diastolic,
            bp_status: if input.is_hypertensive() {
                BpStatus::Hypertensive
            } else {
                BpStatus::Normal
            },
            age_risk: if input.age >= 45 {
                Indicator::Elevated
            } else {
                Indicator::Normal
            },
            lifestyle_risk: if lifestyle_elevated {
                Indicator::Elevated
            } else {
                Indicator::Optimal
            },
        }
    }

    /// Full pipeline: encode, classify, explain, derive metrics.
    ///
    /// # Errors
    /// Returns `ClassifierInvocation` if classification fails. No partial
    /// result is produced.
    pub fn assess(&self, input: &ClinicalInput) -> Result<Assessment, CardioriskError> {
        let features = self.encode(input);
        let prediction = self.classify(&features)?;

        let factors = self.explain(input, prediction.label);
        let metrics = self.metrics(input);

        tracing::debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            factors = factors.len(),
            "Assessment complete"
        );

        Ok(Assessment {
            label: prediction.label,
            confidence: prediction.confidence,
            factors,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{sample_input, Gender, Level};
    use crate::ports::ClassifierError;
    use proptest::prelude::*;

    /// Deterministic stand-in: risk grows with age and systolic pressure.
    struct StubClassifier;

    impl StubClassifier {
        fn positive(features: &FeatureVector) -> f64 {
            let age = features.get("age_years").unwrap_or(0.0);
            let ap_hi = features.get("ap_hi").unwrap_or(0.0);
            let z = 0.08 * (age - 50.0) + 0.04 * (ap_hi - 130.0);
            1.0 / (1.0 + (-z).exp())
        }
    }

    impl Classifier for StubClassifier {
        fn predict(&self, features: &FeatureVector) -> Result<usize, ClassifierError> {
            Ok(usize::from(Self::positive(features) >= 0.5))
        }

        fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
            let p = Self::positive(features);
            Ok(vec![1.0 - p, p])
        }
    }

    /// Returns canned answers regardless of input.
    struct FixedClassifier {
        class: usize,
        proba: Vec<f64>,
    }

    impl Classifier for FixedClassifier {
        fn predict(&self, _: &FeatureVector) -> Result<usize, ClassifierError> {
            Ok(self.class)
        }

        fn predict_proba(&self, _: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
            Ok(self.proba.clone())
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(&self, _: &FeatureVector) -> Result<usize, ClassifierError> {
            Err(ClassifierError::Invocation("model exploded".into()))
        }

        fn predict_proba(&self, _: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
            Err(ClassifierError::Invocation("model exploded".into()))
        }
    }

    fn stub() -> RiskAssessor<StubClassifier> {
        RiskAssessor::new(Arc::new(StubClassifier))
    }

    fn fixed(class: usize, proba: Vec<f64>) -> RiskAssessor<FixedClassifier> {
        RiskAssessor::new(Arc::new(FixedClassifier { class, proba }))
    }

    fn labels(factors: &[Factor]) -> Vec<&'static str> {
        factors.iter().map(|f| f.label()).collect()
    }

    #[test]
    fn test_explain_high_risk_all_factors() {
        // 170 cm, 90 kg => BMI ~31.1
        let input = ClinicalInput {
            age: 50,
            weight_kg: 90.0,
            systolic: 150,
            diastolic: 95,
            smoker: true,
            ..sample_input()
        };

        let factors = stub().explain(&input, RiskLabel::HighRisk);
        assert_eq!(
            labels(&factors),
            vec!["Age ≥45", "BMI ≥30", "Hypertension", "Tobacco use"]
        );
    }

    #[test]
    fn test_explain_high_risk_without_factors() {
        let input = ClinicalInput {
            age: 30,
            systolic: 120,
            diastolic: 80,
            smoker: false,
            ..sample_input()
        };

        let factors = stub().explain(&input, RiskLabel::HighRisk);
        assert!(factors.is_empty());
    }

    #[test]
    fn test_explain_low_risk_all_factors() {
        // 170 cm, 63.6 kg => BMI ~22
        let input = ClinicalInput {
            weight_kg: 63.6,
            physically_active: true,
            smoker: false,
            ..sample_input()
        };

        let factors = stub().explain(&input, RiskLabel::LowRisk);
        assert_eq!(
            labels(&factors),
            vec!["Physical activity", "Non-smoker", "Healthy weight"]
        );
    }

    #[test]
    fn test_explain_low_risk_without_factors() {
        let input = ClinicalInput {
            weight_kg: 90.0,
            physically_active: false,
            smoker: true,
            ..sample_input()
        };

        let factors = stub().explain(&input, RiskLabel::LowRisk);
        assert!(factors.is_empty());
    }

    #[test]
    fn test_explain_ignores_other_path() {
        // Smoker shows up as tobacco use on the high-risk path only.
        let input = ClinicalInput {
            smoker: true,
            ..sample_input()
        };
        let low = stub().explain(&input, RiskLabel::LowRisk);
        assert!(!low.contains(&Factor::TobaccoUse));
        assert!(!low.contains(&Factor::NonSmoker));
    }

    #[test]
    fn test_metrics_normal_bmi() {
        let metrics = stub().metrics(&sample_input());
        assert!((metrics.bmi - 24.22).abs() < 0.01);
        assert_eq!(metrics.bmi_status, BmiStatus::Normal);
        assert_eq!(metrics.bp_status, BpStatus::Normal);
        assert_eq!(metrics.age_risk, Indicator::Elevated);
        assert_eq!(metrics.lifestyle_risk, Indicator::Optimal);
    }

    #[test]
    fn test_metrics_bp_boundary() {
        let normal = ClinicalInput {
            systolic: 139,
            diastolic: 89,
            ..sample_input()
        };
        assert_eq!(stub().metrics(&normal).bp_status, BpStatus::Normal);

        let hypertensive = ClinicalInput {
            systolic: 140,
            ..normal
        };
        assert_eq!(stub().metrics(&hypertensive).bp_status, BpStatus::Hypertensive);
    }

    #[test]
    fn test_metrics_lifestyle_and_age() {
        let input = ClinicalInput {
            age: 30,
            drinks_alcohol: true,
            weight_kg: 80.0,
            ..sample_input()
        };
        let metrics = stub().metrics(&input);
        assert_eq!(metrics.age_risk, Indicator::Normal);
        assert_eq!(metrics.lifestyle_risk, Indicator::Elevated);
        assert_eq!(metrics.bmi_status, BmiStatus::Overweight);
    }

    #[test]
    fn test_classify_selects_predicted_class_probability() {
        let assessor = fixed(0, vec![0.8, 0.2]);
        let prediction = assessor
            .classify(&sample_input().to_features())
            .expect("Should classify");
        assert_eq!(prediction.label, RiskLabel::LowRisk);
        assert!((prediction.confidence - 0.8).abs() < f64::EPSILON);

        // Confidence follows the predicted label even when it is the minority mass.
        let assessor = fixed(1, vec![0.6, 0.4]);
        let prediction = assessor
            .classify(&sample_input().to_features())
            .expect("Should classify");
        assert_eq!(prediction.label, RiskLabel::HighRisk);
        assert!((prediction.confidence - 0.4).abs() < f64::EPSILON);
        assert_eq!(prediction.probabilities, vec![0.6, 0.4]);
    }

    #[test]
    fn test_classify_rejects_contract_violations() {
        let features = sample_input().to_features();

        let err = fixed(2, vec![0.5, 0.5]).classify(&features).unwrap_err();
        assert!(matches!(err, CardioriskError::ClassifierInvocation(_)));

        let err = fixed(1, vec![1.0]).classify(&features).unwrap_err();
        assert!(matches!(err, CardioriskError::ClassifierInvocation(_)));

        let err = fixed(1, vec![-0.5, 1.5]).classify(&features).unwrap_err();
        assert!(matches!(err, CardioriskError::ClassifierInvocation(_)));

        let err = fixed(0, vec![f64::NAN, 0.5]).classify(&features).unwrap_err();
        assert!(matches!(err, CardioriskError::ClassifierInvocation(_)));
    }

    #[test]
    fn test_assess_propagates_classifier_failure() {
        let assessor = RiskAssessor::new(Arc::new(FailingClassifier));
        let err = assessor.assess(&sample_input()).unwrap_err();
        assert!(matches!(err, CardioriskError::ClassifierInvocation(_)));
        assert!(err.to_string().contains("model exploded"));
    }

    #[test]
    fn test_assess_high_risk_pipeline() {
        let assessor = fixed(1, vec![0.27, 0.73]);
        let input = ClinicalInput {
            age: 62,
            weight_kg: 95.0,
            systolic: 160,
            diastolic: 100,
            gender: Gender::Female,
            cholesterol: Level::WellAboveNormal,
            smoker: true,
            ..sample_input()
        };

        let assessment = assessor.assess(&input).expect("Should assess");
        assert_eq!(assessment.label, RiskLabel::HighRisk);
        assert!((assessment.confidence - 0.73).abs() < f64::EPSILON);
        assert_eq!(
            assessment.factor_labels(),
            vec!["Age ≥45", "BMI ≥30", "Hypertension", "Tobacco use"]
        );
        assert_eq!(assessment.bmi_status(), BmiStatus::Obese);
        assert_eq!(assessment.bp_status(), BpStatus::Hypertensive);
    }

    fn clinical_input() -> impl Strategy<Value = ClinicalInput> {
        (
            (20u32..=80, 140.0f64..=210.0, 40.0f64..=150.0),
            (80u32..=200, 50u32..=150),
            (any::<bool>(), 0usize..3, 0usize..3),
            (any::<bool>(), any::<bool>(), any::<bool>()),
        )
            .prop_map(
                |(
                    (age, height_cm, weight_kg),
                    (systolic, diastolic),
                    (male, chol, gluc),
                    (smoker, drinks_alcohol, physically_active),
                )| {
                    let levels = [Level::Normal, Level::AboveNormal, Level::WellAboveNormal];
                    ClinicalInput {
                        age,
                        height_cm,
                        weight_kg,
                        systolic,
                        diastolic,
                        gender: if male { Gender::Male } else { Gender::Female },
                        cholesterol: levels[chol],
                        glucose: levels[gluc],
                        smoker,
                        drinks_alcohol,
                        physically_active,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_confidence_matches_predicted_class(input in clinical_input()) {
            let assessor = RiskAssessor::new(Arc::new(StubClassifier));
            let features = assessor.encode(&input);
            let prediction = assessor.classify(&features).expect("Should classify");

            prop_assert!((0.0..=1.0).contains(&prediction.confidence));
            prop_assert_eq!(
                prediction.confidence,
                prediction.probabilities[prediction.label.class_index()]
            );
        }

        #[test]
        fn prop_assess_is_idempotent(input in clinical_input()) {
            let assessor = RiskAssessor::new(Arc::new(StubClassifier));
            let first = assessor.assess(&input).expect("Should assess");
            let second = assessor.assess(&input).expect("Should assess");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_bmi_matches_formula(input in clinical_input()) {
            let metrics = stub().metrics(&input);
            let expected = input.weight_kg / (input.height_cm / 100.0).powi(2);
            prop_assert!((metrics.bmi - expected).abs() < 1e-9);
        }
    }
}
