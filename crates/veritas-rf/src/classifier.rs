//! Confidence-scored verdicts over a named label vocabulary.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::RfError;
use crate::forest::RandomForest;

/// Names for the class indices a forest predicts, indexed by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    names: Vec<String>,
}

impl LabelVocabulary {
    /// Build a vocabulary where `names[i]` names label `i`.
    #[must_use]
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The image-forensics vocabulary: Original, Tampered, AI-generated.
    #[must_use]
    pub fn forensic() -> Self {
        Self::new(["Original", "Tampered", "AI-generated"])
    }

    /// Name of `label`, if the vocabulary covers it.
    #[must_use]
    pub fn name(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// Number of named labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no label is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in label order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::forensic()
    }
}

/// Vote count and confidence for one vocabulary label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    /// Class index.
    pub label: usize,
    /// Vocabulary name of the class.
    pub name: String,
    /// Trees that voted for this class.
    pub votes: usize,
    /// `votes / n_trees * 100`.
    pub confidence: f64,
}

/// Verdict for one feature vector.
///
/// `scores` holds exactly one entry per vocabulary label, in label order,
/// including labels that received no votes.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Winning class index.
    pub label: usize,
    /// Per-label votes and confidences.
    pub scores: Vec<LabelScore>,
}

/// JSON shape printed for a prediction.
///
/// Keys carry the `RF_` prefix that downstream feature tooling reads.
#[derive(Debug, serde::Serialize)]
pub struct PredictionOutput {
    /// Name of the winning label.
    #[serde(rename = "RF_label")]
    pub label: String,
    /// Confidence of the winning label, in percent.
    #[serde(rename = "RF_confidence")]
    pub confidence: f64,
    /// Confidence of every vocabulary label, in vocabulary order.
    #[serde(rename = "RF_probabilities")]
    pub probabilities: Map<String, Value>,
}

impl PredictionResult {
    /// Vocabulary name of the winning label.
    #[must_use]
    pub fn label_name(&self) -> &str {
        &self.scores[self.label].name
    }

    /// Confidence of the winning label, in percent.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.scores[self.label].confidence
    }

    /// Votes for `label`; 0 for labels outside the vocabulary.
    #[must_use]
    pub fn votes(&self, label: usize) -> usize {
        self.scores.get(label).map_or(0, |s| s.votes)
    }

    /// Render as `{RF_label, RF_confidence, RF_probabilities}`.
    #[must_use]
    pub fn to_output(&self) -> PredictionOutput {
        let probabilities = self
            .scores
            .iter()
            .map(|s| (s.name.clone(), Value::from(s.confidence)))
            .collect();
        PredictionOutput {
            label: self.label_name().to_string(),
            confidence: self.confidence(),
            probabilities,
        }
    }
}

/// A fitted forest paired with the names of its labels.
#[derive(Debug, Clone)]
pub struct EnsembleClassifier {
    forest: RandomForest,
    vocabulary: LabelVocabulary,
}

impl EnsembleClassifier {
    /// Pair `forest` with `vocabulary`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::LabelOutOfVocabulary`] when the forest knows more
    /// classes than the vocabulary names.
    pub fn new(forest: RandomForest, vocabulary: LabelVocabulary) -> Result<Self, RfError> {
        if forest.n_classes() > vocabulary.len() {
            return Err(RfError::LabelOutOfVocabulary {
                n_classes: forest.n_classes(),
                vocabulary_size: vocabulary.len(),
            });
        }
        Ok(Self { forest, vocabulary })
    }

    /// Borrow the wrapped forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Borrow the label vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// Score a feature vector.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::DimensionMismatch`] when `sample.len()` differs from
    /// the trained feature count.
    #[instrument(level = "debug", skip_all, fields(n_values = sample.len()))]
    pub fn predict(&self, sample: &[f64]) -> Result<PredictionResult, RfError> {
        let tally = self.forest.predict_with_votes(sample)?;
        let total = tally.total() as f64;
        let scores = self
            .vocabulary
            .names()
            .enumerate()
            .map(|(label, name)| {
                let votes = tally.count(label);
                LabelScore {
                    label,
                    name: name.to_string(),
                    votes,
                    confidence: votes as f64 / total * 100.0,
                }
            })
            .collect();
        let result = PredictionResult {
            label: tally.winner(),
            scores,
        };
        debug!(label = result.label, confidence = result.confidence(), "prediction");
        Ok(result)
    }

    /// Score the numeric fields of a JSON object, in insertion order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::NoNumericFields`] | the object holds no numbers |
    /// | [`RfError::DimensionMismatch`] | wrong number of numeric fields |
    pub fn predict_fields(&self, fields: &Map<String, Value>) -> Result<PredictionResult, RfError> {
        self.predict(&numeric_fields(fields)?)
    }

    /// Score an inference document: an object, or an array whose first
    /// element is an object.
    ///
    /// # Errors
    ///
    /// [`RfError::InvalidDocument`] for any other shape, plus the errors of
    /// [`EnsembleClassifier::predict_fields`].
    pub fn predict_json(&self, document: &Value) -> Result<PredictionResult, RfError> {
        self.predict(&extract_features(document)?)
    }
}

/// Pull the feature vector out of an inference document.
///
/// # Errors
///
/// [`RfError::InvalidDocument`] unless the document is an object or an array
/// whose first element is an object; [`RfError::NoNumericFields`] when that
/// object holds no numbers.
pub fn extract_features(document: &Value) -> Result<Vec<f64>, RfError> {
    match document {
        Value::Object(fields) => numeric_fields(fields),
        Value::Array(items) => match items.first() {
            Some(Value::Object(fields)) => numeric_fields(fields),
            Some(other) => Err(RfError::InvalidDocument {
                found: json_type(other),
            }),
            None => Err(RfError::InvalidDocument { found: "empty array" }),
        },
        other => Err(RfError::InvalidDocument {
            found: json_type(other),
        }),
    }
}

/// Numbers of `fields` in insertion order; everything else is skipped.
fn numeric_fields(fields: &Map<String, Value>) -> Result<Vec<f64>, RfError> {
    let values: Vec<f64> = fields
        .values()
        .filter_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .collect();
    if values.is_empty() {
        return Err(RfError::NoNumericFields);
    }
    Ok(values)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::RandomForestConfig;
    use crate::error::ErrorKind;

    fn classifier(n_trees: usize) -> EnsembleClassifier {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            features.push(vec![class as f64 * 5.0 + (i / 3) as f64 * 0.1, (i % 4) as f64]);
            labels.push(class);
        }
        let forest = RandomForestConfig::new(n_trees)
            .unwrap()
            .with_seed(8)
            .fit(&features, &labels)
            .unwrap();
        EnsembleClassifier::new(forest, LabelVocabulary::forensic()).unwrap()
    }

    #[test]
    fn confidences_sum_to_one_hundred() {
        let clf = classifier(7);
        for x in [0.0, 2.5, 5.2, 7.4, 10.9, 30.0] {
            let result = clf.predict(&[x, 1.0]).unwrap();
            let sum: f64 = result.scores.iter().map(|s| s.confidence).sum();
            assert!((sum - 100.0).abs() < 1e-6, "sum = {sum}");
            let best = result.scores.iter().map(|s| s.votes).max().unwrap();
            assert_eq!(result.scores[result.label].votes, best);
            assert!(result.scores[..result.label].iter().all(|s| s.votes < best));
        }
    }

    #[test]
    fn zero_vote_labels_are_present() {
        let clf = classifier(5);
        let result = clf.predict(&[0.1, 0.0]).unwrap();
        assert_eq!(result.scores.len(), 3);
        assert_eq!(result.label_name(), "Original");
        assert_eq!(result.votes(0), 5);
        assert_eq!(result.scores[2].confidence, 0.0);

        let output = result.to_output();
        let names: Vec<&str> = output.probabilities.keys().map(String::as_str).collect();
        assert_eq!(names, ["Original", "Tampered", "AI-generated"]);
        assert_eq!(output.probabilities["AI-generated"], json!(0.0));
        assert_eq!(output.confidence, 100.0);

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["RF_label"], "Original");
        assert_eq!(value["RF_confidence"], json!(100.0));
        assert_eq!(value["RF_probabilities"]["Tampered"], json!(0.0));
        assert_eq!(value.as_object().unwrap().len(), 3);
    }

    #[test]
    fn vocabulary_may_name_more_labels_than_trained() {
        let clf = classifier(3);
        let forest = clf.forest().clone();
        let wide = EnsembleClassifier::new(
            forest.clone(),
            LabelVocabulary::new(["a", "b", "c", "d"]),
        )
        .unwrap();
        let result = wide.predict(&[5.0, 2.0]).unwrap();
        assert_eq!(result.scores.len(), 4);
        assert_eq!(result.scores[3].votes, 0);

        let err = EnsembleClassifier::new(forest, LabelVocabulary::new(["a", "b"])).unwrap_err();
        assert!(matches!(
            err,
            RfError::LabelOutOfVocabulary {
                n_classes: 3,
                vocabulary_size: 2
            }
        ));
    }

    #[test]
    fn json_fields_extracted_in_order() {
        let doc = json!({"prnu": 1.5, "name": "img.png", "ela": 2, "flag": true, "noise": -0.25});
        assert_eq!(extract_features(&doc).unwrap(), vec![1.5, 2.0, -0.25]);
        let list = json!([{"a": 3.0, "b": 4.0}, {"c": 9.0}]);
        assert_eq!(extract_features(&list).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn json_schema_errors() {
        let err = extract_features(&json!({"name": "x", "ok": false})).unwrap_err();
        assert!(matches!(err, RfError::NoNumericFields));
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(
            extract_features(&json!("text")),
            Err(RfError::InvalidDocument { found: "string" })
        ));
        assert!(matches!(
            extract_features(&json!([])),
            Err(RfError::InvalidDocument { .. })
        ));
        assert!(matches!(
            extract_features(&json!([1, 2])),
            Err(RfError::InvalidDocument { found: "number" })
        ));
    }

    #[test]
    fn json_with_wrong_field_count_is_dimension_mismatch() {
        let clf = classifier(3);
        let err = clf.predict_json(&json!({"a": 1.0, "b": 2.0, "c": 3.0})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        let ok = clf.predict_json(&json!([{"a": 10.0, "label": "?", "b": 1.0}])).unwrap();
        assert_eq!(ok.label, 2);
    }
}
