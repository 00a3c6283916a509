use indexmap::IndexMap;

/// Per-class confidence values for one classified pose.
///
/// Classifier output holds vote counts in `[0, confidence_range]`; smoothed
/// output holds weighted averages of those counts. Classes keep insertion
/// order so iteration and tie-breaking are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    class_confidences: IndexMap<String, f32>,
}

impl ClassificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_classes(&self) -> impl Iterator<Item = &str> {
        self.class_confidences.keys().map(String::as_str)
    }

    /// Confidence of `class_name`, zero when the class is absent.
    pub fn class_confidence(&self, class_name: &str) -> f32 {
        self.class_confidences
            .get(class_name)
            .copied()
            .unwrap_or(0.0)
    }

    /// Class with the highest confidence; the first one wins on ties.
    pub fn max_confidence_class(&self) -> Option<&str> {
        let mut best: Option<(&String, f32)> = None;
        for (class_name, &confidence) in &self.class_confidences {
            match best {
                Some((_, best_confidence)) if confidence <= best_confidence => {}
                _ => best = Some((class_name, confidence)),
            }
        }
        best.map(|(class_name, _)| class_name.as_str())
    }

    pub fn increment_class_confidence(&mut self, class_name: &str) {
        match self.class_confidences.get_mut(class_name) {
            Some(confidence) => *confidence += 1.0,
            None => {
                self.class_confidences.insert(class_name.to_string(), 1.0);
            }
        }
    }

    pub fn put_class_confidence(&mut self, class_name: impl Into<String>, confidence: f32) {
        self.class_confidences.insert(class_name.into(), confidence);
    }

    pub fn len(&self) -> usize {
        self.class_confidences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_confidences.is_empty()
    }
}
