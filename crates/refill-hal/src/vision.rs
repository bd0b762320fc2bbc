//! Generic `Classifier` trait for vision services.

use async_trait::async_trait;
use refill_types::{Classification, Image, RefillError};

/// An image classifier (local model, remote vision service, …).
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Stable identifier for this classifier, e.g. `"hopper_model"`.
    fn name(&self) -> &str;

    /// Classify `image`, returning at most `top_k` results.
    ///
    /// The order of the returned results is defined by the classifier; callers
    /// must not assume it is sorted by confidence.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::Classification`] when inference fails.
    async fn classify(&self, image: &Image, top_k: usize)
    -> Result<Vec<Classification>, RefillError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    /// Always answers with a fixed list, truncated to `top_k`.
    struct FixedClassifier {
        results: Vec<Classification>,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(
            &self,
            _image: &Image,
            top_k: usize,
        ) -> Result<Vec<Classification>, RefillError> {
            Ok(self.results.iter().take(top_k).cloned().collect())
        }
    }

    #[tokio::test]
    async fn classifier_respects_top_k() {
        let classifier = FixedClassifier {
            results: vec![
                Classification::new("full", 0.7),
                Classification::new("empty", 0.3),
            ],
        };
        let image = Image {
            width: 1,
            height: 1,
            data: vec![0],
            mime_type: "image/x-raw-gray".to_string(),
            captured_at: Utc::now(),
        };
        let results = classifier.classify(&image, 1).await.unwrap();
        assert_eq!(results, vec![Classification::new("full", 0.7)]);
    }
}
