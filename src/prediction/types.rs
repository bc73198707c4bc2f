//! Request and reply envelopes exchanged with the classification workers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of values in a flattened 28x28 input image.
pub const IMAGE_SIZE: usize = 784;

/// Number of classes scored by the model.
pub const CLASS_COUNT: usize = 10;

/// Rejected input vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidImage {
    /// A value overflowed `f32` or is otherwise not a finite number.
    #[error("Image value at index {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("Image data must have a length of {expected}")]
    WrongLength { expected: usize, actual: usize },
}

/// A validated classification request: exactly [`IMAGE_SIZE`] finite values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    image: Vec<f32>,
}

impl PredictionRequest {
    pub fn new(image: Vec<f32>) -> Result<Self, InvalidImage> {
        if let Some(index) = image.iter().position(|v| !v.is_finite()) {
            return Err(InvalidImage::NonFinite { index });
        }
        if image.len() != IMAGE_SIZE {
            return Err(InvalidImage::WrongLength {
                expected: IMAGE_SIZE,
                actual: image.len(),
            });
        }
        Ok(Self { image })
    }

    pub fn image(&self) -> &[f32] {
        &self.image
    }
}

/// The request body as it arrives, before length validation.
#[derive(Debug, Deserialize)]
pub struct RawPredictionRequest {
    pub image: Vec<f32>,
}

impl TryFrom<RawPredictionRequest> for PredictionRequest {
    type Error = InvalidImage;

    fn try_from(raw: RawPredictionRequest) -> Result<Self, Self::Error> {
        PredictionRequest::new(raw.image)
    }
}

/// A worker's answer: the predicted digit and per-class scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub digit: i32,
    pub probabilities: [f32; CLASS_COUNT],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_length() {
        let request = PredictionRequest::new(vec![0.5; IMAGE_SIZE]).unwrap();
        assert_eq!(request.image().len(), IMAGE_SIZE);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = PredictionRequest::new(vec![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            InvalidImage::WrongLength {
                expected: IMAGE_SIZE,
                actual: 3
            }
        );
        assert_eq!(err.to_string(), "Image data must have a length of 784");

        assert!(PredictionRequest::new(vec![0.0; IMAGE_SIZE + 1]).is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut image = vec![0.0; IMAGE_SIZE];
        image[300] = f32::INFINITY;
        assert_eq!(
            PredictionRequest::new(image).unwrap_err(),
            InvalidImage::NonFinite { index: 300 }
        );

        let mut image = vec![0.0; IMAGE_SIZE];
        image[0] = f32::NAN;
        assert_eq!(
            PredictionRequest::new(image).unwrap_err(),
            InvalidImage::NonFinite { index: 0 }
        );
    }

    #[test]
    fn request_wire_format() {
        let request = PredictionRequest::new(vec![0.0; IMAGE_SIZE]).unwrap();
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["image"].as_array().unwrap().len(), IMAGE_SIZE);
    }

    #[test]
    fn response_requires_ten_scores() {
        let ok = r#"{"digit":3,"probabilities":[0,0,0,1,0,0,0,0,0,0]}"#;
        let response: PredictionResponse = serde_json::from_str(ok).unwrap();
        assert_eq!(response.digit, 3);
        assert_eq!(response.probabilities[3], 1.0);

        let short = r#"{"digit":3,"probabilities":[0,1]}"#;
        assert!(serde_json::from_str::<PredictionResponse>(short).is_err());
    }
}
