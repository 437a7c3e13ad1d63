use crate::models::RiskLevel;

/// Map a binary prediction and its confidence percentage to a risk bucket.
///
/// Comparisons are strict, so a confidence sitting exactly on a threshold
/// falls to the next bucket down the list. A low-confidence negative is
/// escalated to `High`.
pub fn bucket(predicted_class: u8, confidence: f64) -> RiskLevel {
    if predicted_class == 1 {
        if confidence > 80.0 {
            RiskLevel::High
        } else if confidence > 60.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    } else if confidence > 90.0 {
        RiskLevel::Low
    } else if confidence > 70.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep() -> impl Iterator<Item = f64> {
        (500..=1000).map(|tenths| tenths as f64 / 10.0)
    }

    #[test]
    fn test_positive_class_buckets() {
        for confidence in sweep() {
            let expected = if confidence > 80.0 {
                RiskLevel::High
            } else if confidence > 60.0 {
                RiskLevel::Medium
            } else {
                RiskLevel::Low
            };
            assert_eq!(bucket(1, confidence), expected, "confidence {confidence}");
        }
    }

    #[test]
    fn test_negative_class_buckets() {
        for confidence in sweep() {
            let expected = if confidence > 90.0 {
                RiskLevel::Low
            } else if confidence > 70.0 {
                RiskLevel::Medium
            } else {
                RiskLevel::High
            };
            assert_eq!(bucket(0, confidence), expected, "confidence {confidence}");
        }
    }

    #[test]
    fn test_boundaries_fall_to_lower_bucket() {
        assert_eq!(bucket(1, 80.0), RiskLevel::Medium);
        assert_eq!(bucket(1, 80.01), RiskLevel::High);
        assert_eq!(bucket(1, 60.0), RiskLevel::Low);
        assert_eq!(bucket(0, 90.0), RiskLevel::Medium);
        assert_eq!(bucket(0, 90.01), RiskLevel::Low);
        assert_eq!(bucket(0, 70.0), RiskLevel::High);
    }

    #[test]
    fn test_low_confidence_negative_is_high_risk() {
        assert_eq!(bucket(0, 55.0), RiskLevel::High);
        assert_eq!(bucket(1, 55.0), RiskLevel::Low);
    }

    #[test]
    fn test_bucket_is_pure() {
        for confidence in [50.0, 65.5, 80.0, 99.9] {
            for class in [0, 1] {
                assert_eq!(bucket(class, confidence), bucket(class, confidence));
            }
        }
    }
}
