//! Pure projection from `UiState` to what the detection panel displays.
//!
//! The GUI and the CLI both render a `PanelView`; neither looks at the
//! pipeline state directly.

use std::fmt;

use crate::models::{ClassificationResult, ErrorCause};
use crate::pipeline::UiState;

pub const PROMPT: &str = "Upload or capture an image to detect diseases";
pub const PREVIEW_READY: &str = "Image ready. Submit it to detect diseases";
pub const ANALYZING: &str = "Analyzing image...";
pub const LOW_CONFIDENCE_ADVISORY: &str =
    "Low confidence prediction. Please verify with a clearer image.";

const HIGH_CONFIDENCE: f64 = 70.0;
const LOW_CONFIDENCE: f64 = 50.0;
const MAX_RANKED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBadge {
    Healthy,
    Diseased,
}

impl HealthBadge {
    pub fn text(self) -> &'static str {
        match self {
            HealthBadge::Healthy => "Healthy Leaf",
            HealthBadge::Diseased => "Disease Detected",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            HealthBadge::Healthy => "✅",
            HealthBadge::Diseased => "⚠️",
        }
    }
}

/// Colour of the confidence bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// 70 and above
    Green,
    /// 50 up to 70
    Amber,
    /// below 50
    Red,
}

impl ConfidenceBand {
    pub fn for_percent(percent: f64) -> Self {
        if percent >= HIGH_CONFIDENCE {
            ConfidenceBand::Green
        } else if percent >= LOW_CONFIDENCE {
            ConfidenceBand::Amber
        } else {
            ConfidenceBand::Red
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            ConfidenceBand::Green => [34, 197, 94],
            ConfidenceBand::Amber => [234, 179, 8],
            ConfidenceBand::Red => [239, 68, 68],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(Medal::Gold),
            1 => Some(Medal::Silver),
            2 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPrediction {
    pub rank: usize,
    pub medal: Option<Medal>,
    pub name: String,
    pub confidence_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub label: String,
    pub badge: HealthBadge,
    pub confidence_percent: f64,
    /// Bar fill in `0.0..=1.0`
    pub bar_fill: f32,
    pub band: ConfidenceBand,
    pub predictions: Vec<RankedPrediction>,
    pub low_confidence_advisory: Option<&'static str>,
}

impl ResultView {
    pub fn from_result(result: &ClassificationResult) -> Self {
        let confidence = result.confidence_percent;
        let predictions = result
            .top_predictions
            .iter()
            .take(MAX_RANKED)
            .enumerate()
            .map(|(rank, p)| RankedPrediction {
                rank,
                medal: Medal::for_rank(rank),
                name: p.name.clone(),
                confidence_percent: p.confidence,
            })
            .collect();

        Self {
            label: result.label.clone(),
            badge: if result.is_healthy {
                HealthBadge::Healthy
            } else {
                HealthBadge::Diseased
            },
            confidence_percent: confidence,
            bar_fill: (confidence / 100.0).clamp(0.0, 1.0) as f32,
            band: ConfidenceBand::for_percent(confidence),
            predictions,
            low_confidence_advisory: (confidence < LOW_CONFIDENCE).then_some(LOW_CONFIDENCE_ADVISORY),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    /// Nothing selected yet
    Prompt(&'static str),
    /// An image is selected but not submitted
    Ready(&'static str),
    /// Indeterminate progress while a request is in flight
    Progress(&'static str),
    Error { message: String, cause: ErrorCause },
    Result(ResultView),
}

pub fn present(state: &UiState) -> PanelView {
    match state {
        UiState::Idle => PanelView::Prompt(PROMPT),
        UiState::Previewing => PanelView::Ready(PREVIEW_READY),
        UiState::Submitting => PanelView::Progress(ANALYZING),
        UiState::Failed(err) => PanelView::Error {
            message: err.message.clone(),
            cause: err.cause,
        },
        UiState::Succeeded(result) => PanelView::Result(ResultView::from_result(result)),
    }
}

/// Width of the text confidence bar
const BAR_CELLS: usize = 20;

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelView::Prompt(text) | PanelView::Ready(text) | PanelView::Progress(text) => {
                writeln!(f, "{}", text)
            }
            PanelView::Error { message, cause } => {
                writeln!(f, "❌ Error ({})", cause)?;
                writeln!(f, "{}", message)
            }
            PanelView::Result(view) => {
                writeln!(f, "{} {}", view.badge.icon(), view.label)?;
                writeln!(f, "{}", view.badge.text())?;
                let filled = (view.bar_fill * BAR_CELLS as f32).round() as usize;
                writeln!(
                    f,
                    "Confidence: {}% [{}{}] {:?}",
                    view.confidence_percent,
                    "#".repeat(filled),
                    "-".repeat(BAR_CELLS - filled.min(BAR_CELLS)),
                    view.band
                )?;
                if !view.predictions.is_empty() {
                    writeln!(f, "Top Predictions:")?;
                    for p in &view.predictions {
                        let marker = p.medal.map(Medal::marker).unwrap_or(" ");
                        writeln!(f, "  {} {}: {:.2}%", marker, p.name, p.confidence_percent)?;
                    }
                }
                if let Some(advisory) = view.low_confidence_advisory {
                    writeln!(f, "⚠️ {}", advisory)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationError, Prediction};

    fn prediction(name: &str, confidence: f64) -> Prediction {
        Prediction {
            name: name.to_string(),
            confidence,
        }
    }

    fn early_blight(confidence: f64) -> ClassificationResult {
        ClassificationResult {
            label: "Early Blight".to_string(),
            is_healthy: false,
            confidence_percent: confidence,
            top_predictions: vec![
                prediction("Early Blight", confidence),
                prediction("Late Blight", 12.0),
                prediction("Healthy", 6.0),
            ],
        }
    }

    #[test]
    fn test_confident_diseased_result() {
        let view = match present(&UiState::Succeeded(early_blight(82.0))) {
            PanelView::Result(view) => view,
            other => panic!("unexpected view {:?}", other),
        };
        assert_eq!(view.badge, HealthBadge::Diseased);
        assert_eq!(view.band, ConfidenceBand::Green);
        assert!((view.bar_fill - 0.82).abs() < 1e-6);
        assert_eq!(view.predictions.len(), 3);
        let medals: Vec<_> = view.predictions.iter().map(|p| p.medal).collect();
        assert_eq!(medals, vec![Some(Medal::Gold), Some(Medal::Silver), Some(Medal::Bronze)]);
        assert_eq!(view.low_confidence_advisory, None);
    }

    #[test]
    fn test_low_confidence_is_red_with_advisory() {
        let view = ResultView::from_result(&early_blight(45.0));
        assert_eq!(view.band, ConfidenceBand::Red);
        assert_eq!(view.low_confidence_advisory, Some(LOW_CONFIDENCE_ADVISORY));
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(ConfidenceBand::for_percent(70.0), ConfidenceBand::Green);
        assert_eq!(ConfidenceBand::for_percent(69.99), ConfidenceBand::Amber);
        assert_eq!(ConfidenceBand::for_percent(50.0), ConfidenceBand::Amber);
        assert_eq!(ConfidenceBand::for_percent(49.9), ConfidenceBand::Red);
        assert!(ResultView::from_result(&early_blight(50.0)).low_confidence_advisory.is_none());
    }

    #[test]
    fn test_only_top_three_are_ranked() {
        let mut result = early_blight(60.0);
        result.top_predictions.push(prediction("Leaf Mold", 1.0));
        let view = ResultView::from_result(&result);
        assert_eq!(view.predictions.len(), 3);
        assert_eq!(view.predictions[2].name, "Healthy");
    }

    #[test]
    fn test_healthy_badge_and_clamped_bar() {
        let result = ClassificationResult {
            label: "Healthy".to_string(),
            is_healthy: true,
            confidence_percent: 130.0,
            top_predictions: vec![],
        };
        let view = ResultView::from_result(&result);
        assert_eq!(view.badge, HealthBadge::Healthy);
        assert_eq!(view.bar_fill, 1.0);
        assert!(view.predictions.is_empty());
    }

    #[test]
    fn test_non_result_states() {
        assert_eq!(present(&UiState::Idle), PanelView::Prompt(PROMPT));
        assert_eq!(present(&UiState::Submitting), PanelView::Progress(ANALYZING));
        assert_eq!(
            present(&UiState::Failed(ClassificationError::server("corrupt image"))),
            PanelView::Error {
                message: "corrupt image".to_string(),
                cause: ErrorCause::Server,
            }
        );
    }

    #[test]
    fn test_text_rendering() {
        let text = present(&UiState::Succeeded(early_blight(45.0))).to_string();
        assert!(text.contains("Early Blight"));
        assert!(text.contains("Disease Detected"));
        assert!(text.contains("🥇 Early Blight: 45.00%"));
        assert!(text.contains("🥉 Healthy: 6.00%"));
        assert!(text.contains(LOW_CONFIDENCE_ADVISORY));
    }
}
