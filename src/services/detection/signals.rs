// Superficial Signal Checks
// Weak content-independent hints read off the input descriptor. Each one
// alone is noise; the runner only boosts when two or more coincide.

use crate::models::{ContentType, MediaDescriptor};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    AiTermedFilename,
    TinyPayload,
    PerfectDimensions,
    ShortClip,
    TemplateText,
}

#[derive(Debug, Clone)]
pub struct SuperficialSignal {
    pub kind: SignalKind,
    pub issue: String,
}

fn ai_term_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\bai\b|gpt|\bgan\b|diffusion|midjourney|dall[-_]?e|sora|deepfake|face[-_]?swap|synthe|generated|voice[-_]?clone|cloned)",
        )
        .expect("ai term regex")
    })
}

/// Filename mentions generative tooling. Also used by the aggregator for
/// its flat score bonus, independent of method results.
pub fn filename_has_ai_terms(filename: &str) -> bool {
    ai_term_re().is_match(filename)
}

/// Byte size implausibly small for the declared content type.
fn suspicious_size(content_type: ContentType, size_bytes: u64) -> bool {
    let floor = match content_type {
        ContentType::Image => 30_000,
        ContentType::Video => 500_000,
        ContentType::Audio => 50_000,
        ContentType::Text => return false,
    };
    size_bytes > 0 && size_bytes < floor
}

/// Dimensions sitting exactly on common generator output grids.
fn perfect_dimensions(width: u32, height: u32) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    width == height || (width % 64 == 0 && height % 64 == 0 && width >= 512 && height >= 512)
}

/// Uniform sentence structure across a text passage. Needs at least five
/// sentences to say anything.
fn template_like_text(text: &str) -> bool {
    let lengths: Vec<f64> = text
        .split(['.', '!', '?'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().count() as f64)
        .collect();
    if lengths.len() < 5 {
        return false;
    }
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    if mean <= 0.0 {
        return false;
    }
    let variance =
        lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    let cv = variance.sqrt() / mean;
    cv < 0.18
}

/// Collect every weak signal the descriptor carries for this type.
pub fn collect_signals(
    content_type: ContentType,
    descriptor: &MediaDescriptor,
) -> Vec<SuperficialSignal> {
    let mut signals = Vec::new();

    if let Some(name) = descriptor.filename.as_deref() {
        if filename_has_ai_terms(name) {
            signals.push(SuperficialSignal {
                kind: SignalKind::AiTermedFilename,
                issue: "Filename references generative tooling".to_string(),
            });
        }
    }

    if let Some(size) = descriptor.size_bytes {
        if suspicious_size(content_type, size) {
            signals.push(SuperficialSignal {
                kind: SignalKind::TinyPayload,
                issue: format!(
                    "File size is implausibly small for {} content",
                    content_type.as_str()
                ),
            });
        }
    }

    if let (Some(w), Some(h)) = (descriptor.width, descriptor.height) {
        if perfect_dimensions(w, h) {
            signals.push(SuperficialSignal {
                kind: SignalKind::PerfectDimensions,
                issue: "Pixel dimensions match common generator output sizes".to_string(),
            });
        }
    }

    if matches!(content_type, ContentType::Video | ContentType::Audio) {
        if let Some(duration) = descriptor.duration_secs {
            if duration > 0.0 && duration < 4.0 {
                signals.push(SuperficialSignal {
                    kind: SignalKind::ShortClip,
                    issue: "Clip might be trimmed to hide synthesis seams".to_string(),
                });
            }
        }
    }

    if content_type == ContentType::Text {
        if let Some(text) = descriptor.text.as_deref() {
            if template_like_text(text) {
                signals.push(SuperficialSignal {
                    kind: SignalKind::TemplateText,
                    issue: "Sentence structure is unusually uniform across the passage"
                        .to_string(),
                });
            }
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_terms() {
        assert!(filename_has_ai_terms("midjourney_export_01.png"));
        assert!(filename_has_ai_terms("AI-portrait.jpg"));
        assert!(filename_has_ai_terms("voice_clone_take3.wav"));
        assert!(!filename_has_ai_terms("birthday_party.jpg"));
        // "ai" must be a standalone token, not a substring
        assert!(!filename_has_ai_terms("maintenance_report.pdf"));
    }

    #[test]
    fn test_perfect_dimensions_grid() {
        assert!(perfect_dimensions(1024, 1024));
        assert!(perfect_dimensions(512, 768));
        assert!(perfect_dimensions(333, 333)); // exact square counts
        assert!(!perfect_dimensions(4032, 3024)); // phone sensor output
        assert!(!perfect_dimensions(0, 512));
    }

    #[test]
    fn test_two_signals_from_descriptor() {
        let descriptor = MediaDescriptor {
            filename: Some("deepfake_test.png".to_string()),
            size_bytes: Some(12_000),
            width: Some(512),
            height: Some(512),
            ..Default::default()
        };
        let signals = collect_signals(ContentType::Image, &descriptor);
        assert_eq!(signals.len(), 3);
        assert!(signals.iter().any(|s| s.kind == SignalKind::AiTermedFilename));
        assert!(signals.iter().any(|s| s.kind == SignalKind::TinyPayload));
        assert!(signals.iter().any(|s| s.kind == SignalKind::PerfectDimensions));
    }

    #[test]
    fn test_template_text_needs_enough_sentences() {
        assert!(!template_like_text("Short one. Another short."));
        let uniform = "This sentence has a length. That sentence has a length. \
                       Some sentence has a length. Every sentence has a length. \
                       Which sentence has a length. Their sentence has a length.";
        assert!(template_like_text(uniform));
    }
}
