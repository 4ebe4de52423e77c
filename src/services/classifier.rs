//! Urban service classification.
//!
//! Detects whether a photo detail page describes an urban bus service and
//! extracts its structured label (line id + name) from the page text.
//!
//! The extraction runs an ordered, first-match-wins pattern cascade. The
//! order is a behavioral contract: a page matching both an `INTER` pattern
//! and a `CODE - NAME` pattern must resolve through the `INTER` branch.

use regex::Regex;
use scraper::{Html, Selector};

use crate::models::ServiceLabel;

/// Line codes look like "72", "A12" or "204B".
const LINE_CODE: &str = r"[A-Z]?\d+[A-Z]?";

/// Line names: letters (accented included), spaces, slashes, dashes, dots.
const LINE_NAME: &str = r"[A-ZÀ-ÿ/\s\-\.]+";

/// Relaxed line names for the fallback pass.
const LINE_NAME_RELAXED: &str = r"[A-ZÀ-ÿ/\s\-\.]{3,}";

/// How a pattern's captures map onto a service label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// One capture holding an "INTER <digits>" code
    InterCode,
    /// Two captures: line code and line name
    CodeAndName,
}

struct ServicePattern {
    regex: Regex,
    shape: Shape,
}

impl ServicePattern {
    fn new(pattern: &str, shape: Shape) -> Self {
        Self {
            // All patterns are case-insensitive, matching the page text as
            // rendered with any capitalization.
            regex: Regex::new(&format!("(?i){pattern}")).expect("service pattern"),
            shape,
        }
    }
}

/// Classifier for urban bus service pages.
pub struct ServiceClassifier {
    primary: Vec<ServicePattern>,
    fallback: Vec<ServicePattern>,
    keyword: Regex,
    marker_phrase: Regex,
    text_elements: Selector,
}

impl ServiceClassifier {
    pub fn new() -> Self {
        let primary = vec![
            // INTER family: the marker may precede or follow the code.
            ServicePattern::new(r"Serviço\s+Urbano:?\s*(INTER\s+\d+)", Shape::InterCode),
            ServicePattern::new(r"Urbano:?\s*(INTER\s+\d+)", Shape::InterCode),
            ServicePattern::new(r"(INTER\s+\d+).*Urbano", Shape::InterCode),
            ServicePattern::new(r"Urbano.*(INTER\s+\d+)", Shape::InterCode),
            // "marker: CODE - NAME" family, with and without the colon.
            ServicePattern::new(
                &format!(r"Serviço\s+Urbano:\s*({LINE_CODE})\s*-\s*({LINE_NAME})"),
                Shape::CodeAndName,
            ),
            ServicePattern::new(
                &format!(r"Urbano:\s*({LINE_CODE})\s*-\s*({LINE_NAME})"),
                Shape::CodeAndName,
            ),
            ServicePattern::new(
                &format!(r"Serviço\s+Urbano\s+({LINE_CODE})\s*-\s*({LINE_NAME})"),
                Shape::CodeAndName,
            ),
            // Structural variants anchored on alternate marker words.
            ServicePattern::new(
                &format!(r"Tipo.*Urbano.*?({LINE_CODE})\s*-\s*({LINE_NAME})"),
                Shape::CodeAndName,
            ),
            ServicePattern::new(
                &format!(r"Linha\s*({LINE_CODE})\s*-\s*({LINE_NAME}).*Urbano"),
                Shape::CodeAndName,
            ),
        ];

        let fallback = vec![
            ServicePattern::new(r"(INTER\s+\d+)", Shape::InterCode),
            ServicePattern::new(
                &format!(r"({LINE_CODE})\s*-\s*({LINE_NAME_RELAXED})"),
                Shape::CodeAndName,
            ),
            ServicePattern::new(
                &format!(r"Linha\s*({LINE_CODE})\s*({LINE_NAME_RELAXED})"),
                Shape::CodeAndName,
            ),
        ];

        Self {
            primary,
            fallback,
            keyword: Regex::new(r"(?i)urbano").expect("keyword pattern"),
            marker_phrase: Regex::new(r"(?i)Serviço.*Urbano").expect("marker pattern"),
            text_elements: Selector::parse("td, div, span, p").expect("text element selector"),
        }
    }

    /// Classify a detail page, returning its service label if the page
    /// describes an urban service.
    pub fn classify(&self, document: &Html) -> Option<ServiceLabel> {
        let page_text = normalize(&document.root_element().text().collect::<String>());

        if let Some(label) = self.match_patterns(&self.primary, &page_text) {
            return Some(label);
        }

        // The full-page pass missed; retry the cascade scoped to individual
        // elements carrying the marker phrase.
        for element in document.select(&self.text_elements) {
            let text = normalize(&element.text().collect::<String>());
            if !self.marker_phrase.is_match(&text) {
                continue;
            }
            if let Some(label) = self.match_patterns(&self.primary, &text) {
                return Some(label);
            }
        }

        // The keyword appears without any structured label: relaxed
        // patterns, then the sentinel.
        if self.keyword.is_match(&page_text) {
            if let Some(label) = self.match_fallback(&page_text) {
                log::debug!(
                    "Fallback classification: {} - {}",
                    label.line_id,
                    label.name
                );
                return Some(label);
            }
            return Some(ServiceLabel::unknown());
        }

        None
    }

    fn match_patterns(&self, patterns: &[ServicePattern], text: &str) -> Option<ServiceLabel> {
        for pattern in patterns {
            let Some(caps) = pattern.regex.captures(text) else {
                continue;
            };
            match pattern.shape {
                Shape::InterCode => {
                    let Some(code) = caps.get(1) else { continue };
                    return Some(ServiceLabel {
                        line_id: "INTER".to_string(),
                        name: code.as_str().to_lowercase(),
                    });
                }
                Shape::CodeAndName => {
                    let (Some(code), Some(name)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    return Some(ServiceLabel {
                        line_id: code.as_str().to_string(),
                        name: name.as_str().trim().to_string(),
                    });
                }
            }
        }
        None
    }

    /// Relaxed pass: two-capture matches only qualify when the extracted
    /// name is longer than 3 characters.
    fn match_fallback(&self, text: &str) -> Option<ServiceLabel> {
        for pattern in &self.fallback {
            let Some(caps) = pattern.regex.captures(text) else {
                continue;
            };
            match pattern.shape {
                Shape::InterCode => {
                    let Some(code) = caps.get(1) else { continue };
                    return Some(ServiceLabel {
                        line_id: "INTER".to_string(),
                        name: code.as_str().to_lowercase(),
                    });
                }
                Shape::CodeAndName => {
                    let (Some(code), Some(name)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    let name = name.as_str().trim();
                    if name.chars().count() > 3 {
                        return Some(ServiceLabel {
                            line_id: code.as_str().to_string(),
                            name: name.to_string(),
                        });
                    }
                }
            }
        }
        None
    }
}

impl Default for ServiceClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse line breaks into spaces.
fn normalize(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(body: &str) -> Option<ServiceLabel> {
        let html = format!("<html><body>{body}</body></html>");
        ServiceClassifier::new().classify(&Html::parse_document(&html))
    }

    #[test]
    fn test_inter_with_marker_prefix() {
        let label = classify("<p>Serviço Urbano: INTER 140</p>").unwrap();
        assert_eq!(label.line_id, "INTER");
        assert_eq!(label.name, "inter 140");
    }

    #[test]
    fn test_inter_with_marker_suffix() {
        let label = classify("<p>INTER 22 em operação no Serviço Urbano</p>").unwrap();
        assert_eq!(label.line_id, "INTER");
        assert_eq!(label.name, "inter 22");
    }

    #[test]
    fn test_code_and_name_with_colon() {
        let label = classify("<p>Serviço Urbano: A12 - Vila Nova (2024)</p>").unwrap();
        assert_eq!(label.line_id, "A12");
        assert_eq!(label.name, "Vila Nova");
    }

    #[test]
    fn test_code_and_name_uppercase_accents() {
        let label = classify("<p>SERVIÇO URBANO: 12B - PRAÇA DA SÉ (leste)</p>").unwrap();
        assert_eq!(label.line_id, "12B");
        assert_eq!(label.name, "PRAÇA DA SÉ");
    }

    #[test]
    fn test_code_and_name_without_colon() {
        let label = classify("<p>Serviço Urbano 72 - Circular Centro (ida)</p>").unwrap();
        assert_eq!(label.line_id, "72");
        assert_eq!(label.name, "Circular Centro");
    }

    #[test]
    fn test_tipo_structural_variant() {
        let label = classify("<p>Tipo de operação: Urbano, linha 15A - São José (volta)</p>")
            .unwrap();
        assert_eq!(label.line_id, "15A");
        assert_eq!(label.name, "São José");
    }

    #[test]
    fn test_inter_beats_code_and_name() {
        // Both families match; the INTER branch must win.
        let label = classify(
            "<p>INTER 22 também atende o Serviço Urbano: B7 - Jardim das Flores (2023)</p>",
        )
        .unwrap();
        assert_eq!(label.line_id, "INTER");
        assert_eq!(label.name, "inter 22");
    }

    #[test]
    fn test_marker_in_table_cell() {
        let label = classify(
            "<table><tr><td>Serviço Urbano: 204 - Vila Madalena (2022)</td></tr></table>",
        )
        .unwrap();
        assert_eq!(label.line_id, "204");
        assert_eq!(label.name, "Vila Madalena");
    }

    #[test]
    fn test_fallback_extracts_relaxed_code_and_name() {
        let label = classify("<p>ônibus urbano 204 - Vila Madalena (foto)</p>").unwrap();
        assert_eq!(label.line_id, "204");
        assert_eq!(label.name, "Vila Madalena");
    }

    #[test]
    fn test_fallback_rejects_short_names() {
        // "Rio" is not longer than 3 characters, so the relaxed match is
        // discarded and the sentinel applies.
        let label = classify("<p>ônibus urbano 204 - Rio (foto)</p>").unwrap();
        assert_eq!(label.line_id, "unknown");
        assert_eq!(label.name, "urbano");
    }

    #[test]
    fn test_keyword_only_yields_sentinel() {
        let label = classify("<p>ônibus urbano em operação</p>").unwrap();
        assert_eq!(label.line_id, "unknown");
        assert_eq!(label.name, "urbano");
    }

    #[test]
    fn test_no_marker_yields_none() {
        assert!(classify("<p>Ônibus rodoviário executivo 123 - Litoral</p>").is_none());
    }

    #[test]
    fn test_line_breaks_are_collapsed() {
        let label = classify("<p>Serviço\nUrbano: A1 - Centro\n(2020)</p>").unwrap();
        assert_eq!(label.line_id, "A1");
        assert_eq!(label.name, "Centro");
    }
}
