//! Static keyword classifier.
//!
//! Matching is case-insensitive and word-bounded. Named anti-cheat/DRM
//! systems take precedence over the generic privacy vocabulary.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

/// (reported name, pattern) for named anti-cheat and DRM systems.
const SYSTEMS: &[(&str, &str)] = &[
    ("BattlEye", r"battleye"),
    ("EasyAntiCheat", r"easy\s*-?\s*anti\s*-?\s*cheat|eac"),
    ("Vanguard", r"(?:riot\s+)?vanguard"),
    ("PunkBuster", r"punk\s*buster"),
    ("VAC", r"vac|valve\s+anti\s*-?\s*cheat"),
    ("FACEIT", r"faceit"),
    ("ESEA", r"esea"),
    ("nProtect GameGuard", r"n\s*protect|game\s*guard"),
    ("XIGNCODE3", r"xigncode3?"),
    ("EQU8", r"equ8"),
    ("Ricochet", r"ricochet(?:\s+anti\s*-?\s*cheat)?"),
    ("mhyprot", r"mhyprot\d?"),
    ("Denuvo", r"denuvo"),
    ("Arxan", r"arxan"),
    ("Javelin", r"javelin(?:\s+anti\s*-?\s*cheat)"),
];

/// Generic privacy / technical terms that warrant a manual read.
const TERMS: &[&str] = &[
    "telemetry",
    "kernel",
    "driver",
    "anti-cheat",
    "anticheat",
    "personal data",
    "personal information",
    "third party",
    "third-party",
    "tracking",
    "track",
    "monitor",
    "monitoring",
    "data collection",
    "collect",
    "hardware identifier",
    "hardware id",
    "hwid",
    "ip address",
    "device identifier",
    "fingerprint",
    "analytics",
    "advertising",
    "background process",
];

struct Pattern {
    name: &'static str,
    regex: Regex,
}

fn compile(name: &'static str, pattern: &str) -> Pattern {
    let bounded = format!(r"(?i)\b(?:{})\b", pattern);
    Pattern {
        name,
        regex: Regex::new(&bounded).expect("keyword pattern is valid"),
    }
}

static SYSTEM_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    SYSTEMS
        .iter()
        .map(|&(name, pattern)| compile(name, pattern))
        .collect()
});

static TERM_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    TERMS
        .iter()
        .map(|&term| compile(term, &regex::escape(term).replace(' ', r"\s+")))
        .collect()
});

/// Outcome of the keyword scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordVerdict {
    NoDocument,
    /// Named systems, deduplicated and sorted.
    Detected(Vec<String>),
    /// Generic terms, deduplicated and sorted.
    Uncertain(Vec<String>),
    Clear,
}

impl KeywordVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            KeywordVerdict::NoDocument => "No document found",
            KeywordVerdict::Detected(_) => "Detected",
            KeywordVerdict::Uncertain(_) => "Uncertain - manual review",
            KeywordVerdict::Clear => "No concerning terms found",
        }
    }

    pub fn matches(&self) -> &[String] {
        match self {
            KeywordVerdict::Detected(m) | KeywordVerdict::Uncertain(m) => m,
            KeywordVerdict::NoDocument | KeywordVerdict::Clear => &[],
        }
    }
}

impl fmt::Display for KeywordVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordVerdict::Detected(_) | KeywordVerdict::Uncertain(_) => {
                write!(f, "{}: {}", self.label(), self.matches().join(", "))
            }
            _ => f.write_str(self.label()),
        }
    }
}

fn matched_names(patterns: &[Pattern], text: &str) -> Vec<String> {
    patterns
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| p.name.to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Classifies the selected document text, if any.
pub fn classify(text: Option<&str>) -> KeywordVerdict {
    let Some(text) = text else {
        return KeywordVerdict::NoDocument;
    };
    let systems = matched_names(&SYSTEM_PATTERNS, text);
    if !systems.is_empty() {
        return KeywordVerdict::Detected(systems);
    }
    let terms = matched_names(&TERM_PATTERNS, text);
    if !terms.is_empty() {
        return KeywordVerdict::Uncertain(terms);
    }
    KeywordVerdict::Clear
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_text_is_no_document() {
        assert_eq!(classify(None), KeywordVerdict::NoDocument);
        assert_eq!(classify(None).to_string(), "No document found");
    }

    #[test]
    fn battleye_in_any_case_is_detected() {
        for text in ["Uses BattlEye.", "uses BATTLEYE anti-cheat", "battleye"] {
            assert_eq!(
                classify(Some(text)),
                KeywordVerdict::Detected(vec!["BattlEye".to_string()])
            );
        }
        assert_eq!(
            classify(Some("This game uses BattlEye anti-cheat.")).to_string(),
            "Detected: BattlEye"
        );
    }

    #[test]
    fn detected_systems_are_sorted_and_deduplicated() {
        let verdict = classify(Some(
            "Protected by Easy Anti-Cheat, EasyAntiCheat and BattlEye; DRM by Denuvo.",
        ));
        assert_eq!(
            verdict,
            KeywordVerdict::Detected(vec![
                "BattlEye".to_string(),
                "Denuvo".to_string(),
                "EasyAntiCheat".to_string(),
            ])
        );
    }

    #[test]
    fn telemetry_alone_is_uncertain() {
        let verdict = classify(Some("We gather telemetry to improve the game."));
        assert_eq!(
            verdict,
            KeywordVerdict::Uncertain(vec!["telemetry".to_string()])
        );
        assert_eq!(verdict.to_string(), "Uncertain - manual review: telemetry");
        assert_eq!(verdict.matches(), ["telemetry".to_string()]);
        assert!(KeywordVerdict::Clear.matches().is_empty());
    }

    #[test]
    fn word_boundaries_are_respected() {
        assert_eq!(classify(Some("The vacation was great.")), KeywordVerdict::Clear);
        assert_eq!(classify(Some("Kernels of corn.")), KeywordVerdict::Clear);
        assert_eq!(
            classify(Some("Valve Anti-Cheat (VAC) is enabled.")),
            KeywordVerdict::Detected(vec!["VAC".to_string()])
        );
    }

    #[test]
    fn multiword_terms_span_line_breaks() {
        assert_eq!(
            classify(Some("We never share personal\ndata.")),
            KeywordVerdict::Uncertain(vec!["personal data".to_string()])
        );
    }

    #[test]
    fn neutral_text_is_clear() {
        assert_eq!(
            classify(Some("You may install this software on one computer.")),
            KeywordVerdict::Clear
        );
    }
}
