//! OWASP Top 10 (2021) classification rules.
//!
//! Classification precedence: CWE table, then WASC table, then
//! case-insensitive substring heuristics on the alert name. Only the
//! first tier that produces a match contributes tags; coverage is
//! best-effort and an empty tag set is a legitimate outcome — tags are
//! never invented when no rule matches.

use crate::models::finding::OwaspCategory;

use OwaspCategory::*;

/// CWE numeric id to OWASP categories. One id may implicate several
/// categories (e.g. missing authentication touches both access control
/// and identification failures).
pub fn cwe_tags(cwe: u32) -> &'static [OwaspCategory] {
    match cwe {
        // Broken access control
        22 | 23 | 284 | 285 | 352 | 425 | 639 | 732 | 200 => &[A01],
        // Cryptographic failures
        261 | 319 | 326 | 327 | 328 | 330 | 347 | 916 => &[A02],
        // Injection
        20 | 74 | 77 | 78 | 79 | 83 | 88 | 89 | 90 | 91 | 94 | 113 | 564 | 643 | 917 => &[A03],
        // Insecure design
        434 | 472 | 501 | 522 | 602 => &[A04],
        // Security misconfiguration
        16 | 260 | 520 | 611 | 614 | 756 | 942 | 1004 => &[A05],
        // Vulnerable and outdated components
        937 | 1035 | 1104 => &[A06],
        // Identification and authentication failures
        287 | 290 | 294 | 295 | 297 | 302 | 307 | 384 | 521 | 613 | 620 | 640 | 798 => &[A07],
        // Missing authentication for critical function: both access
        // control and authentication are implicated.
        306 => &[A01, A07],
        // Software and data integrity failures
        345 | 353 | 426 | 494 | 502 | 565 | 784 | 829 | 830 | 915 => &[A08],
        // Logging and monitoring failures
        117 | 223 | 532 | 778 => &[A09],
        // Server-side request forgery
        918 => &[A10],
        _ => &[],
    }
}

/// WASC threat-classification id to OWASP categories.
pub fn wasc_tags(wasc: u32) -> &'static [OwaspCategory] {
    match wasc {
        // Insufficient authentication / brute force
        1 | 11 => &[A07],
        // Insufficient authorization
        2 => &[A01],
        // Insufficient transport layer protection
        4 => &[A02],
        // Remote file inclusion, XSS, and the injection family
        5 | 8 | 19 | 20 | 23 | 25 | 28 | 29 | 30 | 31 => &[A03],
        // Cross-site request forgery
        9 => &[A01],
        // Information leakage
        13 => &[A01],
        // Server / application misconfiguration, predictable resources
        14 | 15 | 34 | 45 => &[A05],
        _ => &[],
    }
}

/// Keyword fallback over the alert name, used only when neither the CWE
/// nor the WASC id produced a match.
pub fn name_tags(name: &str) -> Vec<OwaspCategory> {
    const KEYWORDS: &[(&str, OwaspCategory)] = &[
        ("sql injection", A03),
        ("sqli", A03),
        ("xss", A03),
        ("cross-site scripting", A03),
        ("csrf", A01),
        ("ssrf", A10),
        ("authentication", A07),
        ("authorization", A01),
        ("access control", A01),
        ("misconfiguration", A05),
        ("crypto", A02),
        ("encryption", A02),
        ("ssl", A02),
        ("tls", A02),
    ];

    let lowered = name.to_lowercase();
    let mut tags: Vec<OwaspCategory> = KEYWORDS
        .iter()
        .filter(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, tag)| *tag)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

/// Classify an alert given its optional CWE id, optional WASC id, and
/// free-text name. Returns a sorted, deduplicated tag set; empty when
/// nothing matched.
pub fn classify(cwe: Option<u32>, wasc: Option<u32>, name: &str) -> Vec<OwaspCategory> {
    if let Some(id) = cwe {
        let tags = cwe_tags(id);
        if !tags.is_empty() {
            return dedup(tags.to_vec());
        }
    }
    if let Some(id) = wasc {
        let tags = wasc_tags(id);
        if !tags.is_empty() {
            return dedup(tags.to_vec());
        }
    }
    name_tags(name)
}

/// Classify over a list of CWE ids (static-analysis findings carry zero
/// or more). Union across all ids, deduplicated.
pub fn classify_cwes(cwes: &[u32]) -> Vec<OwaspCategory> {
    let mut tags: Vec<OwaspCategory> = cwes.iter().flat_map(|id| cwe_tags(*id)).copied().collect();
    tags.sort();
    tags.dedup();
    tags
}

fn dedup(mut tags: Vec<OwaspCategory>) -> Vec<OwaspCategory> {
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_injection_cwe_maps_to_a03() {
        assert_eq!(cwe_tags(89), &[A03]);
        assert_eq!(classify(Some(89), None, "anything"), vec![A03]);
    }

    #[test]
    fn ssrf_cwe_maps_to_a10() {
        assert_eq!(cwe_tags(918), &[A10]);
        assert_eq!(classify(Some(918), None, ""), vec![A10]);
    }

    #[test]
    fn missing_authentication_maps_to_both_a01_and_a07() {
        let tags = classify(Some(306), None, "Missing Authentication");
        assert_eq!(tags, vec![A01, A07]);
    }

    #[test]
    fn cwe_takes_precedence_over_wasc_and_name() {
        // CWE 89 (A03) wins over WASC 9 (A01) and a misleading name.
        let tags = classify(Some(89), Some(9), "csrf issue");
        assert_eq!(tags, vec![A03]);
    }

    #[test]
    fn wasc_used_when_cwe_unmapped() {
        // CWE 99999 has no table entry, WASC 19 is SQL injection.
        let tags = classify(Some(99_999), Some(19), "whatever");
        assert_eq!(tags, vec![A03]);
    }

    #[test]
    fn name_fallback_when_no_ids_match() {
        let tags = classify(None, None, "Reflected Cross-Site Scripting");
        assert_eq!(tags, vec![A03]);
    }

    #[test]
    fn name_fallback_is_case_insensitive() {
        assert_eq!(name_tags("SQL Injection via query param"), vec![A03]);
        assert_eq!(name_tags("Weak TLS configuration"), vec![A02]);
    }

    #[test]
    fn name_matching_multiple_keywords_unions() {
        // "authorization" -> A01, "tls" -> A02; union, sorted, deduped.
        let tags = name_tags("authorization over plain TLS downgrade");
        assert_eq!(tags, vec![A01, A02]);
    }

    #[test]
    fn unmatched_everything_yields_empty_set() {
        assert!(classify(None, None, "Timestamp Disclosure").is_empty());
        assert!(classify(Some(99_999), Some(99), "benign").is_empty());
    }

    #[test]
    fn classify_cwes_unions_and_dedups() {
        let tags = classify_cwes(&[89, 79, 918]);
        assert_eq!(tags, vec![A03, A10]);
    }

    #[test]
    fn classify_cwes_empty_input_empty_output() {
        assert!(classify_cwes(&[]).is_empty());
    }

    #[test]
    fn no_duplicate_tags_ever() {
        let tags = name_tags("sqli sql injection xss");
        assert_eq!(tags, vec![A03]);
    }
}
