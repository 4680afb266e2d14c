//! Mission-level abstraction helpers, ported from
//! `original_source/.../step1_agents/base_step1.py`
//! (`extract_mission_language`, `is_implementation_detail`,
//! `is_prevention_language`). These are deterministic keyword checks, not
//! LLM calls — every Step 1 agent runs its own output through them before
//! accepting it, matching the original's per-agent abstraction guard.

const IMPLEMENTATION_KEYWORDS: &[&str] = &[
    "algorithm", "protocol", "api", "database", "firewall",
    "encryption key", "tls", "ssl", "http", "tcp/ip",
    "code", "function", "method", "class", "module",
    "sql", "nosql", "rest", "soap", "graphql",
    "aws", "azure", "docker", "kubernetes",
    "patch", "update", "version", "library",
];

const PREVENTION_KEYWORDS: &[&str] = &[
    "prevent", "mitigate", "defend", "protect against",
    "security control", "countermeasure", "safeguard",
    "must not", "shall not", "avoid", "ensure",
    "validate", "verify", "authenticate", "authorize",
];

const MISSION_LANGUAGE_REPLACEMENTS: &[(&str, &str)] = &[
    ("authentication system", "identity verification capability"),
    ("authorization system", "access control capability"),
    ("encryption", "data protection capability"),
    ("API", "service interface"),
    ("database", "information store"),
    ("network", "communication infrastructure"),
    ("fails to", "operates without"),
    ("unable to", "lacks capability for"),
    ("cannot", "does not have ability to"),
    ("compromised by", "operates in compromised state due to"),
    ("SQL injection", "data integrity compromise"),
    ("XSS attack", "user interface compromise"),
    ("DDoS", "availability disruption"),
    ("malware", "system compromise"),
    ("phishing", "user deception"),
];

/// Returns `true` if `text` names an implementation-level mechanism
/// rather than a mission-level state or capability.
#[must_use]
pub fn is_implementation_detail(text: &str) -> bool {
    let lower = text.to_lowercase();
    IMPLEMENTATION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Returns `true` if `text` reads as prevention/mitigation language (a
/// Step 2 control concern) rather than a Step 1 loss/hazard statement.
#[must_use]
pub fn is_prevention_language(text: &str) -> bool {
    let lower = text.to_lowercase();
    PREVENTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Rewrites common technical/action phrasing into mission-level language.
#[must_use]
pub fn extract_mission_language(text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, replacement) in MISSION_LANGUAGE_REPLACEMENTS {
        result = result.replace(pattern, replacement);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_implementation_keywords_case_insensitively() {
        assert!(is_implementation_detail("The API returns a 500 error"));
        assert!(is_implementation_detail("uses TLS for transport"));
        assert!(!is_implementation_detail("the mission fails to deliver value"));
    }

    #[test]
    fn detects_prevention_language() {
        assert!(is_prevention_language("the system must prevent unauthorized access"));
        assert!(!is_prevention_language("the system loses the ability to serve patients"));
    }

    #[test]
    fn rewrites_technical_phrases_to_mission_language() {
        let rewritten = extract_mission_language("the authentication system fails to verify users");
        assert!(rewritten.contains("identity verification capability"));
        assert!(rewritten.contains("operates without"));
    }
}
