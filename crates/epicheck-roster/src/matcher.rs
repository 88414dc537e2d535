//! Roster matching by ordered precedence rules.
//!
//! The remote system returns logins in several inconsistent shapes (bare
//! login, login with domain suffix, full email, display title), so a single
//! equality check is not enough. Matching tries a fixed precedence list and
//! the first rule with any hit decides the outcome. Within the winning
//! rule, more than one distinct roster entry is an ambiguity and is
//! rejected rather than resolved to the first hit.

use crate::normalize::NormalizedLogin;
use crate::types::{Roster, Student};

// ---------------------------------------------------------------------------
// MatchOutcome / ScanResult
// ---------------------------------------------------------------------------

/// Result of matching one normalized identifier against a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Exactly one roster entry satisfied the winning rule.
    Matched(Student),
    /// No rule matched any entry.
    NotFound,
    /// The winning rule matched more than one entry; their logins are
    /// listed for diagnostic display.
    Ambiguous { logins: Vec<String> },
}

/// One scan's match record: what was scanned, what it normalized to, and
/// how it resolved. Transient, produced per scan, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub raw_input: String,
    pub normalized: NormalizedLogin,
    pub outcome: MatchOutcome,
}

impl ScanResult {
    pub fn matched_student(&self) -> Option<&Student> {
        match &self.outcome {
            MatchOutcome::Matched(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// match_roster
// ---------------------------------------------------------------------------

/// Match `candidates` against `roster` under the fixed precedence list.
///
/// Rules, in order:
/// 1. `login == bare`
/// 2. `login == raw`
/// 3. `email == raw`
/// 4. `login == bare@{domain}`
/// 5. `login-before-@ == bare`
///
/// `domain` is the institutional email domain (e.g. `school.domain`),
/// configured by the caller.
pub fn match_roster(candidates: &NormalizedLogin, roster: &Roster, domain: &str) -> MatchOutcome {
    let with_domain = format!("{}@{}", candidates.bare, domain);

    let rules: [&dyn Fn(&Student) -> bool; 5] = [
        &|s| s.login == candidates.bare,
        &|s| s.login == candidates.raw,
        &|s| s.email.as_deref() == Some(candidates.raw.as_str()),
        &|s| s.login == with_domain,
        &|s| s.bare_login() == candidates.bare,
    ];

    for rule in rules {
        let hits: Vec<&Student> = roster.students.iter().filter(|&s| rule(s)).collect();
        match hits.as_slice() {
            [] => continue,
            [one] => return MatchOutcome::Matched((*one).clone()),
            many => {
                return MatchOutcome::Ambiguous {
                    logins: many.iter().map(|s| s.login.clone()).collect(),
                }
            }
        }
    }

    MatchOutcome::NotFound
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::PresenceStatus;

    const DOMAIN: &str = "school.domain";

    fn student(login: &str, email: Option<&str>) -> Student {
        Student {
            login: login.to_string(),
            email: email.map(str::to_string),
            display_name: None,
            presence: PresenceStatus::Unknown,
        }
    }

    fn matched_login(outcome: &MatchOutcome) -> &str {
        match outcome {
            MatchOutcome::Matched(s) => &s.login,
            other => panic!("expected Matched, got {other:?}"),
        }
    }

    #[test]
    fn rule1_exact_bare_login() {
        let roster = Roster::new(vec![student("marie.curie", None)]);
        let out = match_roster(&normalize("marie.curie@school.domain"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "marie.curie");
    }

    #[test]
    fn rule2_login_field_holds_full_email() {
        let roster = Roster::new(vec![student(
            "jean.dupont@school.domain",
            Some("jean.dupont@school.domain"),
        )]);
        let out = match_roster(&normalize("jean.dupont@school.domain"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "jean.dupont@school.domain");
    }

    #[test]
    fn rule3_email_field_matches_raw() {
        // Login is an internal alias; only the email field carries the
        // scanned address.
        let roster = Roster::new(vec![student("jdupont2", Some("jean.dupont@school.domain"))]);
        let out = match_roster(&normalize("jean.dupont@school.domain"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "jdupont2");
    }

    #[test]
    fn rule4_bare_scan_against_domain_suffixed_login() {
        let roster = Roster::new(vec![student("marie.curie@school.domain", None)]);
        let out = match_roster(&normalize("marie.curie"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "marie.curie@school.domain");
    }

    #[test]
    fn rule5_domain_suffixed_login_with_foreign_domain_scan() {
        // Roster login carries a different suffix than the scan; only the
        // before-@ comparison can bridge them.
        let roster = Roster::new(vec![student("marie.curie@old.domain", None)]);
        let out = match_roster(&normalize("marie.curie@school.domain"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "marie.curie@old.domain");
    }

    #[test]
    fn every_roster_login_matches_itself() {
        let roster = Roster::new(vec![
            student("marie.curie", None),
            student("jean.dupont@school.domain", Some("jean.dupont@school.domain")),
            student("jdupont2", Some("ada.lovelace@school.domain")),
        ]);
        for s in &roster.students {
            let out = match_roster(&normalize(&s.login), &roster, DOMAIN);
            assert_eq!(matched_login(&out), s.login, "self-match failed for {}", s.login);
        }
    }

    #[test]
    fn every_roster_email_matches_its_owner() {
        let roster = Roster::new(vec![
            student("marie.curie", Some("marie.curie@school.domain")),
            student("jdupont2", Some("jean.dupont@school.domain")),
        ]);
        for s in &roster.students {
            let email = s.email.clone().unwrap();
            let out = match_roster(&normalize(&email), &roster, DOMAIN);
            assert_eq!(matched_login(&out), s.login, "email match failed for {email}");
        }
    }

    #[test]
    fn empty_roster_is_not_found() {
        let out = match_roster(&normalize("anyone"), &Roster::default(), DOMAIN);
        assert_eq!(out, MatchOutcome::NotFound);
    }

    #[test]
    fn unknown_login_is_not_found() {
        let roster = Roster::new(vec![student("marie.curie", None)]);
        let out = match_roster(&normalize("nobody.here"), &roster, DOMAIN);
        assert_eq!(out, MatchOutcome::NotFound);
    }

    #[test]
    fn duplicate_logins_are_ambiguous_not_first_wins() {
        let roster = Roster::new(vec![
            student("marie.curie", None),
            student("marie.curie", Some("other@school.domain")),
        ]);
        let out = match_roster(&normalize("marie.curie"), &roster, DOMAIN);
        match out {
            MatchOutcome::Ambiguous { logins } => assert_eq!(logins.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn collision_across_domain_suffixes_is_ambiguous() {
        // Two distinct remote entries that collapse to the same bare login
        // under rule 5.
        let roster = Roster::new(vec![
            student("marie.curie@school.domain", None),
            student("marie.curie@old.domain", None),
        ]);
        let out = match_roster(&normalize("marie.curie"), &roster, DOMAIN);
        match out {
            MatchOutcome::Ambiguous { logins } => {
                assert!(logins.contains(&"marie.curie@school.domain".to_string()));
                assert!(logins.contains(&"marie.curie@old.domain".to_string()));
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn earlier_rule_exact_hit_beats_later_rule_collision() {
        // "marie.curie" matches entry 0 exactly (rule 1) even though rule 5
        // would also hit entry 1; precedence stops at the first rule with
        // hits.
        let roster = Roster::new(vec![
            student("marie.curie", None),
            student("marie.curie@old.domain", None),
        ]);
        let out = match_roster(&normalize("marie.curie"), &roster, DOMAIN);
        assert_eq!(matched_login(&out), "marie.curie");
    }
}
