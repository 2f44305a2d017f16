use std::collections::HashSet;

use dailysong::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    assert!(!challenge.is_empty());

    // Same input produces same output
    assert_eq!(challenge, generate_code_challenge(verifier));

    // Different input produces different output
    assert_ne!(challenge, generate_code_challenge("different_verifier"));
}

#[test]
fn test_generate_code_challenge_known_value() {
    // RFC 7636 appendix B
    let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn test_generate_code_challenge_url_safe() {
    for _ in 0..10 {
        let challenge = generate_code_challenge(&generate_code_verifier());
        assert!(
            challenge
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "challenge contains invalid characters: {}",
            challenge
        );
        assert!(!challenge.contains('='));
    }
}

#[test]
fn test_generate_state() {
    let state = generate_state();

    // 16 bytes base64url without padding
    assert_eq!(state.len(), 22);
    assert!(
        state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}

#[test]
fn test_generate_state_unique() {
    let states: HashSet<String> = (0..100).map(|_| generate_state()).collect();
    assert_eq!(states.len(), 100);
}

#[test]
fn test_state_matches() {
    assert!(state_matches(Some("abc"), Some("abc")));
    assert!(!state_matches(Some("abc"), Some("abd")));
    assert!(!state_matches(Some("abc"), Some("ABC")));
    assert!(!state_matches(Some("abc"), None));
    assert!(!state_matches(None, Some("abc")));
    assert!(!state_matches(None, None));
}

#[test]
fn test_state_matches_rejects_empty() {
    assert!(!state_matches(Some(""), Some("")));
    assert!(!state_matches(Some(""), None));
    assert!(!state_matches(Some("abc"), Some("")));
}

#[test]
fn test_spinner() {
    let pb = spinner("Working...");
    assert_eq!(pb.message(), "Working...");
    pb.finish_and_clear();
}
