use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::Digest;
use sha2::Sha256;

/// Unreserved characters per RFC 7636 §4.1: `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`.
const VERIFIER_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const VERIFIER_LEN: usize = 128;
const STATE_LEN: usize = 32;

/// The verifier/challenge pair for one authorization attempt (spec §3 "PKCE
/// / OAuth state"). `verifier` is retained client-side until the token
/// exchange; only `challenge` is sent in the authorization URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceParameters {
    pub verifier: String,
    pub challenge: String,
    pub method: &'static str,
}

/// Draw `len` characters from [`VERIFIER_ALPHABET`] using raw random bytes
/// rather than a weighted-distribution helper, to stay clear of `rand`'s
/// distribution-API churn across semver-major releases.
fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut raw = vec![0u8; len];
    rng.fill_bytes(&mut raw);
    raw.iter()
        .map(|b| VERIFIER_ALPHABET[(*b as usize) % VERIFIER_ALPHABET.len()] as char)
        .collect()
}

fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generate a fresh PKCE verifier/challenge pair (spec §4.6 "Registered →
/// AuthorizationPending"): a 128-character verifier over the RFC 7636
/// unreserved alphabet, challenge = `BASE64URL(SHA256(verifier))`.
pub fn generate() -> PkceParameters {
    let verifier = random_string(VERIFIER_LEN);
    let challenge = challenge_for(&verifier);
    PkceParameters {
        verifier,
        challenge,
        method: "S256",
    }
}

/// Generate a CSRF state token: 32 characters over the same alphabet as the
/// PKCE verifier (original_source doesn't constrain the state alphabet
/// beyond "opaque string"; reusing the verifier alphabet keeps it URL-safe
/// with no percent-encoding needed in the query string).
pub fn generate_state_token() -> String {
    random_string(STATE_LEN)
}

/// Constant-time equality for state/CSRF comparison (spec §4.6 "enforce
/// constant-time state equality"). Unequal lengths are rejected up front —
/// that branch leaks only the *length* of an attacker-supplied value, never
/// which bytes of the real secret matched.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
