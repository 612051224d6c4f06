// ABOUTME: PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
// ABOUTME: Generates per-attempt code verifiers, S256 challenges, and CSRF state nonces

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::PkceChallenge,
};

/// RFC 7636 "unreserved" characters
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const VERIFIER_LENGTH: usize = 64;

const STATE_LENGTH: usize = 32;

/// Generate a fresh PKCE challenge for one authentication attempt
///
/// The verifier is random per call; the challenge is
/// `BASE64URL-NOPAD(SHA256(verifier))` as required by the S256 method.
pub fn generate_pkce_challenge() -> AuthResult<PkceChallenge> {
    let code_verifier = generate_code_verifier()?;
    let code_challenge = code_challenge_for(&code_verifier);

    Ok(PkceChallenge {
        code_verifier,
        code_challenge,
        code_challenge_method: "S256".to_string(),
    })
}

/// Generate a random code verifier (43-128 characters)
fn generate_code_verifier() -> AuthResult<String> {
    let mut rng = rand::thread_rng();
    let verifier: String = (0..VERIFIER_LENGTH)
        .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
        .collect();

    if verifier.len() < 43 || verifier.len() > 128 {
        return Err(AuthError::Pkce(format!(
            "Invalid code verifier length: {}",
            verifier.len()
        )));
    }

    Ok(verifier)
}

/// S256 challenge for a verifier
pub fn code_challenge_for(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Verify that a code verifier matches a code challenge
///
/// This is what the authorization server does at the token endpoint.
pub fn verify_pkce_challenge(verifier: &str, challenge: &str) -> bool {
    code_challenge_for(verifier) == challenge
}

/// Random nonce sent as the `state` parameter
pub fn generate_state() -> String {
    nanoid::nanoid!(STATE_LENGTH)
}
