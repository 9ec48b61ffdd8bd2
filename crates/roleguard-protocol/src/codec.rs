//! Bearer-token decoding and expiry checks.
//!
//! The guards never verify signatures; that is the backend's job on every
//! request. All they need from a token is its `exp` claim, to notice a
//! session that has gone stale before the backend starts rejecting calls.
//!
//! The [`Clock`] trait is the seam for time. Production code uses
//! [`SystemClock`]; tests pin time with [`FixedClock`] so expiry checks are
//! deterministic.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// A source of wall-clock time in Unix seconds.
///
/// `Send + Sync + 'static` because the codec is shared (behind `Arc`)
/// between every guard task.
pub trait Clock: Send + Sync + 'static {
    /// Seconds since the Unix epoch, with sub-second precision.
    fn now_unix_secs(&self) -> f64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_secs(&self) -> f64 {
        // A clock set before 1970 reads as the epoch, which makes every
        // token look valid-until-exp; the backend still rejects it.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// A clock pinned to a settable instant. Cloning shares the instant.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    secs: Arc<AtomicU64>,
}

impl FixedClock {
    pub fn at(unix_secs: u64) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(unix_secs)),
        }
    }

    pub fn set(&self, unix_secs: u64) {
        self.secs.store(unix_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix_secs(&self) -> f64 {
        self.secs.load(Ordering::SeqCst) as f64
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// The decoded payload of a bearer token.
///
/// `exp` is required: a payload without a numeric `exp` fails to decode,
/// and a token that fails to decode counts as expired.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, in Unix seconds.
    pub exp: f64,

    /// All other claims (`sub`, `iat`, role hints, ...), untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// TokenCodec
// ---------------------------------------------------------------------------

/// Decodes bearer tokens and answers "is this token expired?".
#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// A codec reading the given clock.
    pub fn new(clock: impl Clock) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// A codec reading the system clock.
    pub fn system() -> Self {
        Self::new(SystemClock)
    }

    /// Decodes the payload segment of `token` into its claims.
    ///
    /// # Errors
    /// - [`ProtocolError::MalformedToken`] unless there are exactly three
    ///   dot-separated segments
    /// - [`ProtocolError::Base64`] if the payload isn't base64
    /// - [`ProtocolError::Claims`] if it isn't a JSON object with `exp`
    pub fn decode_claims(&self, token: &str) -> Result<TokenClaims, ProtocolError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(ProtocolError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let bytes = decode_segment(segments[1])?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The token's `exp` claim, or `None` if it can't be decoded.
    pub fn expires_at(&self, token: &str) -> Option<f64> {
        self.decode_claims(token).ok().map(|claims| claims.exp)
    }

    /// Returns `true` if the token's `exp` is in the past, or if the token
    /// can't be decoded at all.
    pub fn is_expired(&self, token: &str) -> bool {
        match self.expires_at(token) {
            Some(exp) => exp < self.clock.now_unix_secs(),
            None => true,
        }
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Builds an unsigned `header.payload.signature` token carrying `claims`.
///
/// The signature segment is a fixed placeholder. Only useful where nothing
/// verifies signatures: fixtures, demos, local development.
///
/// # Errors
/// Returns [`ProtocolError::Claims`] if `claims` can't be serialized.
pub fn unsigned_token(claims: &Value) -> Result<String, ProtocolError> {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header}.{payload}.unsigned"))
}

/// JWTs use the URL-safe alphabet without padding, but tokens minted by
/// hand (or by older backends) sometimes use the standard one. Padding is
/// stripped first so both padded and unpadded input decode.
fn decode_segment(segment: &str) -> Result<Vec<u8>, ProtocolError> {
    let trimmed = segment.trim_end_matches('=');
    match URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(STANDARD_NO_PAD.decode(trimmed)?),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(FixedClock::at(NOW))
    }

    #[test]
    fn test_is_expired_past_exp_returns_true() {
        let token = token_with_payload(&format!(r#"{{"exp":{}}}"#, NOW - 1));
        assert!(codec().is_expired(&token));
    }

    #[test]
    fn test_is_expired_future_exp_returns_false() {
        let token = token_with_payload(&format!(r#"{{"exp":{},"sub":"7"}}"#, NOW + 60));
        assert!(!codec().is_expired(&token));
    }

    #[test]
    fn test_is_expired_exp_equal_to_now_is_still_valid() {
        // Strictly-less-than: a token is expired only once `exp` has passed.
        let token = token_with_payload(&format!(r#"{{"exp":{NOW}}}"#));
        assert!(!codec().is_expired(&token));
    }

    #[test]
    fn test_is_expired_fractional_exp() {
        let token = token_with_payload(&format!(r#"{{"exp":{}.5}}"#, NOW - 1));
        assert!(codec().is_expired(&token));
    }

    #[test]
    fn test_is_expired_malformed_tokens_return_true() {
        let c = codec();
        assert!(c.is_expired(""));
        assert!(c.is_expired("not-a-token"));
        assert!(c.is_expired("a.b"));
        assert!(c.is_expired("a.b.c.d"));
        assert!(c.is_expired("header.!!!notbase64!!!.sig"));
        assert!(c.is_expired(&token_with_payload("not json")));
        assert!(c.is_expired(&token_with_payload(r#"{"sub":"7"}"#)));
        assert!(c.is_expired(&token_with_payload(r#"{"exp":"tomorrow"}"#)));
    }

    #[test]
    fn test_decode_claims_accepts_padded_standard_alphabet() {
        let payload = STANDARD_NO_PAD.encode(format!(r#"{{"exp":{},"role":"a?b>"}}"#, NOW + 5));
        let token = format!("h.{payload}==.s");
        let claims = codec().decode_claims(&token).unwrap();
        assert_eq!(claims.exp, (NOW + 5) as f64);
        assert_eq!(claims.extra.get("role"), Some(&Value::String("a?b>".into())));
    }

    #[test]
    fn test_unsigned_token_decodes_back() {
        let token = unsigned_token(&serde_json::json!({ "exp": NOW + 1, "sub": "9" })).unwrap();
        let claims = codec().decode_claims(&token).unwrap();
        assert_eq!(claims.exp, (NOW + 1) as f64);
        assert_eq!(claims.extra.get("sub"), Some(&Value::String("9".into())));
    }

    #[test]
    fn test_decode_claims_wrong_segment_count_is_malformed() {
        let err = codec().decode_claims("only.two").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedToken(_)));
    }

    #[test]
    fn test_fixed_clock_advance_expires_token() {
        let clock = FixedClock::at(NOW);
        let codec = TokenCodec::new(clock.clone());
        let token = token_with_payload(&format!(r#"{{"exp":{}}}"#, NOW + 30));

        assert!(!codec.is_expired(&token));
        clock.advance(31);
        assert!(codec.is_expired(&token));
    }
}
