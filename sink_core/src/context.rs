/**
 * Context-carrying submission (spec §5).
 *
 * Instead of relying on implicit task-local storage, a caller that wants to
 * keep cross-cutting values (today, just the token) attached to a single
 * call site builds a `Context` explicitly and passes it alongside the
 * records. Explicit beats implicit here: a `Context` is an ordinary value,
 * not ambient state a reader has to go hunting for.
 */
use std::collections::HashMap;

/// Well-known key under which the submission token is stored. Spec §6
/// requires this to carry the same string value as the transport's token
/// HTTP header name, so a caller who places a token under this key in a
/// `Context` and one who sets it as an HTTP header are naming the same
/// thing. `sink::SinkBuilder` defaults `token_header` to this constant
/// rather than a separate literal, so the two can't drift apart.
pub const TOKEN_CTX_KEY: &str = "X-Sink-Token";

/// A small bag of string values threaded through a `_with_context` call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<&'static str, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the submission token under `TOKEN_CTX_KEY`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.values.insert(TOKEN_CTX_KEY, token.into());
        self
    }

    /// The token this context carries, if any.
    pub fn token(&self) -> Option<&str> {
        self.values.get(TOKEN_CTX_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_token() {
        assert_eq!(Context::new().token(), None);
    }

    #[test]
    fn with_token_round_trips() {
        let ctx = Context::new().with_token("abc123");
        assert_eq!(ctx.token(), Some("abc123"));
    }

    #[test]
    fn with_token_overwrites() {
        let ctx = Context::new().with_token("first").with_token("second");
        assert_eq!(ctx.token(), Some("second"));
    }
}
