//! Logging setup shared by both binaries.
//!
//! Everything written to stderr passes through [`RedactingWriter`], which
//! masks Telegram bot tokens and Dadata `Token ...` credentials.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "domofomka=info,domofomka_api=info,domofomka_bot=info,\
tower_http=info,sqlx=warn,teloxide=info,warn";

/// Filter used when `DEBUG_MODE` is enabled and `RUST_LOG` is unset.
pub const DEBUG_FILTER: &str = "domofomka=debug,domofomka_api=debug,domofomka_bot=debug,\
tower_http=debug,sqlx=info,teloxide=debug,info";

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    telegram_url: Regex,
    telegram_bare: Regex,
    telegram_prefixed: Regex,
    dadata_token: Regex,
}

impl RedactionPatterns {
    /// Compile all patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            telegram_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            telegram_bare: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            telegram_prefixed: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            dadata_token: Regex::new(r"(Token )[A-Za-z0-9]+")?,
        })
    }

    /// Mask every secret found in `input`
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self
            .telegram_url
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self
            .telegram_bare
            .replace_all(&output, "[TELEGRAM_TOKEN]");
        let output = self
            .telegram_prefixed
            .replace_all(&output, "$1[TELEGRAM_TOKEN]");
        self.dadata_token
            .replace_all(&output, "$1[MASKED]")
            .into_owned()
    }
}

/// Writer that redacts secrets before forwarding bytes
pub struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    /// Wrap `inner`
    pub const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.inner.write_all(self.patterns.redact(&s).as_bytes())?;
        // Report the original length; the redacted one may differ.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), Arc::clone(&self.patterns))
    }
}

/// Whether `DEBUG_MODE` asks for verbose logs.
#[must_use]
pub fn debug_mode() -> bool {
    std::env::var("DEBUG_MODE")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true"))
        .unwrap_or(false)
}

/// Install the global subscriber with redaction.
///
/// # Errors
///
/// Returns an error if a redaction pattern fails to compile.
pub fn init_logging() -> Result<(), regex::Error> {
    let patterns = Arc::new(RedactionPatterns::new()?);
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let fallback = if debug_mode() {
        DEBUG_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> RedactionPatterns {
        RedactionPatterns::new().expect("patterns compile")
    }

    #[test]
    fn telegram_url_token_is_masked() {
        let line = "GET https://api.telegram.org/bot123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsawq/getMe failed";
        let redacted = patterns().redact(line);
        assert!(!redacted.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsawq"));
        assert!(redacted.contains("/bot[TELEGRAM_TOKEN]/getMe"));
    }

    #[test]
    fn bare_telegram_token_is_masked() {
        let redacted = patterns().redact("token=123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsawq");
        assert_eq!(redacted, "token=[TELEGRAM_TOKEN]");
    }

    #[test]
    fn dadata_token_is_masked() {
        let redacted = patterns().redact("authorization: Token 0a1b2c3d4e5f");
        assert_eq!(redacted, "authorization: Token [MASKED]");
    }

    #[test]
    fn writer_forwards_redacted_bytes() {
        let mut sink = Vec::new();
        {
            let mut writer = RedactingWriter::new(&mut sink, Arc::new(patterns()));
            let input = b"Token abc123 sent";
            let written = writer.write(input).expect("write");
            assert_eq!(written, input.len());
        }
        assert_eq!(String::from_utf8(sink).expect("utf8"), "Token [MASKED] sent");
    }
}
