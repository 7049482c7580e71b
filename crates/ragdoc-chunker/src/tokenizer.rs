//! BPE token encoding backed by `tiktoken-rs`.
//!
//! Every size decision in the chunker goes through a [`TokenEncoder`], so the
//! helpers here ([`tail_text`], [`token_windows`]) work on any encoder and
//! handle token boundaries that fall inside a multi-byte character.

use ragdoc_core::{ChunkError, ConfigError, TokenEncoder};
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Encoding used when none is configured.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Encodings bundled with `tiktoken-rs`.
pub const SUPPORTED_ENCODINGS: &[&str] = &["cl100k_base", "o200k_base", "p50k_base", "r50k_base"];

/// [`TokenEncoder`] over one of the OpenAI BPE vocabularies.
pub struct TiktokenEncoder {
    name: String,
    bpe: CoreBPE,
}

impl TiktokenEncoder {
    /// Load an encoding by name.
    ///
    /// Fails with [`ConfigError::Encoder`] for unknown names or when the
    /// vocabulary cannot be loaded.
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        let loaded = match name {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(ConfigError::Encoder(format!(
                    "unknown encoding '{other}', expected one of: {}",
                    SUPPORTED_ENCODINGS.join(", ")
                )))
            }
        };
        let bpe = loaded.map_err(|e| ConfigError::Encoder(format!("{name}: {e}")))?;

        debug!("Loaded token encoding {}", name);
        Ok(Self {
            name: name.to_string(),
            bpe,
        })
    }

    /// The `cl100k_base` encoding.
    pub fn cl100k() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_ENCODING)
    }
}

impl std::fmt::Debug for TiktokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenEncoder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TokenEncoder for TiktokenEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        // Special-token text such as "<|endoftext|>" is treated as plain text.
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError> {
        self.bpe
            .decode(tokens.iter().map(|&t| t as _).collect())
            .map_err(|e| ChunkError::Encoding(e.to_string()))
    }
}

/// Most tokens one UTF-8 character can span in a byte-level BPE vocabulary,
/// minus one: the number of tokens a boundary fix may add or drop.
pub const MAX_BOUNDARY_SKIP: usize = 3;

/// Decode the last `n` tokens of `tokens`, moving the start off a split
/// character.
///
/// A slice cut from the middle of an encoding may start inside a multi-byte
/// character. Up to [`MAX_BOUNDARY_SKIP`] leading tokens are dropped first;
/// if no non-empty suffix decodes, the start moves back by up to as many
/// tokens instead. Any other decoder failure is returned.
pub fn decode_tail(
    encoder: &dyn TokenEncoder,
    tokens: &[u32],
    n: usize,
) -> Result<String, ChunkError> {
    let n = n.min(tokens.len());
    let start = tokens.len() - n;
    let mut last_error = None;

    let forward = (start..tokens.len()).take(MAX_BOUNDARY_SKIP + 1);
    let backward = (start.saturating_sub(MAX_BOUNDARY_SKIP)..start).rev();
    for from in forward.chain(backward) {
        match encoder.decode(&tokens[from..]) {
            Ok(text) => return Ok(text),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| ChunkError::Encoding("no tokens to decode".to_string())))
}

/// The last `n` tokens of `text`, decoded back to text.
///
/// Returns the whole text when it has at most `n` tokens, and an empty string
/// when `n` is zero.
pub fn tail_text(
    encoder: &dyn TokenEncoder,
    text: &str,
    n: usize,
) -> Result<String, ChunkError> {
    if n == 0 {
        return Ok(String::new());
    }
    let tokens = encoder.encode(text);
    if tokens.len() <= n {
        return Ok(text.to_string());
    }
    decode_tail(encoder, &tokens, n)
}

/// Split `text` into consecutive pieces of at most `window` tokens each.
///
/// Each piece is decoded back to text and trimmed; blank pieces are skipped.
/// Window ends are moved back until they fall on a character boundary and the
/// trimmed piece re-encodes within `window` tokens. When a single character
/// spans more tokens than the window, the end moves forward instead.
pub fn token_windows(
    encoder: &dyn TokenEncoder,
    text: &str,
    window: usize,
) -> Result<Vec<String>, ChunkError> {
    let window = window.max(1);
    let tokens = encoder.encode(text);
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < tokens.len() {
        let target = (start + window).min(tokens.len());
        let (end, piece) = window_end(encoder, &tokens, start, target, window)?;

        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = end;
    }

    Ok(pieces)
}

fn window_end(
    encoder: &dyn TokenEncoder,
    tokens: &[u32],
    start: usize,
    target: usize,
    window: usize,
) -> Result<(usize, String), ChunkError> {
    for end in (start + 1..=target).rev() {
        if let Ok(piece) = encoder.decode(&tokens[start..end]) {
            if end == start + 1 || encoder.count_tokens(piece.trim()) <= window {
                return Ok((end, piece));
            }
        }
    }
    for end in target + 1..=tokens.len() {
        if let Ok(piece) = encoder.decode(&tokens[start..end]) {
            return Ok((end, piece));
        }
    }
    Err(ChunkError::Encoding(format!(
        "no decodable token window starting at token {start}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> TiktokenEncoder {
        TiktokenEncoder::cl100k().unwrap()
    }

    #[test]
    fn test_unknown_encoding_is_config_error() {
        let err = TiktokenEncoder::new("gpt-9000").unwrap_err();
        assert!(matches!(err, ConfigError::Encoder(_)));
        assert!(err.to_string().contains("cl100k_base"));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let enc = encoder();
        let text = "Structure-aware chunking, with ünïcödé and emoji 🦀.";
        let tokens = enc.encode(text);
        assert!(!tokens.is_empty());
        assert_eq!(enc.decode(&tokens).unwrap(), text);
        assert_eq!(enc.count_tokens(text), tokens.len());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = encoder();
        let text = "The same text always yields the same tokens.";
        assert_eq!(enc.encode(text), enc.encode(text));
        assert_eq!(enc.name(), "cl100k_base");
    }

    #[test]
    fn test_special_tokens_encoded_as_text() {
        let enc = encoder();
        let text = "before <|endoftext|> after";
        assert_eq!(enc.decode(&enc.encode(text)).unwrap(), text);
        assert!(enc.count_tokens(text) > 3);
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        let enc = encoder();
        assert_eq!(enc.count_tokens(""), 0);
    }

    #[test]
    fn test_tail_text_returns_whole_short_text() {
        let enc = encoder();
        assert_eq!(tail_text(&enc, "short text", 50).unwrap(), "short text");
        assert_eq!(tail_text(&enc, "short text", 0).unwrap(), "");
    }

    #[test]
    fn test_tail_text_takes_last_tokens() {
        let enc = encoder();
        let text = "one two three four five six seven eight nine ten";
        let tail = tail_text(&enc, text, 3).unwrap();
        assert_eq!(tail, " eight nine ten");
        assert!(text.ends_with(&tail));
    }

    #[test]
    fn test_tail_text_skips_split_characters() {
        let enc = encoder();
        let text = "漢字漢字漢字漢字漢字漢字";
        for n in 1..enc.count_tokens(text) {
            let tail = tail_text(&enc, text, n).unwrap();
            assert!(text.ends_with(&tail), "tail {tail:?} for n={n}");
        }
    }

    /// One token per byte; decoding always fails.
    struct BrokenDecoder;

    impl TokenEncoder for BrokenDecoder {
        fn name(&self) -> &str {
            "broken"
        }

        fn encode(&self, text: &str) -> Vec<u32> {
            text.bytes().map(u32::from).collect()
        }

        fn decode(&self, _tokens: &[u32]) -> Result<String, ChunkError> {
            Err(ChunkError::Encoding("decoder unavailable".to_string()))
        }
    }

    #[test]
    fn test_tail_text_propagates_decoder_failure() {
        let result = tail_text(&BrokenDecoder, "a longer piece of text", 3);
        assert!(matches!(result, Err(ChunkError::Encoding(_))));
    }

    #[test]
    fn test_tail_text_short_text_needs_no_decode() {
        assert_eq!(tail_text(&BrokenDecoder, "ab", 3).unwrap(), "ab");
    }

    #[test]
    fn test_token_windows_respect_window() {
        let enc = encoder();
        let text = "word ".repeat(250);
        let pieces = token_windows(&enc, &text, 40).unwrap();

        assert!(pieces.len() >= 6);
        for piece in &pieces {
            assert!(enc.count_tokens(piece) <= 40, "piece over window: {piece:?}");
            assert!(!piece.is_empty());
        }
        let words: usize = pieces.iter().map(|p| p.split_whitespace().count()).sum();
        assert_eq!(words, 250);
    }

    #[test]
    fn test_token_windows_keep_multibyte_text_intact() {
        let enc = encoder();
        let text = "数据分块".repeat(30);
        let pieces = token_windows(&enc, &text, 5).unwrap();
        assert_eq!(pieces.concat(), text);
    }

    #[test]
    fn test_token_windows_empty_text() {
        let enc = encoder();
        assert!(token_windows(&enc, "", 10).unwrap().is_empty());
    }
}
