// ============================================================
// ENCODING DETECTOR
// ============================================================
// Guess the text encoding of a byte sample and build the fallback order

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Result of encoding detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingGuess {
    pub encoding: &'static Encoding,

    /// 0.0 (guess) to 1.0 (certain)
    pub confidence: f32,
}

/// Byte-level encoding detector
pub struct EncodingDetector;

impl EncodingDetector {
    /// Detect the encoding of the first bytes of a file
    pub fn detect(sample: &[u8]) -> EncodingGuess {
        if let Some((encoding, _bom_len)) = Encoding::for_bom(sample) {
            return EncodingGuess {
                encoding,
                confidence: 1.0,
            };
        }

        if let Some(multibyte) = Self::utf8_multibyte_chars(sample) {
            return EncodingGuess {
                encoding: UTF_8,
                confidence: Self::utf8_confidence(multibyte),
            };
        }

        EncodingGuess {
            encoding: WINDOWS_1252,
            confidence: Self::single_byte_confidence(sample),
        }
    }

    /// Ordered, de-duplicated list of encodings to attempt.
    ///
    /// Labels resolve through the WHATWG table, so `latin1`, `iso-8859-1`
    /// and `windows-1252` collapse into a single windows-1252 attempt.
    /// Unknown labels are skipped.
    pub fn candidates<S: AsRef<str>>(
        detected: Option<&'static Encoding>,
        fallback_labels: &[S],
    ) -> Vec<&'static Encoding> {
        let mut candidates: Vec<&'static Encoding> = Vec::with_capacity(fallback_labels.len() + 1);

        let fallbacks = fallback_labels
            .iter()
            .filter_map(|label| Encoding::for_label(label.as_ref().trim().as_bytes()));

        for encoding in detected.into_iter().chain(fallbacks) {
            if !candidates.contains(&encoding) {
                candidates.push(encoding);
            }
        }

        candidates
    }

    /// Count multi-byte UTF-8 sequences, or None when the sample is not UTF-8.
    /// A sequence cut off by the end of the sample is tolerated.
    fn utf8_multibyte_chars(sample: &[u8]) -> Option<usize> {
        let valid = match std::str::from_utf8(sample) {
            Ok(text) => text,
            Err(e) if e.error_len().is_none() => {
                // Truncated tail only
                std::str::from_utf8(&sample[..e.valid_up_to()]).ok()?
            }
            Err(_) => return None,
        };

        Some(valid.chars().filter(|c| !c.is_ascii()).count())
    }

    /// Confidence grows with each multi-byte sequence seen; pure ASCII is certain.
    fn utf8_confidence(multibyte: usize) -> f32 {
        if multibyte == 0 {
            return 1.0;
        }
        if multibyte >= 6 {
            return 0.99;
        }
        1.0 - 0.99 * 0.5f32.powi(multibyte as i32)
    }

    /// Share of high bytes that look like Latin-1 letters, scaled into 0.5..0.95
    fn single_byte_confidence(sample: &[u8]) -> f32 {
        let mut high = 0usize;
        let mut letter_like = 0usize;
        let mut undefined = false;

        for &byte in sample.iter().filter(|b| **b >= 0x80) {
            high += 1;
            match byte {
                0x81 | 0x8D | 0x8F | 0x90 | 0x9D => undefined = true,
                0xAA | 0xBA => letter_like += 1,
                0xD7 | 0xF7 => {}
                0xC0..=0xFF => letter_like += 1,
                _ => {}
            }
        }

        if high == 0 {
            return 0.5;
        }

        let ratio = letter_like as f32 / high as f32;
        let confidence = 0.5 + 0.45 * ratio;
        if undefined {
            confidence * 0.5
        } else {
            confidence
        }
    }
}

/// Decode a whole buffer, failing on any malformed sequence.
/// A leading byte-order mark is removed.
pub fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&*text);
    Some(text.to_string())
}
