//! Charset detection for streams opened without an explicit encoding.

use crate::{
    aliases::{AliasRegistry, UnicodeFamily},
    error::{Error, Result},
    options::EncodingSource,
    stream::{Detected, INTERNAL_ENCODING},
};

/// Identifies a byte-order mark at the start of `bytes`.
///
/// UTF-32 marks are checked before UTF-16 ones, since the little-endian
/// UTF-32 mark starts with the little-endian UTF-16 mark.
#[must_use]
pub fn sniff_bom(bytes: &[u8]) -> Option<UnicodeFamily> {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => Some(UnicodeFamily::Utf8),
        [0x00, 0x00, 0xFE, 0xFF, ..] => Some(UnicodeFamily::Utf32Be),
        [0xFF, 0xFE, 0x00, 0x00, ..] => Some(UnicodeFamily::Utf32Le),
        [0xFE, 0xFF, ..] => Some(UnicodeFamily::Utf16Be),
        [0xFF, 0xFE, ..] => Some(UnicodeFamily::Utf16Le),
        _ => None,
    }
}

/// Marks a stream in `family` may start with. The byte-order-neutral forms
/// accept both of their variants' marks.
fn marks(family: UnicodeFamily) -> [Option<&'static [u8]>; 2] {
    match family {
        UnicodeFamily::Utf16 => [UnicodeFamily::Utf16Be.bom(), UnicodeFamily::Utf16Le.bom()],
        UnicodeFamily::Utf32 => [UnicodeFamily::Utf32Be.bom(), UnicodeFamily::Utf32Le.bom()],
        family => [family.bom(), None],
    }
}

/// Whether `bytes` could still grow into a byte-order mark of `family`, or
/// of any family while the charset is unknown.
pub(crate) fn is_partial_bom(bytes: &[u8], family: Option<UnicodeFamily>) -> bool {
    let is_prefix = |bom: &[u8]| bytes.len() < bom.len() && bom.starts_with(bytes);
    match family {
        Some(family) => marks(family).into_iter().flatten().any(is_prefix),
        None => UnicodeFamily::ALL
            .iter()
            .filter_map(|family| family.bom())
            .any(is_prefix),
    }
}

/// Charset detector suitable for [`InputStream::new`].
///
/// A byte-order mark wins. Without one, and with the `detect` feature, the
/// bytes are handed to `chardetng`; its guess is used if the registry knows
/// the name. Otherwise the internal encoding is assumed.
///
/// # Errors
///
/// [`Error::NoCharset`] if the registry cannot resolve the chosen charset.
///
/// [`InputStream::new`]: crate::InputStream::new
pub fn detect_charset(bytes: &[u8], registry: &AliasRegistry) -> Result<Detected> {
    if let Some(family) = sniff_bom(bytes) {
        log::debug!("byte-order mark selects {}", family.name());
        let registry_id = registry
            .registry_id_from_name(family.name())
            .ok_or(Error::NoCharset)?;
        return Ok(Detected {
            registry_id,
            source: EncodingSource::BOM,
        });
    }

    #[cfg(feature = "detect")]
    {
        let mut detector = chardetng::EncodingDetector::new();
        let non_ascii = detector.feed(bytes, false);
        let (guess, confident) = detector.guess_assess(None, true);
        // Pure ASCII is valid in every candidate; only an escape-based
        // guess carries evidence then.
        if confident && (non_ascii || guess != encoding_rs::UTF_8) {
            if let Some(registry_id) = registry.registry_id_from_name(guess.name()) {
                log::debug!("content sniffing selects {}", guess.name());
                return Ok(Detected {
                    registry_id,
                    source: EncodingSource::DETECTED,
                });
            }
            log::debug!("guessed charset {} is not registered", guess.name());
        } else {
            log::debug!("no evidence for content sniffing");
        }
    }

    let registry_id = registry
        .registry_id_from_name(INTERNAL_ENCODING)
        .ok_or(Error::NoCharset)?;
    Ok(Detected {
        registry_id,
        source: EncodingSource::DEFAULT,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"\xEF\xBB\xBFabc", Some(UnicodeFamily::Utf8))]
    #[case(b"\xFE\xFF\x00a", Some(UnicodeFamily::Utf16Be))]
    #[case(b"\xFF\xFEa\x00", Some(UnicodeFamily::Utf16Le))]
    #[case(b"\x00\x00\xFE\xFF", Some(UnicodeFamily::Utf32Be))]
    #[case(b"\xFF\xFE\x00\x00", Some(UnicodeFamily::Utf32Le))]
    #[case(b"\xEF\xBB", None)]
    #[case(b"plain", None)]
    fn sniffs_marks(#[case] bytes: &[u8], #[case] expected: Option<UnicodeFamily>) {
        assert_eq!(sniff_bom(bytes), expected);
    }

    #[test]
    fn partial_marks_of_unknown_charset() {
        assert!(is_partial_bom(b"", None));
        assert!(is_partial_bom(b"\xEF\xBB", None));
        assert!(is_partial_bom(b"\xFF\xFE", None));
        assert!(is_partial_bom(b"\x00\x00\xFE", None));
        assert!(!is_partial_bom(b"\xEF\xBB\xBF", None));
        assert!(!is_partial_bom(b"\xE2", None));
        assert!(!is_partial_bom(b"\xFF\xFEa", None));
    }

    #[rstest]
    #[case(UnicodeFamily::Utf8, b"\xEF\xBB", true)]
    #[case(UnicodeFamily::Utf8, b"\x00", false)]
    #[case(UnicodeFamily::Utf8, b"\xFF", false)]
    #[case(UnicodeFamily::Utf16, b"\xFE", true)]
    #[case(UnicodeFamily::Utf16, b"\xFF", true)]
    #[case(UnicodeFamily::Utf16, b"\x00", false)]
    #[case(UnicodeFamily::Utf16Le, b"\xFE", false)]
    #[case(UnicodeFamily::Utf32, b"\xFF\xFE\x00", true)]
    #[case(UnicodeFamily::Utf32, b"\x00\x00", true)]
    #[case(UnicodeFamily::Utf32Be, b"\xFF", false)]
    #[case(UnicodeFamily::Ucs2, b"\xFE", false)]
    fn partial_marks_of_resolved_family(
        #[case] family: UnicodeFamily,
        #[case] bytes: &[u8],
        #[case] expected: bool,
    ) {
        assert_eq!(is_partial_bom(bytes, Some(family)), expected);
    }

    #[test]
    fn bom_beats_content() {
        let registry = AliasRegistry::builtin();
        let detected = detect_charset(b"\xFF\xFEh\x00i\x00", &registry).unwrap();
        assert_eq!(registry.registry_id_to_name(detected.registry_id), Some("UTF-16LE"));
        assert_eq!(detected.source, EncodingSource::BOM);
    }

    #[test]
    fn empty_registry_cannot_resolve() {
        let registry = AliasRegistry::new();
        assert_eq!(detect_charset(b"abc", &registry), Err(Error::NoCharset));
        assert_eq!(detect_charset(b"\xEF\xBB\xBF", &registry), Err(Error::NoCharset));
    }

    #[cfg(feature = "detect")]
    #[rstest]
    #[case(b"")]
    #[case(b"plain ascii text, nothing to go on")]
    fn no_evidence_falls_back_to_default(#[case] bytes: &[u8]) {
        let registry = AliasRegistry::builtin();
        let detected = detect_charset(bytes, &registry).unwrap();
        assert_eq!(registry.registry_id_to_name(detected.registry_id), Some("UTF-8"));
        assert_eq!(detected.source, EncodingSource::DEFAULT);
    }

    #[cfg(feature = "detect")]
    #[test]
    fn sniffs_escape_based_ascii() {
        let registry = AliasRegistry::builtin();
        let detected = detect_charset(b"\x1B$B$3$s$K$A$O\x1B(B", &registry).unwrap();
        assert_eq!(registry.registry_id_to_name(detected.registry_id), Some("ISO-2022-JP"));
        assert_eq!(detected.source, EncodingSource::DETECTED);
    }

    #[cfg(feature = "detect")]
    #[test]
    fn sniffs_utf8_content() {
        let registry = AliasRegistry::builtin();
        let text = "Grüße aus Köln, schöne Grüße an die Straße und über die Brücke.";
        let detected = detect_charset(text.as_bytes(), &registry).unwrap();
        assert_eq!(registry.registry_id_to_name(detected.registry_id), Some("UTF-8"));
        assert_eq!(detected.source, EncodingSource::DETECTED);
    }
}
