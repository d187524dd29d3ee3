use rstest::rstest;

use crate::{AliasRegistry, Error, UnicodeFamily};

#[rstest]
#[case("UTF-8", "UTF-8")]
#[case("utf8", "UTF-8")]
#[case("u.t.f.8", "UTF-8")]
#[case("  Utf_8  ", "UTF-8")]
#[case("csinvariant", "INVARIANT")]
#[case("nats-sefi-add", "NATS-SEFI-ADD")]
#[case("latin1", "ISO-8859-1")]
#[case("ISO_8859-1:1987", "ISO-8859-1")]
#[case("sjis", "Shift_JIS")]
#[case("cp1252", "windows-1252")]
#[case("ucs2", "ISO-10646-UCS-2")]
fn spellings_resolve(#[case] name: &str, #[case] canonical: &str) {
    let registry = AliasRegistry::builtin();
    let entry = registry.canonicalize(name).unwrap();
    assert_eq!(entry.name(), canonical);
}

#[test]
fn unknown_names_do_not_resolve() {
    let registry = AliasRegistry::builtin();
    assert!(registry.canonicalize("moose").is_none());
    assert!(registry.canonicalize("not-a-real-charset").is_none());
    assert_eq!(registry.registry_id_from_name("moose"), None);
}

#[test]
fn every_alias_round_trips_through_its_registry_id() {
    let registry = AliasRegistry::builtin();
    let mut seen = 0;
    for (alias, entry) in registry.aliases() {
        let resolved = registry.canonicalize(alias).unwrap();
        assert_eq!(resolved, entry, "alias {alias}");
        assert_eq!(
            registry.registry_id_to_name(resolved.registry_id()),
            Some(resolved.name())
        );
        seen += 1;
    }
    assert!(seen > 100);
}

#[test]
fn registry_ids_are_iana_mib_enums() {
    let registry = AliasRegistry::builtin();
    assert_eq!(registry.registry_id_from_name("UTF-8"), Some(106));
    assert_eq!(registry.registry_id_from_name("us-ascii"), Some(3));
    assert_eq!(registry.registry_id_from_name("UTF-16LE"), Some(1014));
    assert_eq!(registry.registry_id_to_name(2252), Some("windows-1252"));
    assert_eq!(registry.registry_id_to_name(9999), None);
}

#[rstest]
#[case("UTF-8", Some(UnicodeFamily::Utf8))]
#[case("UTF-16", Some(UnicodeFamily::Utf16))]
#[case("utf-16be", Some(UnicodeFamily::Utf16Be))]
#[case("UTF-32LE", Some(UnicodeFamily::Utf32Le))]
#[case("UCS-4", Some(UnicodeFamily::Ucs4))]
#[case("csUnicode", Some(UnicodeFamily::Ucs2))]
#[case("ISO-8859-1", None)]
#[case("GB18030", None)]
fn unicode_families(#[case] name: &str, #[case] family: Option<UnicodeFamily>) {
    let registry = AliasRegistry::builtin();
    let id = registry.registry_id_from_name(name).unwrap();
    assert_eq!(registry.unicode_family(id), family);
    assert_eq!(registry.is_unicode_family(id), family.is_some());
}

#[test]
fn loading_skips_malformed_records() {
    let mut registry = AliasRegistry::new();
    let added = registry.load(
        b"# comment\n\
          \n\
          GOOD 1000 good-alias\n\
          NOID\n\
          BADID abc alias\n\
          ZERO 0 zero-alias\n\
          OTHER\t2000\tfirst\x0Bsecond\n",
    );
    assert_eq!(added, 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.canonicalize("goodalias").unwrap().name(), "GOOD");
    assert_eq!(registry.canonicalize("second").unwrap().registry_id(), 2000);
    assert!(registry.canonicalize("NOID").is_none());
    assert!(registry.canonicalize("zero-alias").is_none());
}

#[test]
fn first_loaded_entry_wins() {
    let mut registry = AliasRegistry::new();
    registry.load(b"ONE 10 shared\nTWO 20 shared\nONE 30\n");
    assert_eq!(registry.canonicalize("shared").unwrap().name(), "ONE");
    assert_eq!(registry.canonicalize("one").unwrap().registry_id(), 10);
    assert_eq!(registry.registry_id_to_name(30), Some("ONE"));
}

#[test]
fn unload_and_reload() {
    let mut registry = AliasRegistry::builtin();
    let utf8 = registry.registry_id_from_name("UTF-8").unwrap();
    assert!(registry.is_unicode_family(utf8));

    registry.unload();
    assert!(registry.is_empty());
    assert!(registry.canonicalize("UTF-8").is_none());
    assert!(!registry.is_unicode_family(utf8));
    registry.unload();

    // A table where UTF-8 has another id; the family cache must follow.
    registry.load(b"UTF-8 7 utf8\n");
    assert!(registry.is_unicode_family(7));
    assert!(!registry.is_unicode_family(utf8));
}

#[cfg(feature = "std")]
#[test]
fn load_file_errors() {
    let mut registry = AliasRegistry::new();
    assert_eq!(registry.load_file(""), Err(Error::BadParameter));
    assert_eq!(
        registry.load_file("/nonexistent/charstream/Aliases"),
        Err(Error::FileNotFound)
    );
}

#[cfg(feature = "std")]
#[test]
fn load_file_reads_table() {
    let path = std::env::temp_dir().join("charstream-load-file-test.aliases");
    std::fs::write(&path, "KOI8-R 2084 csKOI8R\n").unwrap();

    let mut registry = AliasRegistry::new();
    assert_eq!(registry.load_file(&path), Ok(1));
    assert_eq!(registry.canonicalize("cskoi8r").unwrap().name(), "KOI8-R");
    let _ = std::fs::remove_file(&path);
}
