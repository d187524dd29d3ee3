//! Encoding-name canonicalization.
//!
//! An [`AliasRegistry`] maps any spelling of a charset name to a
//! [`CanonicalEntry`] holding the preferred name and its IANA registry id
//! (MIBenum). Names compare case-insensitively with ASCII punctuation and
//! whitespace ignored, so `"UTF-8"`, `"utf8"` and `"u.t.f.8"` are the same
//! name.
//!
//! The registry is an ordinary value: load it once, wrap it in an
//! [`Arc`](alloc::sync::Arc) and hand clones to every codec, filter and
//! stream that needs name resolution. It is immutable while shared.

use alloc::{boxed::Box, vec::Vec};
use core::fmt;

use bstr::ByteSlice;
use once_cell::race::OnceBox;

/// Number of hash buckets for canonical names and for aliases.
const BUCKETS: usize = 43;

/// Alias table compiled into the crate.
const BUILTIN_TABLE: &[u8] = include_bytes!("../data/Aliases");

/// A canonical charset name and its registry id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEntry {
    name: Box<str>,
    registry_id: u16,
}

impl CanonicalEntry {
    /// The preferred spelling of the charset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The IANA MIBenum of the charset.
    #[must_use]
    pub const fn registry_id(&self) -> u16 {
        self.registry_id
    }
}

#[derive(Debug)]
struct AliasEntry {
    name: Box<str>,
    canonical: usize,
}

/// The Unicode encoding forms the registry recognises by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnicodeFamily {
    /// ISO-10646-UCS-2.
    Ucs2,
    /// ISO-10646-UCS-4.
    Ucs4,
    /// UTF-8.
    Utf8,
    /// UTF-16 without a declared byte order.
    Utf16,
    /// UTF-16, big-endian.
    Utf16Be,
    /// UTF-16, little-endian.
    Utf16Le,
    /// UTF-32 without a declared byte order.
    Utf32,
    /// UTF-32, big-endian.
    Utf32Be,
    /// UTF-32, little-endian.
    Utf32Le,
}

impl UnicodeFamily {
    /// Every family, in the order the registry resolves them.
    pub const ALL: [Self; 9] = [
        Self::Ucs4,
        Self::Ucs2,
        Self::Utf8,
        Self::Utf16,
        Self::Utf16Be,
        Self::Utf16Le,
        Self::Utf32,
        Self::Utf32Be,
        Self::Utf32Le,
    ];

    /// A name under which the family is looked up in a registry.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ucs2 => "UCS-2",
            Self::Ucs4 => "UCS-4",
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf32 => "UTF-32",
            Self::Utf32Be => "UTF-32BE",
            Self::Utf32Le => "UTF-32LE",
        }
    }

    /// The byte-order mark that identifies this family, if it has exactly
    /// one. The byte-order-neutral forms accept either of their variants'
    /// marks and so return `None`, as do UCS-2 and UCS-4.
    #[must_use]
    pub const fn bom(self) -> Option<&'static [u8]> {
        match self {
            Self::Utf8 => Some(b"\xEF\xBB\xBF"),
            Self::Utf16Be => Some(b"\xFE\xFF"),
            Self::Utf16Le => Some(b"\xFF\xFE"),
            Self::Utf32Be => Some(b"\x00\x00\xFE\xFF"),
            Self::Utf32Le => Some(b"\xFF\xFE\x00\x00"),
            Self::Ucs2 | Self::Ucs4 | Self::Utf16 | Self::Utf32 => None,
        }
    }
}

/// Registry ids of the Unicode families, resolved once per loaded table.
struct UnicodeIds([Option<u16>; UnicodeFamily::ALL.len()]);

/// Table of canonical charset names and their aliases.
///
/// ```rust
/// use charstream::AliasRegistry;
///
/// let registry = AliasRegistry::builtin();
/// let entry = registry.canonicalize("u.t.f.8").unwrap();
/// assert_eq!(entry.name(), "UTF-8");
/// assert_eq!(registry.registry_id_to_name(entry.registry_id()), Some("UTF-8"));
/// ```
pub struct AliasRegistry {
    canonicals: Vec<CanonicalEntry>,
    canonical_buckets: [Vec<usize>; BUCKETS],
    alias_buckets: [Vec<AliasEntry>; BUCKETS],
    unicode: OnceBox<UnicodeIds>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self {
            canonicals: Vec::new(),
            canonical_buckets: core::array::from_fn(|_| Vec::new()),
            alias_buckets: core::array::from_fn(|_| Vec::new()),
            unicode: OnceBox::new(),
        }
    }
}

impl fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasRegistry")
            .field("canonicals", &self.canonicals.len())
            .field("aliases", &self.alias_buckets.iter().map(Vec::len).sum::<usize>())
            .finish_non_exhaustive()
    }
}

impl AliasRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated from the alias table bundled with the
    /// crate.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.load(BUILTIN_TABLE);
        registry
    }

    /// Adds the entries of a textual alias table.
    ///
    /// Each record is `CANONICAL-NAME REGISTRY-ID ALIAS...`, one per line,
    /// with tokens delimited by whitespace or control characters. Blank lines
    /// and lines starting with `#` are skipped, as are lines without a
    /// parsable non-zero registry id. Names already present keep resolving
    /// to the entry loaded first.
    ///
    /// Returns the number of canonical entries added.
    pub fn load(&mut self, table: &[u8]) -> usize {
        let before = self.canonicals.len();
        for line in table.lines() {
            if line.first() == Some(&b'#') {
                continue;
            }
            let mut fields = line
                .fields_with(|c| c.is_whitespace() || c.is_control())
                .filter_map(|field| field.to_str().ok());
            let Some(name) = fields.next() else {
                continue;
            };
            let Some(registry_id) = fields
                .next()
                .and_then(|id| id.parse::<u16>().ok())
                .filter(|id| *id != 0)
            else {
                log::debug!("skipping alias record for {name:?}: no registry id");
                continue;
            };

            let canonical = self.canonicals.len();
            self.canonicals.push(CanonicalEntry {
                name: name.into(),
                registry_id,
            });
            self.canonical_buckets[bucket_of(name)].push(canonical);
            for alias in fields {
                self.alias_buckets[bucket_of(alias)].push(AliasEntry {
                    name: alias.into(),
                    canonical,
                });
            }
        }
        self.unicode = OnceBox::new();

        let added = self.canonicals.len() - before;
        log::debug!("loaded {added} canonical charset entries");
        added
    }

    /// Adds the entries of the alias table stored at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::BadParameter`] for an empty path, [`Error::FileNotFound`] if
    /// the file cannot be read.
    ///
    /// [`Error::BadParameter`]: crate::Error::BadParameter
    /// [`Error::FileNotFound`]: crate::Error::FileNotFound
    #[cfg(feature = "std")]
    pub fn load_file(&mut self, path: impl AsRef<std::path::Path>) -> crate::Result<usize> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(crate::Error::BadParameter);
        }
        let table = std::fs::read(path).map_err(|err| {
            log::debug!("cannot read alias table {}: {err}", path.display());
            crate::Error::FileNotFound
        })?;
        Ok(self.load(&table))
    }

    /// Drops every entry. The registry can be loaded again afterwards.
    pub fn unload(&mut self) {
        self.canonicals.clear();
        for bucket in &mut self.canonical_buckets {
            bucket.clear();
        }
        for bucket in &mut self.alias_buckets {
            bucket.clear();
        }
        self.unicode = OnceBox::new();
    }

    /// Number of canonical entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.canonicals.len()
    }

    /// Whether nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonicals.is_empty()
    }

    /// Resolves any spelling of a charset name.
    ///
    /// Canonical names are searched before aliases.
    #[must_use]
    pub fn canonicalize(&self, name: &str) -> Option<&CanonicalEntry> {
        if significant(name).next().is_none() {
            return None;
        }
        let bucket = bucket_of(name);

        let canonical = self.canonical_buckets[bucket]
            .iter()
            .map(|&index| &self.canonicals[index])
            .find(|entry| names_match(&entry.name, name));
        if canonical.is_some() {
            return canonical;
        }

        self.alias_buckets[bucket]
            .iter()
            .find(|alias| names_match(&alias.name, name))
            .map(|alias| &self.canonicals[alias.canonical])
    }

    /// Resolves a charset name straight to its registry id.
    #[must_use]
    pub fn registry_id_from_name(&self, name: &str) -> Option<u16> {
        self.canonicalize(name).map(CanonicalEntry::registry_id)
    }

    /// Canonical name of the first entry with the given registry id.
    #[must_use]
    pub fn registry_id_to_name(&self, registry_id: u16) -> Option<&str> {
        self.canonicals
            .iter()
            .find(|entry| entry.registry_id == registry_id)
            .map(CanonicalEntry::name)
    }

    /// The Unicode family a registry id belongs to, if any.
    #[must_use]
    pub fn unicode_family(&self, registry_id: u16) -> Option<UnicodeFamily> {
        let ids = self.unicode.get_or_init(|| {
            Box::new(UnicodeIds(
                UnicodeFamily::ALL.map(|family| self.registry_id_from_name(family.name())),
            ))
        });
        UnicodeFamily::ALL
            .iter()
            .zip(ids.0)
            .find(|(_, id)| *id == Some(registry_id))
            .map(|(family, _)| *family)
    }

    /// Whether a registry id names UCS-2, UCS-4 or one of the UTF forms.
    #[must_use]
    pub fn is_unicode_family(&self, registry_id: u16) -> bool {
        self.unicode_family(registry_id).is_some()
    }

    /// Canonical entries in load order.
    pub fn canonical_entries(&self) -> impl Iterator<Item = &CanonicalEntry> {
        self.canonicals.iter()
    }

    /// Every alias together with the entry it resolves to. Order follows
    /// the hash buckets, not the table.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &CanonicalEntry)> {
        self.alias_buckets
            .iter()
            .flatten()
            .map(|alias| (&*alias.name, &self.canonicals[alias.canonical]))
    }
}

const fn is_punct_or_space(byte: u8) -> bool {
    matches!(
        byte,
        0x09..=0x0D | 0x20..=0x2F | 0x3A..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E
    )
}

fn significant(name: &str) -> impl Iterator<Item = u8> + '_ {
    name.bytes().filter(|byte| !is_punct_or_space(*byte))
}

fn bucket_of(name: &str) -> usize {
    let hash = significant(name).fold(5381_u32, |hash, byte| {
        hash.wrapping_mul(33) ^ u32::from(byte & !0x20)
    });
    hash as usize % BUCKETS
}

/// Compares two charset names, ignoring case and punctuation.
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    let mut left = significant(left);
    let mut right = significant(right);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l.eq_ignore_ascii_case(&r) => {}
            _ => return false,
        }
    }
}
