//! Vietnamese encoding conversion
//!
//! Transliterates text between canonical (precomposed) Unicode and the legacy
//! encodings that older applications and fonts still expect:
//!
//! - **VNI Windows**: base letter followed by a mark code unit
//! - **TCVN3 (ABC)**: one narrow code unit per letter
//! - **Unicode Composite**: decomposed (NFD) Unicode
//!
//! Unicode is always the pivot: `convert` decodes the source encoding to
//! Unicode, then encodes Unicode into the target. Characters outside the
//! Vietnamese repertoire pass through unchanged in every direction.

mod tables;

use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use tables::{
    TCVN3_EXTRA, TCVN3_ROWS, TONES, UNICODE_EXTRA, UNICODE_ROWS, VNI_EXTRA, VNI_ROWS,
};

/// Every encoding the converter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Unicode,
    Vni,
    Tcvn3,
    UnicodeComposite,
}

impl Encoding {
    pub const ALL: [Encoding; 4] = [
        Encoding::Unicode,
        Encoding::Vni,
        Encoding::Tcvn3,
        Encoding::UnicodeComposite,
    ];

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            Encoding::Unicode => "Unicode",
            Encoding::Vni => "VNI Windows",
            Encoding::Tcvn3 => "TCVN3 (ABC)",
            Encoding::UnicodeComposite => "Unicode Composite",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Returned when an encoding name is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEncoding(pub String);

impl fmt::Display for UnknownEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown encoding '{}' (expected unicode, vni, tcvn3 or composite)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEncoding {}

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match key.as_str() {
            "unicode" | "utf8" | "nfc" => Ok(Encoding::Unicode),
            "vni" | "vniwindows" => Ok(Encoding::Vni),
            "tcvn3" | "tcvn" | "abc" => Ok(Encoding::Tcvn3),
            "composite" | "unicodecomposite" | "nfd" => Ok(Encoding::UnicodeComposite),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

/// Encoding a foreground application expects synthesized text in
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    Unicode,
    Vni,
    Tcvn3,
}

impl From<OutputEncoding> for Encoding {
    fn from(enc: OutputEncoding) -> Self {
        match enc {
            OutputEncoding::Unicode => Encoding::Unicode,
            OutputEncoding::Vni => Encoding::Vni,
            OutputEncoding::Tcvn3 => Encoding::Tcvn3,
        }
    }
}

impl FromStr for OutputEncoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Encoding>()? {
            Encoding::Unicode => Ok(OutputEncoding::Unicode),
            Encoding::Vni => Ok(OutputEncoding::Vni),
            Encoding::Tcvn3 => Ok(OutputEncoding::Tcvn3),
            Encoding::UnicodeComposite => Err(UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Encoding::from(*self).fmt(f)
    }
}

/// One or two code units of a legacy encoding
type Units = (char, Option<char>);

/// Bidirectional lookup between repertoire letters and legacy code units
struct LegacyTable {
    encode: HashMap<char, Units>,
    decode: HashMap<Units, char>,
}

impl LegacyTable {
    /// Earlier entries win; the tables carry no duplicates.
    fn build(entries: impl Iterator<Item = (char, Units)>) -> Self {
        let mut encode = HashMap::new();
        let mut decode = HashMap::new();
        for (letter, units) in entries {
            encode.entry(letter).or_insert(units);
            decode.entry(units).or_insert(letter);
        }
        Self { encode, decode }
    }

    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        for c in text.chars() {
            match self.encode.get(&c) {
                Some(&(first, second)) => {
                    out.push(first);
                    if let Some(second) = second {
                        out.push(second);
                    }
                }
                None => out.push(c),
            }
        }
        out
    }

    /// Longest match first: a two-unit sequence beats its leading unit.
    fn decode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(&next) = chars.peek() {
                if let Some(&letter) = self.decode.get(&(c, Some(next))) {
                    out.push(letter);
                    chars.next();
                    continue;
                }
            }
            out.push(self.decode.get(&(c, None)).copied().unwrap_or(c));
        }
        out
    }
}

fn units(s: &str) -> Units {
    let mut chars = s.chars();
    (chars.next().unwrap_or_default(), chars.next())
}

/// Pair every repertoire letter with its entry in a parallel legacy table
fn pair_with<T: Copy>(
    rows: &'static [[T; TONES]; 24],
    extra: &'static [T; 2],
) -> impl Iterator<Item = (char, T)> {
    repertoire().zip(rows.iter().flatten().copied().chain(extra.iter().copied()))
}

static VNI: LazyLock<LegacyTable> =
    LazyLock::new(|| LegacyTable::build(pair_with(&VNI_ROWS, &VNI_EXTRA).map(|(c, s)| (c, units(s)))));

static TCVN3: LazyLock<LegacyTable> = LazyLock::new(|| {
    LegacyTable::build(pair_with(&TCVN3_ROWS, &TCVN3_EXTRA).map(|(c, unit)| {
        let unit = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
        (c, (unit, None))
    }))
});

/// The Vietnamese letter repertoire in canonical Unicode, table order
pub fn repertoire() -> impl Iterator<Item = char> {
    UNICODE_ROWS
        .iter()
        .flatten()
        .copied()
        .chain(UNICODE_EXTRA.iter().copied())
}

/// Convert `text` from one encoding to another through Unicode
pub fn convert(text: &str, from: Encoding, to: Encoding) -> String {
    if from == to {
        return text.to_string();
    }
    let unicode = to_unicode(text, from);
    from_unicode(&unicode, to)
}

fn to_unicode(text: &str, from: Encoding) -> Cow<'_, str> {
    match from {
        Encoding::Unicode => Cow::Borrowed(text),
        Encoding::Vni => Cow::Owned(VNI.decode(text)),
        Encoding::Tcvn3 => Cow::Owned(TCVN3.decode(text)),
        Encoding::UnicodeComposite => Cow::Owned(strip_padding(text.nfc().collect())),
    }
}

fn from_unicode(text: &str, to: Encoding) -> String {
    match to {
        Encoding::Unicode => text.to_string(),
        Encoding::Vni => VNI.encode(text),
        Encoding::Tcvn3 => TCVN3.encode(text),
        Encoding::UnicodeComposite => strip_padding(text.nfd().collect()),
    }
}

/// Drop trailing NUL padding left over from fixed-size buffers
fn strip_padding(mut text: String) -> String {
    let len = text.trim_end_matches('\0').len();
    text.truncate(len);
    text
}
