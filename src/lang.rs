//! Language code handling.
//!
//! DBpedia dumps and the langlinks catalog key everything off a two-letter
//! (occasionally three-letter) ISO code embedded in the dump filename's
//! `lang=XX` segment. Unlike a closed `Lang` enum enumerating every known
//! Wikipedia edition, this wraps a validated string: the set of valid
//! editions changes over time and is not this crate's concern to enumerate.
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A validated language code, e.g. `en`, `de`, `simple`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LangCode(String);

impl LangCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts a language code from a dump filename's `lang=XX` segment.
    ///
    /// # Example
    /// ```ignore
    /// assert_eq!(LangCode::from_dump_filename("infobox_properties_lang=de.ttl").unwrap().as_str(), "de");
    /// ```
    pub fn from_dump_filename(fname: &str) -> Result<Self, Error> {
        let idx = fname.find("lang=").ok_or_else(|| {
            Error::Config(format!("no lang= segment found in filename {}", fname))
        })?;
        let start = idx + "lang=".len();
        let rest = &fname[start..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        LangCode::new(&rest[..end])
    }

    pub fn new(code: &str) -> Result<Self, Error> {
        if code.len() < 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::UnknownLang(code.to_string()));
        }
        Ok(LangCode(code.to_ascii_lowercase()))
    }
}

impl fmt::Display for LangCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LangCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        LangCode::new(s)
    }
}
