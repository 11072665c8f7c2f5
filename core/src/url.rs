//! URL composition for collection and member endpoints.

use std::fmt;

/// Identifier of a single resource, formatted verbatim into member URLs.
///
/// Presence of a key is expressed by choosing the member handle over the
/// collection handle, so `0` and `"0"` are ordinary keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Int(i64),
    UInt(u64),
    Str(String),
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(n) => write!(f, "{n}"),
            PrimaryKey::UInt(n) => write!(f, "{n}"),
            PrimaryKey::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! int_key {
    ($($t:ty),*) => {
        $(impl From<$t> for PrimaryKey {
            fn from(n: $t) -> Self {
                PrimaryKey::Int(i64::from(n))
            }
        })*
    };
}

int_key!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for PrimaryKey {
    fn from(n: u64) -> Self {
        PrimaryKey::UInt(n)
    }
}

impl From<usize> for PrimaryKey {
    fn from(n: usize) -> Self {
        PrimaryKey::UInt(n as u64)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        PrimaryKey::Str(s.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(s: String) -> Self {
        PrimaryKey::Str(s)
    }
}

/// `base` without a single trailing slash.
fn no_slash(base: &str) -> &str {
    base.strip_suffix('/').unwrap_or(base)
}

/// `{base}/{entity}/`, with one trailing slash stripped from `base` first.
pub fn collection_url(base: &str, entity: &str) -> String {
    format!("{}/{entity}/", no_slash(base))
}

/// `{collection_url}{pk}/`.
pub fn member_url(base: &str, entity: &str, pk: &PrimaryKey) -> String {
    format!("{}{pk}/", collection_url(base, entity))
}

/// Action URLs concatenate the name directly onto a URL that already ends in `/`.
pub fn action_url(scope_url: &str, action: &str) -> String {
    format!("{scope_url}{action}")
}
