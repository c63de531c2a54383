use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Named key-type tags used by the parent for table lookups.
///
/// The dispatcher passes the raw tag through untouched; this type only
/// gives the known values names for logs and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    None,
    Alias,
    Domain,
    Credentials,
    Netaddr,
    Userinfo,
    Source,
    Mailaddr,
    Addrname,
    Mailaddrmap,
}

const ALL: [KeyKind; 10] = [
    KeyKind::None,
    KeyKind::Alias,
    KeyKind::Domain,
    KeyKind::Credentials,
    KeyKind::Netaddr,
    KeyKind::Userinfo,
    KeyKind::Source,
    KeyKind::Mailaddr,
    KeyKind::Addrname,
    KeyKind::Mailaddrmap,
];

impl KeyKind {
    pub fn tag(self) -> i32 {
        match self {
            KeyKind::None => 0x000,
            KeyKind::Alias => 0x001,
            KeyKind::Domain => 0x002,
            KeyKind::Credentials => 0x004,
            KeyKind::Netaddr => 0x008,
            KeyKind::Userinfo => 0x010,
            KeyKind::Source => 0x020,
            KeyKind::Mailaddr => 0x040,
            KeyKind::Addrname => 0x080,
            KeyKind::Mailaddrmap => 0x100,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyKind::None => "none",
            KeyKind::Alias => "alias",
            KeyKind::Domain => "domain",
            KeyKind::Credentials => "credentials",
            KeyKind::Netaddr => "netaddr",
            KeyKind::Userinfo => "userinfo",
            KeyKind::Source => "source",
            KeyKind::Mailaddr => "mailaddr",
            KeyKind::Addrname => "addrname",
            KeyKind::Mailaddrmap => "mailaddrmap",
        }
    }

    /// Name of a raw tag, `"unknown"` if it is not a known service.
    pub fn describe(tag: i32) -> &'static str {
        Self::from_tag(tag).map_or("unknown", Self::name)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown key kind '{s}'"))
    }
}
