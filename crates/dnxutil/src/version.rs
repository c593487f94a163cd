// dnx: Dependency resolution and framework compatibility for DNX projects.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! Semantic versions as they appear in package manifests.
//!
//! A version has up to four numeric components (`major.minor.build.revision`),
//! an optional special (pre-release) tag and an optional trailing `-*` snapshot
//! marker. Missing numeric components compare as zero, so `1.0` and `1.0.0.0`
//! are the same version, but the original component count is kept for display.

use std::{cmp::Ordering, fmt, hash::Hash, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const SNAPSHOT_SUFFIX: &str = "-*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticVersionError {
    #[error("version string is empty")]
    Empty,
    #[error("`{0}` is not a valid version component")]
    InvalidComponent(String),
    #[error("a version has at most four numeric components, got `{0}`")]
    TooManyComponents(String),
    #[error("`{0}` is not a valid special version")]
    InvalidSpecialVersion(String),
}

#[derive(Clone)]
pub struct SemanticVersion {
    components: [u32; 4],
    /// Number of numeric components written in the source string (2..=4).
    field_count: u8,
    special: String,
    snapshot: bool,
}

impl SemanticVersion {
    pub fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        let field_count = if revision != 0 {
            4
        } else if build != 0 {
            3
        } else {
            2
        };
        SemanticVersion {
            components: [major, minor, build, revision],
            field_count,
            special: String::new(),
            snapshot: false,
        }
    }

    pub fn with_special(mut self, special: impl Into<String>) -> Self {
        self.special = special.into();
        self
    }

    pub fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Parses a version, returning `None` on malformed input.
    pub fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn major(&self) -> u32 {
        self.components[0]
    }

    pub fn minor(&self) -> u32 {
        self.components[1]
    }

    pub fn build(&self) -> u32 {
        self.components[2]
    }

    pub fn revision(&self) -> u32 {
        self.components[3]
    }

    pub fn components(&self) -> [u32; 4] {
        self.components
    }

    /// The pre-release tag, without the leading dash. Empty for releases.
    pub fn special_version(&self) -> &str {
        &self.special
    }

    pub fn is_prerelease(&self) -> bool {
        !self.special.is_empty()
    }

    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    /// The same version without the special tag and snapshot marker.
    pub fn release(&self) -> Self {
        SemanticVersion {
            components: self.components,
            field_count: self.field_count,
            special: String::new(),
            snapshot: false,
        }
    }

    /// Compares only the numeric components.
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl FromStr for SemanticVersion {
    type Err = SemanticVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut input = s.trim();
        if input.is_empty() {
            return Err(SemanticVersionError::Empty);
        }

        let snapshot = match input.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(rest) => {
                input = rest;
                true
            }
            None => false,
        };

        let (numeric, special) = match input.split_once('-') {
            Some((numeric, special)) => (numeric, special),
            None => (input, ""),
        };

        if !special.is_empty() || input.ends_with('-') {
            validate_special(special)?;
        }

        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.len() > 4 {
            return Err(SemanticVersionError::TooManyComponents(s.to_string()));
        }
        let mut components = [0u32; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            let part = part.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SemanticVersionError::InvalidComponent(part.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| SemanticVersionError::InvalidComponent(part.to_string()))?;
        }

        Ok(SemanticVersion {
            components,
            // A bare integer such as `1` is read as `1.0`.
            field_count: parts.len().max(2) as u8,
            special: special.to_string(),
            snapshot,
        })
    }
}

fn validate_special(special: &str) -> Result<(), SemanticVersionError> {
    let mut chars = special.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SemanticVersionError::InvalidSpecialVersion(
            special.to_string(),
        ))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.components[0], self.components[1])?;
        for component in &self.components[2..self.field_count as usize] {
            write!(f, ".{}", component)?;
        }
        if !self.special.is_empty() {
            write!(f, "-{}", self.special)?;
        }
        if self.snapshot {
            f.write_str(SNAPSHOT_SUFFIX)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl Hash for SemanticVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.components.hash(state);
        self.special.to_ascii_lowercase().hash(state);
    }
}

impl Ord for SemanticVersion {
    /// Numeric components first; on a tie a release sorts after any
    /// pre-release and pre-release tags compare case-insensitively.
    /// The snapshot marker does not take part in ordering.
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_numeric(other)
            .then_with(|| match (self.special.is_empty(), other.special.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self
                    .special
                    .to_ascii_lowercase()
                    .cmp(&other.special.to_ascii_lowercase()),
            })
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        let cases = ["1.0", "1.0.0", "1.2.3.4", "2.0.0-beta", "1.0.0-rc-2", "1.0.0-*", "1.0.0-beta-*"];
        let shown: Vec<String> = cases.iter().map(|c| v(c).to_string()).collect();
        assert_eq!(shown, cases);
        assert_eq!(v("1").to_string(), "1.0");
    }

    #[test]
    fn snapshot_marker_is_stripped() {
        let snap = v("1.0.0-beta-*");
        assert!(snap.is_snapshot());
        assert_eq!(snap.special_version(), "beta");
        assert_eq!(snap, v("1.0.0-beta"));

        let plain = v("1.0.0-*");
        assert!(plain.is_snapshot());
        assert!(!plain.is_prerelease());
    }

    #[test]
    fn malformed_versions() {
        for bad in ["", "a.b", "1.0.0.0.0", "1.0-", "1.0-1beta", "1..0", "-1.0", "1.0.x"] {
            assert!(SemanticVersion::try_parse(bad).is_none(), "{bad} should not parse");
        }
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0.0"));
        assert_eq!(v("1.0.0-Beta"), v("1.0.0-beta"));
    }

    #[test]
    fn ordering() {
        let mut versions = vec![
            v("2.0"),
            v("1.0.0"),
            v("1.0.0-beta"),
            v("1.0.0-alpha"),
            v("1.0.1"),
            v("1.0.0.1"),
        ];
        versions.sort();
        let shown: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            ["1.0.0-alpha", "1.0.0-beta", "1.0.0", "1.0.0.1", "1.0.1", "2.0"]
        );
    }
}
