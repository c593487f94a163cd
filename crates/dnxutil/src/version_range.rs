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

//! Version ranges and the version selection policy.
//!
//! Textual grammar:
//!
//! ```text
//! PLAIN := SemVer                              inclusive minimum, no maximum
//! FLOAT := '*' | N '.*' | N.N '.*' | N.N.N '.*' | SemVer '-*'
//! RANGE := ('['|'(') [SemVer] ',' [SemVer] (']'|')')
//! EXACT := ('['|'(') SemVer (']'|')')
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::version::{SemanticVersion, SemanticVersionError, SNAPSHOT_SUFFIX};

/// Which part of the minimum version may float to the highest available value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FloatBehavior {
    #[default]
    None,
    Prerelease,
    Revision,
    Build,
    Minor,
    Major,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionRangeError {
    #[error("version range is empty")]
    Empty,
    #[error("`{0}` must start with `[` or `(` and end with `]` or `)`")]
    Brackets(String),
    #[error("`{0}` has more than two bounds")]
    TooManyBounds(String),
    #[error("`{0}` specifies neither a lower nor an upper bound")]
    NoBounds(String),
    #[error("invalid bound in `{range}`")]
    Bound {
        range: String,
        #[source]
        source: SemanticVersionError,
    },
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    pub min_version: Option<SemanticVersion>,
    pub is_min_inclusive: bool,
    pub max_version: Option<SemanticVersion>,
    pub is_max_inclusive: bool,
    pub float_behavior: FloatBehavior,
}

impl VersionRange {
    /// `version` or anything above it.
    pub fn at_least(version: SemanticVersion) -> Self {
        let float_behavior = if version.is_snapshot() {
            FloatBehavior::Prerelease
        } else {
            FloatBehavior::None
        };
        VersionRange {
            min_version: Some(version),
            is_min_inclusive: true,
            max_version: None,
            is_max_inclusive: false,
            float_behavior,
        }
    }

    /// Exactly `version`, written `[version]`.
    pub fn exact(version: SemanticVersion) -> Self {
        VersionRange {
            min_version: Some(version.clone()),
            is_min_inclusive: true,
            max_version: Some(version),
            is_max_inclusive: true,
            float_behavior: FloatBehavior::None,
        }
    }

    /// `[version, major.(minor + 1))`: the range of safe upgrades from `version`.
    ///
    /// A minor component at its limit rolls over into the next major; with no
    /// next major either, the range is unbounded above.
    pub fn safe_range(version: SemanticVersion) -> Self {
        let next_minor = match version.minor().checked_add(1) {
            Some(minor) => Some(SemanticVersion::new(version.major(), minor, 0, 0)),
            None => version
                .major()
                .checked_add(1)
                .map(|major| SemanticVersion::new(major, 0, 0, 0)),
        };
        VersionRange {
            min_version: Some(version),
            is_min_inclusive: true,
            max_version: next_minor,
            is_max_inclusive: false,
            float_behavior: FloatBehavior::None,
        }
    }

    /// Parses a range, returning `None` on malformed input.
    pub fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn is_floating(&self) -> bool {
        self.float_behavior != FloatBehavior::None
    }

    /// Whether `version` matches the floating pattern of this range. For a
    /// non-floating range this is plain equality with the minimum.
    pub fn equals_floating(&self, version: &SemanticVersion) -> bool {
        let Some(min) = &self.min_version else {
            return false;
        };
        let (a, b) = (min.components(), version.components());
        match self.float_behavior {
            FloatBehavior::None => min == version,
            FloatBehavior::Prerelease => {
                a == b
                    && version
                        .special_version()
                        .to_ascii_lowercase()
                        .starts_with(&min.special_version().to_ascii_lowercase())
            }
            FloatBehavior::Revision => a[..3] == b[..3],
            FloatBehavior::Build => a[..2] == b[..2],
            FloatBehavior::Minor => a[0] == b[0],
            FloatBehavior::Major => true,
        }
    }

    fn satisfies_min(&self, version: &SemanticVersion) -> bool {
        match &self.min_version {
            None => true,
            Some(min) if self.is_min_inclusive => version >= min,
            Some(min) => version > min,
        }
    }

    fn satisfies_max(&self, version: &SemanticVersion) -> bool {
        match &self.max_version {
            None => true,
            Some(max) if self.is_max_inclusive => version <= max,
            Some(max) => version < max,
        }
    }

    pub fn contains(&self, version: &SemanticVersion) -> bool {
        let above_min = self.satisfies_min(version)
            || (self.is_floating() && self.equals_floating(version));
        above_min && self.satisfies_max(version)
    }
}

/// Decides whether `considering` should replace `current` as the version
/// picked for `ideal`.
///
/// Candidates outside the range are never used. When both versions match a
/// floating pattern the higher one wins, otherwise the lower one does.
pub fn should_use_considering(
    current: Option<&SemanticVersion>,
    considering: &SemanticVersion,
    ideal: &VersionRange,
) -> bool {
    if !ideal.equals_floating(considering) && !ideal.satisfies_min(considering) {
        return false;
    }
    if !ideal.satisfies_max(considering) {
        return false;
    }

    let Some(current) = current else {
        return true;
    };

    // An exact hit on the minimum of a fixed range cannot be improved upon.
    if !ideal.is_floating() && ideal.min_version.as_ref() == Some(current) {
        return false;
    }

    if ideal.equals_floating(current) && ideal.equals_floating(considering) {
        return current < considering;
    }

    current > considering
}

impl FromStr for VersionRange {
    type Err = VersionRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(VersionRangeError::Empty);
        }

        if let Some(range) = parse_floating(value) {
            return Ok(range);
        }

        if let Ok(version) = value.parse::<SemanticVersion>() {
            return Ok(VersionRange::at_least(version));
        }

        if value.len() < 3 {
            return Err(VersionRangeError::Brackets(value.to_string()));
        }
        let is_min_inclusive = match value.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return Err(VersionRangeError::Brackets(value.to_string())),
        };
        let is_max_inclusive = match value.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(VersionRangeError::Brackets(value.to_string())),
        };

        let inner = &value[1..value.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() > 2 {
            return Err(VersionRangeError::TooManyBounds(value.to_string()));
        }
        if parts.iter().all(|p| p.is_empty()) {
            return Err(VersionRangeError::NoBounds(value.to_string()));
        }

        let min = parts[0];
        let max = parts.get(1).copied().unwrap_or(min);
        let bound = |p: &str| -> Result<Option<SemanticVersion>, VersionRangeError> {
            if p.is_empty() {
                return Ok(None);
            }
            p.parse()
                .map(Some)
                .map_err(|source| VersionRangeError::Bound {
                    range: value.to_string(),
                    source,
                })
        };

        Ok(VersionRange {
            min_version: bound(min)?,
            is_min_inclusive,
            max_version: bound(max)?,
            is_max_inclusive,
            float_behavior: FloatBehavior::None,
        })
    }
}

fn parse_floating(value: &str) -> Option<VersionRange> {
    let floating = |min: SemanticVersion, float_behavior| VersionRange {
        min_version: Some(min),
        is_min_inclusive: true,
        max_version: None,
        is_max_inclusive: false,
        float_behavior,
    };

    if value == "*" {
        return Some(floating(SemanticVersion::new(0, 0, 0, 0), FloatBehavior::Major));
    }
    if value.ends_with(SNAPSHOT_SUFFIX) {
        let version: SemanticVersion = value.parse().ok()?;
        return Some(floating(version, FloatBehavior::Prerelease));
    }

    let prefix = value.strip_suffix(".*")?;
    let parts = prefix
        .split('.')
        .map(|p| p.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    let (min, behavior) = match parts.as_slice() {
        [major] => (SemanticVersion::new(*major, 0, 0, 0), FloatBehavior::Minor),
        [major, minor] => (
            SemanticVersion::new(*major, *minor, 0, 0),
            FloatBehavior::Build,
        ),
        [major, minor, build] => (
            SemanticVersion::new(*major, *minor, *build, 0),
            FloatBehavior::Revision,
        ),
        _ => return None,
    };
    Some(floating(min, behavior))
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = &self.min_version {
            let [major, minor, build, _] = min.components();
            match self.float_behavior {
                FloatBehavior::None => {}
                FloatBehavior::Prerelease => return write!(f, "{}", min.clone().with_snapshot(true)),
                FloatBehavior::Revision => return write!(f, "{major}.{minor}.{build}.*"),
                FloatBehavior::Build => return write!(f, "{major}.{minor}.*"),
                FloatBehavior::Minor => return write!(f, "{major}.*"),
                FloatBehavior::Major => return f.write_str("*"),
            }
        }

        match (&self.min_version, &self.max_version) {
            (Some(min), None) if self.is_min_inclusive && !self.is_max_inclusive => {
                return write!(f, "{min}");
            }
            (Some(min), Some(max))
                if min == max && self.is_min_inclusive && self.is_max_inclusive =>
            {
                return write!(f, "[{min}]");
            }
            _ => {}
        }

        f.write_str(if self.is_min_inclusive { "[" } else { "(" })?;
        if let Some(min) = &self.min_version {
            write!(f, "{min}")?;
        }
        f.write_str(", ")?;
        if let Some(max) = &self.max_version {
            write!(f, "{max}")?;
        }
        f.write_str(if self.is_max_inclusive { "]" } else { ")" })
    }
}

impl fmt::Debug for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
