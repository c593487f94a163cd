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

//! Target framework descriptors.
//!
//! A [`FrameworkName`] identifies a target platform: an identifier such as
//! `.NETFramework`, a version, an optional profile and an optional secondary
//! platform. Frameworks can be written in the long form
//! (`.NETFramework,Version=v4.5,Profile=Client`) or as short folder names
//! (`net45-client`, `dnxcore50`, `portable-net45+win8`).

pub mod compat;
pub mod expander;
pub mod mappings;
pub mod reducer;
pub mod table;

use std::{
    convert::Infallible,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use compat::CompatibilityProvider;
pub use expander::FrameworkExpander;
pub use mappings::FrameworkMappings;
pub use reducer::FrameworkReducer;
pub use table::CompatibilityTable;

pub mod identifiers {
    pub const NET: &str = ".NETFramework";
    pub const NET_CORE: &str = ".NETCore";
    pub const NET_PLATFORM: &str = ".NETPlatform";
    pub const NET_MICRO: &str = ".NETMicroFramework";
    pub const PORTABLE: &str = ".NETPortable";
    pub const DNX: &str = "DNX";
    pub const DNX_CORE: &str = "DNXCore";
    pub const ASP_NET: &str = "ASP.NET";
    pub const ASP_NET_CORE: &str = "ASP.NETCore";
    pub const SILVERLIGHT: &str = "Silverlight";
    pub const WINDOWS: &str = "Windows";
    pub const WINDOWS_PHONE: &str = "WindowsPhone";
    pub const WINDOWS_PHONE_APP: &str = "WindowsPhoneApp";
    pub const UAP: &str = "UAP";
    pub const MONO_ANDROID: &str = "MonoAndroid";
    pub const MONO_TOUCH: &str = "MonoTouch";
    pub const MONO_MAC: &str = "MonoMac";
    pub const XAMARIN_IOS: &str = "Xamarin.iOS";
    pub const XAMARIN_MAC: &str = "Xamarin.Mac";
    pub const NATIVE: &str = "native";

    pub const ANY: &str = "Any";
    pub const AGNOSTIC: &str = "Agnostic";
    pub const UNSUPPORTED: &str = "Unsupported";
}

const PORTABLE_PREFIX: &str = "portable-";

/// A four-component framework version. Unwritten components are zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FrameworkVersion([u32; 4]);

impl FrameworkVersion {
    pub const EMPTY: FrameworkVersion = FrameworkVersion([0; 4]);
    pub const MAX: FrameworkVersion = FrameworkVersion([u32::MAX; 4]);

    pub const fn new(major: u32, minor: u32) -> Self {
        FrameworkVersion([major, minor, 0, 0])
    }

    pub const fn from_components(components: [u32; 4]) -> Self {
        FrameworkVersion(components)
    }

    pub fn components(&self) -> [u32; 4] {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Parses a dotted version with an optional leading `v` (`v4.5`, `4.5.1`).
    pub fn parse_dotted(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s
            .strip_prefix('v')
            .or_else(|| s.strip_prefix('V'))
            .unwrap_or(s);
        let parts: Vec<&str> = s.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        let mut components = [0u32; 4];
        for (slot, part) in components.iter_mut().zip(parts) {
            *slot = part.parse().ok()?;
        }
        Some(FrameworkVersion(components))
    }

    /// Parses the version part of a short folder name. Undotted digits are one
    /// component each (`451` is 4.5.1); dotted text is read as is (`10.0`).
    pub fn parse_short(s: &str) -> Option<Self> {
        if s.contains('.') {
            return Self::parse_dotted(s);
        }
        if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut components = [0u32; 4];
        for (slot, digit) in components.iter_mut().zip(s.bytes()) {
            *slot = (digit - b'0') as u32;
        }
        Some(FrameworkVersion(components))
    }

    /// The version as written in short folder names: `45`, `451`, or dotted
    /// (`10.0`) once any component no longer fits in a single digit. Trailing
    /// zeros are dropped down to `min_parts` components.
    pub fn short_string(&self, min_parts: usize) -> String {
        if self.0.iter().any(|&c| c > 9) {
            return self.to_string();
        }
        let mut parts = self.0.as_slice();
        while parts.len() > min_parts.max(1) && parts.last() == Some(&0) {
            parts = &parts[..parts.len() - 1];
        }
        parts.iter().map(u32::to_string).collect()
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, build, revision] = self.0;
        write!(f, "{major}.{minor}")?;
        if build > 0 || revision > 0 {
            write!(f, ".{build}")?;
            if revision > 0 {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A target framework: identifier, version, profile and secondary platform.
///
/// Identifiers, profiles and platforms compare case-insensitively. The
/// identifiers `Any`, `Agnostic` and `Unsupported` are sentinels that bypass
/// the ordinary comparison rules.
#[derive(Clone)]
pub struct FrameworkName {
    framework: String,
    version: FrameworkVersion,
    profile: String,
    platform: String,
    platform_version: FrameworkVersion,
}

impl FrameworkName {
    pub fn new(framework: impl Into<String>, version: FrameworkVersion) -> Self {
        FrameworkName {
            framework: framework.into(),
            version,
            profile: String::new(),
            platform: String::new(),
            platform_version: FrameworkVersion::EMPTY,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>, version: FrameworkVersion) -> Self {
        self.platform = platform.into();
        self.platform_version = version;
        self
    }

    pub fn with_version(mut self, version: FrameworkVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }

    pub fn any() -> Self {
        Self::new(identifiers::ANY, FrameworkVersion::EMPTY)
    }

    pub fn agnostic() -> Self {
        Self::new(identifiers::AGNOSTIC, FrameworkVersion::EMPTY)
    }

    pub fn unsupported() -> Self {
        Self::new(identifiers::UNSUPPORTED, FrameworkVersion::EMPTY)
    }

    pub fn framework(&self) -> &str {
        &self.framework
    }

    pub fn version(&self) -> FrameworkVersion {
        self.version
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn platform_version(&self) -> FrameworkVersion {
        self.platform_version
    }

    pub fn has_profile(&self) -> bool {
        !self.profile.is_empty()
    }

    pub fn is_framework(&self, identifier: &str) -> bool {
        self.framework.eq_ignore_ascii_case(identifier)
    }

    pub fn is_any(&self) -> bool {
        self.is_framework(identifiers::ANY)
    }

    pub fn is_agnostic(&self) -> bool {
        self.is_framework(identifiers::AGNOSTIC)
    }

    pub fn is_unsupported(&self) -> bool {
        self.is_framework(identifiers::UNSUPPORTED)
    }

    /// Not one of the `Any`, `Agnostic` or `Unsupported` sentinels.
    pub fn is_specific(&self) -> bool {
        !(self.is_any() || self.is_agnostic() || self.is_unsupported())
    }

    pub fn is_portable(&self) -> bool {
        self.is_framework(identifiers::PORTABLE)
    }

    /// Parses either form with the shared default mappings.
    pub fn parse(s: &str) -> Self {
        Self::parse_with(s, &FrameworkMappings::shared())
    }

    /// Parses either form. Unknown identifiers and malformed input give the
    /// `Unsupported` sentinel.
    pub fn parse_with(s: &str, mappings: &FrameworkMappings) -> Self {
        let s = s.trim();
        if s.contains(',') {
            Self::parse_long(s, mappings).unwrap_or_else(Self::unsupported)
        } else {
            Self::parse_folder(s, mappings)
        }
    }

    fn parse_long(s: &str, mappings: &FrameworkMappings) -> Option<Self> {
        let mut parts = s.split(',').map(str::trim);
        let identifier = parts.next().filter(|p| !p.is_empty())?;
        let mut framework = FrameworkName::new(
            mappings.canonical_identifier(identifier),
            FrameworkVersion::EMPTY,
        );
        for part in parts {
            let (key, value) = part.split_once('=')?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => framework.version = FrameworkVersion::parse_dotted(value)?,
                "profile" => framework.profile = value.to_string(),
                "platform" => framework.platform = value.to_string(),
                "platformversion" => {
                    framework.platform_version = FrameworkVersion::parse_dotted(value)?
                }
                _ => return None,
            }
        }
        Some(framework)
    }

    /// Parses a short folder name such as `net45`, `net40-client` or
    /// `portable-net45+win8`.
    pub fn parse_folder(folder: &str, mappings: &FrameworkMappings) -> Self {
        static FOLDER: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^([a-z]+(?:\.[a-z]+)*)([0-9][0-9.]*)?(?:-([a-z0-9.]+))?$")
                .expect("valid folder name pattern")
        });

        let folder = folder.trim().to_ascii_lowercase();
        match folder.as_str() {
            "any" => return Self::any(),
            "agnostic" => return Self::agnostic(),
            "unsupported" => return Self::unsupported(),
            _ => {}
        }

        if let Some(profile) = folder.strip_prefix(PORTABLE_PREFIX) {
            return Self::parse_portable_profile(profile, mappings).unwrap_or_else(Self::unsupported);
        }

        let Some(caps) = FOLDER.captures(&folder) else {
            return Self::unsupported();
        };
        let Some(identifier) = mappings.identifier_from_short_name(&caps[1]) else {
            log::debug!("unknown framework identifier in `{folder}`");
            return Self::unsupported();
        };
        let version = match caps.get(2) {
            Some(v) => match FrameworkVersion::parse_short(v.as_str()) {
                Some(v) => v,
                None => return Self::unsupported(),
            },
            None => FrameworkVersion::EMPTY,
        };
        let profile = caps
            .get(3)
            .map(|p| mappings.profile_from_short_name(identifier, p.as_str()))
            .unwrap_or_default();
        FrameworkName::new(identifier, version).with_profile(profile)
    }

    fn parse_portable_profile(profile: &str, mappings: &FrameworkMappings) -> Option<Self> {
        if let Some(number) = profile.strip_prefix("profile") {
            let number: u32 = number.parse().ok()?;
            mappings.portable_profile(number)?;
            return Some(
                FrameworkName::new(identifiers::PORTABLE, FrameworkVersion::EMPTY)
                    .with_profile(format!("Profile{number}")),
            );
        }
        let mut members = Vec::new();
        for member in profile.split('+') {
            let framework = Self::parse_folder(member, mappings);
            if !framework.is_specific() || framework.is_portable() {
                return None;
            }
            members.push(framework.short_folder_name_with(mappings));
        }
        members.sort();
        members.dedup();
        Some(
            FrameworkName::new(identifiers::PORTABLE, FrameworkVersion::EMPTY)
                .with_profile(members.join("+")),
        )
    }

    /// The member frameworks of a portable profile, `None` when this is not a
    /// portable framework or the profile is unknown.
    pub fn portable_frameworks(&self, mappings: &FrameworkMappings) -> Option<Vec<FrameworkName>> {
        if !self.is_portable() {
            return None;
        }
        let profile = self.profile.to_ascii_lowercase();
        if let Some(number) = profile.strip_prefix("profile").and_then(|n| n.parse().ok()) {
            return mappings.portable_profile(number).map(<[_]>::to_vec);
        }
        let members = profile
            .split('+')
            .map(|m| Self::parse_folder(m, mappings))
            .collect::<Vec<_>>();
        if members.is_empty() || members.iter().any(|m| !m.is_specific() || m.is_portable()) {
            return None;
        }
        Some(members)
    }

    pub fn short_folder_name(&self) -> String {
        self.short_folder_name_with(&FrameworkMappings::shared())
    }

    pub fn short_folder_name_with(&self, mappings: &FrameworkMappings) -> String {
        if self.is_any() {
            return "any".to_string();
        }
        if self.is_agnostic() {
            return "agnostic".to_string();
        }
        if self.is_unsupported() {
            return "unsupported".to_string();
        }
        if self.is_portable() {
            let profile = match self.portable_frameworks(mappings) {
                Some(members) => {
                    let mut names: Vec<String> = members
                        .iter()
                        .map(|m| m.short_folder_name_with(mappings))
                        .collect();
                    names.sort();
                    names.join("+")
                }
                None => self.profile.to_ascii_lowercase(),
            };
            return format!("{PORTABLE_PREFIX}{profile}");
        }

        let mut name = mappings
            .short_name_for_identifier(&self.framework)
            .map(str::to_string)
            .unwrap_or_else(|| self.framework.to_ascii_lowercase());
        if !self.version.is_empty() {
            let min_parts = if mappings.is_single_digit_version(&self.framework) {
                1
            } else {
                2
            };
            name.push_str(&self.version.short_string(min_parts));
        }
        if self.has_profile() {
            name.push('-');
            name.push_str(&mappings.short_name_for_profile(&self.framework, &self.profile));
        }
        name
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.framework, self.version)?;
        if self.has_profile() {
            write!(f, ",Profile={}", self.profile)?;
        }
        if !self.platform.is_empty() {
            write!(
                f,
                ",Platform={},PlatformVersion=v{}",
                self.platform, self.platform_version
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for FrameworkName {
    fn eq(&self, other: &Self) -> bool {
        self.framework.eq_ignore_ascii_case(&other.framework)
            && self.version == other.version
            && self.profile.eq_ignore_ascii_case(&other.profile)
            && self.platform.eq_ignore_ascii_case(&other.platform)
            && self.platform_version == other.platform_version
    }
}

impl Eq for FrameworkName {}

impl Hash for FrameworkName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.framework.to_ascii_lowercase().hash(state);
        self.version.hash(state);
        self.profile.to_ascii_lowercase().hash(state);
        self.platform.to_ascii_lowercase().hash(state);
        self.platform_version.hash(state);
    }
}

impl FromStr for FrameworkName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FrameworkName::parse(s))
    }
}

impl Serialize for FrameworkName {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FrameworkName {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(FrameworkName::parse(&s))
    }
}
