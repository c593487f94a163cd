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

//! The data that drives framework parsing and compatibility.
//!
//! Everything here is plain data. The rules that interpret it live in
//! [`super::compat`], [`super::expander`] and [`super::reducer`].

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{FrameworkName, FrameworkVersion, identifiers as id};

/// An inclusive range of versions of a single framework and profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkRange {
    pub min: FrameworkName,
    pub max: FrameworkName,
}

impl FrameworkRange {
    pub fn new(min: FrameworkName, max: FrameworkName) -> Self {
        FrameworkRange { min, max }
    }

    pub fn framework(&self) -> &str {
        self.min.framework()
    }

    pub fn satisfies(&self, framework: &FrameworkName) -> bool {
        framework.is_framework(self.min.framework())
            && framework.profile().eq_ignore_ascii_case(self.min.profile())
            && self.min.version() <= framework.version()
            && framework.version() <= self.max.version()
    }
}

/// Frameworks within `target` can consume anything within `supported`.
/// The relation is one-way.
#[derive(Debug, Clone)]
pub struct OneWayCompatibilityMapping {
    pub target: FrameworkRange,
    pub supported: FrameworkRange,
}

/// Projects targeting `identifier` may also consume assets built for
/// `equivalent`. With `version` set, the equivalent is pinned to that version;
/// otherwise the project version carries over.
#[derive(Debug, Clone)]
pub struct EquivalentProjectFramework {
    pub identifier: String,
    pub equivalent: String,
    pub version: Option<FrameworkVersion>,
}

/// Within `identifier`, a project with any of `project_profiles` accepts a
/// candidate carrying `candidate_profile`.
#[derive(Debug, Clone)]
pub struct ProfileCompatibility {
    pub identifier: String,
    pub candidate_profile: String,
    pub project_profiles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileShortName {
    pub identifier: String,
    pub short_name: String,
    pub profile: String,
}

#[derive(Debug, Clone)]
pub struct EquivalentProfile {
    pub identifier: String,
    pub profile: String,
    pub equivalent: String,
}

#[derive(Debug, Clone)]
pub struct PortableProfile {
    pub number: u32,
    pub frameworks: Vec<FrameworkName>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameworkMappings {
    /// `(synonym, identifier)`
    pub identifier_synonyms: Vec<(String, String)>,
    /// `(short name, identifier)`; the first entry for an identifier is the
    /// one used when printing.
    pub identifier_short_names: Vec<(String, String)>,
    pub profile_short_names: Vec<ProfileShortName>,
    /// Identifiers whose short versions may be a single digit (`win8`).
    pub single_digit_version_frameworks: Vec<String>,
    /// Symmetric pairs of frameworks that are interchangeable.
    pub equivalent_frameworks: Vec<(FrameworkName, FrameworkName)>,
    pub equivalent_profiles: Vec<EquivalentProfile>,
    /// `(subset, superset)`: every version of `subset` is also usable where
    /// the superset identifier is targeted.
    pub subset_frameworks: Vec<(String, String)>,
    pub compatibility_mappings: Vec<OneWayCompatibilityMapping>,
    pub equivalent_project_frameworks: Vec<EquivalentProjectFramework>,
    pub profile_compatibility: Vec<ProfileCompatibility>,
    pub portable_profiles: Vec<PortableProfile>,
}

static SHARED: Lazy<Arc<FrameworkMappings>> =
    Lazy::new(|| Arc::new(FrameworkMappings::default_mappings()));

fn fw(identifier: &str, major: u32, minor: u32) -> FrameworkName {
    FrameworkName::new(identifier, FrameworkVersion::new(major, minor))
}

fn fw3(identifier: &str, major: u32, minor: u32, build: u32) -> FrameworkName {
    FrameworkName::new(
        identifier,
        FrameworkVersion::from_components([major, minor, build, 0]),
    )
}

fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

impl FrameworkMappings {
    /// The process-wide default tables.
    pub fn shared() -> Arc<FrameworkMappings> {
        Arc::clone(&SHARED)
    }

    pub fn canonical_identifier(&self, identifier: &str) -> String {
        self.identifier_synonyms
            .iter()
            .find(|(synonym, _)| synonym.eq_ignore_ascii_case(identifier))
            .map(|(_, canonical)| canonical.clone())
            .or_else(|| {
                self.identifier_short_names
                    .iter()
                    .find(|(_, full)| full.eq_ignore_ascii_case(identifier))
                    .map(|(_, full)| full.clone())
            })
            .unwrap_or_else(|| identifier.to_string())
    }

    pub fn identifier_from_short_name(&self, short_name: &str) -> Option<&str> {
        self.identifier_short_names
            .iter()
            .find(|(short, _)| short.eq_ignore_ascii_case(short_name))
            .map(|(_, full)| full.as_str())
    }

    pub fn short_name_for_identifier(&self, identifier: &str) -> Option<&str> {
        self.identifier_short_names
            .iter()
            .find(|(_, full)| full.eq_ignore_ascii_case(identifier))
            .map(|(short, _)| short.as_str())
    }

    /// Unknown short profiles are kept as written.
    pub fn profile_from_short_name(&self, identifier: &str, short_name: &str) -> String {
        self.profile_short_names
            .iter()
            .find(|p| {
                p.identifier.eq_ignore_ascii_case(identifier)
                    && p.short_name.eq_ignore_ascii_case(short_name)
            })
            .map(|p| p.profile.clone())
            .unwrap_or_else(|| short_name.to_string())
    }

    pub fn short_name_for_profile(&self, identifier: &str, profile: &str) -> String {
        self.profile_short_names
            .iter()
            .find(|p| {
                p.identifier.eq_ignore_ascii_case(identifier)
                    && p.profile.eq_ignore_ascii_case(profile)
            })
            .map(|p| p.short_name.clone())
            .unwrap_or_else(|| profile.to_ascii_lowercase())
    }

    pub fn is_single_digit_version(&self, identifier: &str) -> bool {
        self.single_digit_version_frameworks
            .iter()
            .any(|f| f.eq_ignore_ascii_case(identifier))
    }

    pub fn portable_profile(&self, number: u32) -> Option<&[FrameworkName]> {
        self.portable_profiles
            .iter()
            .find(|p| p.number == number)
            .map(|p| p.frameworks.as_slice())
    }

    /// The profile number whose member set equals `frameworks`, in any order.
    pub fn portable_profile_number(&self, frameworks: &[FrameworkName]) -> Option<u32> {
        self.portable_profiles
            .iter()
            .find(|p| {
                p.frameworks.len() == frameworks.len()
                    && p.frameworks.iter().all(|f| frameworks.contains(f))
            })
            .map(|p| p.number)
    }

    pub fn default_mappings() -> FrameworkMappings {
        FrameworkMappings {
            identifier_synonyms: pairs(&[
                ("NETFramework", id::NET),
                (".NET", id::NET),
                ("NETCore", id::NET_CORE),
                ("WinRT", id::NET_CORE),
                (".NETMicroFramework", id::NET_MICRO),
                ("NETPortable", id::PORTABLE),
                ("WindowsPhone", id::WINDOWS_PHONE),
                ("Xamarin.PlayStationThree", "Xamarin.PlayStation3"),
                ("Xamarin.PlayStationFour", "Xamarin.PlayStation4"),
                ("Xamarin.PlayStationVita", "Xamarin.PSVita"),
            ]),
            identifier_short_names: pairs(&[
                ("net", id::NET),
                ("netcore", id::NET_CORE),
                ("winrt", id::NET_CORE),
                ("netmf", id::NET_MICRO),
                ("win", id::WINDOWS),
                ("wp", id::WINDOWS_PHONE),
                ("wpa", id::WINDOWS_PHONE_APP),
                ("sl", id::SILVERLIGHT),
                ("portable", id::PORTABLE),
                ("dotnet", id::NET_PLATFORM),
                ("dnx", id::DNX),
                ("dnxcore", id::DNX_CORE),
                ("aspnet", id::ASP_NET),
                ("aspnetcore", id::ASP_NET_CORE),
                ("uap", id::UAP),
                ("monoandroid", id::MONO_ANDROID),
                ("monotouch", id::MONO_TOUCH),
                ("monomac", id::MONO_MAC),
                ("xamarinios", id::XAMARIN_IOS),
                ("xamarinmac", id::XAMARIN_MAC),
                ("native", id::NATIVE),
            ]),
            profile_short_names: [
                (id::NET, "client", "Client"),
                (id::NET, "full", ""),
                (id::NET, "cf", "CompactFramework"),
                (id::SILVERLIGHT, "wp", "WindowsPhone"),
                (id::SILVERLIGHT, "wp71", "WindowsPhone71"),
            ]
            .into_iter()
            .map(|(identifier, short_name, profile)| ProfileShortName {
                identifier: identifier.to_string(),
                short_name: short_name.to_string(),
                profile: profile.to_string(),
            })
            .collect(),
            single_digit_version_frameworks: [id::WINDOWS, id::WINDOWS_PHONE, id::SILVERLIGHT]
                .map(String::from)
                .to_vec(),
            equivalent_frameworks: vec![
                (fw(id::WINDOWS, 0, 0), fw(id::WINDOWS, 8, 0)),
                (fw(id::WINDOWS, 8, 0), fw(id::NET_CORE, 4, 5)),
                (fw(id::WINDOWS, 8, 1), fw3(id::NET_CORE, 4, 5, 1)),
                (fw(id::NET_CORE, 0, 0), fw(id::NET_CORE, 4, 5)),
                (fw(id::WINDOWS_PHONE, 0, 0), fw(id::WINDOWS_PHONE, 7, 0)),
                (
                    fw(id::WINDOWS_PHONE, 7, 0),
                    fw(id::SILVERLIGHT, 3, 0).with_profile("WindowsPhone"),
                ),
                (
                    fw(id::WINDOWS_PHONE, 7, 1),
                    fw(id::SILVERLIGHT, 4, 0).with_profile("WindowsPhone71"),
                ),
                (
                    fw(id::WINDOWS_PHONE, 8, 0),
                    fw(id::SILVERLIGHT, 8, 0).with_profile("WindowsPhone"),
                ),
                (
                    fw(id::WINDOWS_PHONE, 8, 1),
                    fw(id::SILVERLIGHT, 8, 1).with_profile("WindowsPhone"),
                ),
                (fw(id::WINDOWS_PHONE_APP, 0, 0), fw(id::WINDOWS_PHONE_APP, 8, 1)),
                (fw(id::DNX, 0, 0), fw(id::DNX, 4, 5)),
                (fw(id::DNX_CORE, 0, 0), fw(id::DNX_CORE, 5, 0)),
                (fw(id::NET_PLATFORM, 0, 0), fw(id::NET_PLATFORM, 5, 0)),
                (fw(id::ASP_NET, 0, 0), fw(id::ASP_NET, 5, 0)),
                (fw(id::ASP_NET_CORE, 0, 0), fw(id::ASP_NET_CORE, 5, 0)),
                (fw(id::UAP, 0, 0), fw(id::UAP, 10, 0)),
            ],
            equivalent_profiles: [
                (id::NET, "Client", ""),
                (id::NET, "Full", ""),
                (id::SILVERLIGHT, "WindowsPhone71", "WindowsPhone"),
            ]
            .into_iter()
            .map(|(identifier, profile, equivalent)| EquivalentProfile {
                identifier: identifier.to_string(),
                profile: profile.to_string(),
                equivalent: equivalent.to_string(),
            })
            .collect(),
            subset_frameworks: pairs(&[(id::NET, id::DNX)]),
            compatibility_mappings: default_compatibility_mappings(),
            equivalent_project_frameworks: vec![
                EquivalentProjectFramework {
                    identifier: id::DNX.to_string(),
                    equivalent: id::ASP_NET.to_string(),
                    version: Some(FrameworkVersion::new(5, 0)),
                },
                EquivalentProjectFramework {
                    identifier: id::DNX_CORE.to_string(),
                    equivalent: id::ASP_NET_CORE.to_string(),
                    version: Some(FrameworkVersion::new(5, 0)),
                },
                EquivalentProjectFramework {
                    identifier: id::ASP_NET.to_string(),
                    equivalent: id::NET.to_string(),
                    version: None,
                },
            ],
            profile_compatibility: vec![
                ProfileCompatibility {
                    identifier: id::NET.to_string(),
                    candidate_profile: "Client".to_string(),
                    project_profiles: vec![String::new()],
                },
                ProfileCompatibility {
                    identifier: id::NET.to_string(),
                    candidate_profile: String::new(),
                    project_profiles: vec!["Client".to_string()],
                },
                ProfileCompatibility {
                    identifier: id::SILVERLIGHT.to_string(),
                    candidate_profile: "WindowsPhone".to_string(),
                    project_profiles: vec!["WindowsPhone71".to_string()],
                },
                ProfileCompatibility {
                    identifier: id::SILVERLIGHT.to_string(),
                    candidate_profile: "WindowsPhone71".to_string(),
                    project_profiles: vec!["WindowsPhone".to_string()],
                },
            ],
            portable_profiles: default_portable_profiles(),
        }
    }
}

fn default_compatibility_mappings() -> Vec<OneWayCompatibilityMapping> {
    let max = |identifier: &str| FrameworkName::new(identifier, FrameworkVersion::MAX);
    let range = |min: FrameworkName, max: FrameworkName| FrameworkRange::new(min, max);
    let dotnet = |major: u32, minor: u32| {
        FrameworkRange::new(fw(id::NET_PLATFORM, 5, 0), fw(id::NET_PLATFORM, major, minor))
    };
    let from = |framework: FrameworkName| {
        let identifier = framework.framework().to_string();
        range(framework, max(&identifier))
    };

    vec![
        OneWayCompatibilityMapping {
            target: from(fw(id::UAP, 10, 0)),
            supported: range(fw(id::WINDOWS, 0, 0), fw(id::WINDOWS, 8, 1)),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::UAP, 10, 0)),
            supported: range(fw(id::WINDOWS_PHONE_APP, 0, 0), fw(id::WINDOWS_PHONE_APP, 8, 1)),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::UAP, 10, 0)),
            supported: range(fw(id::NET_CORE, 0, 0), fw3(id::NET_CORE, 4, 5, 1)),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::NET, 4, 5)),
            supported: dotnet(5, 2),
        },
        OneWayCompatibilityMapping {
            target: from(fw3(id::NET, 4, 5, 1)),
            supported: dotnet(5, 3),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::NET, 4, 6)),
            supported: dotnet(5, 4),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::WINDOWS, 8, 0)),
            supported: dotnet(5, 2),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::WINDOWS, 8, 1)),
            supported: dotnet(5, 3),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::WINDOWS_PHONE_APP, 8, 1)),
            supported: dotnet(5, 3),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::UAP, 10, 0)),
            supported: dotnet(5, 4),
        },
        OneWayCompatibilityMapping {
            target: from(fw(id::DNX_CORE, 5, 0)),
            supported: dotnet(5, 5),
        },
    ]
}

fn default_portable_profiles() -> Vec<PortableProfile> {
    let net4 = || fw(id::NET, 4, 0);
    let net403 = || fw3(id::NET, 4, 0, 3);
    let net45 = || fw(id::NET, 4, 5);
    let net451 = || fw3(id::NET, 4, 5, 1);
    let sl4 = || fw(id::SILVERLIGHT, 4, 0);
    let sl5 = || fw(id::SILVERLIGHT, 5, 0);
    let win8 = || fw(id::WINDOWS, 8, 0);
    let win81 = || fw(id::WINDOWS, 8, 1);
    let wp7 = || fw(id::WINDOWS_PHONE, 7, 0);
    let wp75 = || fw(id::WINDOWS_PHONE, 7, 5);
    let wp8 = || fw(id::WINDOWS_PHONE, 8, 0);
    let wp81 = || fw(id::WINDOWS_PHONE, 8, 1);
    let wpa81 = || fw(id::WINDOWS_PHONE_APP, 8, 1);

    let table: Vec<(u32, Vec<FrameworkName>)> = vec![
        (2, vec![net4(), win8(), sl4(), wp7()]),
        (3, vec![net4(), sl4()]),
        (4, vec![net45(), sl4(), win8(), wp7()]),
        (5, vec![net4(), win8()]),
        (6, vec![net403(), win8()]),
        (7, vec![net45(), win8()]),
        (14, vec![net4(), sl5()]),
        (18, vec![net403(), sl4()]),
        (19, vec![net403(), sl5()]),
        (23, vec![net45(), sl4()]),
        (24, vec![net45(), sl5()]),
        (31, vec![win81(), wp81()]),
        (32, vec![win81(), wpa81()]),
        (36, vec![net4(), sl4(), win8(), wp8()]),
        (37, vec![net4(), sl5(), win8()]),
        (41, vec![net403(), sl4(), win8()]),
        (42, vec![net403(), sl5(), win8()]),
        (44, vec![net451(), win81()]),
        (46, vec![net45(), sl4(), win8()]),
        (47, vec![net45(), sl5(), win8()]),
        (49, vec![net45(), wp8()]),
        (78, vec![net45(), win8(), wp8()]),
        (84, vec![wp81(), wpa81()]),
        (88, vec![net4(), sl4(), win8(), wp75()]),
        (92, vec![net4(), win8(), wpa81()]),
        (95, vec![net403(), sl4(), win8(), wp7()]),
        (96, vec![net403(), sl4(), win8(), wp75()]),
        (102, vec![net403(), win8(), wpa81()]),
        (104, vec![net45(), sl4(), win8(), wp75()]),
        (111, vec![net45(), win8(), wpa81()]),
        (136, vec![net4(), sl5(), win8(), wp8()]),
        (143, vec![net403(), sl4(), win8(), wp8()]),
        (147, vec![net403(), sl5(), win8(), wp8()]),
        (151, vec![net451(), win81(), wpa81()]),
        (154, vec![net45(), sl4(), win8(), wp8()]),
        (157, vec![win81(), wp81(), wpa81()]),
        (158, vec![net45(), sl5(), win8(), wp8()]),
        (225, vec![net4(), sl5(), win8(), wpa81()]),
        (240, vec![net403(), sl5(), win8(), wpa81()]),
        (255, vec![net45(), sl5(), win8(), wpa81()]),
        (259, vec![net45(), win8(), wpa81(), wp8()]),
        (328, vec![net4(), sl5(), win8(), wpa81(), wp8()]),
        (336, vec![net403(), sl5(), win8(), wpa81(), wp8()]),
        (344, vec![net45(), sl5(), win8(), wpa81(), wp8()]),
    ];

    table
        .into_iter()
        .map(|(number, frameworks)| PortableProfile { number, frameworks })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identifier_lookup_is_case_insensitive() {
        let m = FrameworkMappings::shared();
        assert_eq!(m.identifier_from_short_name("NET"), Some(id::NET));
        assert_eq!(m.short_name_for_identifier(".netframework"), Some("net"));
        assert_eq!(m.canonical_identifier("NETCore"), id::NET_CORE);
        assert_eq!(m.canonical_identifier("dnx"), id::DNX);
        assert_eq!(m.canonical_identifier("Custom"), "Custom");
    }

    #[test]
    fn profiles() {
        let m = FrameworkMappings::shared();
        assert_eq!(m.profile_from_short_name(id::NET, "client"), "Client");
        assert_eq!(m.profile_from_short_name(id::NET, "odd"), "odd");
        assert_eq!(m.short_name_for_profile(id::SILVERLIGHT, "WindowsPhone71"), "wp71");
    }

    #[test]
    fn portable_profiles() {
        let m = FrameworkMappings::shared();
        let members = m.portable_profile(7).unwrap();
        assert_eq!(members, &[fw(id::NET, 4, 5), fw(id::WINDOWS, 8, 0)]);
        let reversed = [fw(id::WINDOWS, 8, 0), fw(id::NET, 4, 5)];
        assert_eq!(m.portable_profile_number(&reversed), Some(7));
        assert!(m.portable_profile(1).is_none());
    }

    #[test]
    fn framework_range() {
        let range = FrameworkRange::new(fw(id::NET_PLATFORM, 5, 0), fw(id::NET_PLATFORM, 5, 2));
        assert!(range.satisfies(&fw(id::NET_PLATFORM, 5, 1)));
        assert!(!range.satisfies(&fw(id::NET_PLATFORM, 5, 3)));
        assert!(!range.satisfies(&fw(id::NET, 5, 1)));
    }
}
