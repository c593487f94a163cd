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

use std::path::PathBuf;

use anyhow::Context;
use colored::*;
use dnxresolve::{
    DependencyWalker, ProviderList, WalkResult,
    provider::{CatalogProvider, ReferenceAssemblyProvider},
};
use dnxutil::{
    LibraryDependencyType, LibraryType, SemanticVersion, VersionRange, catalog::CATALOG_JSON,
    cli::UniversalFlags,
};
use serde::Serialize;

use super::parse_target_framework;

/// Resolve the dependency graph of a package
#[derive(Debug, clap::Parser)]
pub struct ResolveSubcommand {
    /// The package to start from
    pub name: String,

    /// The exact version of the package, defaults to the highest available
    #[clap(long)]
    pub version: Option<String>,

    /// The target framework, e.g. `net45` or `dnxcore50`
    #[clap(long, short = 'f', env = "DNX_FRAMEWORK")]
    pub framework: String,

    /// The package catalog, defaults to `catalog.json` in the current directory
    #[clap(long, env = "DNX_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// The runtime identifier handed to the providers, e.g. `win7-x64`
    #[clap(long)]
    pub runtime: Option<String>,

    /// Print the result as JSON
    #[clap(long)]
    pub json: bool,
}

pub fn run_resolve(cli: &UniversalFlags, cmd: ResolveSubcommand) -> anyhow::Result<i32> {
    let framework = parse_target_framework(&cmd.framework)?;
    let version = cmd
        .version
        .as_deref()
        .map(|v| v.parse::<SemanticVersion>())
        .transpose()
        .with_context(|| format!("invalid version for `{}`", cmd.name))?;

    let catalog_path = cmd.catalog.unwrap_or_else(|| PathBuf::from(CATALOG_JSON));
    let packages = CatalogProvider::from_path(&catalog_path)?;
    let references = ReferenceAssemblyProvider::from_catalog(packages.catalog());
    log::debug!("using catalog {}", catalog_path.display());

    let mut providers = ProviderList::new();
    providers.push(packages).push(references);
    let mut walker = DependencyWalker::new(providers);
    if let Some(runtime) = cmd.runtime {
        walker = walker.with_runtime_identifier(runtime);
    }

    let result = walker
        .walk(&cmd.name, version, &framework)
        .with_context(|| format!("failed to resolve `{}`", cmd.name))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&ResolveJSON::new(&result))?);
    } else {
        print_result(&result);
    }

    if !cli.quiet {
        for unresolved in result.unresolved() {
            eprintln!("{}: {}", "warning".yellow().bold(), unresolved);
            for path in &unresolved.attempted_paths {
                eprintln!("    searched {}", path);
            }
        }
    }

    Ok(0)
}

fn print_result(result: &WalkResult) {
    for (_, library) in result.libraries() {
        if library.is_resolved() {
            println!("{}", library.identity());
        } else {
            println!("{} (unresolved)", library.description.requested_range);
        }
        for dependency in &library.description.dependencies {
            match &dependency.resolved_identity {
                Some(identity) => println!("    {} => {}", dependency.range, identity),
                None if result.find(dependency.name()).is_some() => {
                    println!("    {} => unresolved", dependency.range)
                }
                None => println!("    {} => not selected", dependency.range),
            }
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveJSON<'a> {
    framework: String,
    complete: bool,
    libraries: Vec<LibraryJSON<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LibraryJSON<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a SemanticVersion>,
    #[serde(rename = "type")]
    library_type: LibraryType,
    resolved: bool,
    compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    framework: Option<String>,
    dependency_type: LibraryDependencyType,
    dependencies: Vec<DependencyJSON<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DependencyJSON<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<&'a VersionRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<&'a SemanticVersion>,
}

impl<'a> ResolveJSON<'a> {
    fn new(result: &'a WalkResult) -> Self {
        let libraries = result
            .libraries()
            .map(|(_, library)| {
                let description = &library.description;
                LibraryJSON {
                    name: &description.identity.name,
                    version: description.identity.version.as_ref(),
                    library_type: description.identity.library_type,
                    resolved: description.resolved,
                    compatible: description.compatible,
                    provider: library.provider.as_deref(),
                    framework: description.framework.as_ref().map(|f| f.short_folder_name()),
                    dependency_type: library.dependency_type,
                    dependencies: description
                        .dependencies
                        .iter()
                        .map(|dependency| DependencyJSON {
                            name: dependency.name(),
                            range: dependency.range.version_range.as_ref(),
                            resolved: dependency
                                .resolved_identity
                                .as_ref()
                                .and_then(|identity| identity.version.as_ref()),
                        })
                        .collect(),
                }
            })
            .collect();
        ResolveJSON {
            framework: result.framework().short_folder_name(),
            complete: result.is_complete(),
            libraries,
        }
    }
}
