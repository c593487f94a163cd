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

use dnxutil::{FrameworkName, cli::UniversalFlags, framework::FrameworkReducer};

use super::parse_target_framework;

/// Pick the candidate framework nearest to a project framework
#[derive(Debug, clap::Parser)]
pub struct NearestSubcommand {
    /// The framework of the consuming project
    pub framework: String,

    /// The frameworks to choose from
    #[clap(required = true)]
    pub candidates: Vec<String>,
}

pub fn run_nearest(cli: &UniversalFlags, cmd: NearestSubcommand) -> anyhow::Result<i32> {
    let framework = parse_target_framework(&cmd.framework)?;
    let candidates: Vec<FrameworkName> = cmd
        .candidates
        .iter()
        .map(|c| FrameworkName::parse(c))
        .collect();
    let reducer = FrameworkReducer::default();

    let Some(nearest) = reducer.get_nearest(&framework, &candidates) else {
        if !cli.quiet {
            eprintln!("no candidate is compatible with {}", framework.short_folder_name());
        }
        return Ok(1);
    };
    println!("nearest: {}", nearest.short_folder_name());

    let compatible: Vec<FrameworkName> = candidates
        .iter()
        .filter(|c| reducer.provider().is_compatible(&framework, c))
        .cloned()
        .collect();
    let covering: Vec<String> = reducer
        .reduce_upwards(&compatible)
        .iter()
        .map(|f| f.short_folder_name())
        .collect();
    println!("covering: {}", covering.join(" "));
    Ok(0)
}
