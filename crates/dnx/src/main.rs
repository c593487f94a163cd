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

use std::io::IsTerminal;

use clap::Parser;
use cli::DnxSubcommands;
use dnxutil::cli::UniversalFlags;

mod cli;

use colored::*;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging.
///
/// `RUST_LOG` filters the output printed to stderr. Without it, warnings are
/// shown, `--verbose` shows debug logs and `--quiet` only shows errors.
/// Records from the `log` facade are forwarded as well.
fn init_tracing(flags: &UniversalFlags) {
    // usage example: only show debug logs for the walker
    // env RUST_LOG=dnxresolve::resolver::walker=debug cargo run -- resolve App -f net45

    let log_env_set = std::env::var("RUST_LOG").is_ok();
    let default_level = if flags.verbose {
        tracing::Level::DEBUG
    } else if flags.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt = tracing_subscriber::fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_line_number(log_env_set)
        .with_level(true)
        .with_writer(std::io::stderr);
    let fmt = if !log_env_set {
        fmt.with_target(false).without_time().boxed()
    } else {
        fmt.compact().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt.with_filter(filter))
        .init();
}

pub fn main() {
    let cli = cli::DnxCli::parse();
    let flags = cli.flags;

    init_tracing(&flags);

    use DnxSubcommands::*;
    let res = match cli.subcommand {
        Resolve(r) => cli::run_resolve(&flags, r),
        Compat(c) => cli::run_compat(&flags, c),
        Nearest(n) => cli::run_nearest(&flags, n),
        Expand(e) => cli::run_expand(&flags, e),
    };

    match res {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:?}", "error".red().bold(), e);
            std::process::exit(-1);
        }
    }
}
