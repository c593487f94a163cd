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

mod test_cases;

use std::path::{Path, PathBuf};

use expect_test::Expect;

pub fn check<S: AsRef<str>>(actual: S, expect: Expect) {
    expect.assert_eq(actual.as_ref())
}

pub fn dnx_bin() -> PathBuf {
    snapbox::cmd::cargo_bin("dnx")
}

// the fixture directory in tests/test_cases/<sub>
fn test_dir(sub: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_cases")
        .join(sub)
}

#[track_caller]
fn get_stdout(
    dir: &impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> String {
    let out = snapbox::cmd::Command::new(dnx_bin())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("DNX_CATALOG")
        .env_remove("DNX_FRAMEWORK")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .to_owned();

    std::str::from_utf8(&out).unwrap().replace("\r\n", "\n")
}

#[track_caller]
fn get_stderr(
    dir: &impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> String {
    let out = snapbox::cmd::Command::new(dnx_bin())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("DNX_CATALOG")
        .env_remove("DNX_FRAMEWORK")
        .args(args)
        .assert()
        .success()
        .get_output()
        .stderr
        .to_owned();

    std::str::from_utf8(&out).unwrap().replace("\r\n", "\n")
}

#[track_caller]
fn get_err_stderr(
    dir: &impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> String {
    let out = snapbox::cmd::Command::new(dnx_bin())
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("DNX_CATALOG")
        .env_remove("DNX_FRAMEWORK")
        .args(args)
        .assert()
        .failure()
        .get_output()
        .stderr
        .to_owned();

    std::str::from_utf8(&out).unwrap().replace("\r\n", "\n")
}
