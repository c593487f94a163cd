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

use expect_test::expect;

use super::*;

#[test]
fn test_resolve_nearest_wins() {
    let dir = test_dir("sample.in");
    check(
        get_stdout(&dir, ["resolve", "App", "--framework", "net45"]),
        expect![[r#"
            App 1.0.0
                Logging 1.0.0 => Logging 1.0.0
                Json 6.0.0 => Json 6.0.0
                System => System 4.0.0.0
            Logging 1.0.0
                Json 7.0.0 => Json 6.0.0
            Json 6.0.0
            System 4.0.0.0
        "#]],
    );
    check(
        get_stderr(&dir, ["resolve", "App", "--framework", "net45"]),
        expect![""],
    );
}

#[test]
fn test_resolve_reports_unresolved() {
    let dir = test_dir("sample.in");
    check(
        get_stdout(&dir, ["resolve", "App", "-f", "dnxcore50", "--version", "1.0.0"]),
        expect![[r#"
            App 1.0.0
                System.Runtime 4.0.20 => System.Runtime 4.0.20
                Missing 1.0.0 => unresolved
            System.Runtime 4.0.20
            Missing 1.0.0 (unresolved)
        "#]],
    );

    let stderr = get_stderr(&dir, ["resolve", "App", "-f", "dnxcore50"]);
    assert!(stderr.contains("Unable to locate Missing 1.0.0, required by App 1.0.0"));
    assert!(stderr.contains("searched catalog.json"));

    let stderr = get_stderr(&dir, ["resolve", "App", "-f", "dnxcore50", "--quiet"]);
    assert!(!stderr.contains("searched"));
}

#[test]
fn test_resolve_json() {
    let dir = test_dir("sample.in");
    let out = get_stdout(&dir, ["resolve", "App", "-f", "net45", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["framework"], "net45");
    assert_eq!(json["complete"], true);

    let libraries = json["libraries"].as_array().unwrap();
    let names: Vec<&str> = libraries
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["App", "Logging", "Json", "System"]);

    let app = &libraries[0];
    assert_eq!(app["version"], "1.0.0");
    assert_eq!(app["type"], "package");
    assert_eq!(app["provider"], "catalog");
    assert_eq!(app["framework"], "net45");
    assert_eq!(app["dependencyType"], "default");

    let logging = &libraries[1];
    assert_eq!(logging["dependencies"][0]["range"], "7.0.0");
    assert_eq!(logging["dependencies"][0]["resolved"], "6.0.0");

    let system = &libraries[3];
    assert_eq!(system["type"], "referenceAssembly");
    assert_eq!(system["provider"], "reference assemblies");
    assert_eq!(system["framework"], "net40");
}

#[test]
fn test_resolve_catalog_from_env() {
    let dir = test_dir("sample.in");
    let elsewhere = tempfile::TempDir::new().unwrap();
    let out = snapbox::cmd::Command::new(dnx_bin())
        .current_dir(elsewhere.path())
        .env_remove("RUST_LOG")
        .env("DNX_CATALOG", dir.join("catalog.json"))
        .env("DNX_FRAMEWORK", "net45")
        .args(["resolve", "Json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .to_owned();
    check(std::str::from_utf8(&out).unwrap(), expect![[r#"
        Json 7.0.0
    "#]]);
}

#[test]
fn test_resolve_bad_catalog() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("catalog.json"), r#"{ "packages": { "A": { "one": {} } } }"#)
        .unwrap();
    let stderr = get_err_stderr(&dir, ["resolve", "A", "-f", "net45"]);
    assert!(stderr.contains("failed to load `catalog.json`"));
    assert!(stderr.contains("`A one` has a bad version"));

    let missing = tempfile::TempDir::new().unwrap();
    let stderr = get_err_stderr(&missing, ["resolve", "A", "-f", "net45"]);
    assert!(stderr.contains("failed to load `catalog.json`"));
}

#[test]
fn test_resolve_bad_arguments() {
    let dir = test_dir("sample.in");
    let stderr = get_err_stderr(&dir, ["resolve", "App", "-f", "nonsense!"]);
    assert!(stderr.contains("unrecognized framework `nonsense!`"));

    let stderr = get_err_stderr(&dir, ["resolve", "App", "-f", "net45", "--version", "x.y"]);
    assert!(stderr.contains("invalid version for `App`"));
}

#[test]
fn test_resolve_cycle_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("catalog.json"),
        r#"{ "packages": {
            "A": { "1.0": { "frameworks": { "": { "B": "1.0" } } } },
            "B": { "1.0": { "frameworks": { "": { "A": "1.0" } } } }
        } }"#,
    )
    .unwrap();
    let stderr = get_err_stderr(&dir, ["resolve", "A", "-f", "net45"]);
    assert!(stderr.contains("failed to resolve `A`"));
    assert!(stderr.contains("Cyclic dependency detected: A -> B -> A"));
}

#[test]
fn test_compat() {
    let dir = test_dir("sample.in");
    let out = get_stdout(&dir, ["compat", "dnx451", "net45"]);
    assert!(out.starts_with("compatible\nscore: "));
    check(
        get_stdout(&dir, ["compat", "net45", "dnxcore50", "-q"]),
        expect![[r#"
            incompatible
        "#]],
    );
}

#[test]
fn test_nearest() {
    let dir = test_dir("sample.in");
    check(
        get_stdout(&dir, ["nearest", "net451", "net40", "net45", "net20"]),
        expect![[r#"
            nearest: net45
            covering: net45
        "#]],
    );

    let out = snapbox::cmd::Command::new(dnx_bin())
        .current_dir(&dir)
        .args(["nearest", "net35", "net40", "net45"])
        .assert()
        .code(1)
        .get_output()
        .stderr
        .to_owned();
    assert!(std::str::from_utf8(&out)
        .unwrap()
        .contains("no candidate is compatible with net35"));
}

#[test]
fn test_expand() {
    let dir = test_dir("sample.in");
    check(
        get_stdout(&dir, ["expand", "wpa81"]),
        expect![[r#"
            wpa
            dotnet50
            dotnet53
            dotnet
        "#]],
    );
}
