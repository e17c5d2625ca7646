//! Integration tests for swpack

mod lifecycle;

mod support {
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Temp workspace with a config file pointing stores into it
    pub struct Workspace {
        pub dir: TempDir,
    }

    impl Workspace {
        pub fn new(base_url: &str) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("site")).unwrap();
            let config = format!(
                "[general]\naudit_log = false\n\n[store]\nroot = {:?}\n\n[origin]\nbase_url = {:?}\n\n[fetch]\ntimeout_secs = 5\n",
                dir.path().join("stores").display().to_string(),
                base_url
            );
            std::fs::write(dir.path().join("config.toml"), config).unwrap();
            Self { dir }
        }

        pub fn config(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        pub fn site(&self) -> PathBuf {
            self.dir.path().join("site")
        }

        pub fn manifest(&self) -> PathBuf {
            self.site().join("sw-pack.json")
        }

        pub fn write_site(&self, path: &str, body: &str) {
            std::fs::write(self.site().join(path), body).unwrap();
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }
    }
}

mod cli_tests {
    use super::support::Workspace;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use httpmock::prelude::*;
    use httpmock::Mock;
    use predicates::prelude::*;

    fn swpack() -> Command {
        cargo_bin_cmd!("swpack")
    }

    /// Command bound to the workspace config, ignoring any local config
    fn swpack_in(ws: &Workspace) -> Command {
        let mut cmd = swpack();
        cmd.current_dir(ws.path())
            .arg("--no-local")
            .arg("--config")
            .arg(ws.config());
        cmd
    }

    /// Write `files` into the site, serve them from `origin`, then build
    fn build_site<'a>(
        ws: &Workspace,
        origin: &'a MockServer,
        files: &[(&str, &str)],
    ) -> Vec<Mock<'a>> {
        let served = files
            .iter()
            .map(|(path, body)| {
                ws.write_site(path, body);
                origin.mock(|when, then| {
                    when.method(GET).path(format!("/{}", path));
                    then.status(200).header("content-type", "text/plain").body(*body);
                })
            })
            .collect();

        let mut cmd = swpack_in(ws);
        cmd.arg("build").arg("--root").arg(ws.site());
        for (path, _) in files {
            cmd.arg(path);
        }
        cmd.assert().success();
        served
    }

    #[test]
    fn help_displays() {
        swpack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("versioned resource packs"));
    }

    #[test]
    fn version_displays() {
        swpack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swpack"));
    }

    #[test]
    fn completions_print_without_config() {
        swpack()
            .args(["completions", "bash"])
            .env("SWPACK_CONFIG", "/nonexistent/config.toml")
            .assert()
            .success()
            .stdout(predicate::str::contains("swpack"));
    }

    #[test]
    fn config_path_honors_flag() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_set_then_show() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .args(["config", "set", "retention.max_archive_mb", "16"])
            .assert()
            .success();
        swpack_in(&ws)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("max_archive_mb = 16"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn build_writes_manifest() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        ws.write_site("index.html", "<html>");
        ws.write_site("app.js", "console.log(1)");

        swpack_in(&ws)
            .arg("build")
            .arg("--root")
            .arg(ws.site())
            .args(["index.html", "app.js", "app.js", "--pack-version", "1.2.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Built pack"));

        let manifest = std::fs::read_to_string(ws.manifest()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(json["cache"].as_array().unwrap().len(), 2);
        assert_eq!(json["cache"][0]["path"], "index.html");
        assert_eq!(json["version"], "1.2.0");
        assert_eq!(json["archiveVersions"], 1);
    }

    #[test]
    fn build_missing_input_fails() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .arg("build")
            .arg("--root")
            .arg(ws.site())
            .arg("missing.js")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn activate_without_pack_fails_with_hint() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No pack is installed"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn route_without_pack_passes_through() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        swpack_in(&ws)
            .args(["route", "http://127.0.0.1:9/index.html"])
            .assert()
            .success()
            .stdout(predicate::str::contains("passthrough"));
    }

    #[test]
    fn install_against_unreachable_origin_aborts() {
        let ws = Workspace::new("http://127.0.0.1:9/");
        ws.write_site("index.html", "<html>");
        swpack_in(&ws)
            .arg("build")
            .arg("--root")
            .arg(ws.site())
            .arg("index.html")
            .assert()
            .success();

        swpack_in(&ws)
            .arg("install")
            .arg(ws.manifest())
            .assert()
            .failure()
            .code(75)
            .stderr(predicate::str::contains("aborted"));

        swpack_in(&ws)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"current\": null"));
    }

    #[test]
    fn install_route_and_upgrade() {
        let origin = MockServer::start();
        let ws = Workspace::new(&origin.base_url());

        let v1 = build_site(&ws, &origin, &[("index.html", "<html>v1"), ("app.js", "v1")]);
        swpack_in(&ws)
            .arg("install")
            .arg(ws.manifest())
            .assert()
            .success()
            .stdout(predicate::str::contains("is active"));

        swpack_in(&ws)
            .arg("route")
            .arg(origin.url("/app.js"))
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"))
            .stdout(predicate::str::contains("Status: 200"));

        swpack_in(&ws)
            .arg("route")
            .arg(origin.url("/settings"))
            .arg("--navigate")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache"));

        // index.html is unchanged, app.js is new
        for mut mock in v1 {
            mock.delete();
        }
        let v2 = build_site(&ws, &origin, &[("index.html", "<html>v1"), ("app.js", "v2")]);
        swpack_in(&ws)
            .arg("install")
            .arg(ws.manifest())
            .assert()
            .success()
            .stdout(predicate::str::contains("1 reused, 1 fetched"));
        v2[0].assert_hits(0);
        v2[1].assert_hits(1);

        swpack_in(&ws)
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("$$$sw-pack-internal"))
            .stdout(predicate::str::contains("sw-pack-").count(3));
    }

    #[test]
    fn route_miss_returns_origin_status() {
        let origin = MockServer::start();
        let ws = Workspace::new(&origin.base_url());
        build_site(&ws, &origin, &[("index.html", "<html>")]);
        swpack_in(&ws).arg("install").arg(ws.manifest()).assert().success();

        let missing = origin.mock(|when, then| {
            when.method(GET).path("/missing.css");
            then.status(404).body("not found");
        });

        swpack_in(&ws)
            .arg("route")
            .arg(origin.url("/missing.css"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Status: 404"))
            .stdout(predicate::str::contains("network"));
        missing.assert();
    }

    #[test]
    fn install_with_missing_resource_aborts() {
        let origin = MockServer::start();
        let ws = Workspace::new(&origin.base_url());
        let mut served = build_site(&ws, &origin, &[("index.html", "<html>"), ("app.js", "v1")]);
        if let Some(mut app) = served.pop() {
            app.delete();
        }
        origin.mock(|when, then| {
            when.method(GET).path("/app.js");
            then.status(404);
        });

        swpack_in(&ws)
            .arg("install")
            .arg(ws.manifest())
            .assert()
            .failure()
            .stderr(predicate::str::contains("aborted: 1 of 2 entries failed"));

        swpack_in(&ws)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"current\": null"));
    }

    #[test]
    fn purge_requires_confirmation() {
        let origin = MockServer::start();
        let ws = Workspace::new(&origin.base_url());
        build_site(&ws, &origin, &[("index.html", "<html>")]);
        swpack_in(&ws).arg("install").arg(ws.manifest()).assert().success();

        // Non-interactive default is "no"
        swpack_in(&ws)
            .arg("purge")
            .assert()
            .success()
            .stdout(predicate::str::contains("cancelled"));

        swpack_in(&ws)
            .args(["purge", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Purged 2 store(s)"));

        swpack_in(&ws)
            .args(["status", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }
}
