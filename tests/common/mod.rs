//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(dead_code)]
pub const CONFIG_JSON: &str = r#"{
    "TIN": "12345678",
    "Name": "Acme d.o.o.",
    "VAT": "30/31-00001-5",
    "Environment": "TEST",
    "BusinUnitCode": "bu1",
    "TCRCode": "tcr1",
    "SoftCode": "soft1",
    "OperatorCode": "op1",
    "Typless": { "APIKey": "key", "Template": "tpl" }
}"#;

/// Stand-in for every stage tool: logs its argv to `calls.log`, writes a
/// canned body to the `-out` path, and exits 7 when `fail-<name>` exists.
#[cfg(unix)]
#[allow(dead_code)]
const STAGE_SCRIPT: &str = r#"#!/bin/sh
name=$(basename "$0")
echo "$name $*" >> calls.log
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-out" ]; then out="$2"; fi
  shift 2
done
case "$name" in
  dsig) body='<Request><Invoice IIC="ABC123"/></Request>' ;;
  reg) body='<Response><FIC>XYZ</FIC></Response>' ;;
  *) body="$name" ;;
esac
if [ -n "$out" ]; then printf '%s' "$body" > "$out"; fi
if [ -f "fail-$name" ]; then exit 7; fi
exit 0
"#;

/// Working directory populated with config.json and, optionally, stage tools.
pub struct WorkDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl WorkDir {
    pub fn with_config(config: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::write(dir.path().join("config.json"), config).expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Install the stage stand-ins. Call from a single test per binary so
    /// no concurrent fork inherits a script opened for writing.
    #[cfg(unix)]
    pub fn install_stage_tools(&self) {
        use std::os::unix::fs::PermissionsExt;

        for name in ["extract", "bridge", "iic", "dsig", "reg", "keep", "qrc", "pdf"] {
            let path = self.path().join(name);
            fs::write(&path, STAGE_SCRIPT).expect("write stage script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("make stage script executable");
        }
    }

    pub fn fail_stage(&self, name: &str) {
        self.file(&format!("fail-{name}"), "");
    }

    /// Stage names in invocation order, read from `calls.log`.
    pub fn invoked(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|line| line.split_whitespace().next().map(str::to_string))
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("calls.log"))
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
