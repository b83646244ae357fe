//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

/// Graph where `app` (repoB) and `admin` (repoC) depend on `lodash` (repoA),
/// and `axios` (repoD) has no dependents.
pub const GRAPH_FIXTURE: &str = concat!(
    r#"{"kind":"node","id":"n1","repository_id":"repoA","package_name":"lodash","version":"4.17.15","type":"direct","is_outdated":true}"#,
    "\n",
    r#"{"kind":"node","id":"n2","repository_id":"repoB","package_name":"app","version":"1.0.0","type":"direct"}"#,
    "\n",
    r#"{"kind":"node","id":"n3","repository_id":"repoC","package_name":"admin","version":"2.3.0","type":"transitive"}"#,
    "\n",
    r#"{"kind":"node","id":"n4","repository_id":"repoD","package_name":"axios","version":"0.21.0","type":"direct"}"#,
    "\n",
    r#"{"kind":"edge","from_node_id":"n2","to_node_id":"n1","version_range":"^4.17.0"}"#,
    "\n",
    r#"{"kind":"edge","from_node_id":"n3","to_node_id":"n1","version_range":"~4.17.15"}"#,
    "\n",
);

/// Overwrite the workspace graph snapshot with `content`.
pub fn write_graph(root: &Path, content: &str) {
    std::fs::write(root.join(".ripple").join("graph.jsonl"), content)
        .expect("Failed to write graph snapshot");
}

/// Run the ripple binary in the specified directory
pub fn run_ripple_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ripple"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("RIPPLE_ASCII", "1")
        .output()
        .expect("Failed to execute ripple binary")
}
