use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=DS485SHARK_COMMIT");

    // CI may pin the commit; otherwise ask git, which is absent in source tarballs.
    let commit = env::var("DS485SHARK_COMMIT")
        .ok()
        .map(|value| value.trim().chars().take(7).collect::<String>())
        .filter(|value| !value.is_empty())
        .or_else(|| git(&["describe", "--always", "--dirty", "--abbrev=7"]))
        .unwrap_or_else(|| UNKNOWN.to_string());
    let date = git(&["show", "-s", "--format=%cs", "HEAD"]).unwrap_or_else(|| UNKNOWN.to_string());

    println!("cargo:rustc-env=DS485SHARK_BUILD_COMMIT={commit}");
    println!("cargo:rustc-env=DS485SHARK_BUILD_DATE={date}");
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
