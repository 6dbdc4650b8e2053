use std::env;
use std::process::Command;

fn main() {
    // Expose the short commit hash as `GIT_HEAD`, so that the daemon can
    // report which revision is deployed. Hosting platforms build from a
    // tarball without `.git`; they may pass the revision in the environment.
    let head = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_owned())
        .or_else(|| env::var("VERCEL_GIT_COMMIT_SHA").ok())
        .or_else(|| env::var("GIT_HEAD").ok())
        .unwrap_or_else(|| String::from("unknown"));

    println!("cargo:rustc-env=GIT_HEAD={head}");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
