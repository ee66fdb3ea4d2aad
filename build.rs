use std::error::Error;
use vergen_gitcl::{Emitter, GitclBuilder};

/// Emits the VERGEN_GIT_* instructions used for the full version string.
/// # Errors
/// * if `git` is missing or the source tree is not a clone (e.g. a release tarball)
fn emit_git() -> Result<(), Box<dyn Error>> {
    let gitcl = GitclBuilder::default()
        .all()
        .describe(false, true, Some("NoTagShouldMatchThisPattern"))
        .build()?;

    Emitter::default()
        .fail_on_error()
        .add_instructions(&gitcl)?
        .emit()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    if emit_git().is_err() {
        // packaged builds can inject a description, otherwise fall back to "unknown"
        let git_desc = option_env!("SVBENCH_GIT_DESCRIBE").unwrap_or("unknown");
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE={git_desc}");
    }

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=src");
    Ok(())
}
