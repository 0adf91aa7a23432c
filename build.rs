//! Build script that generates man pages from the CLI definition.

use clap::CommandFactory;
use clap_mangen::Man;
use std::{env, fs, path::PathBuf};

#[path = "src/cli.rs"]
#[expect(
    dead_code,
    reason = "Only type definitions are needed for man page generation"
)]
mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");
    println!("cargo:rerun-if-env-changed=CARGO_PKG_NAME");

    let out_dir = PathBuf::from("target/generated-man");
    fs::create_dir_all(&out_dir)?;

    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_owned();
    let package = env::var("CARGO_PKG_NAME").unwrap_or_else(|_| name.clone());
    if name != package {
        return Err(format!("CLI name '{name}' differs from package name '{package}'").into());
    }

    let mut page = Vec::new();
    Man::new(cmd.clone()).render(&mut page)?;
    fs::write(out_dir.join(format!("{name}.1")), page)?;

    // One page per subcommand, named `edagraph-<sub>.1`.
    for sub in cmd.get_subcommands() {
        let sub_name = format!("{name}-{}", sub.get_name());
        let mut buf = Vec::new();
        Man::new(sub.clone()).render(&mut buf)?;
        fs::write(out_dir.join(format!("{sub_name}.1")), buf)?;
    }
    Ok(())
}
