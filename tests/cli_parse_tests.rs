//! Unit tests for command-line parsing.

use edagraph::cli::{Cli, Commands, RunArgs};
use rstest::rstest;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from_with_default(std::iter::once("edagraph").chain(args.iter().copied()))
}

#[rstest]
fn build_is_the_default_command() {
    let cli = parse(&[]).expect("parse");
    assert_eq!(cli.command, Some(Commands::Build));
    assert_eq!(cli.work_root, PathBuf::from("."));
}

#[rstest]
#[case(&["run"], RunArgs::default())]
#[case(
    &["run", "--plusarg", "seed=3", "--cmdlinearg", "fast", "--", "+x", "-y"],
    RunArgs {
        plusargs: vec!["seed=3".into()],
        cmdlineargs: vec!["fast".into()],
        raw: vec!["+x".into(), "-y".into()],
    }
)]
fn run_arguments_are_collected(#[case] args: &[&str], #[case] expected: RunArgs) {
    let cli = parse(args).expect("parse");
    assert_eq!(cli.command, Some(Commands::Run(expected)));
}

#[rstest]
#[case(&["-j", "0"])]
#[case(&["-j", "65"])]
#[case(&["-j", "many"])]
#[case(&["run", "--plusarg", "=3"])]
#[case(&["makefile"])]
fn invalid_arguments_are_rejected(#[case] args: &[&str]) {
    assert!(parse(args).is_err(), "{args:?} should be rejected");
}

#[rstest]
fn makefile_accepts_stdout_sentinel() {
    let cli = parse(&["--tool", "verilator", "makefile", "-"]).expect("parse");
    assert_eq!(cli.tool.as_deref(), Some("verilator"));
    assert_eq!(
        cli.command,
        Some(Commands::Makefile {
            file: PathBuf::from("-")
        })
    );
}
