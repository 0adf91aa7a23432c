//! Makefile generator.
//!
//! This module converts a [`crate::ir::BuildGraph`] into the text read by
//! `make`. Rules are written in graph order, which is already deterministic,
//! so nothing is sorted here.
//!
//! Every recipe line is prefixed with `$(EDAGRAPH_LAUNCHER)` so a wrapper
//! such as a job server or container shim can be injected from the make
//! command line.

// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::fmt::{self, Display, Formatter, Write};

use camino::Utf8PathBuf;
use itertools::Itertools;
use make_env::LAUNCHER_VAR;
use miette::Diagnostic;
use shell_quote::{QuoteRefExt, Sh};
use thiserror::Error;

use crate::ir::{Arg, BuildGraph, Command, RESERVED_OUTPUT, Target, Variable};

/// First line of every generated Makefile.
pub const HEADER: &str = "# Generated by edagraph. Do not edit.";

/// Errors raised while serialising a graph.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum MakefileError {
    /// The graph has no default target.
    #[error("build graph has no default target")]
    #[diagnostic(
        code(edagraph::makefile::missing_default),
        help("call BuildGraph::set_default before generating")
    )]
    MissingDefault,

    /// An argument contains a line break, which cannot appear in a recipe.
    #[error("argument {argument:?} contains a line break")]
    #[diagnostic(code(edagraph::makefile::line_break))]
    LineBreak {
        /// The offending argument.
        argument: String,
    },

    /// Writing to the output buffer failed.
    #[error("failed to format Makefile")]
    #[diagnostic(code(edagraph::makefile::format))]
    Format(#[from] fmt::Error),
}

/// Generate Makefile text for `graph`.
///
/// # Errors
///
/// Returns [`MakefileError`] when the graph has no default target or an
/// argument cannot be represented on a recipe line.
pub fn generate(graph: &BuildGraph) -> Result<String, MakefileError> {
    let default = graph
        .default_target()
        .ok_or(MakefileError::MissingDefault)?;
    let mut out = String::new();
    writeln!(out, "{HEADER}")?;

    if !graph.variables().is_empty() {
        writeln!(out)?;
        for (name, value) in graph.variables() {
            write!(out, "{}", DisplayVariable { name, value })?;
        }
    }

    for target in graph.targets() {
        let recipe = target
            .commands
            .iter()
            .map(render_command)
            .collect::<Result<Vec<_>, _>>()?;
        writeln!(out)?;
        write!(out, "{}", DisplayRule { target, recipe: &recipe })?;
    }

    let phony = std::iter::once(RESERVED_OUTPUT.to_owned())
        .chain(
            graph
                .targets()
                .iter()
                .filter(|t| t.phony)
                .flat_map(|t| t.outputs.iter().map(|o| escape_path(o.as_str()))),
        )
        .join(" ");
    writeln!(out)?;
    writeln!(out, ".PHONY: {phony}")?;
    writeln!(out, "{RESERVED_OUTPUT}: {}", escape_path(default.as_str()))?;
    writeln!(out, ".DEFAULT_GOAL := {RESERVED_OUTPUT}")?;
    Ok(out)
}

/// Quote one word for a shell recipe and escape it for make.
///
/// Words made only of characters the shell treats literally are left bare.
/// Anything else is quoted for a POSIX shell. `$` always becomes `$$`.
///
/// # Errors
///
/// Returns [`MakefileError::LineBreak`] if the word spans lines.
pub fn quote_word(word: &str) -> Result<String, MakefileError> {
    if word.contains(['\n', '\r']) {
        return Err(MakefileError::LineBreak {
            argument: word.to_owned(),
        });
    }
    let quoted = if !word.is_empty() && word.chars().all(is_shell_safe) {
        word.to_owned()
    } else {
        let bytes: Vec<u8> = word.quoted(Sh);
        String::from_utf8_lossy(&bytes).into_owned()
    };
    Ok(quoted.replace('$', "$$"))
}

const fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '-' | '+' | '=' | '.' | '/' | ',' | ':' | '@' | '%' | '^'
        )
}

/// Escape a path for a rule header.
fn escape_path(path: &str) -> String {
    path.replace('$', "$$")
        .replace(' ', "\\ ")
        .replace('#', "\\#")
        .replace(':', "\\:")
}

fn render_command(command: &Command) -> Result<String, MakefileError> {
    let words = command
        .argv()
        .iter()
        .map(|arg| match arg {
            Arg::Literal(text) => quote_word(text),
            Arg::Variable(name) => Ok(format!("$({name})")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(words.join(" "))
}

/// Wrapper struct to display one `?=` definition.
struct DisplayVariable<'a> {
    name: &'a str,
    value: &'a Variable,
}

impl DisplayVariable<'_> {
    fn assign(&self, f: &mut Formatter<'_>, value: &str) -> fmt::Result {
        if value.is_empty() {
            writeln!(f, "{} ?=", self.name)
        } else {
            writeln!(f, "{} ?= {value}", self.name)
        }
    }
}

impl Display for DisplayVariable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.value {
            Variable::Plain(value) => self.assign(f, value),
            Variable::Switched { switch, unset, set } => {
                writeln!(f, "ifeq ($({switch}),)")?;
                self.assign(f, unset)?;
                writeln!(f, "else")?;
                self.assign(f, set)?;
                writeln!(f, "endif")
            }
        }
    }
}

/// Wrapper struct to display a rule with its rendered recipe.
struct DisplayRule<'a> {
    target: &'a Target,
    recipe: &'a [String],
}

impl Display for DisplayRule<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Several outputs of one recipe form a grouped target.
        let separator = if self.target.outputs.len() > 1 { " &:" } else { ":" };
        write!(f, "{}{separator}", join(&self.target.outputs))?;
        if !self.target.dependencies.is_empty() {
            write!(f, " {}", join(&self.target.dependencies))?;
        }
        writeln!(f)?;
        for line in self.recipe {
            writeln!(f, "\t$({LAUNCHER_VAR}) {line}")?;
        }
        Ok(())
    }
}

/// Convert a slice of paths into a space-separated string.
fn join(paths: &[Utf8PathBuf]) -> String {
    paths.iter().map(|p| escape_path(p.as_str())).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("vlogan", "vlogan")]
    #[case("+define+X=1", "+define+X=1")]
    #[case("-timescale=1ns/1ps", "-timescale=1ns/1ps")]
    fn quoting_leaves_safe_words_bare(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(quote_word(word).expect("quote"), expected);
    }

    #[rstest]
    #[case("$HOME")]
    #[case("two words")]
    #[case("it's \"quoted\"")]
    #[case("")]
    fn quoted_words_survive_the_shell(#[case] word: &str) {
        let recipe = quote_word(word).expect("quote").replace("$$", "$");
        assert_eq!(shlex::split(&recipe), Some(vec![word.to_owned()]));
    }

    #[rstest]
    fn line_breaks_are_rejected() {
        assert_eq!(
            quote_word("a\nb"),
            Err(MakefileError::LineBreak {
                argument: "a\nb".into()
            })
        );
    }

    #[rstest]
    fn missing_default_is_an_error() {
        let graph = BuildGraph::default();
        assert_eq!(generate(&graph), Err(MakefileError::MissingDefault));
    }

    #[rstest]
    #[case("my dir/$x#1", "my\\ dir/$$x\\#1")]
    #[case("c:/rtl/a.v", "c\\:/rtl/a.v")]
    fn header_paths_are_escaped(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(escape_path(path), expected);
    }

    fn graph_with_default() -> BuildGraph {
        let mut graph = BuildGraph::default();
        graph.declare_input("c:/rtl/a.v");
        graph
            .add_target(
                vec![Command::program("gen").arg("c:/rtl/a.v")],
                ["model.h", "model.cpp"],
                ["c:/rtl/a.v"],
            )
            .expect("grouped target");
        graph.set_default("model.h").expect("default");
        graph
    }

    #[rstest]
    fn multiple_outputs_form_a_grouped_rule() {
        let text = generate(&graph_with_default()).expect("generate");
        assert!(
            text.contains("model.h model.cpp &: c\\:/rtl/a.v\n"),
            "unexpected Makefile:\n{text}"
        );
        assert!(text.contains("$(EDAGRAPH_LAUNCHER) gen c:/rtl/a.v\n"));
    }

    #[rstest]
    fn switched_variables_emit_a_conditional() {
        let mut graph = graph_with_default();
        graph
            .set_switched_variable("GEN", "GEN_ROOT", "gen", "$(GEN_ROOT)/bin/gen")
            .expect("switched");
        graph.set_variable("GEN_OPTIONS", "").expect("plain");
        let text = generate(&graph).expect("generate");
        assert!(
            text.contains(concat!(
                "ifeq ($(GEN_ROOT),)\n",
                "GEN ?= gen\n",
                "else\n",
                "GEN ?= $(GEN_ROOT)/bin/gen\n",
                "endif\n",
                "GEN_OPTIONS ?=\n",
            )),
            "unexpected Makefile:\n{text}"
        );
    }
}
