//! Build graph and its construction errors.

// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use miette::Diagnostic;
use thiserror::Error;

use super::Command;

/// Output name used by the default-goal wiring rule.
pub const RESERVED_OUTPUT: &str = "all";

/// A single rule of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Files produced by the commands. Never empty.
    pub outputs: Vec<Utf8PathBuf>,
    /// Declared inputs or earlier outputs, in order.
    pub dependencies: Vec<Utf8PathBuf>,
    /// Commands run in order. Never empty.
    pub commands: Vec<Command>,
    /// Whether the outputs name an action rather than a file.
    pub phony: bool,
}

impl Target {
    /// Name used when reporting problems with this target.
    #[must_use]
    pub fn display_name(&self) -> &Utf8Path {
        self.outputs
            .first()
            .map_or_else(|| Utf8Path::new(""), Utf8PathBuf::as_path)
    }
}

/// Value of a make variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    /// Emitted as `NAME ?= value`.
    Plain(String),
    /// Chooses between two values depending on whether the make variable
    /// `switch` is empty.
    Switched {
        /// Variable tested with `ifeq ($(switch),)`.
        switch: String,
        /// Value used while `switch` is empty.
        unset: String,
        /// Value used once `switch` is set; may reference it.
        set: String,
    },
}

impl Variable {
    /// The unconditional value, if this is a plain variable.
    #[must_use]
    pub const fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(value) => Some(value.as_str()),
            Self::Switched { .. } => None,
        }
    }
}

/// Errors raised while building a [`BuildGraph`].
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphError {
    /// A target was declared without outputs.
    #[error("target has no outputs")]
    #[diagnostic(code(edagraph::graph::empty_outputs))]
    EmptyOutputs,

    /// A target was declared without commands.
    #[error("target '{target}' has no commands")]
    #[diagnostic(code(edagraph::graph::empty_commands))]
    EmptyCommands {
        /// First output of the offending target.
        target: Utf8PathBuf,
    },

    /// An output was declared more than once.
    #[error("output '{output}' is declared more than once")]
    #[diagnostic(code(edagraph::graph::duplicate_output))]
    DuplicateOutput {
        /// The repeated output.
        output: Utf8PathBuf,
    },

    /// An output used the name reserved for the default-goal rule.
    #[error("output name '{output}' is reserved")]
    #[diagnostic(code(edagraph::graph::reserved_name))]
    ReservedName {
        /// The reserved name.
        output: Utf8PathBuf,
    },

    /// A dependency is neither a declared input nor an earlier output.
    #[error("target '{target}' depends on unknown file '{dependency}'")]
    #[diagnostic(
        code(edagraph::graph::dangling_dependency),
        help("declare the file as an input or add the target producing it first")
    )]
    DanglingDependency {
        /// Target carrying the dependency.
        target: Utf8PathBuf,
        /// The unknown dependency.
        dependency: Utf8PathBuf,
    },

    /// A phony target was used as a prerequisite.
    #[error("target '{target}' depends on phony target '{dependency}'")]
    #[diagnostic(code(edagraph::graph::phony_prerequisite))]
    PhonyPrerequisite {
        /// Target carrying the dependency.
        target: Utf8PathBuf,
        /// The phony prerequisite.
        dependency: Utf8PathBuf,
    },

    /// The default names no declared output.
    #[error("default target '{name}' is not a declared output")]
    #[diagnostic(code(edagraph::graph::unknown_default))]
    UnknownDefault {
        /// Requested default.
        name: Utf8PathBuf,
    },

    /// The default names a phony target.
    #[error("default target '{name}' is phony")]
    #[diagnostic(code(edagraph::graph::phony_default))]
    PhonyDefault {
        /// Requested default.
        name: Utf8PathBuf,
    },

    /// A default was already chosen.
    #[error("default target already set to '{existing}', cannot set '{name}'")]
    #[diagnostic(code(edagraph::graph::default_already_set))]
    DefaultAlreadySet {
        /// Current default.
        existing: Utf8PathBuf,
        /// Requested default.
        name: Utf8PathBuf,
    },

    /// A make variable was defined twice.
    #[error("make variable '{name}' is already defined")]
    #[diagnostic(code(edagraph::graph::duplicate_variable))]
    DuplicateVariable {
        /// Variable name.
        name: String,
    },
}

/// Append-only collection of targets with a single default.
///
/// Every dependency is checked when its target is added, so the graph is
/// acyclic by construction and emission order equals insertion order.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    targets: Vec<Target>,
    outputs: IndexMap<Utf8PathBuf, usize>,
    inputs: IndexSet<Utf8PathBuf>,
    variables: IndexMap<String, Variable>,
    default_target: Option<Utf8PathBuf>,
}

impl BuildGraph {
    /// Register a source file that targets may depend on.
    ///
    /// Inputs are trusted; their existence on disk is not checked.
    pub fn declare_input(&mut self, path: impl Into<Utf8PathBuf>) {
        self.inputs.insert(path.into());
    }

    /// Register several input files.
    pub fn declare_inputs<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
    }

    /// Append a file-producing target.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for empty outputs or commands, a duplicate or
    /// reserved output, or a dependency that is unknown or phony.
    pub fn add_target<O, D, P, Q>(
        &mut self,
        commands: Vec<Command>,
        outputs: O,
        dependencies: D,
    ) -> Result<(), GraphError>
    where
        O: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
        D: IntoIterator<Item = Q>,
        Q: Into<Utf8PathBuf>,
    {
        self.push(Target {
            outputs: outputs.into_iter().map(Into::into).collect(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            commands,
            phony: false,
        })
    }

    /// Append an action target such as `run`.
    ///
    /// Phony targets are never rebuilt from timestamps and may not be the
    /// prerequisite or default of anything.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BuildGraph::add_target`].
    pub fn add_phony_target<D, Q>(
        &mut self,
        commands: Vec<Command>,
        name: impl Into<Utf8PathBuf>,
        dependencies: D,
    ) -> Result<(), GraphError>
    where
        D: IntoIterator<Item = Q>,
        Q: Into<Utf8PathBuf>,
    {
        self.push(Target {
            outputs: vec![name.into()],
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            commands,
            phony: true,
        })
    }

    fn push(&mut self, target: Target) -> Result<(), GraphError> {
        if target.outputs.is_empty() {
            return Err(GraphError::EmptyOutputs);
        }
        if target.commands.is_empty() {
            return Err(GraphError::EmptyCommands {
                target: target.display_name().to_owned(),
            });
        }
        let mut fresh: IndexSet<&Utf8Path> = IndexSet::new();
        for output in &target.outputs {
            if output.as_str() == RESERVED_OUTPUT {
                return Err(GraphError::ReservedName {
                    output: output.clone(),
                });
            }
            if self.outputs.contains_key(output) || !fresh.insert(output.as_path()) {
                return Err(GraphError::DuplicateOutput {
                    output: output.clone(),
                });
            }
        }
        for dep in &target.dependencies {
            self.check_dependency(&target, dep)?;
        }
        let index = self.targets.len();
        self.outputs
            .extend(target.outputs.iter().map(|o| (o.clone(), index)));
        self.targets.push(target);
        Ok(())
    }

    fn check_dependency(&self, target: &Target, dep: &Utf8Path) -> Result<(), GraphError> {
        match self.producer(dep) {
            Some(producer) if producer.phony => Err(GraphError::PhonyPrerequisite {
                target: target.display_name().to_owned(),
                dependency: dep.to_owned(),
            }),
            Some(_) => Ok(()),
            None if self.inputs.contains(dep) => Ok(()),
            None => Err(GraphError::DanglingDependency {
                target: target.display_name().to_owned(),
                dependency: dep.to_owned(),
            }),
        }
    }

    /// Choose the target built when no goal is given.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when `name` is not a declared output, names a
    /// phony target, or a default already exists.
    pub fn set_default(&mut self, output: impl Into<Utf8PathBuf>) -> Result<(), GraphError> {
        let name: Utf8PathBuf = output.into();
        if let Some(existing) = &self.default_target {
            return Err(GraphError::DefaultAlreadySet {
                existing: existing.clone(),
                name,
            });
        }
        match self.producer(&name).map(|target| target.phony) {
            None => Err(GraphError::UnknownDefault { name }),
            Some(true) => Err(GraphError::PhonyDefault { name }),
            Some(false) => {
                self.default_target = Some(name);
                Ok(())
            }
        }
    }

    /// Define a make variable emitted as `NAME ?= value`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateVariable`] if `name` is already defined.
    pub fn set_variable(
        &mut self,
        variable: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.define(variable.into(), Variable::Plain(value.into()))
    }

    /// Define a make variable whose default depends on whether `switch` is
    /// set in the environment or on the make command line.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateVariable`] if `name` is already defined.
    pub fn set_switched_variable(
        &mut self,
        variable: impl Into<String>,
        switch: impl Into<String>,
        unset: impl Into<String>,
        set: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.define(
            variable.into(),
            Variable::Switched {
                switch: switch.into(),
                unset: unset.into(),
                set: set.into(),
            },
        )
    }

    fn define(&mut self, name: String, value: Variable) -> Result<(), GraphError> {
        if self.variables.contains_key(&name) {
            return Err(GraphError::DuplicateVariable { name });
        }
        self.variables.insert(name, value);
        Ok(())
    }

    /// Targets in insertion order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Target producing `output`, if any.
    #[must_use]
    pub fn producer(&self, output: &Utf8Path) -> Option<&Target> {
        self.outputs
            .get(output)
            .and_then(|&index| self.targets.get(index))
    }

    /// Declared input files in registration order.
    pub fn inputs(&self) -> impl Iterator<Item = &Utf8Path> {
        self.inputs.iter().map(Utf8PathBuf::as_path)
    }

    /// Make variables in definition order.
    #[must_use]
    pub const fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    /// Output built when no goal is given.
    #[must_use]
    pub fn default_target(&self) -> Option<&Utf8Path> {
        self.default_target.as_deref()
    }
}
