//! Argv-style commands attached to targets.

/// One command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Text passed to the shell as a single word.
    Literal(String),
    /// Reference to a make variable, expanded at build time.
    Variable(String),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// A command run as part of a target's recipe.
///
/// A command always has a program, so it is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<Arg>,
}

impl Command {
    /// Start a command with a literal program name.
    #[must_use]
    pub fn program(name: impl Into<String>) -> Self {
        Self {
            args: vec![Arg::Literal(name.into())],
        }
    }

    /// Start a command whose program comes from a make variable.
    #[must_use]
    pub fn from_variable(name: impl Into<String>) -> Self {
        Self {
            args: vec![Arg::Variable(name.into())],
        }
    }

    /// Append a literal argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Literal(value.into()));
        self
    }

    /// Append literal arguments.
    #[must_use]
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args
            .extend(values.into_iter().map(|v| Arg::Literal(v.into())));
        self
    }

    /// Append a make variable reference.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.args.push(Arg::Variable(name.into()));
        self
    }

    /// Arguments in order, program first.
    #[must_use]
    pub fn argv(&self) -> &[Arg] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_argument_order() {
        let cmd = Command::from_variable("MAKE")
            .variable("MAKE_OPTIONS")
            .arg("-f")
            .args(["Vtop.mk"]);
        assert_eq!(
            cmd.argv(),
            [
                Arg::Variable("MAKE".into()),
                Arg::Variable("MAKE_OPTIONS".into()),
                Arg::from("-f"),
                Arg::from("Vtop.mk"),
            ]
        );
    }
}
