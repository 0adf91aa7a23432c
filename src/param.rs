//! Typed parameters and their token serialisation.
//!
//! Tool command lines and option files each expect literal values in a
//! slightly different syntax. [`ParamValue::render`] produces those tokens
//! from a [`TokenStyle`], and [`parse`] inverts it for a declared
//! [`DataType`]. Rendering is pure: an identical value and style always yield
//! an identical token, which is what makes [`DefineSet`] comparison by
//! serialised form meaningful.
//!
//! ```rust
//! use edagraph::param::{ParamValue, TokenStyle};
//!
//! let value = ParamValue::from("fast");
//! assert_eq!(value.render(TokenStyle::BARE), "fast");
//! assert_eq!(value.render(TokenStyle::ASSIGNMENT), "\"fast\"");
//! assert_eq!(ParamValue::Bool(true).render(TokenStyle::BARE), "1");
//! ```

// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros. FIXME: remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// `true`/`false`, rendered per [`BoolStyle`].
    Bool,
    /// Signed integer.
    Int,
    /// Floating point value.
    Real,
    /// Free-form string.
    Str,
    /// Path to a file, handled like a string.
    File,
}

/// How a parameter reaches the tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Command-line argument passed to the simulation model.
    Cmdlinearg,
    /// VHDL generic on the top-level entity.
    Generic,
    /// Verilog plusarg read at run time.
    Plusarg,
    /// Verilog preprocessor define.
    Vlogdefine,
    /// Verilog parameter on the top-level module.
    Vlogparam,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cmdlinearg => "cmdlinearg",
            Self::Generic => "generic",
            Self::Plusarg => "plusarg",
            Self::Vlogdefine => "vlogdefine",
            Self::Vlogparam => "vlogparam",
        })
    }
}

/// Declaration of a design parameter.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    /// Declared value type.
    pub datatype: DataType,
    /// Delivery mechanism.
    pub paramtype: ParamType,
    /// Value used when no override is supplied.
    #[serde(default)]
    pub default: Option<ParamValue>,
    /// Human-readable summary.
    #[serde(default)]
    pub description: Option<String>,
}

/// A literal parameter or define value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Real literal.
    Real(f64),
    /// String literal.
    Str(String),
    /// Vector of values.
    List(Vec<ParamValue>),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Delimiter wrapped around string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// Strings are emitted verbatim.
    None,
    /// `'value'`
    Single,
    /// `"value"`
    Double,
    /// `""value""`, which survives one level of quote stripping in VCS
    /// argument files.
    DoubledDouble,
}

impl QuoteStyle {
    /// The delimiter placed on each side of a string.
    #[must_use]
    pub const fn delimiter(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Single => "'",
            Self::Double => "\"",
            Self::DoubledDouble => "\"\"",
        }
    }
}

/// Boolean spelling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolStyle {
    /// `1` and `0`.
    Numeric,
    /// `true` and `false`.
    Word,
}

impl BoolStyle {
    const fn render(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::Numeric, true) => "1",
            (Self::Numeric, false) => "0",
            (Self::Word, true) => "true",
            (Self::Word, false) => "false",
        }
    }
}

/// Combined rendering convention for one token position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStyle {
    /// String delimiter.
    pub quote: QuoteStyle,
    /// Boolean spelling.
    pub bools: BoolStyle,
}

impl TokenStyle {
    /// Unquoted tokens: plusargs, command-line args, `-G`/`-D` options.
    pub const BARE: Self = Self {
        quote: QuoteStyle::None,
        bools: BoolStyle::Numeric,
    };

    /// Analysis-time `+define+` values inside a VCS option file.
    pub const VLOG_DEFINE: Self = Self {
        quote: QuoteStyle::DoubledDouble,
        bools: BoolStyle::Numeric,
    };

    /// Values in a parameter assignment file.
    pub const ASSIGNMENT: Self = Self {
        quote: QuoteStyle::Double,
        bools: BoolStyle::Numeric,
    };

    /// Build a style from its parts.
    #[must_use]
    pub const fn new(quote: QuoteStyle, bools: BoolStyle) -> Self {
        Self { quote, bools }
    }
}

impl ParamValue {
    /// Render the value as a single tool token.
    #[must_use]
    pub fn render(&self, style: TokenStyle) -> String {
        match self {
            Self::Bool(value) => style.bools.render(*value).to_owned(),
            Self::Int(value) => value.to_string(),
            // Debug keeps the decimal point so `2.0` stays a real literal.
            Self::Real(value) => format!("{value:?}"),
            Self::Str(value) => {
                let q = style.quote.delimiter();
                format!("{q}{value}{q}")
            }
            Self::List(items) => items.iter().map(|item| item.render(style)).join(","),
        }
    }
}

/// Errors raised while parsing parameter tokens or assignments.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ParamError {
    /// The token does not spell a boolean.
    #[error("`{token}` is not a boolean value")]
    #[diagnostic(
        code(edagraph::param::invalid_bool),
        help("use 1/0 or true/false")
    )]
    InvalidBool {
        /// Offending token.
        token: String,
    },

    /// The token is not an integer.
    #[error("`{token}` is not an integer value")]
    #[diagnostic(code(edagraph::param::invalid_int))]
    InvalidInt {
        /// Offending token.
        token: String,
    },

    /// The token is not a real number.
    #[error("`{token}` is not a real value")]
    #[diagnostic(code(edagraph::param::invalid_real))]
    InvalidReal {
        /// Offending token.
        token: String,
    },

    /// A string token is missing its delimiters.
    #[error("`{token}` is not wrapped in `{quote}`")]
    #[diagnostic(code(edagraph::param::unquoted))]
    Unquoted {
        /// Offending token.
        token: String,
        /// Expected delimiter.
        quote: &'static str,
    },

    /// The assignment names no declared parameter.
    #[error("parameter `{name}` is not declared by the design")]
    #[diagnostic(code(edagraph::param::unknown))]
    UnknownParameter {
        /// Parameter name from the assignment.
        name: String,
    },

    /// The parameter exists but is delivered another way.
    #[error("parameter `{name}` is a {actual}, not a {expected}")]
    #[diagnostic(code(edagraph::param::wrong_kind))]
    WrongKind {
        /// Parameter name.
        name: String,
        /// Kind the caller asked for.
        expected: ParamType,
        /// Declared kind.
        actual: ParamType,
    },

    /// A declared default does not spell a value of its datatype.
    #[error("default of parameter `{name}` does not match its datatype")]
    #[diagnostic(code(edagraph::param::invalid_default))]
    InvalidDefault {
        /// Parameter name.
        name: String,
        /// Conversion failure.
        #[source]
        source: Box<ParamError>,
    },

    /// A non-boolean assignment has no `=`.
    #[error("assignment `{assignment}` must have the form KEY=VALUE")]
    #[diagnostic(code(edagraph::param::missing_value))]
    MissingValue {
        /// Offending assignment.
        assignment: String,
    },
}

/// Parse a token rendered with `style` back into a value of `datatype`.
///
/// Strings must carry the style's delimiters; lists are not parseable since
/// their element type is not declared.
///
/// # Errors
///
/// Returns a [`ParamError`] when the token does not spell a value of the
/// requested type.
pub fn parse(token: &str, datatype: DataType, style: TokenStyle) -> Result<ParamValue, ParamError> {
    match datatype {
        DataType::Bool => match token {
            "1" | "true" => Ok(ParamValue::Bool(true)),
            "0" | "false" => Ok(ParamValue::Bool(false)),
            _ => Err(ParamError::InvalidBool {
                token: token.to_owned(),
            }),
        },
        DataType::Int => token
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| ParamError::InvalidInt {
                token: token.to_owned(),
            }),
        DataType::Real => token
            .parse::<f64>()
            .map(ParamValue::Real)
            .map_err(|_| ParamError::InvalidReal {
                token: token.to_owned(),
            }),
        DataType::Str | DataType::File => {
            let q = style.quote.delimiter();
            if q.is_empty() {
                return Ok(ParamValue::Str(token.to_owned()));
            }
            token
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
                .map(|inner| ParamValue::Str(inner.to_owned()))
                .ok_or_else(|| ParamError::Unquoted {
                    token: token.to_owned(),
                    quote: q,
                })
        }
    }
}

/// Convert a YAML-typed value into `datatype`.
///
/// Scalars go through the bare token form, so `1` declared as a string
/// becomes `"1"` exactly as a `NAME=1` override would. Lists convert
/// element-wise.
///
/// # Errors
///
/// Returns a [`ParamError`] when a scalar does not spell a value of
/// `datatype`.
pub fn coerce(value: &ParamValue, datatype: DataType) -> Result<ParamValue, ParamError> {
    match value {
        ParamValue::List(items) => items
            .iter()
            .map(|item| coerce(item, datatype))
            .collect::<Result<Vec<_>, _>>()
            .map(ParamValue::List),
        scalar => parse(&scalar.render(TokenStyle::BARE), datatype, TokenStyle::BARE),
    }
}

/// Parse a `KEY=VALUE` override for a declared parameter of kind `kind`.
///
/// A bare `KEY` is accepted for boolean parameters and means `true`.
///
/// # Errors
///
/// Returns a [`ParamError`] when the key is undeclared, declared with a
/// different kind, or the value does not match the declared datatype.
pub fn parse_assignment(
    assignment: &str,
    declarations: &IndexMap<String, Parameter>,
    kind: ParamType,
) -> Result<(String, ParamValue), ParamError> {
    let (name, raw) = match assignment.split_once('=') {
        Some((name, raw)) => (name, Some(raw)),
        None => (assignment, None),
    };
    let decl = declarations
        .get(name)
        .ok_or_else(|| ParamError::UnknownParameter {
            name: name.to_owned(),
        })?;
    if decl.paramtype != kind {
        return Err(ParamError::WrongKind {
            name: name.to_owned(),
            expected: kind,
            actual: decl.paramtype,
        });
    }
    let value = match (raw, decl.datatype) {
        (Some(raw), datatype) => parse(raw, datatype, TokenStyle::BARE)?,
        (None, DataType::Bool) => ParamValue::Bool(true),
        (None, _) => {
            return Err(ParamError::MissingValue {
                assignment: assignment.to_owned(),
            });
        }
    };
    Ok((name.to_owned(), value))
}

/// Effective parameter values split by delivery mechanism.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    cmdlinearg: IndexMap<String, ParamValue>,
    generic: IndexMap<String, ParamValue>,
    plusarg: IndexMap<String, ParamValue>,
    vlogdefine: IndexMap<String, ParamValue>,
    vlogparam: IndexMap<String, ParamValue>,
}

impl ParameterSet {
    /// Collect every declared parameter that has a default value, converted
    /// to its declared datatype.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::InvalidDefault`] when a default cannot be
    /// converted.
    pub fn from_declarations(
        declarations: &IndexMap<String, Parameter>,
    ) -> Result<Self, ParamError> {
        let mut set = Self::default();
        for (name, decl) in declarations {
            if let Some(value) = &decl.default {
                let typed =
                    coerce(value, decl.datatype).map_err(|err| ParamError::InvalidDefault {
                        name: name.clone(),
                        source: Box::new(err),
                    })?;
                set.set(decl.paramtype, name, typed);
            }
        }
        Ok(set)
    }

    /// Set or override a value.
    pub fn set(&mut self, kind: ParamType, name: &str, value: ParamValue) {
        self.slot_mut(kind).insert(name.to_owned(), value);
    }

    /// Values of one kind, in declaration order.
    #[must_use]
    pub const fn of(&self, kind: ParamType) -> &IndexMap<String, ParamValue> {
        match kind {
            ParamType::Cmdlinearg => &self.cmdlinearg,
            ParamType::Generic => &self.generic,
            ParamType::Plusarg => &self.plusarg,
            ParamType::Vlogdefine => &self.vlogdefine,
            ParamType::Vlogparam => &self.vlogparam,
        }
    }

    const fn slot_mut(&mut self, kind: ParamType) -> &mut IndexMap<String, ParamValue> {
        match kind {
            ParamType::Cmdlinearg => &mut self.cmdlinearg,
            ParamType::Generic => &mut self.generic,
            ParamType::Plusarg => &mut self.plusarg,
            ParamType::Vlogdefine => &mut self.vlogdefine,
            ParamType::Vlogparam => &mut self.vlogparam,
        }
    }
}

/// Effective Verilog defines for one source file.
///
/// Global defines come first; per-file defines override matching keys in
/// place and append new ones. Two sets are equal exactly when they serialise
/// to the same tokens.
#[derive(Debug, Clone, Default)]
pub struct DefineSet(IndexMap<String, ParamValue>);

impl DefineSet {
    /// Merge per-file defines over the global ones.
    #[must_use]
    pub fn merged(
        global: &IndexMap<String, ParamValue>,
        local: &IndexMap<String, ParamValue>,
    ) -> Self {
        let mut merged = global.clone();
        merged.extend(local.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// `+define+KEY=VALUE` tokens in merge order.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(key, value)| format!("+define+{key}={}", value.render(TokenStyle::VLOG_DEFINE)))
            .collect()
    }

    /// Serialised form used as the grouping key.
    #[must_use]
    pub fn key(&self) -> String {
        self.tokens().join(" ")
    }
}

impl PartialEq for DefineSet {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DefineSet {}
