//! File classification.
//!
//! Splits a design file list into an explicit partition in one pass over the
//! input. Every file receives exactly one [`Role`]; nothing is removed from a
//! shared pool, so the buckets are disjoint by construction and their sizes
//! always add up to the input length.
//!
//! ```rust
//! use edagraph::ast::SourceFile;
//! use edagraph::classify::classify;
//! use indexmap::IndexMap;
//!
//! let files = vec![
//!     SourceFile::new("inc/defs.vh", "verilogSource").as_include(),
//!     SourceFile::new("rtl/top.sv", "systemVerilogSource"),
//!     SourceFile::new("sw/main.c", "cSource"),
//! ];
//! let classified = classify(&files, &IndexMap::new());
//! assert_eq!(classified.include_dirs(), ["inc"]);
//! assert_eq!(classified.compiled().count(), 1);
//! assert_eq!(classified.passthrough().count(), 1);
//! assert!(classified.has_system_verilog());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::SourceFile;
use crate::param::{DefineSet, ParamValue};

/// Analysis command family a compiled source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisKind {
    /// Verilog or SystemVerilog analysis.
    Verilog,
    /// VHDL analysis.
    Vhdl,
}

/// Language family derived from a file type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// `verilogSource*`
    Verilog,
    /// `systemVerilogSource*`
    SystemVerilog,
    /// `vhdlSource*`
    Vhdl,
    /// `cSource`, `cppSource`, or `systemCSource`.
    CFamily,
    /// `user`: opaque link-time input.
    User,
    /// Any other declared type.
    Other,
    /// No `file_type` given.
    Untyped,
}

impl Language {
    /// Derive the family from an optional file type tag.
    #[must_use]
    pub fn of(file_type: Option<&str>) -> Self {
        match file_type {
            None => Self::Untyped,
            Some(t) if t.starts_with("systemVerilogSource") => Self::SystemVerilog,
            Some(t) if t.starts_with("verilogSource") => Self::Verilog,
            Some(t) if t.starts_with("vhdlSource") => Self::Vhdl,
            Some("cSource" | "cppSource" | "systemCSource") => Self::CFamily,
            Some("user") => Self::User,
            Some(_) => Self::Other,
        }
    }

    /// Whether the family is analysed by a Verilog front end.
    #[must_use]
    pub const fn is_verilog_family(self) -> bool {
        matches!(self, Self::Verilog | Self::SystemVerilog)
    }
}

/// Role assigned to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Verilog header referenced through an include directory.
    Include,
    /// Source analysed into a logical library.
    Compile {
        /// Analysis command family.
        kind: AnalysisKind,
        /// Target logical library.
        library: String,
        /// Effective defines; always empty for VHDL.
        defines: DefineSet,
    },
    /// Simulation file that is not analysed: `user` files, foreign sources,
    /// unknown or missing types.
    Passthrough,
    /// File whose tags exclude simulation.
    Excluded,
}

/// A file paired with its role.
#[derive(Debug, Clone)]
pub struct Classified<'a> {
    /// The untouched input file.
    pub file: &'a SourceFile,
    /// Language family of the file.
    pub language: Language,
    /// Assigned role.
    pub role: Role,
}

/// A compiled source viewed through its role.
#[derive(Debug, Clone, Copy)]
pub struct CompiledSource<'a> {
    /// Source path.
    pub path: &'a Utf8Path,
    /// Analysis command family.
    pub kind: AnalysisKind,
    /// Logical library.
    pub library: &'a str,
    /// Effective defines.
    pub defines: &'a DefineSet,
}

/// Result of classifying a design file list.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    entries: Vec<Classified<'a>>,
    include_dirs: Vec<Utf8PathBuf>,
    has_system_verilog: bool,
}

/// Partition `files` into include, compiled, passthrough, and excluded files.
///
/// Input order is preserved in every bucket. `global_defines` are merged
/// under each Verilog file's own defines.
#[must_use]
pub fn classify<'a>(
    files: &'a [SourceFile],
    global_defines: &IndexMap<String, ParamValue>,
) -> Classification<'a> {
    let mut include_dirs: Vec<Utf8PathBuf> = Vec::new();
    let mut has_system_verilog = false;
    let entries = files
        .iter()
        .map(|file| {
            let language = Language::of(file.file_type());
            if language == Language::SystemVerilog {
                has_system_verilog = true;
            }
            let role = assign_role(file, language, global_defines, &mut include_dirs);
            debug!(file = %file.name, ?language, ?role, "classified design file");
            Classified {
                file,
                language,
                role,
            }
        })
        .collect();
    Classification {
        entries,
        include_dirs,
        has_system_verilog,
    }
}

fn assign_role(
    file: &SourceFile,
    language: Language,
    global_defines: &IndexMap<String, ParamValue>,
    include_dirs: &mut Vec<Utf8PathBuf>,
) -> Role {
    if !file.in_simulation() {
        return Role::Excluded;
    }
    if language.is_verilog_family() && file.is_include_file {
        let dir = include_dir(file);
        if !include_dirs.contains(&dir) {
            include_dirs.push(dir);
        }
        return Role::Include;
    }
    match language {
        Language::Verilog | Language::SystemVerilog => Role::Compile {
            kind: AnalysisKind::Verilog,
            library: file.library().to_owned(),
            defines: DefineSet::merged(global_defines, &file.define),
        },
        Language::Vhdl => Role::Compile {
            kind: AnalysisKind::Vhdl,
            library: file.library().to_owned(),
            defines: DefineSet::default(),
        },
        Language::Untyped => {
            warn!(file = %file.name, "design file has no file_type; passing it through unanalysed");
            Role::Passthrough
        }
        Language::CFamily | Language::User | Language::Other => Role::Passthrough,
    }
}

/// Directory registered for an include file, with forward slashes.
fn include_dir(file: &SourceFile) -> Utf8PathBuf {
    let dir = file
        .include_path
        .as_deref()
        .filter(|p| !p.as_str().is_empty())
        .or_else(|| file.path().parent().filter(|p| !p.as_str().is_empty()))
        .map_or(".", Utf8Path::as_str);
    Utf8PathBuf::from(dir.replace('\\', "/"))
}

impl<'a> Classification<'a> {
    /// Every input file with its role, in input order.
    #[must_use]
    pub fn entries(&self) -> &[Classified<'a>] {
        &self.entries
    }

    /// Include directories in first-seen order, without duplicates.
    #[must_use]
    pub fn include_dirs(&self) -> &[Utf8PathBuf] {
        &self.include_dirs
    }

    /// Whether any SystemVerilog file appears anywhere in the input.
    #[must_use]
    pub const fn has_system_verilog(&self) -> bool {
        self.has_system_verilog
    }

    fn with_role(&self, pred: fn(&Role) -> bool) -> impl Iterator<Item = &Classified<'a>> + '_ {
        self.entries.iter().filter(move |e| pred(&e.role))
    }

    /// Include-only headers.
    pub fn include_files(&self) -> impl Iterator<Item = &'a SourceFile> + '_ {
        self.with_role(|r| matches!(r, Role::Include)).map(|e| e.file)
    }

    /// Files analysed into a library.
    pub fn compiled(&self) -> impl Iterator<Item = CompiledSource<'_>> + '_ {
        self.entries.iter().filter_map(|e| match &e.role {
            Role::Compile {
                kind,
                library,
                defines,
            } => Some(CompiledSource {
                path: e.file.path(),
                kind: *kind,
                library,
                defines,
            }),
            _ => None,
        })
    }

    /// Simulation files that are not analysed.
    pub fn passthrough(&self) -> impl Iterator<Item = &Classified<'a>> + '_ {
        self.with_role(|r| matches!(r, Role::Passthrough))
    }

    /// Passthrough files typed `user`, which become link-time inputs.
    pub fn user_files(&self) -> impl Iterator<Item = &'a SourceFile> + '_ {
        self.passthrough()
            .filter(|e| e.language == Language::User)
            .map(|e| e.file)
    }

    /// Passthrough C, C++, and SystemC sources.
    pub fn foreign_sources(&self) -> impl Iterator<Item = &'a SourceFile> + '_ {
        self.passthrough()
            .filter(|e| e.language == Language::CFamily)
            .map(|e| e.file)
    }

    /// Files excluded from simulation by their tags.
    pub fn excluded(&self) -> impl Iterator<Item = &'a SourceFile> + '_ {
        self.with_role(|r| matches!(r, Role::Excluded)).map(|e| e.file)
    }

    /// Files not consumed by a generated command, in input order.
    ///
    /// Passthrough and excluded files are handed on unmodified for later
    /// stages that share the same file set.
    #[must_use]
    pub fn leftover(&self) -> Vec<SourceFile> {
        self.with_role(|r| matches!(r, Role::Passthrough | Role::Excluded))
            .map(|e| e.file.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn mixed() -> Vec<SourceFile> {
        vec![
            SourceFile::new("inc/a.vh", "verilogSource").as_include(),
            SourceFile::new("rtl/a.v", "verilogSource-2005").with_define("X", 1),
            SourceFile::new("rtl/b.vhd", "vhdlSource-2008").in_library("lib"),
            SourceFile::new("tb/tb.sv", "systemVerilogSource"),
            SourceFile::new("run.tcl", "tclSource"),
            SourceFile::new("libfoo.so", "user"),
            SourceFile::new("syn.sdc", "SDC").with_tags(["synthesis"]),
            SourceFile::new("syn.v", "verilogSource").with_tags(["synthesis"]),
            SourceFile::new("tb/main.cpp", "cppSource"),
        ]
    }

    #[rstest]
    fn partition_is_complete_and_disjoint(mixed: Vec<SourceFile>) {
        let c = classify(&mixed, &IndexMap::new());
        let total = c.include_files().count()
            + c.compiled().count()
            + c.passthrough().count()
            + c.excluded().count();
        assert_eq!(total, mixed.len());
        assert_eq!(c.entries().len(), mixed.len());
    }

    #[rstest]
    fn buckets_preserve_input_order(mixed: Vec<SourceFile>) {
        let c = classify(&mixed, &IndexMap::new());
        let compiled: Vec<_> = c.compiled().map(|s| s.path.as_str()).collect();
        assert_eq!(compiled, ["rtl/a.v", "rtl/b.vhd", "tb/tb.sv"]);
        let user: Vec<_> = c.user_files().map(|f| f.name.as_str()).collect();
        assert_eq!(user, ["libfoo.so"]);
        let foreign: Vec<_> = c.foreign_sources().map(|f| f.name.as_str()).collect();
        assert_eq!(foreign, ["tb/main.cpp"]);
    }

    #[rstest]
    fn excluded_files_are_returned_unmodified(mixed: Vec<SourceFile>) {
        let c = classify(&mixed, &IndexMap::new());
        let excluded: Vec<_> = c.excluded().cloned().collect();
        assert_eq!(excluded, vec![mixed[6].clone(), mixed[7].clone()]);
        let leftover = c.leftover();
        assert!(leftover.contains(&mixed[7]));
        assert!(leftover.contains(&mixed[4]));
        assert!(!leftover.iter().any(|f| f.name == "rtl/a.v"));
        assert!(!leftover.iter().any(|f| f.name == "inc/a.vh"));
    }

    #[rstest]
    fn non_simulation_verilog_headers_are_not_includes() {
        let files = vec![
            SourceFile::new("syn/defs.vh", "verilogSource")
                .as_include()
                .with_tags(["synthesis"]),
        ];
        let c = classify(&files, &IndexMap::new());
        assert!(c.include_dirs().is_empty());
        assert_eq!(c.excluded().count(), 1);
    }

    #[rstest]
    #[case(None, "a/b/defs.vh", "a/b")]
    #[case(None, "defs.vh", ".")]
    #[case(Some("custom\\inc"), "a/defs.vh", "custom/inc")]
    fn include_dirs_are_normalised(
        #[case] include_path: Option<&str>,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        let mut file = SourceFile::new(name, "verilogSource").as_include();
        file.include_path = include_path.map(Utf8PathBuf::from);
        let c = classify(std::slice::from_ref(&file), &IndexMap::new());
        assert_eq!(c.include_dirs(), [Utf8PathBuf::from(expected)]);
    }

    #[rstest]
    fn include_dirs_are_deduplicated_in_first_seen_order() {
        let files = vec![
            SourceFile::new("b/x.vh", "verilogSource").as_include(),
            SourceFile::new("a/y.vh", "systemVerilogSource").as_include(),
            SourceFile::new("b/z.vh", "verilogSource").as_include(),
        ];
        let c = classify(&files, &IndexMap::new());
        assert_eq!(
            c.include_dirs(),
            [Utf8PathBuf::from("b"), Utf8PathBuf::from("a")]
        );
        assert_eq!(c.include_files().count(), 3);
    }

    #[rstest]
    fn system_verilog_anywhere_enables_mode() {
        let files = vec![
            SourceFile::new("a.v", "verilogSource"),
            SourceFile::new("pkg.svh", "systemVerilogSource").as_include(),
        ];
        assert!(classify(&files, &IndexMap::new()).has_system_verilog());
        let plain = vec![SourceFile::new("a.v", "verilogSource")];
        assert!(!classify(&plain, &IndexMap::new()).has_system_verilog());
    }

    #[rstest]
    fn untyped_files_pass_through() {
        let mut file = SourceFile::new("mystery", "x");
        file.file_type = None;
        let files = vec![file];
        let c = classify(&files, &IndexMap::new());
        assert_eq!(c.passthrough().count(), 1);
        assert_eq!(c.entries()[0].language, Language::Untyped);
    }

    #[rstest]
    fn verilog_defines_merge_global_under_local() {
        let mut global = IndexMap::new();
        global.insert("X".to_owned(), ParamValue::Int(0));
        global.insert("Y".to_owned(), ParamValue::Int(5));
        let files = vec![
            SourceFile::new("a.v", "verilogSource").with_define("X", 1),
            SourceFile::new("b.vhd", "vhdlSource"),
        ];
        let c = classify(&files, &global);
        let defines: Vec<_> = c.compiled().map(|s| s.defines.key()).collect();
        assert_eq!(defines, ["+define+X=1 +define+Y=5", ""]);
    }

    #[rstest]
    fn classification_is_deterministic(mixed: Vec<SourceFile>) {
        let first = classify(&mixed, &IndexMap::new());
        let second = classify(&mixed, &IndexMap::new());
        let roles = |c: &Classification<'_>| -> Vec<Role> {
            c.entries().iter().map(|e| e.role.clone()).collect()
        };
        assert_eq!(roles(&first), roles(&second));
        assert_eq!(first.include_dirs(), second.include_dirs());
    }
}
