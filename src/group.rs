//! Command grouping.
//!
//! Compiled sources in one logical library are bucketed by analysis kind and
//! serialised defines. Each bucket becomes a single analysis command with its
//! own option file. Ordering is first-encounter throughout; nothing is sorted.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use tracing::debug;

use crate::classify::{AnalysisKind, Classification};
use crate::param::DefineSet;

/// Files sharing a library, analysis kind, and effective defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    /// Analysis command family.
    pub kind: AnalysisKind,
    /// Logical library the files are analysed into.
    pub library: String,
    /// Defines shared by every member.
    pub defines: DefineSet,
    /// Member files in first-seen order.
    pub files: Vec<Utf8PathBuf>,
    /// Position within the library, starting at 1.
    pub sequence: usize,
}

impl CommandGroup {
    /// Option file name `<library>.<sequence>.<ext>`.
    #[must_use]
    pub fn option_file(&self, ext: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}.{}.{ext}", self.library, self.sequence))
    }
}

/// Command groups of one logical library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryGroups {
    /// Logical library name.
    pub library: String,
    /// Groups numbered contiguously from 1.
    pub groups: Vec<CommandGroup>,
    /// Every compiled file of the library, in input order.
    pub sources: Vec<Utf8PathBuf>,
}

impl LibraryGroups {
    /// Whether any member is analysed by a Verilog front end.
    ///
    /// Such a library depends on the include files; a VHDL-only library never
    /// does.
    #[must_use]
    pub fn has_verilog(&self) -> bool {
        self.groups.iter().any(|g| g.kind == AnalysisKind::Verilog)
    }
}

/// Group the compiled sources of `classification` per library.
///
/// Libraries appear in first-seen order.
#[must_use]
pub fn group(classification: &Classification<'_>) -> Vec<LibraryGroups> {
    let mut libraries: IndexMap<&str, IndexMap<(AnalysisKind, String), CommandGroup>> =
        IndexMap::new();
    let mut sources: IndexMap<&str, Vec<Utf8PathBuf>> = IndexMap::new();

    for source in classification.compiled() {
        sources
            .entry(source.library)
            .or_default()
            .push(source.path.to_owned());
        let buckets = libraries.entry(source.library).or_default();
        let next = buckets.len() + 1;
        buckets
            .entry((source.kind, source.defines.key()))
            .or_insert_with(|| CommandGroup {
                kind: source.kind,
                library: source.library.to_owned(),
                defines: source.defines.clone(),
                files: Vec::new(),
                sequence: next,
            })
            .files
            .push(source.path.to_owned());
    }

    libraries
        .into_iter()
        .map(|(library, buckets)| {
            let groups: Vec<CommandGroup> = buckets.into_values().collect();
            debug!(library, groups = groups.len(), "grouped analysis commands");
            LibraryGroups {
                library: library.to_owned(),
                groups,
                sources: sources.shift_remove(library).unwrap_or_default(),
            }
        })
        .collect()
}
