//! Synopsys VCS backend.
//!
//! Sources are analysed per logical library with `vlogan` and `vhdlan`, each
//! library leaving an `AN.DB` marker in its directory. The elaborated
//! executable depends on every marker, and a phony `run` target launches it.

use camino::Utf8PathBuf;
use itertools::Itertools;
use make_env::EXTRA_OPTIONS_VAR;
use tracing::debug;

use super::{
    Backend, ConfigFile, RUN_TARGET, RunStage, SetupError, Tool, ToolSetup, require_toplevel,
};
use crate::ast::{DEFAULT_LIBRARY, Design, VcsOptions};
use crate::classify::{AnalysisKind, Classification, classify};
use crate::group::{LibraryGroups, group};
use crate::ir::{BuildGraph, Command};
use crate::param::{ParamType, ParameterSet, TokenStyle};

/// Library mapping file read by every VCS front end.
pub const SETUP_FILE: &str = "synopsys_sim.setup";
/// Elaboration option file.
pub const ELAB_FILE: &str = "vcs.f";
/// Parameter override file passed to elaboration.
pub const PARAMETERS_FILE: &str = "parameters.txt";
/// Option file extension for analysis groups.
const OPTION_EXT: &str = "f";

/// The VCS backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vcs;

impl Backend for Vcs {
    fn setup(&self, design: &Design, params: &ParameterSet) -> Result<ToolSetup, SetupError> {
        let toplevel = require_toplevel(design)?;
        let options = &design.tool_options.vcs;
        let classification = classify(&design.files, params.of(ParamType::Vlogdefine));
        let libraries = group(&classification);
        let full64: &[&str] = if options.bits32 { &[] } else { &["-full64"] };

        let mut graph = BuildGraph::default();
        let mut config_files = vec![ConfigFile::new(SETUP_FILE, setup_file(&libraries))];
        let include_files: Vec<Utf8PathBuf> = classification
            .include_files()
            .map(|f| f.name.clone())
            .collect();
        graph.declare_inputs(include_files.iter().cloned());

        for lib in &libraries {
            let option_files =
                option_files(lib, &classification, &include_files, options, &mut graph)?;
            config_files.extend(option_files);
        }

        let user_files: Vec<Utf8PathBuf> =
            classification.user_files().map(|f| f.name.clone()).collect();
        graph.declare_inputs(user_files.iter().cloned());
        graph.declare_inputs([ELAB_FILE, PARAMETERS_FILE]);

        let elab = Command::program("vcs")
            .args(full64.iter().copied())
            .args(["-o", design.name.as_str(), "-file", ELAB_FILE])
            .args(["-parameters", PARAMETERS_FILE]);
        let markers = libraries.iter().map(|lib| marker(&lib.library));
        let deps: Vec<Utf8PathBuf> = markers
            .chain(user_files)
            .chain([Utf8PathBuf::from(ELAB_FILE), Utf8PathBuf::from(PARAMETERS_FILE)])
            .collect();
        graph.add_target(vec![elab], [design.name.as_str()], deps)?;

        let run = Command::program(format!("./{}", design.name))
            .variable(EXTRA_OPTIONS_VAR)
            .args(options.run_options.iter().cloned());
        graph.add_phony_target(vec![run], RUN_TARGET, [design.name.as_str()])?;
        graph.set_default(design.name.as_str())?;

        config_files.push(ConfigFile::new(
            ELAB_FILE,
            line(
                ["-top".to_owned(), toplevel.to_owned()]
                    .into_iter()
                    .chain(options.vcs_options.iter().cloned()),
            ),
        ));
        config_files.push(ConfigFile::new(PARAMETERS_FILE, parameters_file(params)));

        Ok(ToolSetup::new(
            Tool::Vcs,
            graph,
            config_files,
            classification.leftover(),
            RunStage::Managed {
                cmdline_args: false,
            },
        ))
    }
}

/// Add the analysis target for `lib` and return its option files.
fn option_files(
    lib: &LibraryGroups,
    classification: &Classification<'_>,
    include_files: &[Utf8PathBuf],
    options: &VcsOptions,
    graph: &mut BuildGraph,
) -> Result<Vec<ConfigFile>, SetupError> {
    let full64: &[&str] = if options.bits32 { &[] } else { &["-full64"] };
    let mut commands = vec![Command::program("mkdir").args(["-p", lib.library.as_str()])];
    let mut files = Vec::with_capacity(lib.groups.len());
    for grp in &lib.groups {
        let option_file = grp.option_file(OPTION_EXT);
        let (program, content) = match grp.kind {
            AnalysisKind::Verilog => {
                let sv = classification
                    .has_system_verilog()
                    .then(|| "-sverilog".to_owned());
                let tokens = sv
                    .into_iter()
                    .chain(options.vlogan_options.iter().cloned())
                    .chain(grp.defines.tokens())
                    .chain(
                        classification
                            .include_dirs()
                            .iter()
                            .map(|dir| format!("+incdir+{dir}")),
                    );
                ("vlogan", line(tokens))
            }
            AnalysisKind::Vhdl => ("vhdlan", line(options.vhdlan_options.iter().cloned())),
        };
        commands.push(
            Command::program(program)
                .args(full64.iter().copied())
                .args(["-f", option_file.as_str(), "-work", lib.library.as_str()])
                .args(grp.files.iter().map(|path| path.as_str())),
        );
        debug!(library = %lib.library, file = %option_file, "analysis group");
        files.push(ConfigFile::new(option_file, content));
    }

    graph.declare_inputs(lib.sources.iter().cloned());
    graph.declare_inputs(files.iter().map(|f| f.name.clone()));
    let includes: &[Utf8PathBuf] = if lib.has_verilog() { include_files } else { &[] };
    let deps: Vec<Utf8PathBuf> = lib
        .sources
        .iter()
        .chain(includes)
        .chain(files.iter().map(|f| &f.name))
        .cloned()
        .collect();
    graph.add_target(commands, [marker(&lib.library)], deps)?;
    Ok(files)
}

/// Analysis database marker produced for `library`.
fn marker(library: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{library}/AN.DB"))
}

/// Join tokens with spaces and end the line.
fn line<I>(tokens: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut text = tokens.into_iter().filter(|t| !t.is_empty()).join(" ");
    text.push('\n');
    text
}

fn setup_file(libraries: &[LibraryGroups]) -> String {
    let mut text = format!("WORK > DEFAULT\nDEFAULT : ./{DEFAULT_LIBRARY}\n");
    for lib in libraries.iter().filter(|l| l.library != DEFAULT_LIBRARY) {
        text.push_str(&format!("{0} : ./{0}\n", lib.library));
    }
    text
}

/// `assign <value> <name>` lines for vlogparams, then generics.
fn parameters_file(params: &ParameterSet) -> String {
    let mut merged = params.of(ParamType::Vlogparam).clone();
    merged.extend(
        params
            .of(ParamType::Generic)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    merged
        .iter()
        .map(|(key, value)| format!("assign {} {key}\n", value.render(TokenStyle::ASSIGNMENT)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceFile;
    use crate::param::ParamValue;
    use indexmap::IndexMap;
    use rstest::{fixture, rstest};

    fn design(files: Vec<SourceFile>) -> Design {
        Design {
            edagraph_version: semver::Version::new(1, 0, 0),
            name: "design".into(),
            toplevel: Some("top".into()),
            tool: None,
            files,
            parameters: IndexMap::new(),
            tool_options: crate::ast::ToolOptions::default(),
        }
    }

    #[fixture]
    fn scenario() -> Design {
        design(vec![
            SourceFile::new("a.sv", "systemVerilogSource").with_define("X", 1),
            SourceFile::new("b.sv", "systemVerilogSource").with_define("X", 1),
            SourceFile::new("c.vhd", "vhdlSource").in_library("ipcore"),
        ])
    }

    fn deps(setup: &ToolSetup, output: &str) -> Vec<String> {
        setup
            .graph()
            .producer(output.as_ref())
            .expect("target")
            .dependencies
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[rstest]
    fn mixed_language_scenario(scenario: Design) {
        let setup = Vcs
            .setup(&scenario, &ParameterSet::default())
            .expect("setup");
        let targets = setup.graph().targets();
        assert_eq!(targets.len(), 4);
        assert_eq!(deps(&setup, "work/AN.DB"), ["a.sv", "b.sv", "work.1.f"]);
        assert_eq!(deps(&setup, "ipcore/AN.DB"), ["c.vhd", "ipcore.1.f"]);
        assert_eq!(
            deps(&setup, "design"),
            ["work/AN.DB", "ipcore/AN.DB", "vcs.f", "parameters.txt"]
        );
        let work = setup.graph().producer("work/AN.DB".as_ref()).expect("work");
        assert_eq!(work.commands.len(), 2);
        let work_f = setup.config_file("work.1.f").expect("work.1.f");
        assert_eq!(work_f.content, "-sverilog +define+X=1\n");
        assert_eq!(
            setup.graph().default_target().map(|p| p.as_str()),
            Some("design")
        );
    }

    #[rstest]
    fn empty_logical_name_analyses_into_work() {
        let d = design(vec![
            SourceFile::new("a.v", "verilogSource").in_library(""),
            SourceFile::new("b.vhd", "vhdlSource").in_library("ip"),
        ]);
        let setup = Vcs.setup(&d, &ParameterSet::default()).expect("setup");
        let outputs: Vec<_> = setup
            .graph()
            .targets()
            .iter()
            .flat_map(|t| t.outputs.iter().map(|o| o.as_str()))
            .collect();
        assert_eq!(outputs, ["work/AN.DB", "ip/AN.DB", "design", "run"]);
        assert!(setup.config_file("work.1.f").is_some());
    }

    #[rstest]
    fn non_simulation_files_are_left_over() {
        let sdc = SourceFile::new("constraints.sdc", "SDC").with_tags(["synthesis"]);
        let d = design(vec![
            SourceFile::new("a.v", "verilogSource"),
            sdc.clone(),
        ]);
        let setup = Vcs.setup(&d, &ParameterSet::default()).expect("setup");
        assert_eq!(setup.leftover(), [sdc]);
        assert!(setup.graph().targets().iter().all(|t| {
            t.dependencies.iter().all(|dep| dep != "constraints.sdc")
        }));
    }

    #[rstest]
    fn include_files_feed_only_verilog_libraries() {
        let d = design(vec![
            SourceFile::new("inc/defs.vh", "verilogSource").as_include(),
            SourceFile::new("a.v", "verilogSource"),
            SourceFile::new("b.vhd", "vhdlSource").in_library("vlib"),
        ]);
        let setup = Vcs.setup(&d, &ParameterSet::default()).expect("setup");
        assert_eq!(deps(&setup, "work/AN.DB"), ["a.v", "inc/defs.vh", "work.1.f"]);
        assert_eq!(deps(&setup, "vlib/AN.DB"), ["b.vhd", "vlib.1.f"]);
        assert_eq!(
            setup.config_file("work.1.f").map(|f| f.content.as_str()),
            Some("+incdir+inc\n")
        );
    }

    #[rstest]
    fn config_files_follow_tool_conventions(mut scenario: Design) {
        scenario.tool_options.vcs = VcsOptions {
            bits32: true,
            vlogan_options: vec!["-timescale=1ns/1ps".into()],
            vhdlan_options: vec!["-smart_order".into()],
            vcs_options: vec!["-debug_access+all".into()],
            run_options: vec!["+ntb_random_seed=1".into()],
        };
        let mut params = ParameterSet::default();
        params.set(ParamType::Vlogparam, "WIDTH", ParamValue::Int(8));
        params.set(ParamType::Generic, "NAME", ParamValue::from("core"));
        params.set(ParamType::Vlogdefine, "SIM", ParamValue::Bool(true));
        let setup = Vcs.setup(&scenario, &params).expect("setup");

        let content = |name: &str| setup.config_file(name).expect(name).content.clone();
        assert_eq!(
            content("synopsys_sim.setup"),
            "WORK > DEFAULT\nDEFAULT : ./work\nipcore : ./ipcore\n"
        );
        assert_eq!(
            content("work.1.f"),
            "-sverilog -timescale=1ns/1ps +define+SIM=1 +define+X=1\n"
        );
        assert_eq!(content("ipcore.1.f"), "-smart_order\n");
        assert_eq!(content("vcs.f"), "-top top -debug_access+all\n");
        assert_eq!(
            content("parameters.txt"),
            "assign 8 WIDTH\nassign \"core\" NAME\n"
        );
        let names: Vec<_> = setup.config_files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "synopsys_sim.setup",
                "work.1.f",
                "ipcore.1.f",
                "vcs.f",
                "parameters.txt"
            ]
        );
    }

    #[rstest]
    fn missing_toplevel_is_rejected(mut scenario: Design) {
        scenario.toplevel = None;
        let err = Vcs
            .setup(&scenario, &ParameterSet::default())
            .expect_err("no toplevel");
        assert!(matches!(
            err,
            SetupError::Config(crate::backend::ConfigError::MissingToplevel { .. })
        ));
    }

    #[rstest]
    fn string_defines_use_doubled_quotes() {
        let d = design(vec![
            SourceFile::new("a.v", "verilogSource").with_define("MSG", "hi"),
        ]);
        let setup = Vcs.setup(&d, &ParameterSet::default()).expect("setup");
        assert_eq!(
            setup.config_file("work.1.f").map(|f| f.content.as_str()),
            Some("+define+MSG=\"\"hi\"\"\n")
        );
    }

    #[rstest]
    fn mixed_defines_split_commands_and_default_library_is_work() {
        let d = design(vec![
            SourceFile::new("a.v", "verilogSource").with_define("X", 1),
            SourceFile::new("b.v", "verilogSource").with_define("X", 2),
        ]);
        let setup = Vcs.setup(&d, &ParameterSet::default()).expect("setup");
        assert_eq!(
            deps(&setup, "work/AN.DB"),
            ["a.v", "b.v", "work.1.f", "work.2.f"]
        );
        assert_eq!(
            setup.config_file(SETUP_FILE).map(|f| f.content.as_str()),
            Some("WORK > DEFAULT\nDEFAULT : ./work\n")
        );
    }
}
