//! End-to-end helpers for the ASTERICS composition toolkit.
//!
//! Writes a fixture module repository to disk, loads it through a project
//! file into a [`ModuleLibrary`] and runs processing chains over it, so the
//! tests in `tests/` exercise the reader, the library, the resolver and the
//! connection engine together.

#![warn(missing_docs)]

use std::fs;
use std::io;
use std::path::Path;

use asterics_chain::{BuildFailure, ChainOptions, ProcessingChain, SystemGraph};
use asterics_common::{Interner, SourceDb};
use asterics_config::{load_config_from_str, ProjectConfig};
use asterics_diagnostics::{Diagnostic, Severity};
use asterics_library::{ModuleError, ModuleLibrary, Registration, Session};
use asterics_model::{
    AssignError, AutoInstContext, Direction, InterfaceTemplate, ModuleBehavior, TemplatePort,
};
use asterics_vhdl::{read_entity, BoundDecl, EntityDecl, PortMode, RangeDecl, RangeDir};

/// Stream source with a width generic.
pub const CAMERA: &str = "as_camera";
/// Stream sink with a width generic.
pub const WRITER: &str = "as_writer";
/// Stream filter with a register interface; depends on [`REGMGR`].
pub const INVERT: &str = "as_invert";
/// Register manager, sized by the module that instantiates it.
pub const REGMGR: &str = "as_regmgr";
/// Two input streams, `a_` and `b_`.
pub const DUAL_SINK: &str = "as_dual_sink";
/// Drives one `as_flag` interface.
pub const FLAG_SOURCE: &str = "as_flag_source";
/// Receives one `as_flag` interface.
pub const FLAG_SINK: &str = "as_flag_sink";
/// Depends on a module nobody registered.
pub const ORPHAN: &str = "as_orphan";
/// The dependency of [`ORPHAN`].
pub const VANISHED: &str = "as_vanished";

/// Type name of the single-port interface template.
pub const AS_FLAG: &str = "as_flag";

/// An interface of exactly one port, `flag`.
pub fn flag_template() -> InterfaceTemplate {
    InterfaceTemplate::new(AS_FLAG).with_port(TemplatePort::new(
        "flag",
        Direction::In,
        Some("std_logic"),
    ))
}

const CAMERA_VHD: &str = r#"
library ieee;
use ieee.std_logic_1164.all;

entity as_camera is
  generic (
    DOUT_WIDTH : integer := 8
  );
  port (
    clk        : in  std_logic;
    reset      : in  std_logic;
    strobe_out : out std_logic;
    data_out   : out std_logic_vector(DOUT_WIDTH - 1 downto 0);
    vsync_out  : out std_logic;
    stall_in   : in  std_logic
  );
end entity as_camera;
"#;

const WRITER_VHD: &str = r#"
library ieee;
use ieee.std_logic_1164.all;

entity as_writer is
  generic (
    DIN_WIDTH : integer := 8
  );
  port (
    clk       : in  std_logic;
    reset     : in  std_logic;
    strobe_in : in  std_logic;
    data_in   : in  std_logic_vector(DIN_WIDTH - 1 downto 0);
    stall_out : out std_logic
  );
end entity as_writer;
"#;

const INVERT_VHD: &str = r#"
library ieee;
use ieee.std_logic_1164.all;
use work.helpers.all;

entity as_invert is
  generic (
    DIN_WIDTH  : integer := 8;
    DOUT_WIDTH : integer := 8
  );
  port (
    clk            : in  std_logic;
    reset          : in  std_logic;
    strobe_in      : in  std_logic;
    data_in        : in  std_logic_vector(DIN_WIDTH - 1 downto 0);
    stall_out      : out std_logic;
    strobe_out     : out std_logic;
    data_out       : out std_logic_vector(DOUT_WIDTH - 1 downto 0);
    stall_in       : in  std_logic;
    slv_ctrl_reg   : in  slv_reg_data(0 to 1);
    slv_status_reg : out slv_reg_data(0 to 1);
    slv_reg_modify : out std_logic_vector(0 to 1);
    slv_reg_config : out slv_reg_config_table(0 to 1)
  );
end entity as_invert;

architecture rtl of as_invert is
  constant c_slave_reg_config : slv_reg_config_table(0 to 1) := ("11", "10");
begin
end architecture rtl;
"#;

const REGMGR_VHD: &str = r#"
library ieee;
use ieee.std_logic_1164.all;

entity as_regmgr is
  generic (
    REG_COUNT : integer := 1
  );
  port (
    clk            : in  std_logic;
    reset          : in  std_logic;
    slv_ctrl_reg   : out slv_reg_data(0 to REG_COUNT - 1);
    slv_status_reg : in  slv_reg_data(0 to REG_COUNT - 1);
    slv_reg_modify : in  std_logic_vector(0 to REG_COUNT - 1);
    slv_reg_config : in  slv_reg_config_table(0 to REG_COUNT - 1)
  );
end entity as_regmgr;
"#;

const DUAL_SINK_VHD: &str = r#"
library ieee;
use ieee.std_logic_1164.all;

entity as_dual_sink is
  port (
    clk         : in std_logic;
    a_strobe_in : in std_logic;
    a_data_in   : in std_logic_vector(7 downto 0);
    b_strobe_in : in std_logic;
    b_data_in   : in std_logic_vector(7 downto 0)
  );
end entity as_dual_sink;
"#;

const FLAG_SOURCE_VHD: &str = r#"
entity as_flag_source is
  port (
    clk      : in  std_logic;
    flag_out : out std_logic
  );
end entity as_flag_source;
"#;

const FLAG_SINK_VHD: &str = r#"
entity as_flag_sink is
  port (
    clk     : in std_logic;
    flag_in : in std_logic
  );
end entity as_flag_sink;
"#;

const ORPHAN_VHD: &str = r#"
entity as_orphan is
  port (
    clk : in std_logic
  );
end entity as_orphan;
"#;

/// Every fixture module and its declaration file.
pub fn fixture_sources() -> [(&'static str, &'static str); 8] {
    [
        (CAMERA, CAMERA_VHD),
        (WRITER, WRITER_VHD),
        (INVERT, INVERT_VHD),
        (REGMGR, REGMGR_VHD),
        (DUAL_SINK, DUAL_SINK_VHD),
        (FLAG_SOURCE, FLAG_SOURCE_VHD),
        (FLAG_SINK, FLAG_SINK_VHD),
        (ORPHAN, ORPHAN_VHD),
    ]
}

/// Writes the fixture repository: one directory per module holding
/// `<module>.vhd`.
pub fn write_fixture_repository(root: &Path) -> io::Result<()> {
    for (name, text) in fixture_sources() {
        let dir = root.join(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.vhd")), text)?;
    }
    Ok(())
}

/// Sizes the register manager after the instantiator's control registers.
#[derive(Debug)]
pub struct SizeFromInstantiator;

impl ModuleBehavior for SizeFromInstantiator {
    fn auto_inst_config(&self, ctx: &mut AutoInstContext<'_>) -> Result<(), AssignError> {
        let count = {
            let instantiator = ctx.instantiator();
            instantiator
                .port_by_code_name("slv_ctrl_reg", ctx.interner())
                .and_then(|p| instantiator.ports[p].data_width.bit_width())
                .unwrap_or(1)
        };
        ctx.set_generic("REG_COUNT", (count as i64).into())
    }
}

/// Dependencies and behavior of the fixture modules.
pub fn configure_fixture(name: &str, reg: &mut Registration<'_>) {
    match name {
        INVERT => reg.add_dependency(REGMGR),
        REGMGR => reg.set_behavior(SizeFromInstantiator),
        ORPHAN => reg.add_dependency(VANISHED),
        _ => {}
    }
}

/// Parses a project file.
///
/// # Panics
///
/// Panics if the text is not a valid project file.
pub fn make_config(text: &str) -> ProjectConfig {
    load_config_from_str(text).unwrap()
}

/// A project with one repository, `default`, at `path`.
pub fn make_default_config(path: &Path, build: &str) -> ProjectConfig {
    make_config(&format!(
        r#"
[project]
name = "conformance"

[repositories.default]
path = "{}"

[build]
{build}
"#,
        path.display()
    ))
}

/// Registers every module directory of every configured repository.
///
/// Relative repository paths are taken from `root`. Each module is
/// discovered from `<dir>/<name>.vhd` and then handed to `configure`.
/// Returns the registered names in order.
pub fn register_repositories<'s>(
    library: &mut ModuleLibrary<'s>,
    config: &ProjectConfig,
    root: &Path,
    configure: impl Fn(&str, &mut Registration<'_>),
) -> Result<Vec<String>, ModuleError> {
    let mut registered = Vec::new();
    for (repository, repo) in &config.repositories {
        let base = root.join(&repo.path);
        let mut dirs: Vec<_> = fs::read_dir(&base)
            .map(|entries| entries.flatten().map(|e| e.path()).filter(|p| p.is_dir()).collect())
            .unwrap_or_default();
        dirs.sort();
        for dir in dirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            library.register(&name, repository, &dir, |mut reg| {
                reg.discover_module(format!("{name}.vhd"))?;
                configure(&name, &mut reg);
                Ok(reg.finish())
            })?;
            registered.push(name);
        }
    }
    Ok(registered)
}

/// Writes the fixture repository under `root` and loads it the way a
/// project file describes.
///
/// # Panics
///
/// Panics if the repository cannot be written or a module fails to load.
pub fn fixture_library<'s>(session: &'s Session, root: &Path) -> ModuleLibrary<'s> {
    write_fixture_repository(&root.join("modules")).unwrap();
    let config = make_default_config(Path::new("modules"), "");
    let mut library = ModuleLibrary::new(session);
    library.add_template(flag_template());
    register_repositories(&mut library, &config, root, configure_fixture).unwrap();
    library
}

/// Outcome of a chain build with the diagnostic counts tests assert on.
pub struct BuildResult {
    /// The system, if the build succeeded.
    pub graph: Option<SystemGraph>,
    /// All diagnostics of the build.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl BuildResult {
    /// Whether any errors were recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

/// Builds `chain` and sorts the outcome into a [`BuildResult`].
pub fn build(chain: ProcessingChain<'_>) -> BuildResult {
    let (graph, diagnostics) = match chain.build() {
        Ok(graph) => {
            let diagnostics = graph.diagnostics().to_vec();
            (Some(graph), diagnostics)
        }
        Err(BuildFailure { diagnostics }) => (None, diagnostics),
    };
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    BuildResult {
        error_count: count(Severity::Error),
        warning_count: count(Severity::Warning),
        graph,
        diagnostics,
    }
}

/// A chain over `library` with the build policy of `config`.
pub fn chain_for<'a>(
    library: &'a ModuleLibrary<'a>,
    session: &'a Session,
    config: &ProjectConfig,
) -> ProcessingChain<'a> {
    ProcessingChain::new(library, session, ChainOptions::from(&config.build))
}

/// Reads an in-memory declaration.
///
/// # Panics
///
/// Panics if the text does not read.
pub fn read_declaration(path: &str, text: &str, interner: &Interner) -> EntityDecl {
    let mut db = SourceDb::new();
    let id = db.add_source(path, text.to_string());
    read_entity(id, &db, interner).unwrap()
}

/// One line per entity, generic, port and constant, in declaration order.
pub fn describe_entity(decl: &EntityDecl, interner: &Interner) -> String {
    let mut out = format!("entity {}\n", interner.resolve(decl.name));
    for g in &decl.generics {
        out.push_str(&format!("generic {} : {}", interner.resolve(g.name), g.data_type));
        if let Some(default) = &g.default {
            out.push_str(&format!(" := {default}"));
        }
        out.push('\n');
    }
    for p in &decl.ports {
        let mode = match p.mode {
            PortMode::In => "in",
            PortMode::Out => "out",
            PortMode::InOut => "inout",
        };
        out.push_str(&format!(
            "port {} : {mode} {}{}\n",
            interner.resolve(p.name),
            p.data_type,
            describe_ranges(&p.ranges)
        ));
    }
    for c in &decl.constants {
        out.push_str(&format!(
            "constant {} : {}{} := {}\n",
            interner.resolve(c.name),
            c.data_type,
            describe_ranges(&c.ranges),
            c.value
        ));
    }
    out
}

fn describe_ranges(ranges: &[RangeDecl]) -> String {
    if ranges.is_empty() {
        return String::new();
    }
    let bound = |b: &BoundDecl| match b {
        BoundDecl::Int(v) => v.to_string(),
        BoundDecl::Expr(e) => e.clone(),
    };
    let parts: Vec<String> = ranges
        .iter()
        .map(|r| {
            let dir = match r.dir {
                RangeDir::To => "to",
                RangeDir::Downto => "downto",
            };
            format!("{} {dir} {}", bound(&r.left), bound(&r.right))
        })
        .collect();
    format!("({})", parts.join(", "))
}
