//! Fixture modules for the unit tests of this crate.

use std::fs;
use std::path::Path;

use asterics_library::{ModuleLibrary, Session};
use asterics_model::{Action, AssignError, AutoInstContext, Condition, ModuleBehavior, Rule};

pub const PRODUCER: &str = "as_producer";
pub const CONSUMER: &str = "as_consumer";
pub const FRAME_SINK: &str = "as_frame_sink";
pub const MERGER: &str = "as_merger";
pub const COUNTER: &str = "as_counter";
pub const ACCUMULATOR: &str = "as_accumulator";
pub const REGISTERED: &str = "as_reg_filter";
pub const REGMGR: &str = "as_regmgr";
pub const BROKEN: &str = "as_broken";
pub const UNSIZED: &str = "as_unsized";
pub const STRICT: &str = "as_strict";

const HEADER: &str = "library ieee;\nuse ieee.std_logic_1164.all;\n\n";

fn entity(name: &str, generics: &str, ports: &str) -> String {
    let generics = if generics.is_empty() {
        String::new()
    } else {
        format!("  generic (\n{generics}\n  );\n")
    };
    format!("{HEADER}entity {name} is\n{generics}  port (\n{ports}\n  );\nend entity {name};\n")
}

fn sources() -> Vec<(&'static str, String)> {
    vec![
        (
            PRODUCER,
            entity(
                PRODUCER,
                "    DOUT_WIDTH : integer := 8",
                "    clk : in std_logic;
    reset : in std_logic;
    strobe_out : out std_logic;
    data_out : out std_logic_vector(DOUT_WIDTH - 1 downto 0);
    stall_in : in std_logic;
    vsync_out : out std_logic",
            ),
        ),
        (
            CONSUMER,
            entity(
                CONSUMER,
                "    DIN_WIDTH : integer := 8",
                "    clk : in std_logic;
    reset : in std_logic;
    strobe_in : in std_logic;
    data_in : in std_logic_vector(DIN_WIDTH - 1 downto 0);
    stall_out : out std_logic",
            ),
        ),
        (
            FRAME_SINK,
            entity(
                FRAME_SINK,
                "    DIN_WIDTH : integer := 8",
                "    clk : in std_logic;
    strobe_in : in std_logic;
    data_in : in std_logic_vector(DIN_WIDTH - 1 downto 0);
    vsync_in : in std_logic;
    vcomplete_in : in std_logic",
            ),
        ),
        (
            MERGER,
            entity(
                MERGER,
                "    DATA_WIDTH : integer := 8",
                "    clk : in std_logic;
    left_strobe_in : in std_logic;
    left_data_in : in std_logic_vector(DATA_WIDTH - 1 downto 0);
    right_strobe_in : in std_logic;
    right_data_in : in std_logic_vector(DATA_WIDTH - 1 downto 0);
    strobe_out : out std_logic;
    data_out : out std_logic_vector(DATA_WIDTH - 1 downto 0)",
            ),
        ),
        (
            COUNTER,
            entity(
                COUNTER,
                "",
                "    clk : in std_logic;
    count : out std_logic_vector(7 downto 0);
    enable : in std_logic",
            ),
        ),
        (
            ACCUMULATOR,
            entity(
                ACCUMULATOR,
                "",
                "    clk : in std_logic;
    count : in std_logic_vector(7 downto 0);
    enable : out std_logic",
            ),
        ),
        (
            REGISTERED,
            entity(
                REGISTERED,
                "    DIN_WIDTH : integer := 8;
    DOUT_WIDTH : integer := 8",
                "    clk : in std_logic;
    reset : in std_logic;
    strobe_in : in std_logic;
    data_in : in std_logic_vector(DIN_WIDTH - 1 downto 0);
    stall_out : out std_logic;
    strobe_out : out std_logic;
    data_out : out std_logic_vector(DOUT_WIDTH - 1 downto 0);
    stall_in : in std_logic;
    slv_ctrl_reg : in slv_reg_data(0 to 3);
    slv_status_reg : out slv_reg_data(0 to 3);
    slv_reg_modify : out std_logic_vector(0 to 3);
    slv_reg_config : out slv_reg_config_table(0 to 3)",
            ),
        ),
        (
            REGMGR,
            entity(
                REGMGR,
                "    REG_COUNT : integer := 1",
                "    clk : in std_logic;
    reset : in std_logic;
    slv_ctrl_reg : out slv_reg_data(0 to REG_COUNT - 1);
    slv_status_reg : in slv_reg_data(0 to REG_COUNT - 1);
    slv_reg_modify : in std_logic_vector(0 to REG_COUNT - 1);
    slv_reg_config : in slv_reg_config_table(0 to REG_COUNT - 1)",
            ),
        ),
        (BROKEN, entity(BROKEN, "", "    clk : in std_logic")),
        (
            UNSIZED,
            entity(
                UNSIZED,
                "    LINE_WIDTH : integer",
                "    clk : in std_logic;
    pixels : in std_logic_vector(LINE_WIDTH - 1 downto 0)",
            ),
        ),
        (
            STRICT,
            entity(
                STRICT,
                "",
                "    clk : in std_logic;
    mode : in std_logic;
    level : in std_logic",
            ),
        ),
    ]
}

/// Copies the register count of the instantiating module.
#[derive(Debug)]
pub struct RegisterCount;

impl ModuleBehavior for RegisterCount {
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

/// A library with every fixture module in repository `default`, with the
/// declaration files written to `dir`.
pub fn fixture_library<'s>(session: &'s Session, dir: &Path) -> ModuleLibrary<'s> {
    let mut library = ModuleLibrary::new(session);
    for (name, text) in sources() {
        let file = format!("{name}.vhd");
        fs::write(dir.join(&file), text).unwrap();
        library
            .register(name, "default", dir, |mut reg| {
                reg.discover_module(&file)?;
                match name {
                    REGISTERED => reg.add_dependency(REGMGR),
                    REGMGR => reg.set_behavior(RegisterCount),
                    BROKEN => reg.add_dependency("as_missing"),
                    STRICT => {
                        let interner = &reg.session().interner;
                        let mode = reg.module().port_by_code_name("mode", interner).unwrap();
                        let level = reg.module().port_by_code_name("level", interner).unwrap();
                        let module = reg.module_mut();
                        module.ports[mode]
                            .rules
                            .push(Rule::new(Condition::SourceMissing, Action::Error));
                        module.ports[level].rules =
                            vec![Rule::new(Condition::SinkMissing, Action::SetValue("'0'".into()))];
                    }
                    _ => {}
                }
                Ok(reg.finish())
            })
            .unwrap();
    }
    library
}
