//! Interface templates known to every module.

use asterics_model::{Action, Condition, Direction, InterfaceTemplate, Rule, TemplatePort};

/// Type name of the pixel stream interface.
pub const AS_STREAM: &str = "as_stream";
/// Type name of the slave register interface.
pub const SLV_REG_INTERFACE: &str = "slv_reg_interface";

const STD_LOGIC: Option<&str> = Some("std_logic");
const STD_LOGIC_VECTOR: Option<&str> = Some("std_logic_vector");

/// The streaming interface: `strobe` and `data` plus optional sync and
/// back-pressure lines.
pub fn as_stream() -> InterfaceTemplate {
    let fallback = |port: &str| Rule::new(Condition::SinkMissing, Action::FallbackPort(port.into()));
    InterfaceTemplate::new(AS_STREAM)
        .with_port(TemplatePort::new("strobe", Direction::In, STD_LOGIC))
        .with_port(TemplatePort::new("data", Direction::In, STD_LOGIC_VECTOR))
        .with_port(TemplatePort::new("data_error", Direction::In, STD_LOGIC).optional())
        .with_port(TemplatePort::new("stall", Direction::Out, STD_LOGIC).optional())
        .with_port(TemplatePort::new("vsync", Direction::In, STD_LOGIC).optional())
        .with_port(
            TemplatePort::new("vcomplete", Direction::In, STD_LOGIC)
                .optional()
                .with_rule(fallback("vsync"))
                .with_rule(fallback("data_unit_complete")),
        )
        .with_port(TemplatePort::new("hsync", Direction::In, STD_LOGIC).optional())
        .with_port(
            TemplatePort::new("hcomplete", Direction::In, STD_LOGIC)
                .optional()
                .with_rule(fallback("hsync")),
        )
        .with_port(TemplatePort::new("xres", Direction::In, STD_LOGIC_VECTOR).optional())
        .with_port(TemplatePort::new("yres", Direction::In, STD_LOGIC_VECTOR).optional())
        .with_port(TemplatePort::new("data_unit_complete", Direction::In, STD_LOGIC).optional())
}

/// The register interface between a module and the register manager.
pub fn slv_reg_interface() -> InterfaceTemplate {
    InterfaceTemplate::new(SLV_REG_INTERFACE)
        .with_port(TemplatePort::new("slv_ctrl_reg", Direction::In, Some("slv_reg_data")))
        .with_port(TemplatePort::new("slv_status_reg", Direction::Out, Some("slv_reg_data")))
        .with_port(TemplatePort::new("slv_reg_modify", Direction::Out, STD_LOGIC_VECTOR))
        .with_port(TemplatePort::new(
            "slv_reg_config",
            Direction::Out,
            Some("slv_reg_config_table"),
        ))
}

/// All global templates.
pub fn builtin_templates() -> Vec<InterfaceTemplate> {
    vec![as_stream(), slv_reg_interface()]
}
