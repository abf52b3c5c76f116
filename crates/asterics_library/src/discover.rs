//! Populates a module from its entity declaration.
//!
//! Every declared port is fitted, in declaration order, to the first rule
//! that accepts it:
//!
//! 1. an interface already opened for this module whose template has a slot
//!    named in the port name, with the same prefix and suffix;
//! 2. a new interface of the template whose slot name is the longest match;
//! 3. a standard port (`clk`, `reset`, ...);
//! 4. a lone port.
//!
//! Interfaces still missing mandatory slots afterwards are dissolved and
//! their ports fitted again without opening new interfaces.

use crate::error::{warning_incomplete_interface, warning_undeclared_width_generic, ModuleError};
use crate::session::Session;
use crate::standard::{standard_port, StandardPort};
use crate::templates::SLV_REG_INTERFACE;
use asterics_model::{
    Bound, ConstValue, Constant, DataWidth, Direction, Generic, Interface, InterfaceId,
    InterfaceTemplate, Module, Port, PortKind, Range, RangeDir,
};
use asterics_vhdl::{BoundDecl, PortDecl, PortMode, RangeDecl};
use std::collections::HashSet;
use std::path::Path;

/// Reads the entity in `path` and adds its generics, constants, ports and
/// interfaces to `module`.
///
/// `templates` are the global interface templates; the module's own
/// templates are tried first.
pub fn discover_module(
    module: &mut Module,
    path: &Path,
    session: &Session,
    templates: &[InterfaceTemplate],
) -> Result<(), ModuleError> {
    let interner = &session.interner;
    let decl = session
        .read_entity(path)
        .map_err(|source| ModuleError::Discover {
            module: module.label(interner).to_string(),
            source,
        })?;
    module.entity_name = decl.name;
    module.files.push(path.to_path_buf());

    for g in &decl.generics {
        let mut generic = Generic::new(
            g.name,
            g.data_type.clone(),
            g.default.as_deref().map(ConstValue::parse),
        );
        generic.span = g.span;
        module.add_generic(generic, interner)?;
    }
    for c in &decl.constants {
        module.add_constant(
            Constant {
                name: c.name,
                data_type: c.data_type.clone(),
                data_width: convert_width(&c.ranges),
                value: ConstValue::parse(&c.value),
            },
            interner,
        )?;
    }

    let templates: Vec<InterfaceTemplate> = module
        .templates
        .iter()
        .chain(templates)
        .cloned()
        .collect();
    let names: Vec<String> = decl
        .ports
        .iter()
        .map(|p| interner.resolve(p.name).to_string())
        .collect();
    let mut fitter = Fitter {
        templates: &templates,
        ports: &decl.ports,
        names: &names,
        drafts: Vec::new(),
        fits: Vec::new(),
    };
    for index in 0..decl.ports.len() {
        let fit = fitter.fit(index, true);
        fitter.fits.push(fit);
    }
    fitter.dissolve_incomplete(module.label(interner), session);

    let drafts: Vec<(usize, &Draft)> = fitter
        .drafts
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.as_ref().map(|d| (i, d)))
        .collect();
    let unique_names = name_interfaces(&drafts, &templates);
    let mut interface_ids: Vec<Option<InterfaceId>> = vec![None; fitter.drafts.len()];
    for ((index, draft), unique_name) in drafts.iter().zip(unique_names) {
        let template = &templates[draft.template];
        let mut interface =
            Interface::from_template(template, draft.direction, &draft.prefix, &draft.suffix);
        interface.unique_name = unique_name;
        interface_ids[*index] = Some(module.add_interface(interface, interner)?);
    }

    for (index, decl_port) in decl.ports.iter().enumerate() {
        let mut port = Port::new(decl_port.name, convert_mode(decl_port.mode), decl_port.data_type.clone())
            .with_width(convert_width(&decl_port.ranges));
        port.default_value = decl_port.default.clone();
        port.span = decl_port.span;
        match &fitter.fits[index] {
            Fit::Interface {
                draft,
                template,
                slot,
            } => {
                let template_port = &templates[*template].ports[*slot];
                port.name = interner.get_or_intern(&template_port.name);
                port.optional = template_port.optional;
                port.rules = template_port.rules.clone();
                if let Some(id) = interface_ids[*draft] {
                    port.kind = PortKind::Interface(id);
                }
            }
            Fit::Standard(standard) => {
                port.kind = PortKind::Standard;
                port.optional = true;
                port.rules = standard.rules.clone();
            }
            Fit::Lone => {}
        }
        module.add_port(port, interner)?;
    }

    for id in module.interfaces.ids() {
        let mut generics = Vec::new();
        for port in module.interfaces[id].ports.clone() {
            for generic in module.width_generics(port, interner) {
                if !generics.contains(&generic) {
                    generics.push(generic);
                }
            }
        }
        module.interfaces[id].generics = generics;
    }

    let constants: HashSet<String> = module
        .constants
        .iter()
        .map(|c| interner.resolve(c.name).to_ascii_uppercase())
        .collect();
    for (_, port) in module.ports.iter() {
        for name in port.data_width.generic_names() {
            if module.generic_by_name(&name, interner).is_none() && !constants.contains(&name) {
                session.sink.emit(warning_undeclared_width_generic(
                    &format!("{}.{}", module.label(interner), interner.resolve(port.code_name)),
                    &name,
                    port.span,
                ));
            }
        }
    }
    Ok(())
}

/// An interface being assembled.
#[derive(Debug)]
struct Draft {
    template: usize,
    direction: Direction,
    prefix: String,
    suffix: String,
    /// `(slot, port)` index pairs.
    members: Vec<(usize, usize)>,
}

#[derive(Debug)]
enum Fit {
    Interface {
        draft: usize,
        template: usize,
        slot: usize,
    },
    Standard(StandardPort),
    Lone,
}

struct Fitter<'a> {
    templates: &'a [InterfaceTemplate],
    ports: &'a [PortDecl],
    names: &'a [String],
    drafts: Vec<Option<Draft>>,
    fits: Vec<Fit>,
}

impl Fitter<'_> {
    fn fit(&mut self, port: usize, allow_new: bool) -> Fit {
        let name = &self.names[port];
        let decl = &self.ports[port];
        let direction = convert_mode(decl.mode);

        for (index, draft) in self.drafts.iter_mut().enumerate() {
            let Some(draft) = draft else { continue };
            let template = &self.templates[draft.template];
            let Some(slot) = longest_slot(template, name, &decl.data_type) else {
                continue;
            };
            let Some((prefix, suffix)) = split_affixes(name, &template.ports[slot].name) else {
                continue;
            };
            let expected = match draft.direction {
                Direction::Out => template.ports[slot].direction.flipped(),
                _ => template.ports[slot].direction,
            };
            if prefix != draft.prefix
                || suffix != draft.suffix
                || expected != direction
                || draft.members.iter().any(|(s, _)| *s == slot)
            {
                continue;
            }
            draft.members.push((slot, port));
            return Fit::Interface {
                draft: index,
                template: draft.template,
                slot,
            };
        }

        if allow_new {
            let best = self
                .templates
                .iter()
                .enumerate()
                .filter_map(|(t, template)| {
                    longest_slot(template, name, &decl.data_type).map(|slot| (t, slot))
                })
                .max_by_key(|(t, slot)| {
                    // Earlier templates win ties.
                    (self.templates[*t].ports[*slot].name.len(), usize::MAX - t)
                });
            if let Some((template, slot)) = best {
                let template_port = &self.templates[template].ports[slot];
                if let Some((prefix, suffix)) = split_affixes(name, &template_port.name) {
                    let interface_direction = if template_port.direction == direction {
                        Direction::In
                    } else {
                        Direction::Out
                    };
                    self.drafts.push(Some(Draft {
                        template,
                        direction: interface_direction,
                        prefix,
                        suffix,
                        members: vec![(slot, port)],
                    }));
                    return Fit::Interface {
                        draft: self.drafts.len() - 1,
                        template,
                        slot,
                    };
                }
            }
        }

        match standard_port(name) {
            Some(standard) => Fit::Standard(standard),
            None => Fit::Lone,
        }
    }

    fn dissolve_incomplete(&mut self, module: &str, session: &Session) {
        loop {
            let incomplete = self.drafts.iter().position(|d| {
                d.as_ref().is_some_and(|d| !missing_slots(self.templates, d).is_empty())
            });
            let Some(index) = incomplete else { break };
            let Some(draft) = self.drafts[index].take() else { break };
            let template = &self.templates[draft.template];
            session.sink.emit(warning_incomplete_interface(
                module,
                &template.type_name,
                &missing_slots(self.templates, &draft),
            ));
            for (_, port) in draft.members {
                self.fits[port] = self.fit(port, false);
            }
        }
    }
}

fn missing_slots<'t>(templates: &'t [InterfaceTemplate], draft: &Draft) -> Vec<&'t str> {
    let template = &templates[draft.template];
    template
        .ports
        .iter()
        .enumerate()
        .filter(|(i, p)| !p.optional && !draft.members.iter().any(|(s, _)| s == i))
        .map(|(_, p)| p.name.as_str())
        .collect()
}

/// Index of the longest slot named in `code_name` with a compatible type.
fn longest_slot(template: &InterfaceTemplate, code_name: &str, data_type: &str) -> Option<usize> {
    template
        .ports
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            code_name.contains(p.name.as_str())
                && p.data_type.as_deref().map_or(true, |t| t == data_type)
        })
        .max_by_key(|(i, p)| (p.name.len(), usize::MAX - i))
        .map(|(i, _)| i)
}

/// Splits `code_name` around `slot` into prefix and suffix, dropping
/// direction words: `s_data_in` around `data` gives `("s_", "")`.
fn split_affixes(code_name: &str, slot: &str) -> Option<(String, String)> {
    let at = code_name.find(slot)?;
    let keep = |word: &&str| !word.is_empty() && !matches!(*word, "in" | "out" | "inout");
    let prefix: String = code_name[..at]
        .split('_')
        .filter(keep)
        .map(|w| format!("{w}_"))
        .collect();
    let suffix: String = code_name[at + slot.len()..]
        .split('_')
        .filter(keep)
        .map(|w| format!("_{w}"))
        .collect();
    Some((prefix, suffix))
}

/// Unique interface names, in the order of `drafts`.
///
/// Prefix and suffix form the name when present; otherwise the direction,
/// qualified by the type once the direction alone is taken. Register
/// interfaces are named after their type.
fn name_interfaces(drafts: &[(usize, &Draft)], templates: &[InterfaceTemplate]) -> Vec<String> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(drafts.len());
    for (_, draft) in drafts {
        let prefix = draft.prefix.trim_end_matches('_');
        let suffix = draft.suffix.trim_start_matches('_');
        let type_name = &templates[draft.template].type_name;
        let base = match (prefix.is_empty(), suffix.is_empty()) {
            (false, false) => format!("{prefix}_{suffix}"),
            (false, true) => prefix.to_string(),
            (true, false) => suffix.to_string(),
            (true, true) if type_name == SLV_REG_INTERFACE => type_name.clone(),
            (true, true) => {
                let direction = draft.direction.to_string();
                if used.contains(&direction) {
                    format!("{type_name}_{direction}")
                } else {
                    direction
                }
            }
        };
        let mut name = base.clone();
        let mut n = 1;
        while !used.insert(name.clone()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn convert_mode(mode: PortMode) -> Direction {
    match mode {
        PortMode::In => Direction::In,
        PortMode::Out => Direction::Out,
        PortMode::InOut => Direction::InOut,
    }
}

fn convert_bound(bound: &BoundDecl) -> Bound {
    match bound {
        BoundDecl::Int(v) => Bound::Int(*v),
        BoundDecl::Expr(e) => Bound::Expr(e.clone()),
    }
}

/// Converts declared index ranges into a model width.
pub fn convert_width(ranges: &[RangeDecl]) -> DataWidth {
    DataWidth {
        ranges: ranges
            .iter()
            .map(|r| Range {
                left: convert_bound(&r.left),
                dir: match r.dir {
                    asterics_vhdl::RangeDir::To => RangeDir::To,
                    asterics_vhdl::RangeDir::Downto => RangeDir::Downto,
                },
                right: convert_bound(&r.right),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::builtin_templates;
    use asterics_model::PortKind;

    const AS_INVERT: &str = r#"
library ieee;
use ieee.std_logic_1164.all;

entity as_invert is
  generic (
    DIN_WIDTH  : integer := 8;
    DOUT_WIDTH : integer := 8
  );
  port (
    clk         : in  std_logic;
    reset       : in  std_logic;
    ready       : out std_logic;
    strobe_in   : in  std_logic;
    data_in     : in  std_logic_vector(DIN_WIDTH - 1 downto 0);
    stall_out   : out std_logic;
    strobe_out  : out std_logic;
    data_out    : out std_logic_vector(DOUT_WIDTH - 1 downto 0);
    stall_in    : in  std_logic;
    slv_ctrl_reg   : in  slv_reg_data(0 to 1);
    slv_status_reg : out slv_reg_data(0 to 1);
    slv_reg_modify : out std_logic_vector(0 to 1);
    slv_reg_config : out slv_reg_config_table(0 to 1)
  );
end as_invert;
"#;

    fn discover(source: &str) -> (Session, Module) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity.vhd");
        std::fs::write(&path, source).unwrap();
        let session = Session::new();
        let name = session.interner.intern_lower("dut");
        let mut module = Module::new(name, name);
        discover_module(&mut module, &path, &session, &builtin_templates()).unwrap();
        (session, module)
    }

    #[test]
    fn as_invert_interfaces() {
        let (session, m) = discover(AS_INVERT);
        let interner = &session.interner;
        assert_eq!(interner.resolve(m.entity_name), "as_invert");
        assert_eq!(m.generics.len(), 2);
        assert_eq!(m.interfaces.len(), 3);

        let input = m.interface_by_name("in").unwrap();
        let output = m.interface_by_name("out").unwrap();
        let regs = m.interface_by_name("slv_reg_interface").unwrap();
        assert_eq!(m.interfaces[input].direction, Direction::In);
        assert_eq!(m.interfaces[output].direction, Direction::Out);
        assert_eq!(m.interfaces[input].ports.len(), 3);
        assert_eq!(m.interfaces[output].ports.len(), 3);
        assert_eq!(m.interfaces[regs].ports.len(), 4);

        let data_in = m.port_by_code_name("data_in", interner).unwrap();
        assert_eq!(interner.resolve(m.ports[data_in].name), "data");
        assert_eq!(m.ports[data_in].kind, PortKind::Interface(input));
        let din_width = m.generic_by_name("DIN_WIDTH", interner).unwrap();
        assert_eq!(m.interfaces[input].generics, vec![din_width]);

        let standard: Vec<&str> = m
            .standard_ports()
            .map(|p| interner.resolve(m.ports[p].code_name))
            .collect();
        assert_eq!(standard, vec!["clk", "reset", "ready"]);
        assert_eq!(m.lone_ports().count(), 0);
        assert!(!session.sink.has_errors());
    }

    #[test]
    fn incomplete_interface_becomes_lone_ports() {
        let (session, m) = discover(
            "entity half is\n  port (\n    strobe_in : in std_logic;\n    enable : in std_logic\n  );\nend half;\n",
        );
        assert_eq!(m.interfaces.len(), 0);
        assert_eq!(m.lone_ports().count(), 2);
        let warnings = session.sink.take_all();
        assert!(warnings
            .iter()
            .any(|d| d.code == crate::error::W301 && d.notes[0].contains("data")));
    }

    #[test]
    fn prefixed_interfaces_are_named_by_prefix() {
        let (_, m) = discover(
            "entity split is\n  port (\n    \
             a_strobe_out : out std_logic;\n    a_data_out : out std_logic_vector(7 downto 0);\n    \
             b_strobe_out : out std_logic;\n    b_data_out : out std_logic_vector(7 downto 0)\n  );\nend split;\n",
        );
        assert_eq!(m.interfaces.len(), 2);
        assert!(m.interface_by_name("a").is_some());
        assert!(m.interface_by_name("b").is_some());
        assert_eq!(m.interface_by_name("as_stream"), None);
    }

    #[test]
    fn undeclared_width_generic_warns() {
        let (session, m) = discover(
            "entity w is\n  port (\n    value : in std_logic_vector(C_WIDTH - 1 downto 0)\n  );\nend w;\n",
        );
        assert_eq!(m.lone_ports().count(), 1);
        let diags = session.sink.take_all();
        assert!(diags.iter().any(|d| d.code == crate::error::W302
            && d.subject.as_deref() == Some("dut.value")));
    }

    #[test]
    fn affixes_drop_direction_words() {
        assert_eq!(
            split_affixes("s_data_in", "data"),
            Some(("s_".to_string(), String::new()))
        );
        assert_eq!(
            split_affixes("strobe_out_2", "strobe"),
            Some((String::new(), "_2".to_string()))
        );
        assert_eq!(split_affixes("clk", "data"), None);
    }
}
