//! Module prototypes and instances.

use crate::arena::Arena;
use crate::behavior::ModuleBehavior;
use crate::error::{AssignError, ObjectKind};
use crate::generic::{Generic, GenericValue};
use crate::ids::{GenericId, InterfaceId, PortId};
use crate::interface::{Interface, InterfaceTemplate};
use crate::port::{Direction, Port, PortKind};
use crate::value::ConstValue;
use crate::width::DataWidth;
use asterics_common::{Ident, Interner};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Where a module runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ModuleType {
    /// Plain hardware.
    #[default]
    Hardware,
    /// Software only.
    Software,
    /// Hardware controlled from software through registers.
    HardwareSwControl,
    /// Hardware with a software driver counterpart.
    HardwareSw,
}

/// A named, typed literal for generated declarations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    /// Lower-case name.
    pub name: Ident,
    /// Type mark, lower case.
    pub data_type: String,
    /// Declared width.
    pub data_width: DataWidth,
    /// Value text or literal.
    pub value: ConstValue,
}

/// A module prototype held by the library, or an instance in a design.
///
/// The module owns its ports, interfaces and generics; cross-references
/// between them are IDs into the module's arenas.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    /// Instance name; the registered name for prototypes.
    pub name: Ident,
    /// Entity name from the declaration file.
    pub entity_name: Ident,
    /// Repository the prototype came from.
    pub repository: String,
    /// Hardware/software classification.
    pub module_type: ModuleType,
    /// Free-form category, e.g. `filter`.
    pub category: String,
    /// Entity names required at build time, lower case.
    pub dependencies: Vec<String>,
    /// Files belonging to the module.
    pub files: Vec<PathBuf>,
    /// Ports.
    pub ports: Arena<PortId, Port>,
    /// Interfaces.
    pub interfaces: Arena<InterfaceId, Interface>,
    /// Generics.
    pub generics: Arena<GenericId, Generic>,
    /// Constants in declaration order.
    pub constants: Vec<Constant>,
    /// Interface templates only this module uses.
    pub templates: Vec<InterfaceTemplate>,
    /// Custom per-instance behavior.
    #[serde(skip)]
    pub behavior: Option<Arc<dyn ModuleBehavior>>,
}

impl Module {
    /// An empty module.
    pub fn new(name: Ident, entity_name: Ident) -> Self {
        Module {
            name,
            entity_name,
            repository: String::new(),
            module_type: ModuleType::default(),
            category: String::new(),
            dependencies: Vec::new(),
            files: Vec::new(),
            ports: Arena::new(),
            interfaces: Arena::new(),
            generics: Arena::new(),
            constants: Vec::new(),
            templates: Vec::new(),
            behavior: None,
        }
    }

    /// Adds a port. Interface members are appended to their interface.
    pub fn add_port(&mut self, port: Port, interner: &Interner) -> Result<PortId, AssignError> {
        if self.port_by_ident(port.code_name).is_some() {
            return Err(self.duplicate(ObjectKind::Port, interner.resolve(port.code_name), interner));
        }
        if let PortKind::Interface(iface) = port.kind {
            if self.interfaces.try_get(iface).is_none() {
                return Err(self.unknown(
                    ObjectKind::Interface,
                    &format!("#{}", iface.as_raw()),
                    interner,
                ));
            }
            let id = self.ports.alloc(port);
            self.interfaces[iface].ports.push(id);
            return Ok(id);
        }
        Ok(self.ports.alloc(port))
    }

    /// Adds an interface. Its `unique_name` must be unused.
    pub fn add_interface(
        &mut self,
        interface: Interface,
        interner: &Interner,
    ) -> Result<InterfaceId, AssignError> {
        if self
            .interfaces
            .values()
            .any(|i| i.unique_name == interface.unique_name)
        {
            return Err(self.duplicate(ObjectKind::Interface, &interface.unique_name, interner));
        }
        Ok(self.interfaces.alloc(interface))
    }

    /// Adds a generic.
    pub fn add_generic(
        &mut self,
        generic: Generic,
        interner: &Interner,
    ) -> Result<GenericId, AssignError> {
        if self.generics.values().any(|g| g.name == generic.name) {
            return Err(self.duplicate(ObjectKind::Generic, interner.resolve(generic.name), interner));
        }
        Ok(self.generics.alloc(generic))
    }

    /// Adds a constant.
    pub fn add_constant(&mut self, constant: Constant, interner: &Interner) -> Result<(), AssignError> {
        if self.constants.iter().any(|c| c.name == constant.name) {
            return Err(self.duplicate(ObjectKind::Constant, interner.resolve(constant.name), interner));
        }
        self.constants.push(constant);
        Ok(())
    }

    /// Looks up a generic, case-insensitively.
    pub fn generic_by_name(&self, name: &str, interner: &Interner) -> Option<GenericId> {
        let ident = interner.get(&name.to_ascii_uppercase())?;
        self.generics
            .iter()
            .find(|(_, g)| g.name == ident)
            .map(|(id, _)| id)
    }

    /// Sets a generic of this module to a value.
    ///
    /// Linked generics must be written through
    /// [`Design::set_generic_value`](crate::Design::set_generic_value).
    pub fn set_generic_value(
        &mut self,
        name: &str,
        value: ConstValue,
        interner: &Interner,
    ) -> Result<(), AssignError> {
        let id = self
            .generic_by_name(name, interner)
            .ok_or_else(|| self.unknown(ObjectKind::Generic, name, interner))?;
        let generic = &self.generics[id];
        let qualified = format!(
            "{}.{}",
            interner.resolve(self.name),
            interner.resolve(generic.name)
        );
        if let GenericValue::Link(target) = generic.value {
            return Err(AssignError::Linked {
                generic: qualified,
                target: format!("module #{} generic #{}", target.module.as_raw(), target.generic.as_raw()),
            });
        }
        if let Some(check) = &generic.check {
            if !check.accepts(&value) {
                return Err(AssignError::ValueRejected {
                    generic: qualified,
                    value: value.to_string(),
                    check: check.to_string(),
                });
            }
        }
        self.generics[id].value = GenericValue::Literal(value);
        Ok(())
    }

    /// Looks up a port by its declared name, case-insensitively.
    pub fn port_by_code_name(&self, name: &str, interner: &Interner) -> Option<PortId> {
        self.port_by_ident(interner.get(&name.to_ascii_lowercase())?)
    }

    fn port_by_ident(&self, ident: Ident) -> Option<PortId> {
        self.ports
            .iter()
            .find(|(_, p)| p.code_name == ident)
            .map(|(id, _)| id)
    }

    /// Looks up an interface by unique name, or by type name when exactly
    /// one interface has that type.
    pub fn interface_by_name(&self, name: &str) -> Option<InterfaceId> {
        let name = name.to_ascii_lowercase();
        if let Some((id, _)) = self.interfaces.iter().find(|(_, i)| i.unique_name == name) {
            return Some(id);
        }
        let mut by_type = self.interfaces.iter().filter(|(_, i)| i.type_name == name);
        match (by_type.next(), by_type.next()) {
            (Some((id, _)), None) => Some(id),
            _ => None,
        }
    }

    /// Routes a port to the top level.
    pub fn make_port_external(&mut self, port: PortId, interner: &Interner) -> Result<(), AssignError> {
        self.port_mut(port, interner)?.external = true;
        Ok(())
    }

    /// Ties a port to a constant value.
    pub fn set_port_fixed_value(
        &mut self,
        port: PortId,
        value: impl Into<String>,
        interner: &Interner,
    ) -> Result<(), AssignError> {
        self.port_mut(port, interner)?.fixed_value = Some(value.into());
        Ok(())
    }

    fn port_mut(&mut self, port: PortId, interner: &Interner) -> Result<&mut Port, AssignError> {
        if self.ports.try_get(port).is_none() {
            return Err(self.unknown(ObjectKind::Port, &format!("#{}", port.as_raw()), interner));
        }
        Ok(&mut self.ports[port])
    }

    /// Ports that belong to no interface and are not standard ports.
    pub fn lone_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports_of_kind(PortKind::Single)
    }

    /// Clock, reset and similar ports.
    pub fn standard_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports_of_kind(PortKind::Standard)
    }

    fn ports_of_kind(&self, kind: PortKind) -> impl Iterator<Item = PortId> + '_ {
        self.ports
            .iter()
            .filter(move |(_, p)| p.kind == kind)
            .map(|(id, _)| id)
    }

    /// Interfaces with the given direction.
    pub fn interfaces_in_direction(
        &self,
        direction: Direction,
    ) -> impl Iterator<Item = InterfaceId> + '_ {
        self.interfaces
            .iter()
            .filter(move |(_, i)| i.direction == direction)
            .map(|(id, _)| id)
    }

    /// Generics of this module referenced by a port's width.
    pub fn width_generics(&self, port: PortId, interner: &Interner) -> Vec<GenericId> {
        self.ports[port]
            .data_width
            .generic_names()
            .iter()
            .filter_map(|name| self.generic_by_name(name, interner))
            .collect()
    }

    /// Instance name as text.
    pub fn label<'a>(&self, interner: &'a Interner) -> &'a str {
        interner.resolve(self.name)
    }

    fn duplicate(&self, kind: ObjectKind, name: &str, interner: &Interner) -> AssignError {
        AssignError::Duplicate {
            parent: self.label(interner).to_string(),
            kind,
            name: name.to_string(),
        }
    }

    fn unknown(&self, kind: ObjectKind, name: &str, interner: &Interner) -> AssignError {
        AssignError::UnknownObject {
            parent: self.label(interner).to_string(),
            kind,
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::ValueCheck;
    use crate::interface::TemplatePort;
    use crate::width::Range;

    fn module(interner: &Interner) -> Module {
        let mut m = Module::new(interner.intern_lower("as_invert"), interner.intern_lower("as_invert"));
        m.add_generic(
            Generic::new(interner.intern_upper("DATA_WIDTH"), "integer", Some(ConstValue::Int(8))),
            interner,
        )
        .unwrap();
        m
    }

    #[test]
    fn duplicate_port_rejected() {
        let interner = Interner::new();
        let mut m = module(&interner);
        let clk = interner.intern_lower("clk");
        m.add_port(Port::new(clk, Direction::In, "std_logic"), &interner).unwrap();
        let err = m
            .add_port(Port::new(clk, Direction::In, "std_logic"), &interner)
            .unwrap_err();
        assert!(matches!(err, AssignError::Duplicate { kind: ObjectKind::Port, .. }));
    }

    #[test]
    fn interface_members_are_recorded() {
        let interner = Interner::new();
        let mut m = module(&interner);
        let template = InterfaceTemplate::new("as_stream")
            .with_port(TemplatePort::new("strobe", Direction::In, Some("std_logic")));
        let mut iface = Interface::from_template(&template, Direction::In, "", "");
        iface.unique_name = "in".into();
        let iid = m.add_interface(iface, &interner).unwrap();
        let mut port = Port::new(interner.intern_lower("strobe_in"), Direction::In, "std_logic");
        port.kind = PortKind::Interface(iid);
        let pid = m.add_port(port, &interner).unwrap();
        assert_eq!(m.interfaces[iid].ports, vec![pid]);
        assert_eq!(m.interface_by_name("IN"), Some(iid));
        assert_eq!(m.interface_by_name("as_stream"), Some(iid));
        assert_eq!(m.lone_ports().count(), 0);
    }

    #[test]
    fn set_generic_value_checks() {
        let interner = Interner::new();
        let mut m = module(&interner);
        m.set_generic_value("data_width", ConstValue::Int(16), &interner).unwrap();
        let id = m.generic_by_name("DATA_WIDTH", &interner).unwrap();
        assert_eq!(m.generics[id].value, GenericValue::Literal(ConstValue::Int(16)));

        m.generics[id].check = Some(ValueCheck::PowerOfTwo);
        let err = m
            .set_generic_value("DATA_WIDTH", ConstValue::Int(12), &interner)
            .unwrap_err();
        assert!(matches!(err, AssignError::ValueRejected { .. }));

        let err = m
            .set_generic_value("NOPE", ConstValue::Int(1), &interner)
            .unwrap_err();
        assert!(matches!(err, AssignError::UnknownObject { kind: ObjectKind::Generic, .. }));
    }

    #[test]
    fn port_helpers() {
        let interner = Interner::new();
        let mut m = module(&interner);
        let mut clk = Port::new(interner.intern_lower("clk"), Direction::In, "std_logic");
        clk.kind = PortKind::Standard;
        m.add_port(clk, &interner).unwrap();
        let data = m
            .add_port(
                Port::new(interner.intern_lower("data"), Direction::In, "std_logic_vector").with_width(
                    DataWidth::single(Range {
                        left: crate::width::Bound::Expr("DATA_WIDTH - 1".into()),
                        dir: crate::width::RangeDir::Downto,
                        right: crate::width::Bound::Int(0),
                    }),
                ),
                &interner,
            )
            .unwrap();
        assert_eq!(m.standard_ports().count(), 1);
        assert_eq!(m.lone_ports().collect::<Vec<_>>(), vec![data]);
        assert_eq!(m.port_by_code_name("DATA", &interner), Some(data));
        assert_eq!(m.width_generics(data, &interner).len(), 1);
        m.set_port_fixed_value(data, "(others => '0')", &interner).unwrap();
        assert!(m.ports[data].is_connected());
        assert!(m.make_port_external(PortId::from_raw(9), &interner).is_err());
    }
}
