//! The set of module instances being composed, plus their glue signals.

use crate::arena::Arena;
use crate::error::{AssignError, ObjectKind};
use crate::expr::GenericEnv;
use crate::generic::{Generic, GenericRef, GenericValue};
use crate::ids::{GlueId, ModuleId};
use crate::module::Module;
use crate::port::{Port, PortRef};
use crate::value::ConstValue;
use crate::width::DataWidth;
use asterics_common::Interner;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Intermediary wire created when ports are joined.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlueSignal {
    /// Signal name, `{module}_{prefix}{code_name}` of the driver.
    pub name: String,
    /// Type mark of the driver.
    pub data_type: String,
    /// Width of the driver.
    pub data_width: DataWidth,
    /// Width after finalization.
    pub resolved_width: Option<DataWidth>,
    /// Driving port.
    pub driver: PortRef,
    /// Driven ports.
    pub sinks: Vec<PortRef>,
}

/// Module instances and glue signals of one build.
///
/// Cloning a design is how the engine snapshots it before a change that may
/// have to be undone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Design {
    modules: Arena<ModuleId, Module>,
    glue: Arena<GlueId, GlueSignal>,
}

impl Design {
    /// An empty design.
    pub fn new() -> Self {
        Design::default()
    }

    /// Adds a module instance.
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        self.modules.alloc(module)
    }

    /// Returns a module.
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id]
    }

    /// Returns a module mutably.
    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id]
    }

    /// Returns a module if `id` is valid.
    pub fn try_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.try_get(id)
    }

    /// Modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter()
    }

    /// Number of module instances.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Finds an instance by name, case-insensitively.
    pub fn find_module(&self, name: &str, interner: &Interner) -> Option<ModuleId> {
        let ident = interner.get(&name.to_ascii_lowercase())?;
        self.modules
            .iter()
            .find(|(_, m)| m.name == ident)
            .map(|(id, _)| id)
    }

    /// Returns a port.
    pub fn port(&self, port: PortRef) -> &Port {
        &self.modules[port.module].ports[port.port]
    }

    /// Returns a port mutably.
    pub fn port_mut(&mut self, port: PortRef) -> &mut Port {
        &mut self.modules[port.module].ports[port.port]
    }

    /// Returns a generic.
    pub fn generic(&self, generic: GenericRef) -> &Generic {
        &self.modules[generic.module].generics[generic.generic]
    }

    /// Adds a glue signal.
    pub fn add_glue(&mut self, glue: GlueSignal) -> GlueId {
        self.glue.alloc(glue)
    }

    /// Returns a glue signal.
    pub fn glue(&self, id: GlueId) -> &GlueSignal {
        &self.glue[id]
    }

    /// Returns a glue signal mutably.
    pub fn glue_mut(&mut self, id: GlueId) -> &mut GlueSignal {
        &mut self.glue[id]
    }

    /// Glue signals in creation order.
    pub fn glue_signals(&self) -> impl Iterator<Item = (GlueId, &GlueSignal)> {
        self.glue.iter()
    }

    /// Number of glue signals.
    pub fn glue_count(&self) -> usize {
        self.glue.len()
    }

    /// `module.port` for messages.
    pub fn port_name(&self, port: PortRef, interner: &Interner) -> String {
        let module = &self.modules[port.module];
        format!(
            "{}.{}",
            interner.resolve(module.name),
            interner.resolve(module.ports[port.port].code_name)
        )
    }

    /// `module.GENERIC` for messages.
    pub fn generic_name(&self, generic: GenericRef, interner: &Interner) -> String {
        let module = &self.modules[generic.module];
        format!(
            "{}.{}",
            interner.resolve(module.name),
            interner.resolve(module.generics[generic.generic].name)
        )
    }

    fn check_generic(&self, generic: GenericRef, interner: &Interner) -> Result<(), AssignError> {
        let Some(module) = self.modules.try_get(generic.module) else {
            return Err(AssignError::UnknownObject {
                parent: "design".to_string(),
                kind: ObjectKind::Module,
                name: format!("#{}", generic.module.as_raw()),
            });
        };
        if module.generics.try_get(generic.generic).is_none() {
            return Err(AssignError::UnknownObject {
                parent: module.label(interner).to_string(),
                kind: ObjectKind::Generic,
                name: format!("#{}", generic.generic.as_raw()),
            });
        }
        Ok(())
    }

    /// Makes `from` share the value of `to`.
    ///
    /// Fails with [`AssignError::LinkCycle`] if `to` already leads back to
    /// `from`; the design is unchanged in that case.
    pub fn link_generic(
        &mut self,
        from: GenericRef,
        to: GenericRef,
        interner: &Interner,
    ) -> Result<(), AssignError> {
        self.check_generic(from, interner)?;
        self.check_generic(to, interner)?;
        let mut chain = vec![from];
        let mut current = to;
        loop {
            chain.push(current);
            if current == from {
                return Err(AssignError::LinkCycle {
                    chain: chain
                        .iter()
                        .map(|g| self.generic_name(*g, interner))
                        .collect(),
                });
            }
            match self.generic(current).link() {
                Some(next) => current = next,
                None => break,
            }
        }
        self.modules[from.module].generics[from.generic].value = GenericValue::Link(to);
        Ok(())
    }

    /// The generic at the end of `generic`'s link chain.
    pub fn link_target(&self, generic: GenericRef) -> GenericRef {
        let mut seen = HashSet::new();
        let mut current = generic;
        while seen.insert(current) {
            match self.generic(current).link() {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Current value of a generic.
    ///
    /// Follows links to the end of the chain; an unset generic there yields
    /// its default. Reading never changes the design.
    pub fn generic_value(&self, generic: GenericRef) -> Option<ConstValue> {
        let target = self.generic(self.link_target(generic));
        match &target.value {
            GenericValue::Literal(v) => Some(v.clone()),
            GenericValue::Unset => target.default_value.clone(),
            GenericValue::Link(_) => None,
        }
    }

    /// Assigns a value; for linked generics the end of the link chain
    /// receives it, so every generic on the chain sees the new value.
    pub fn set_generic_value(
        &mut self,
        generic: GenericRef,
        value: ConstValue,
        interner: &Interner,
    ) -> Result<(), AssignError> {
        self.check_generic(generic, interner)?;
        let target = self.link_target(generic);
        for g in [generic, target] {
            if let Some(check) = &self.generic(g).check {
                if !check.accepts(&value) {
                    return Err(AssignError::ValueRejected {
                        generic: self.generic_name(g, interner),
                        value: value.to_string(),
                        check: check.to_string(),
                    });
                }
            }
        }
        self.modules[target.module].generics[target.generic].value = GenericValue::Literal(value);
        Ok(())
    }

    /// Names visible to width expressions of `module`: its constants,
    /// overridden by its generics' current values.
    pub fn generic_env(&self, module: ModuleId, interner: &Interner) -> GenericEnv {
        let m = &self.modules[module];
        let mut env = GenericEnv::new();
        for constant in &m.constants {
            env.insert(
                interner.resolve(constant.name).to_ascii_uppercase(),
                constant.value.clone(),
            );
        }
        for id in m.generics.ids() {
            if let Some(value) = self.generic_value(GenericRef::new(module, id)) {
                env.insert(interner.resolve(m.generics[id].name).to_string(), value);
            }
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(interner: &Interner) -> (Design, GenericRef, GenericRef) {
        let mut design = Design::new();
        let mut refs = Vec::new();
        for name in ["a", "b"] {
            let mut m = Module::new(interner.intern_lower(name), interner.intern_lower("as_invert"));
            let g = m
                .add_generic(
                    Generic::new(interner.intern_upper("WIDTH"), "integer", Some(ConstValue::Int(8))),
                    interner,
                )
                .unwrap();
            let id = design.add_module(m);
            refs.push(GenericRef::new(id, g));
        }
        (design, refs[0], refs[1])
    }

    #[test]
    fn link_then_set_target() {
        let interner = Interner::new();
        let (mut d, a, b) = design(&interner);
        d.link_generic(a, b, &interner).unwrap();
        d.set_generic_value(b, ConstValue::Int(17), &interner).unwrap();
        assert_eq!(d.generic_value(a), Some(ConstValue::Int(17)));
    }

    #[test]
    fn set_through_link_reaches_target() {
        let interner = Interner::new();
        let (mut d, a, b) = design(&interner);
        d.link_generic(a, b, &interner).unwrap();
        d.set_generic_value(a, ConstValue::Int(24), &interner).unwrap();
        assert_eq!(d.generic_value(b), Some(ConstValue::Int(24)));
        assert_eq!(d.generic_value(a), Some(ConstValue::Int(24)));
    }

    #[test]
    fn unset_chain_uses_target_default() {
        let interner = Interner::new();
        let (mut d, a, b) = design(&interner);
        d.module_mut(a.module).generics[a.generic].default_value = Some(ConstValue::Int(1));
        d.link_generic(a, b, &interner).unwrap();
        assert_eq!(d.generic_value(a), Some(ConstValue::Int(8)));
    }

    #[test]
    fn cycle_rejected_at_assignment() {
        let interner = Interner::new();
        let (mut d, a, b) = design(&interner);
        d.link_generic(a, b, &interner).unwrap();
        let err = d.link_generic(b, a, &interner).unwrap_err();
        assert_eq!(
            err,
            AssignError::LinkCycle {
                chain: vec!["b.WIDTH".into(), "a.WIDTH".into(), "b.WIDTH".into()]
            }
        );
        assert_eq!(d.generic(b).value, GenericValue::Unset);
        assert!(d.link_generic(a, a, &interner).is_err());
    }

    #[test]
    fn reading_is_idempotent() {
        let interner = Interner::new();
        let (mut d, a, _) = design(&interner);
        d.set_generic_value(a, ConstValue::Int(5), &interner).unwrap();
        let first = d.generic_value(a);
        let second = d.generic_value(a);
        assert_eq!(first, second);
        assert_eq!(d.generic(a).value, GenericValue::Literal(ConstValue::Int(5)));
    }

    #[test]
    fn env_contains_constants_and_generics() {
        let interner = Interner::new();
        let (mut d, a, _) = design(&interner);
        d.module_mut(a.module).constants.push(crate::module::Constant {
            name: interner.intern_lower("c_reg_count"),
            data_type: "integer".into(),
            data_width: DataWidth::scalar(),
            value: ConstValue::Int(4),
        });
        let env = d.generic_env(a.module, &interner);
        assert_eq!(env.get("WIDTH"), Some(&ConstValue::Int(8)));
        assert_eq!(env.get("C_REG_COUNT"), Some(&ConstValue::Int(4)));
    }

    #[test]
    fn find_module_by_name() {
        let interner = Interner::new();
        let (d, a, _) = design(&interner);
        assert_eq!(d.find_module("A", &interner), Some(a.module));
        assert_eq!(d.find_module("zzz", &interner), None);
    }
}
