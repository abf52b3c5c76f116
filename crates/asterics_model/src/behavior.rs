//! Custom per-module behavior supplied by registration code.

use crate::design::Design;
use crate::error::{AssignError, ObjectKind};
use crate::generic::GenericRef;
use crate::ids::ModuleId;
use crate::module::Module;
use crate::value::ConstValue;
use asterics_common::Interner;
use std::fmt;

/// Behavior attached to a module prototype and shared by its instances.
pub trait ModuleBehavior: Send + Sync + fmt::Debug {
    /// Called once after the module was auto-instantiated for
    /// `ctx.instantiator()` and before any of its ports are wired.
    fn auto_inst_config(&self, ctx: &mut AutoInstContext<'_>) -> Result<(), AssignError> {
        let _ = ctx;
        Ok(())
    }
}

/// What an [`ModuleBehavior::auto_inst_config`] hook may touch.
pub struct AutoInstContext<'a> {
    design: &'a mut Design,
    module: ModuleId,
    instantiator: ModuleId,
    interner: &'a Interner,
}

impl<'a> AutoInstContext<'a> {
    /// Creates a context for `module`, instantiated on behalf of `instantiator`.
    pub fn new(
        design: &'a mut Design,
        module: ModuleId,
        instantiator: ModuleId,
        interner: &'a Interner,
    ) -> Self {
        AutoInstContext {
            design,
            module,
            instantiator,
            interner,
        }
    }

    /// The new module.
    pub fn module(&self) -> &Module {
        self.design.module(self.module)
    }

    /// The module whose dependency caused the instantiation.
    pub fn instantiator(&self) -> &Module {
        self.design.module(self.instantiator)
    }

    /// The session interner.
    pub fn interner(&self) -> &Interner {
        self.interner
    }

    fn generic_ref(&self, module: ModuleId, name: &str) -> Result<GenericRef, AssignError> {
        let m = self.design.module(module);
        m.generic_by_name(name, self.interner)
            .map(|g| GenericRef::new(module, g))
            .ok_or_else(|| AssignError::UnknownObject {
                parent: m.label(self.interner).to_string(),
                kind: ObjectKind::Generic,
                name: name.to_string(),
            })
    }

    /// Sets a generic of the new module.
    pub fn set_generic(&mut self, name: &str, value: ConstValue) -> Result<(), AssignError> {
        let generic = self.generic_ref(self.module, name)?;
        self.design.set_generic_value(generic, value, self.interner)
    }

    /// Links a generic of the new module to a generic of the instantiator.
    pub fn link_generic(&mut self, name: &str, instantiator_generic: &str) -> Result<(), AssignError> {
        let from = self.generic_ref(self.module, name)?;
        let to = self.generic_ref(self.instantiator, instantiator_generic)?;
        self.design.link_generic(from, to, self.interner)
    }

    /// Current value of an instantiator generic.
    pub fn instantiator_generic_value(&self, name: &str) -> Option<ConstValue> {
        let generic = self.generic_ref(self.instantiator, name).ok()?;
        self.design.generic_value(generic)
    }

    /// Ties a port of the new module to a constant.
    pub fn set_port_fixed_value(&mut self, port: &str, value: &str) -> Result<(), AssignError> {
        let module = self.design.module_mut(self.module);
        let Some(id) = module.port_by_code_name(port, self.interner) else {
            return Err(AssignError::UnknownObject {
                parent: module.label(self.interner).to_string(),
                kind: ObjectKind::Port,
                name: port.to_string(),
            });
        };
        module.set_port_fixed_value(id, value, self.interner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{Generic, GenericValue};

    #[derive(Debug)]
    struct RegisterBase;

    impl ModuleBehavior for RegisterBase {
        fn auto_inst_config(&self, ctx: &mut AutoInstContext<'_>) -> Result<(), AssignError> {
            ctx.link_generic("REG_COUNT", "C_SLAVE_REG_COUNT")?;
            ctx.set_generic("BASE", ConstValue::Int(0x40))
        }
    }

    #[test]
    fn hook_sets_and_links_generics() {
        let interner = Interner::new();
        let mut design = Design::new();
        let mut user = Module::new(interner.intern_lower("as_invert_0"), interner.intern_lower("as_invert"));
        user.add_generic(
            Generic::new(interner.intern_upper("C_SLAVE_REG_COUNT"), "integer", Some(ConstValue::Int(3))),
            &interner,
        )
        .unwrap();
        let mut regmgr = Module::new(
            interner.intern_lower("as_invert_0_as_regmgr"),
            interner.intern_lower("as_regmgr"),
        );
        let count = regmgr
            .add_generic(Generic::new(interner.intern_upper("REG_COUNT"), "integer", None), &interner)
            .unwrap();
        let base = regmgr
            .add_generic(Generic::new(interner.intern_upper("BASE"), "integer", None), &interner)
            .unwrap();
        let user = design.add_module(user);
        let reg = design.add_module(regmgr);

        let mut ctx = AutoInstContext::new(&mut design, reg, user, &interner);
        RegisterBase.auto_inst_config(&mut ctx).unwrap();
        assert_eq!(ctx.instantiator_generic_value("c_slave_reg_count"), Some(ConstValue::Int(3)));
        assert!(ctx.set_generic("MISSING", ConstValue::Int(1)).is_err());

        assert_eq!(design.generic_value(GenericRef::new(reg, count)), Some(ConstValue::Int(3)));
        assert_eq!(
            design.generic(GenericRef::new(reg, base)).value,
            GenericValue::Literal(ConstValue::Int(0x40))
        );
    }
}
