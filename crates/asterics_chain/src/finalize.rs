//! Finalization: widths, port rules and the deferred width comparison.

use asterics_model::{Action, Condition, Direction, ModuleId, PortKind, PortRef, WidthCompat};

use crate::chain::ProcessingChain;
use crate::error::{
    rule_report, warning_open_input, warning_unresolved_width, BuildError, ConnectionError,
};

impl<'a> ProcessingChain<'a> {
    /// Resolves every width against the values generics have now, applies
    /// the rules of ports that are still unconnected and compares the
    /// widths of every glued pair.
    ///
    /// All problems are recorded; the first one is returned.
    pub fn finalize(&mut self) -> Result<(), BuildError> {
        self.guard()?;
        let mut errors = Vec::new();
        self.resolve_widths(&mut errors);
        self.apply_rules(&mut errors);
        self.check_glue(&mut errors);
        // A repeated finalization reports each open port once.
        let reported = &mut self.reported;
        self.pending
            .retain(|d| d.severity.is_error() || reported.insert(d.message.clone()));
        self.flush_pending();

        let mut first = None;
        for err in errors {
            let err = self.fail(err);
            first.get_or_insert(err);
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn all_ports(&self) -> Vec<PortRef> {
        self.design
            .modules()
            .flat_map(|(m, module)| module.ports.ids().map(move |p| PortRef::new(m, p)))
            .collect()
    }

    fn resolve_widths(&mut self, errors: &mut Vec<BuildError>) {
        let session = self.session;
        let interner = &session.interner;
        let modules: Vec<ModuleId> = self.design.modules().map(|(id, _)| id).collect();
        for module in modules {
            let env = self.design.generic_env(module, interner);
            let ports: Vec<_> = self.design.module(module).ports.ids().collect();
            for port in ports {
                let port = PortRef::new(module, port);
                let subject = self.design.port_name(port, interner);
                match self.design.port(port).data_width.resolve(&env) {
                    Ok(width) => {
                        if !width.is_resolved() {
                            let names: Vec<String> = width.generic_names().into_iter().collect();
                            self.unresolved(subject, names, errors);
                        }
                        self.design.port_mut(port).resolved_width = Some(width);
                    }
                    Err(source) => errors.push(BuildError::Eval { subject, source }),
                }
            }

            let label = self.design.module(module).label(interner).to_string();
            let count = self.design.module(module).constants.len();
            for index in 0..count {
                let constant = &self.design.module(module).constants[index];
                let subject = format!("{label}.{}", interner.resolve(constant.name));
                match constant.data_width.resolve(&env) {
                    Ok(width) => {
                        if !width.is_resolved() {
                            let names: Vec<String> = width.generic_names().into_iter().collect();
                            self.unresolved(subject, names, errors);
                        }
                        self.design.module_mut(module).constants[index].data_width = width;
                    }
                    Err(source) => errors.push(BuildError::Eval { subject, source }),
                }
            }
        }
    }

    fn unresolved(&mut self, subject: String, names: Vec<String>, errors: &mut Vec<BuildError>) {
        if self.options.strict_widths {
            errors.push(BuildError::UnresolvedWidth { subject, names });
        } else {
            self.pending.push(warning_unresolved_width(&subject, &names));
        }
    }

    fn apply_rules(&mut self, errors: &mut Vec<BuildError>) {
        let session = self.session;
        let interner = &session.interner;
        for port in self.all_ports() {
            if self.design.port(port).is_connected() {
                continue;
            }
            let name = self.design.port_name(port, interner);
            let rules = self.design.port(port).rules.clone();
            for rule in &rules {
                if self.design.port(port).is_connected() {
                    break;
                }
                if !self.condition_holds(rule.condition, port) {
                    continue;
                }
                match &rule.action {
                    Action::Connect | Action::None => {}
                    Action::MakeExternal => self.design.port_mut(port).external = true,
                    Action::SetValue(value) => {
                        self.design.port_mut(port).fixed_value = Some(value.clone())
                    }
                    Action::Error => errors.push(
                        ConnectionError::RuleViolation {
                            port: name.clone(),
                            rule: rule.to_string(),
                        }
                        .into(),
                    ),
                    Action::Warning => self.pending.push(rule_report(&name, &rule.to_string(), true)),
                    Action::Note => self.pending.push(rule_report(&name, &rule.to_string(), false)),
                    Action::FallbackPort(sibling) => {
                        if let Some(driver) = self.fallback_driver(port, sibling) {
                            if let Err(e) = self.wire_ports(driver, port) {
                                errors.push(e);
                            }
                        }
                    }
                }
            }

            let p = self.design.port(port);
            if !p.is_connected()
                && p.direction == Direction::In
                && !p.optional
                && p.default_value.is_none()
            {
                self.pending.push(warning_open_input(&name));
            }
        }
    }

    /// Conditions of an unconnected port. `both_present` only applies while
    /// connecting.
    fn condition_holds(&self, condition: Condition, port: PortRef) -> bool {
        let p = self.design.port(port);
        match condition {
            Condition::BothPresent => false,
            Condition::AnyMissing | Condition::SinkMissing | Condition::ExternalPort => true,
            Condition::SourceMissing => p.direction.is_sink(),
            Condition::SinglePort => p.kind == PortKind::Single,
        }
    }

    /// Driver of the named sibling: first in the port's interface by slot
    /// name, then in the module by declared name.
    fn fallback_driver(&self, port: PortRef, sibling: &str) -> Option<PortRef> {
        let interner = &self.session.interner;
        let module = self.design.module(port.module);
        let in_interface = self.design.port(port).interface().and_then(|iface| {
            let slot = interner.get(sibling)?;
            module.interfaces[iface]
                .ports
                .iter()
                .copied()
                .find(|p| module.ports[*p].name == slot)
        });
        let sibling = in_interface.or_else(|| module.port_by_code_name(sibling, interner))?;
        if sibling == port.port {
            return None;
        }
        module.ports[sibling].incoming
    }

    fn check_glue(&mut self, errors: &mut Vec<BuildError>) {
        let glue_ids: Vec<_> = self.design.glue_signals().map(|(id, _)| id).collect();
        for id in glue_ids {
            let driver = self.design.glue(id).driver;
            let width = self.design.port(driver).resolved_width.clone();
            self.design.glue_mut(id).resolved_width = width.clone();
            let Some(width) = width else {
                continue;
            };
            for sink in self.design.glue(id).sinks.clone() {
                let Some(sink_width) = &self.design.port(sink).resolved_width else {
                    continue;
                };
                if width.compatibility(sink_width) == WidthCompat::Mismatch {
                    match self.width_mismatch(driver, sink) {
                        Ok(err) => errors.push(err.into()),
                        Err(err) => errors.push(err),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{E409, N403, W402};
    use crate::options::ChainOptions;
    use crate::test_support::*;
    use asterics_library::Session;
    use asterics_model::ConstValue;

    #[test]
    fn clock_and_reset_become_external() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.connect(cam, inv).unwrap();
        chain.finalize().unwrap();
        let clk = chain.port_ref(cam, "clk").unwrap();
        assert!(chain.design().port(clk).external);
        let data = chain.port_ref(inv, "data_in").unwrap();
        let width = chain.design().port(data).resolved_width.clone().unwrap();
        assert_eq!(width.bit_width(), Some(8));
        let glue = chain.design().port(data).glue.unwrap();
        assert!(chain.design().glue(glue).resolved_width.is_some());
    }

    #[test]
    fn open_mandatory_input_warns() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.finalize().unwrap();
        let diags = session.sink.diagnostics();
        assert!(diags
            .iter()
            .any(|d| d.code == W402 && d.subject.as_deref() == Some("inv.strobe_in")));
        assert!(diags.iter().any(|d| d.code == N403));
    }

    #[test]
    fn deferred_width_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.connect(cam, inv).unwrap();
        // Widths matched at connect time; the consumer changes afterwards.
        chain.set_generic(inv, "DIN_WIDTH", ConstValue::Int(10)).unwrap();
        let err = chain.finalize().unwrap_err();
        assert!(matches!(
            err,
            BuildError::Connection(ConnectionError::WidthMismatch {
                driver_width: 8,
                sink_width: 10,
                ..
            })
        ));
    }

    #[test]
    fn unresolved_width_strict_and_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        chain.add_module(UNSIZED, Some("u"), None).unwrap();
        let err = chain.finalize().unwrap_err();
        let BuildError::UnresolvedWidth { subject, names } = err else {
            panic!("expected unresolved width, got {err:?}");
        };
        assert_eq!(subject, "u.pixels");
        assert_eq!(names, vec!["LINE_WIDTH".to_string()]);

        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let options = ChainOptions {
            strict_widths: false,
            ..ChainOptions::default()
        };
        let mut chain = ProcessingChain::new(&library, &session, options);
        let u = chain.add_module(UNSIZED, Some("u"), None).unwrap();
        chain.finalize().unwrap();
        chain.set_generic(u, "LINE_WIDTH", ConstValue::Int(640)).unwrap();
        chain.finalize().unwrap();
        let pixels = chain.port_ref(u, "pixels").unwrap();
        let width = chain.design().port(pixels).resolved_width.clone().unwrap();
        assert_eq!(width.bit_width(), Some(640));
    }

    #[test]
    fn fallback_port_takes_sibling_driver() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let sink = chain.add_module(FRAME_SINK, Some("frame"), None).unwrap();
        chain.connect(cam, sink).unwrap();
        chain.finalize().unwrap();
        let vcomplete = chain.port_ref(sink, "vcomplete_in").unwrap();
        let vsync_out = chain.port_ref(cam, "vsync_out").unwrap();
        assert_eq!(chain.design().port(vcomplete).incoming, Some(vsync_out));
        let glue = chain.design().port(vsync_out).glue.unwrap();
        assert_eq!(chain.design().glue(glue).sinks.len(), 2);
    }

    #[test]
    fn error_rule_fails_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let strict = chain.add_module(STRICT, Some("strict"), None).unwrap();
        let err = chain.finalize().unwrap_err();
        assert!(matches!(
            err,
            BuildError::Connection(ConnectionError::RuleViolation { ref port, .. }) if port == "strict.mode"
        ));
        assert!(session.sink.diagnostics().iter().any(|d| d.code == E409));
        let level = chain.port_ref(strict, "level").unwrap();
        assert_eq!(chain.design().port(level).fixed_value.as_deref(), Some("'0'"));
    }
}
