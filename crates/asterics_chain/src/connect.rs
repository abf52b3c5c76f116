//! Matching and wiring.
//!
//! `connect(source, sink)` narrows both sides to candidate sets, picks the
//! single compatible pair and wires it port by port:
//!
//! - interface against interface: source `out` interfaces against sink `in`
//!   interfaces of the same type, both still unconnected;
//! - module against module without any interface pair: lone ports with the
//!   same declared name, a driving source and a driven sink, all wired as
//!   one candidate;
//! - a port against a module or interface: the counterpart with the same
//!   declared name, or the same template slot for interface ports.
//!
//! Zero pairs is [`ConnectionError::NoCandidate`], more than one is
//! [`ConnectionError::Ambiguous`].

use asterics_model::{
    Action, Condition, DataWidth, Direction, GenericRef, GenericValue, GlueSignal, InterfaceId,
    ModuleId, PortRef, WidthCompat,
};

use crate::chain::ProcessingChain;
use crate::endpoint::{Connection, Endpoint};
use crate::error::{note_width_propagated, BuildError, ConnectionError};

/// An endpoint with layers replaced by their boundary module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Module(ModuleId),
    Interface(ModuleId, InterfaceId),
    Port(PortRef),
}

impl Side {
    fn module(self) -> ModuleId {
        match self {
            Side::Module(m) | Side::Interface(m, _) => m,
            Side::Port(p) => p.module,
        }
    }
}

/// The chosen candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Plan {
    /// Source interface and sink interface.
    Interfaces((ModuleId, InterfaceId), (ModuleId, InterfaceId)),
    /// Explicit `(driver, sink)` pairs.
    Ports(Vec<(PortRef, PortRef)>),
}

impl<'a> ProcessingChain<'a> {
    /// Connects `source` to `sink`.
    ///
    /// On failure nothing is wired.
    pub fn connect(
        &mut self,
        source: impl Into<Endpoint>,
        sink: impl Into<Endpoint>,
    ) -> Result<&Connection, BuildError> {
        self.guard()?;
        let (source, sink) = (source.into(), sink.into());
        let snapshot = self.snapshot();
        match self.try_connect(&source, &sink) {
            Ok(wires) => {
                self.flush_pending();
                self.connections.push(Connection { source, sink, wires });
                let index = self.connections.len() - 1;
                Ok(&self.connections[index])
            }
            Err(e) => {
                self.restore(snapshot);
                Err(self.fail(e))
            }
        }
    }

    fn try_connect(
        &mut self,
        source: &Endpoint,
        sink: &Endpoint,
    ) -> Result<Vec<(PortRef, PortRef)>, BuildError> {
        let source = self.resolve_side(source, true)?;
        let sink = self.resolve_side(sink, false)?;
        match self.plan(source, sink, false)? {
            Some(plan) => self.execute(&plan),
            None => Err(self.no_candidate(source, sink).into()),
        }
    }

    fn resolve_side(&self, endpoint: &Endpoint, as_source: bool) -> Result<Side, ConnectionError> {
        let side = match endpoint {
            Endpoint::Module(m) => Side::Module(*m),
            Endpoint::Interface(m, i) => Side::Interface(*m, *i),
            Endpoint::Port(p) => Side::Port(*p),
            Endpoint::Layer(name) => {
                let layer = self.layers.iter().find(|l| &l.name == name).ok_or_else(|| {
                    ConnectionError::UnknownTarget {
                        kind: "layer",
                        name: name.clone(),
                    }
                })?;
                let member = if as_source {
                    layer.modules.last()
                } else {
                    layer.modules.first()
                };
                let module = member.ok_or_else(|| ConnectionError::EmptyLayer {
                    layer: name.clone(),
                })?;
                Side::Module(*module)
            }
        };
        let module = self.existing_module(side.module())?;
        let missing = match side {
            Side::Module(_) => None,
            Side::Interface(_, i) => (module.interfaces.try_get(i).is_none())
                .then(|| ("interface", i.as_raw())),
            Side::Port(p) => (module.ports.try_get(p.port).is_none()).then(|| ("port", p.port.as_raw())),
        };
        if let Some((kind, raw)) = missing {
            return Err(ConnectionError::UnknownTarget {
                kind,
                name: format!("{}.#{raw}", module.label(&self.session.interner)),
            });
        }
        Ok(side)
    }

    pub(crate) fn side_label(&self, side: Side) -> String {
        let interner = &self.session.interner;
        match side {
            Side::Module(m) => self.design.module(m).label(interner).to_string(),
            Side::Interface(m, i) => {
                let module = self.design.module(m);
                format!("{}.{}", module.label(interner), module.interfaces[i].unique_name)
            }
            Side::Port(p) => self.design.port_name(p, interner),
        }
    }

    fn no_candidate(&self, source: Side, sink: Side) -> ConnectionError {
        ConnectionError::NoCandidate {
            driver: self.side_label(source),
            sink: self.side_label(sink),
        }
    }

    /// Picks the candidate for `source -> sink`.
    ///
    /// With `allow_empty`, finding nothing is `Ok(None)` rather than an
    /// error; auto-instantiation wires only what fits.
    pub(crate) fn plan(
        &self,
        source: Side,
        sink: Side,
        allow_empty: bool,
    ) -> Result<Option<Plan>, ConnectionError> {
        let plan = match (source, sink) {
            (Side::Port(p), Side::Port(q)) => Some(Plan::Ports(vec![(p, q)])),
            (Side::Port(p), other) => self
                .counterpart(p, other, false)?
                .map(|q| Plan::Ports(vec![(p, q)])),
            (other, Side::Port(q)) => self
                .counterpart(q, other, true)?
                .map(|p| Plan::Ports(vec![(p, q)])),
            (source, sink) => self.interface_plan(source, sink)?,
        };
        match plan {
            Some(plan) => Ok(Some(plan)),
            None if allow_empty => Ok(None),
            None => Err(self.no_candidate(source, sink)),
        }
    }

    /// The port on `side` matching `port` by name, looking for drivers when
    /// `want_driver` is set and for sinks otherwise.
    fn counterpart(
        &self,
        port: PortRef,
        side: Side,
        want_driver: bool,
    ) -> Result<Option<PortRef>, ConnectionError> {
        let module_id = side.module();
        let module = self.design.module(module_id);
        let given = self.design.port(port);
        let pool: Vec<_> = match side {
            Side::Interface(_, i) => module.interfaces[i].ports.clone(),
            _ => module.ports.ids().collect(),
        };
        let found: Vec<PortRef> = pool
            .into_iter()
            .filter(|id| {
                let p = &module.ports[*id];
                let same_name = p.code_name == given.code_name
                    || (p.interface().is_some() && given.interface().is_some() && p.name == given.name);
                let usable = if want_driver {
                    p.direction.is_driver()
                } else {
                    p.direction.is_sink()
                };
                same_name && usable
            })
            .map(|id| PortRef::new(module_id, id))
            .collect();
        match found.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(*one)),
            many => Err(ConnectionError::Ambiguous {
                driver: self.design.port_name(port, &self.session.interner),
                sink: self.side_label(side),
                candidates: many
                    .iter()
                    .map(|p| self.design.port_name(*p, &self.session.interner))
                    .collect(),
            }),
        }
    }

    fn interface_candidates(
        &self,
        side: Side,
        direction: Direction,
    ) -> Result<Vec<(ModuleId, InterfaceId)>, ConnectionError> {
        match side {
            Side::Interface(m, i) => {
                let interface = &self.design.module(m).interfaces[i];
                let label = self.side_label(side);
                if interface.connected {
                    return Err(ConnectionError::AlreadyConnected { port: label });
                }
                if interface.direction != direction {
                    return Err(ConnectionError::DirectionMismatch {
                        driver: label.clone(),
                        sink: label,
                        detail: format!(
                            "interface is '{}', expected '{direction}'",
                            interface.direction
                        ),
                    });
                }
                Ok(vec![(m, i)])
            }
            Side::Module(m) => {
                let module = self.design.module(m);
                Ok(module
                    .interfaces_in_direction(direction)
                    .filter(|i| !module.interfaces[*i].connected)
                    .map(|i| (m, i))
                    .collect())
            }
            Side::Port(_) => Ok(Vec::new()),
        }
    }

    fn interface_plan(&self, source: Side, sink: Side) -> Result<Option<Plan>, ConnectionError> {
        let sources = self.interface_candidates(source, Direction::Out)?;
        let sinks = self.interface_candidates(sink, Direction::In)?;
        let mut pairs = Vec::new();
        for s in &sources {
            for k in &sinks {
                let s_type = &self.design.module(s.0).interfaces[s.1].type_name;
                let k_type = &self.design.module(k.0).interfaces[k.1].type_name;
                if s_type == k_type && s.0 != k.0 {
                    pairs.push((*s, *k));
                }
            }
        }
        match pairs.as_slice() {
            [(s, k)] => return Ok(Some(Plan::Interfaces(*s, *k))),
            [] => {}
            many => {
                return Err(ConnectionError::Ambiguous {
                    driver: self.side_label(source),
                    sink: self.side_label(sink),
                    candidates: many
                        .iter()
                        .map(|(s, k)| {
                            format!(
                                "{} -> {}",
                                self.side_label(Side::Interface(s.0, s.1)),
                                self.side_label(Side::Interface(k.0, k.1))
                            )
                        })
                        .collect(),
                })
            }
        }
        let (Side::Module(src), Side::Module(snk)) = (source, sink) else {
            return Ok(None);
        };
        let source_module = self.design.module(src);
        let sink_module = self.design.module(snk);
        let mut wires = Vec::new();
        for p in source_module.lone_ports() {
            let driver = &source_module.ports[p];
            if !driver.direction.is_driver() {
                continue;
            }
            for q in sink_module.lone_ports() {
                let port = &sink_module.ports[q];
                if port.code_name == driver.code_name
                    && port.direction.is_sink()
                    && port.data_type.eq_ignore_ascii_case(&driver.data_type)
                    && port.incoming.is_none()
                    && port.fixed_value.is_none()
                {
                    wires.push((PortRef::new(src, p), PortRef::new(snk, q)));
                }
            }
        }
        Ok((!wires.is_empty()).then_some(Plan::Ports(wires)))
    }

    /// Wires a plan and returns the `(driver, sink)` pairs.
    pub(crate) fn execute(&mut self, plan: &Plan) -> Result<Vec<(PortRef, PortRef)>, BuildError> {
        match plan {
            Plan::Ports(pairs) => {
                for (driver, sink) in pairs {
                    self.wire_ports(*driver, *sink)?;
                }
                Ok(pairs.clone())
            }
            Plan::Interfaces(source, sink) => self.wire_interfaces(*source, *sink),
        }
    }

    fn wire_interfaces(
        &mut self,
        (src, src_iface): (ModuleId, InterfaceId),
        (snk, snk_iface): (ModuleId, InterfaceId),
    ) -> Result<Vec<(PortRef, PortRef)>, BuildError> {
        let session = self.session;
        let interner = &session.interner;
        let mut pairs = Vec::new();
        {
            let source_module = self.design.module(src);
            let sink_module = self.design.module(snk);
            for &sp in &source_module.interfaces[src_iface].ports {
                let source_port = &source_module.ports[sp];
                let Some(&kp) = sink_module.interfaces[snk_iface]
                    .ports
                    .iter()
                    .find(|k| sink_module.ports[**k].name == source_port.name)
                else {
                    continue;
                };
                let sink_port = &sink_module.ports[kp];
                let both_present = source_port
                    .rules
                    .iter()
                    .chain(&sink_port.rules)
                    .filter(|r| r.condition == Condition::BothPresent);
                let mut skip = false;
                for rule in both_present {
                    match rule.action {
                        Action::Error => {
                            return Err(ConnectionError::RuleViolation {
                                port: self.design.port_name(PortRef::new(snk, kp), interner),
                                rule: rule.to_string(),
                            }
                            .into())
                        }
                        Action::None => skip = true,
                        _ => {}
                    }
                }
                if skip {
                    continue;
                }
                let (sp, kp) = (PortRef::new(src, sp), PortRef::new(snk, kp));
                if source_port.direction.is_driver() && sink_port.direction.is_sink() {
                    pairs.push((sp, kp));
                } else if sink_port.direction.is_driver() && source_port.direction.is_sink() {
                    pairs.push((kp, sp));
                } else {
                    return Err(ConnectionError::DirectionMismatch {
                        driver: self.design.port_name(sp, interner),
                        sink: self.design.port_name(kp, interner),
                        detail: format!(
                            "both ports are '{}'",
                            source_port.direction
                        ),
                    }
                    .into());
                }
            }
        }
        for (driver, sink) in &pairs {
            self.wire_ports(*driver, *sink)?;
        }
        self.design.module_mut(src).interfaces[src_iface].connected = true;
        self.design.module_mut(snk).interfaces[snk_iface].connected = true;
        Ok(pairs)
    }

    /// Wires one driver to one sink through the driver's glue signal.
    pub(crate) fn wire_ports(&mut self, driver: PortRef, sink: PortRef) -> Result<(), BuildError> {
        let session = self.session;
        let interner = &session.interner;
        let d = self.design.port(driver);
        let s = self.design.port(sink);
        let driver_name = self.design.port_name(driver, interner);
        let sink_name = self.design.port_name(sink, interner);
        if driver == sink {
            return Err(ConnectionError::DirectionMismatch {
                driver: driver_name,
                sink: sink_name,
                detail: "a port cannot drive itself".into(),
            }
            .into());
        }
        if s.incoming.is_some() || s.fixed_value.is_some() || s.external {
            return Err(ConnectionError::AlreadyConnected { port: sink_name }.into());
        }
        if !d.direction.is_driver() {
            let detail = format!("'{driver_name}' is an '{}' port", d.direction);
            return Err(ConnectionError::DirectionMismatch {
                driver: driver_name,
                sink: sink_name,
                detail,
            }
            .into());
        }
        if !s.direction.is_sink() {
            let detail = format!("'{sink_name}' is an '{}' port", s.direction);
            return Err(ConnectionError::DirectionMismatch {
                driver: driver_name,
                sink: sink_name,
                detail,
            }
            .into());
        }
        if !d.data_type.eq_ignore_ascii_case(&s.data_type) {
            return Err(ConnectionError::TypeMismatch {
                driver: driver_name,
                sink: sink_name,
                driver_type: d.data_type.clone(),
                sink_type: s.data_type.clone(),
            }
            .into());
        }
        self.check_widths(driver, sink)?;

        let glue = match self.design.port(driver).glue {
            Some(glue) => {
                self.design.glue_mut(glue).sinks.push(sink);
                glue
            }
            None => {
                let d = self.design.port(driver);
                let signal = GlueSignal {
                    name: self.glue_name(driver),
                    data_type: d.data_type.clone(),
                    data_width: d.data_width.clone(),
                    resolved_width: None,
                    driver,
                    sinks: vec![sink],
                };
                let glue = self.design.add_glue(signal);
                self.design.port_mut(driver).glue = Some(glue);
                glue
            }
        };
        self.design.port_mut(driver).outgoing.insert(sink);
        let s = self.design.port_mut(sink);
        s.incoming = Some(driver);
        s.glue = Some(glue);
        Ok(())
    }

    /// `{module}_{prefix}{code_name}`; the prefix is left out when the
    /// declared name already starts with it.
    fn glue_name(&self, driver: PortRef) -> String {
        let interner = &self.session.interner;
        let module = self.design.module(driver.module);
        let port = &module.ports[driver.port];
        let code_name = interner.resolve(port.code_name);
        let prefix = port
            .interface()
            .map(|i| module.interfaces[i].name_prefix.as_str())
            .filter(|prefix| !code_name.starts_with(prefix))
            .unwrap_or("");
        format!("{}_{prefix}{code_name}", module.label(interner))
    }

    pub(crate) fn resolved_width(&self, port: PortRef) -> Result<DataWidth, BuildError> {
        let interner = &self.session.interner;
        let env = self.design.generic_env(port.module, interner);
        self.design
            .port(port)
            .data_width
            .resolve(&env)
            .map_err(|source| BuildError::Eval {
                subject: self.design.port_name(port, interner),
                source,
            })
    }

    fn check_widths(&mut self, driver: PortRef, sink: PortRef) -> Result<(), BuildError> {
        let mut compat = self.width_compat(driver, sink)?;
        if compat != WidthCompat::Same
            && self.options.auto_propagate_generics
            && self.propagate_width(driver, sink)?
        {
            compat = self.width_compat(driver, sink)?;
        }
        match compat {
            WidthCompat::Mismatch => Err(self.width_mismatch(driver, sink)?.into()),
            // Compared again once finalization resolved both sides.
            WidthCompat::Same | WidthCompat::Unknown => Ok(()),
        }
    }

    fn width_compat(&self, driver: PortRef, sink: PortRef) -> Result<WidthCompat, BuildError> {
        Ok(self
            .resolved_width(driver)?
            .compatibility(&self.resolved_width(sink)?))
    }

    pub(crate) fn width_mismatch(
        &self,
        driver: PortRef,
        sink: PortRef,
    ) -> Result<ConnectionError, BuildError> {
        let interner = &self.session.interner;
        Ok(ConnectionError::WidthMismatch {
            driver: self.design.port_name(driver, interner),
            sink: self.design.port_name(sink, interner),
            driver_width: self.resolved_width(driver)?.bit_width().unwrap_or(0),
            sink_width: self.resolved_width(sink)?.bit_width().unwrap_or(0),
        })
    }

    /// The only generic of the port's module that its width references.
    fn single_width_generic(&self, port: PortRef) -> Option<GenericRef> {
        let interner = &self.session.interner;
        let module = self.design.module(port.module);
        let names = module.ports[port.port].data_width.generic_names();
        let mut names = names.iter();
        match (names.next(), names.next()) {
            (Some(name), None) => module
                .generic_by_name(name, interner)
                .map(|g| GenericRef::new(port.module, g)),
            _ => None,
        }
    }

    /// Links the sink's width generic to the driver's. Only generics still
    /// at their default are linked.
    fn propagate_width(&mut self, driver: PortRef, sink: PortRef) -> Result<bool, BuildError> {
        let (Some(from), Some(to)) = (self.single_width_generic(sink), self.single_width_generic(driver)) else {
            return Ok(false);
        };
        if self.design.generic(from).value != GenericValue::Unset
            || self.design.link_target(from) == self.design.link_target(to)
        {
            return Ok(false);
        }
        let session = self.session;
        self.design.link_generic(from, to, &session.interner)?;
        self.pending.push(note_width_propagated(
            &self.design.generic_name(from, &session.interner),
            &self.design.generic_name(to, &session.interner),
        ));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ChainOptions;
    use crate::test_support::*;
    use asterics_library::Session;
    use asterics_model::ConstValue;

    #[test]
    fn module_to_module_wires_stream() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        let wires = chain.connect(cam, inv).unwrap().wires.clone();
        // strobe, data and stall (driven by the consumer).
        assert_eq!(wires.len(), 3);
        assert_eq!(chain.connections().len(), 1);
        let strobe = chain.port_ref(inv, "strobe_in").unwrap();
        let driver = chain.design().port(strobe).incoming.unwrap();
        assert_eq!(chain.design().port_name(driver, &session.interner), "cam.strobe_out");
        let stall = chain.port_ref(cam, "stall_in").unwrap();
        let stall_driver = chain.design().port(stall).incoming.unwrap();
        assert_eq!(stall_driver.module, inv);
        let glue = chain.design().port(strobe).glue.unwrap();
        assert_eq!(chain.design().glue(glue).name, "cam_strobe_out");
        let iface = chain.module(cam).interface_by_name("out").unwrap();
        assert!(chain.module(cam).interfaces[iface].connected);
    }

    #[test]
    fn reconnecting_fails_and_leaves_design_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let cam2 = chain.add_module(PRODUCER, Some("cam2"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.connect(cam, inv).unwrap();
        let glue_before = chain.design().glue_count();

        let strobe_out = chain.port(cam2, "strobe_out").unwrap();
        let strobe_in = chain.port(inv, "strobe_in").unwrap();
        let err = chain.connect(strobe_out, strobe_in).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Connection(ConnectionError::AlreadyConnected { ref port }) if port == "inv.strobe_in"
        ));
        let iface = chain.interface(inv, "in").unwrap();
        assert!(matches!(
            chain.connect(cam2, iface),
            Err(BuildError::Connection(ConnectionError::AlreadyConnected { .. }))
        ));
        assert_eq!(chain.design().glue_count(), glue_before);
        assert_eq!(chain.connections().len(), 1);
    }

    #[test]
    fn out_to_out_fails() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let a = chain.add_module(PRODUCER, None, None).unwrap();
        let b = chain.add_module(PRODUCER, None, None).unwrap();
        let a_out = chain.port(a, "strobe_out").unwrap();
        let b_out = chain.port(b, "strobe_out").unwrap();
        assert!(matches!(
            chain.connect(a_out, b_out),
            Err(BuildError::Connection(ConnectionError::DirectionMismatch { .. }))
        ));
        assert!(matches!(
            chain.connect(a, b),
            Err(BuildError::Connection(ConnectionError::NoCandidate { .. }))
        ));
        assert_eq!(chain.design().glue_count(), 0);
    }

    #[test]
    fn ambiguous_until_qualified() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let mix = chain.add_module(MERGER, Some("mix"), None).unwrap();
        let err = chain.connect(cam, mix).unwrap_err();
        let BuildError::Connection(ConnectionError::Ambiguous { candidates, .. }) = err else {
            panic!("expected ambiguity, got {err:?}");
        };
        assert_eq!(candidates.len(), 2);
        assert_eq!(chain.design().glue_count(), 0);

        let left = chain.interface(mix, "left").unwrap();
        chain.connect(cam, left).unwrap();
        let cam2 = chain.add_module(PRODUCER, Some("cam2"), None).unwrap();
        // Only `right` is still open.
        chain.connect(cam2, mix).unwrap();
        assert_eq!(chain.connections().len(), 2);
    }

    #[test]
    fn width_mismatch_propagates_generic() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.set_generic(cam, "DOUT_WIDTH", ConstValue::Int(12)).unwrap();
        chain.connect(cam, inv).unwrap();
        assert_eq!(chain.generic_value(inv, "DIN_WIDTH"), Some(ConstValue::Int(12)));
        let notes = session.sink.diagnostics();
        assert!(notes.iter().any(|d| d.code == crate::error::N401));
    }

    #[test]
    fn width_mismatch_without_propagation() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let options = ChainOptions {
            auto_propagate_generics: false,
            ..ChainOptions::default()
        };
        let mut chain = ProcessingChain::new(&library, &session, options);
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.set_generic(cam, "DOUT_WIDTH", ConstValue::Int(12)).unwrap();
        let err = chain.connect(cam, inv).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Connection(ConnectionError::WidthMismatch {
                driver_width: 12,
                sink_width: 8,
                ..
            })
        ));
        assert_eq!(chain.design().glue_count(), 0);
    }

    #[test]
    fn lone_ports_match_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let counter = chain.add_module(COUNTER, None, None).unwrap();
        let acc = chain.add_module(ACCUMULATOR, None, None).unwrap();
        let count_in = chain.port_ref(acc, "count").unwrap();
        let wires = chain.connect(counter, acc).unwrap().wires.clone();
        assert_eq!(wires, vec![(chain.port_ref(counter, "count").unwrap(), count_in)]);
        assert_eq!(chain.design().glue_count(), 1);

        let wires = chain.connect(acc, counter).unwrap().wires.clone();
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].0, chain.port_ref(acc, "enable").unwrap());
        assert!(matches!(
            chain.connect(counter, acc),
            Err(BuildError::Connection(ConnectionError::NoCandidate { .. }))
        ));
    }

    #[test]
    fn layers_use_boundary_modules() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        chain.add_layer("input").unwrap();
        chain.add_layer("filters").unwrap();
        chain.add_to_layer("input", cam).unwrap();
        chain.add_to_layer("filters", inv).unwrap();
        chain.add_layer("empty").unwrap();
        assert!(matches!(
            chain.connect(Endpoint::Layer("input".into()), Endpoint::Layer("empty".into())),
            Err(BuildError::Connection(ConnectionError::EmptyLayer { .. }))
        ));
        chain
            .connect(Endpoint::Layer("input".into()), Endpoint::Layer("filters".into()))
            .unwrap();
        assert_eq!(chain.connections().len(), 1);
    }

    #[test]
    fn port_to_module_finds_counterpart() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        let strobe_out = chain.port_ref(cam, "strobe_out").unwrap();
        let strobe_in = chain.port_ref(inv, "strobe_in").unwrap();
        let conn = chain.connect(strobe_out, inv).unwrap();
        assert_eq!(conn.wires, vec![(strobe_out, strobe_in)]);
    }

    #[test]
    fn type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let library = fixture_library(&session, dir.path());
        let mut chain = ProcessingChain::new(&library, &session, ChainOptions::default());
        let cam = chain.add_module(PRODUCER, Some("cam"), None).unwrap();
        let inv = chain.add_module(CONSUMER, Some("inv"), None).unwrap();
        let data = chain.port(cam, "data_out").unwrap();
        let strobe = chain.port(inv, "strobe_in").unwrap();
        assert!(matches!(
            chain.connect(data, strobe),
            Err(BuildError::Connection(ConnectionError::TypeMismatch { .. }))
        ));
    }
}
