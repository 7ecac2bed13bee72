//! Netlist construction: from a [`CircuitDesc`] to a linked chip arena.
//!
//! Construction runs in fixed phases:
//!
//! 1. the special chips (rails, de-optimizer, bridges),
//! 2. one chip per pin row of every instance in every scope, with rows of
//!    the same instance wired to each other,
//! 3. connection resolution per scope (see [`crate::resolve`]),
//! 4. dead-chip elimination to a fixed point,
//! 5. compaction into the arena, tie-off of undriven inputs to `_GND`,
//! 6. the fan-out check.
//!
//! Every anomaly is a diagnostic; a netlist is always produced.

use crate::arena::Arena;
use crate::chip::{Chip, ChipLink};
use crate::desc::{CircuitDesc, CustomData, PinRow, MAX_CUSTOM_INPUTS, MAX_TABLE_INPUTS};
use crate::diagnostics::{
    error_fanout_exceeded, error_row_too_wide, error_unconnected_input, note_removed_chip,
    warning_invalid_connection, warning_multiple_drivers, warning_unconnected_input,
};
use crate::ids::{ChipId, GND_ID};
use crate::resolve::{resolve_connection, ChipMap, Net, ProtoIndex, RowRef};
use crate::special::SPECIAL_CHIPS;
use dice_common::Interner;
use dice_config::{SimSettings, TieOffPolicy};
use dice_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Counters gathered while building a netlist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Chips created before elimination, special chips included.
    pub chips_created: usize,
    /// Chips removed by dead-chip elimination.
    pub chips_removed: usize,
    /// Chips in the final netlist.
    pub chips: usize,
    /// Links created from resolved connections and internal wiring.
    pub links: usize,
    /// Inputs tied to `_GND`.
    pub tied_off: usize,
    /// Connections that matched nothing.
    pub invalid_connections: usize,
    /// Inputs that received a second driver.
    pub duplicate_drivers: usize,
    /// Outputs over the fan-out ceiling.
    pub fanout_violations: usize,
}

/// The built chip graph.
#[derive(Debug)]
pub struct Netlist {
    /// All chips; [`crate::VCC_ID`] and [`GND_ID`] come first.
    pub chips: Arena<ChipId, Chip>,
    /// Qualified instance names of the chips.
    pub names: Interner,
    /// Construction counters.
    pub stats: BuildStats,
}

/// A chip before compaction into the arena.
struct ProtoChip {
    name: String,
    row: &'static PinRow,
    custom_data: Option<CustomData>,
    queue_capacity: usize,
    subcycle_resolution: u64,
    alive: bool,
}

impl ProtoChip {
    fn label(&self) -> String {
        format!("{}.{}", self.name, self.row.output)
    }
}

/// One-shot builder turning a description into a [`Netlist`].
pub struct NetlistBuilder<'a> {
    settings: &'a SimSettings,
    sink: &'a DiagnosticSink,
    protos: Vec<ProtoChip>,
    map: ChipMap,
    nets: Vec<Net>,
    driven: HashSet<(ProtoIndex, u8)>,
    stats: BuildStats,
}

impl<'a> NetlistBuilder<'a> {
    /// Creates an empty builder.
    pub fn new(settings: &'a SimSettings, sink: &'a DiagnosticSink) -> Self {
        Self {
            settings,
            sink,
            protos: Vec::new(),
            map: ChipMap::new(),
            nets: Vec::new(),
            driven: HashSet::new(),
            stats: BuildStats::default(),
        }
    }

    /// Builds the netlist for `desc`, reporting anomalies to `sink`.
    pub fn build(desc: &CircuitDesc, settings: &SimSettings, sink: &DiagnosticSink) -> Netlist {
        let mut builder = NetlistBuilder::new(settings, sink);
        builder.create_special_chips();

        let scopes = scopes(desc);
        for (prefix, scope) in &scopes {
            builder.create_chips(prefix, scope);
        }
        for (prefix, scope) in &scopes {
            builder.find_connections(prefix, scope);
        }

        builder.eliminate_dead_chips();
        builder.finish()
    }

    fn create_special_chips(&mut self) {
        for special in SPECIAL_CHIPS.iter() {
            for row in special.desc.rows {
                self.push_proto(
                    special.desc.name,
                    row,
                    None,
                    special.queue_capacity,
                    special.subcycle_resolution,
                );
            }
        }
    }

    fn push_proto(
        &mut self,
        name: &str,
        row: &'static PinRow,
        custom_data: Option<CustomData>,
        queue_capacity: usize,
        subcycle_resolution: u64,
    ) -> ProtoIndex {
        let proto = self.protos.len();
        self.protos.push(ProtoChip {
            name: name.to_string(),
            row,
            custom_data,
            queue_capacity,
            subcycle_resolution,
            alive: true,
        });
        self.map.insert(name, RowRef { proto, row });
        self.stats.chips_created += 1;
        proto
    }

    /// Creates the chips of one scope and wires rows within each instance.
    fn create_chips(&mut self, prefix: &str, desc: &CircuitDesc) {
        let settings = self.settings;
        let defaults = &settings.chip_defaults;
        for inst in desc.chips() {
            let name = format!("{prefix}{}", inst.name);
            let (queue_capacity, subcycle_resolution) =
                match desc.hints().iter().find(|h| h.chip == inst.name) {
                    Some(hint) => {
                        debug!(
                            chip = %name,
                            queue_capacity = hint.queue_capacity,
                            subcycle_resolution = hint.subcycle_resolution,
                            "applying optimization hint"
                        );
                        (hint.queue_capacity, hint.subcycle_resolution)
                    }
                    None => (defaults.queue_capacity, defaults.subcycle_resolution),
                };

            let first = self.protos.len();
            for row in inst.chip.rows {
                let max = if row.is_custom() {
                    MAX_CUSTOM_INPUTS
                } else {
                    MAX_TABLE_INPUTS
                };
                if row.inputs.len() > max {
                    let label = format!("{name}.{}", row.output);
                    self.emit(error_row_too_wide(&label, row.inputs.len(), max));
                    continue;
                }
                self.push_proto(
                    &name,
                    row,
                    inst.custom_data.clone(),
                    queue_capacity,
                    subcycle_resolution,
                );
            }

            let created = first..self.protos.len();
            for driver in created.clone() {
                let out = self.protos[driver].row.output;
                if out == 0 {
                    continue;
                }
                for sink in created.clone() {
                    if self.protos[sink].row.input_bit(out).is_some() {
                        self.add_net(
                            Net {
                                driver,
                                sink,
                                sink_pin: out,
                            },
                            &name,
                        );
                    }
                }
            }
        }
    }

    fn add_net(&mut self, net: Net, sink_name: &str) {
        if !self.driven.insert((net.sink, net.sink_pin)) {
            self.stats.duplicate_drivers += 1;
            self.emit(warning_multiple_drivers(sink_name, net.sink_pin));
        }
        self.nets.push(net);
    }

    /// Resolves the connections declared in one scope.
    fn find_connections(&mut self, prefix: &str, desc: &CircuitDesc) {
        for conn in desc.connections() {
            match resolve_connection(&self.map, prefix, conn, &self.driven) {
                Some(res) => {
                    for dup in &res.duplicates {
                        self.stats.duplicate_drivers += 1;
                        self.emit(warning_multiple_drivers(&dup.instance, dup.pin));
                    }
                    for net in res.nets {
                        self.driven.insert((net.sink, net.sink_pin));
                        self.nets.push(net);
                    }
                }
                None => {
                    self.stats.invalid_connections += 1;
                    self.emit(warning_invalid_connection(prefix, &conn.to_string()));
                }
            }
        }
    }

    /// Removes combinational chips whose output nothing reads, until none are left.
    ///
    /// Returns the number of chips removed by this call.
    fn eliminate_dead_chips(&mut self) -> usize {
        let mut removed = 0;
        loop {
            let drivers: HashSet<ProtoIndex> = self.nets.iter().map(|n| n.driver).collect();
            let dead: Vec<ProtoIndex> = self
                .protos
                .iter()
                .enumerate()
                .filter(|(i, p)| p.alive && !p.row.is_custom() && !drivers.contains(i))
                .map(|(i, _)| i)
                .collect();
            if dead.is_empty() {
                break;
            }

            for &i in &dead {
                self.protos[i].alive = false;
                let label = self.protos[i].label();
                debug!(chip = %label, "removing unused chip");
                self.sink.emit(note_removed_chip(&label));
            }
            removed += dead.len();

            let protos = &self.protos;
            self.nets.retain(|n| protos[n.sink].alive);
            self.driven.retain(|&(sink, _)| protos[sink].alive);
        }
        self.stats.chips_removed += removed;
        removed
    }

    /// Compacts the surviving chips into the arena, links them, ties off
    /// undriven inputs, and checks fan-out.
    fn finish(mut self) -> Netlist {
        let names = Interner::new();
        let mut chips: Arena<ChipId, Chip> = Arena::with_capacity(self.protos.len());
        let mut remap: Vec<Option<ChipId>> = vec![None; self.protos.len()];

        for (i, proto) in self.protos.iter().enumerate().filter(|(_, p)| p.alive) {
            let ident = names.get_or_intern(&proto.name);
            remap[i] = Some(chips.alloc(Chip::new(
                ident,
                proto.row,
                proto.custom_data.clone(),
                proto.queue_capacity,
                proto.subcycle_resolution,
            )));
        }

        for net in &self.nets {
            let (Some(driver), Some(sink)) = (remap[net.driver], remap[net.sink]) else {
                continue;
            };
            let Some(bit) = chips[sink].row.input_bit(net.sink_pin) else {
                continue;
            };
            chips[driver].output_links.push(ChipLink {
                target: sink,
                mask: 1 << bit,
            });
            chips[sink].input_links[bit].get_or_insert(driver);
            self.stats.links += 1;
        }

        self.tie_off(&mut chips, &names);
        self.check_fanout(&chips, &names);

        self.stats.chips = chips.len();
        info!(
            chips = self.stats.chips,
            removed = self.stats.chips_removed,
            links = self.stats.links,
            tied_off = self.stats.tied_off,
            "netlist built"
        );

        Netlist {
            chips,
            names,
            stats: self.stats,
        }
    }

    fn tie_off(&mut self, chips: &mut Arena<ChipId, Chip>, names: &Interner) {
        let policy = self.settings.builder.tie_off;
        for raw in 2..chips.len() as u32 {
            let id = ChipId::from_raw(raw);
            for bit in 0..chips[id].input_links.len() {
                if chips[id].input_links[bit].is_some() {
                    continue;
                }
                chips[GND_ID].output_links.push(ChipLink {
                    target: id,
                    mask: 1 << bit,
                });
                chips[id].input_links[bit] = Some(GND_ID);
                self.stats.tied_off += 1;

                let chip = &chips[id];
                if chip.row.is_custom() {
                    continue;
                }
                let label = format!("{}.{}", names.resolve(chip.instance), chip.row.inputs[bit]);
                match policy {
                    TieOffPolicy::Warn => self.emit(warning_unconnected_input(&label)),
                    TieOffPolicy::Error => self.emit(error_unconnected_input(&label)),
                    TieOffPolicy::Silent => {}
                }
            }
        }
    }

    fn check_fanout(&mut self, chips: &Arena<ChipId, Chip>, names: &Interner) {
        let settings = self.settings;
        let limit = settings.builder.fanout_limit;
        let exempt = &settings.builder.fanout_exempt;
        for chip in chips.values() {
            let name = names.resolve(chip.instance);
            if chip.output_links.len() <= limit || exempt.iter().any(|e| e == name) {
                continue;
            }
            self.stats.fanout_violations += 1;
            let label = format!("{name}.{}", chip.row.output);
            self.emit(error_fanout_exceeded(&label, chip.output_links.len(), limit));
        }
    }

    fn emit(&self, diag: Diagnostic) {
        let subject = diag.subject.as_deref().unwrap_or("");
        match diag.severity {
            Severity::Error => error!(code = %diag.code, subject, "{}", diag.message),
            Severity::Warning => warn!(code = %diag.code, subject, "{}", diag.message),
            Severity::Note | Severity::Help => {
                debug!(code = %diag.code, subject, "{}", diag.message)
            }
        }
        self.sink.emit(diag);
    }
}

/// The root description followed by every nested sub-circuit, depth first,
/// each with its accumulated name prefix.
fn scopes(desc: &CircuitDesc) -> Vec<(String, &CircuitDesc)> {
    let mut out = Vec::new();
    let mut stack = vec![(String::new(), desc)];
    while let Some((prefix, scope)) = stack.pop() {
        for sub in scope.sub_circuits().iter().rev() {
            stack.push((format!("{prefix}{}", sub.prefix), sub.desc.as_ref()));
        }
        out.push((prefix, scope));
    }
    out
}
