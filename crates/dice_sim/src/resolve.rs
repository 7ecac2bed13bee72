//! Hierarchical resolution of named connections into driver/sink nets.
//!
//! Everything here is a pure function over a [`ChipMap`]; the builder owns
//! the map, feeds it connections, and turns the returned findings into
//! diagnostics.

use crate::desc::{ConnectionDesc, PinRow};
use std::collections::{HashMap, HashSet};

/// Position of a chip in the builder's construction list, before dead chips are removed.
pub type ProtoIndex = usize;

/// One pin row of a named instance, as registered in the [`ChipMap`].
#[derive(Clone, Copy, Debug)]
pub struct RowRef {
    /// The chip created for this row.
    pub proto: ProtoIndex,
    /// The row itself.
    pub row: &'static PinRow,
}

/// Qualified instance name to its rows, in creation order.
#[derive(Debug, Default)]
pub struct ChipMap {
    rows: HashMap<String, Vec<RowRef>>,
}

impl ChipMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a row under a qualified instance name.
    pub fn insert(&mut self, name: &str, row: RowRef) {
        self.rows.entry(name.to_string()).or_default().push(row);
    }

    /// Rows of `name`, empty if the name is unknown.
    pub fn rows(&self, name: &str) -> &[RowRef] {
        self.rows.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if an instance with this qualified name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }
}

/// A resolved edge from a driving row to one input pin of a sink row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Net {
    /// The driving chip.
    pub driver: ProtoIndex,
    /// The driven chip.
    pub sink: ProtoIndex,
    /// The driven input pin.
    pub sink_pin: u8,
}

/// An input pin that received a second driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateDriver {
    /// Qualified name of the driven instance.
    pub instance: String,
    /// The input pin.
    pub pin: u8,
}

/// Result of resolving one connection.
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// Nets the connection produced.
    pub nets: Vec<Net>,
    /// Inputs among `nets` that were already driven.
    pub duplicates: Vec<DuplicateDriver>,
}

impl Resolution {
    /// Returns `true` if the connection produced at least one net.
    pub fn is_connected(&self) -> bool {
        !self.nets.is_empty()
    }
}

/// Tries to connect `name1.pin1` and `name2.pin2` as given, in both directions.
///
/// In each direction the first row of the driving instance whose output pin
/// matches is taken, and every row of the other instance declaring the
/// requested input pin becomes a sink. `driven` holds `(sink, pin)` pairs
/// that already have a driver.
pub fn find_connection(
    map: &ChipMap,
    name1: &str,
    name2: &str,
    conn: &ConnectionDesc,
    driven: &HashSet<(ProtoIndex, u8)>,
) -> Resolution {
    let mut res = Resolution::default();
    link_direction(map, name1, conn.pin1, name2, conn.pin2, driven, &mut res);
    link_direction(map, name2, conn.pin2, name1, conn.pin1, driven, &mut res);
    res
}

fn link_direction(
    map: &ChipMap,
    out_name: &str,
    out_pin: u8,
    in_name: &str,
    in_pin: u8,
    driven: &HashSet<(ProtoIndex, u8)>,
    res: &mut Resolution,
) {
    if out_pin == 0 {
        return;
    }
    let Some(driver) = map.rows(out_name).iter().find(|r| r.row.output == out_pin) else {
        return;
    };
    for sink in map.rows(in_name) {
        if sink.row.input_bit(in_pin).is_none() {
            continue;
        }
        let already = driven.contains(&(sink.proto, in_pin))
            || res
                .nets
                .iter()
                .any(|n| n.sink == sink.proto && n.sink_pin == in_pin);
        if already {
            res.duplicates.push(DuplicateDriver {
                instance: in_name.to_string(),
                pin: in_pin,
            });
        }
        res.nets.push(Net {
            driver: driver.proto,
            sink: sink.proto,
            sink_pin: in_pin,
        });
    }
}

/// Resolves a connection declared inside a circuit included under `prefix`.
///
/// Candidate name pairs are tried in order:
/// 1. both names prefixed,
/// 2. only `name1` prefixed,
/// 3. only `name2` prefixed,
/// 4. neither prefixed, when one of the names is the prefix itself (a
///    sub-circuit wiring to the instance it stands in for).
///
/// Returns `None` when no candidate resolves.
pub fn resolve_connection(
    map: &ChipMap,
    prefix: &str,
    conn: &ConnectionDesc,
    driven: &HashSet<(ProtoIndex, u8)>,
) -> Option<Resolution> {
    let p1 = format!("{prefix}{}", conn.name1);
    let p2 = format!("{prefix}{}", conn.name2);

    let mut candidates = vec![(p1.as_str(), p2.as_str())];
    if !prefix.is_empty() {
        candidates.push((p1.as_str(), conn.name2.as_str()));
        candidates.push((conn.name1.as_str(), p2.as_str()));
        if names_prefix(prefix, &conn.name1) || names_prefix(prefix, &conn.name2) {
            candidates.push((conn.name1.as_str(), conn.name2.as_str()));
        }
    }

    candidates
        .into_iter()
        .map(|(n1, n2)| find_connection(map, n1, n2, conn, driven))
        .find(Resolution::is_connected)
}

fn names_prefix(prefix: &str, name: &str) -> bool {
    name == prefix || name == prefix.trim_end_matches('.')
}
