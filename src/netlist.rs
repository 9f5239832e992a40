/*!

  API for the sizing netlist: nets, instances, and the design that owns them.

  Instances and nets live in arenas owned by [Netlist] and are addressed by
  [InstanceId] and [NetId]. Pins are owned by their instance and refer to their
  net by id, while nets refer back to their pins by [PinRef].

*/

use crate::{
    circuit::{InstanceType, Pin},
    error::NetlistError,
    graph::Analysis,
};
use std::collections::{HashMap, HashSet};

/// A stable index of an instance within its netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Returns the position of the instance in insertion order
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// A stable index of a net within its netlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(usize);

impl NetId {
    /// Returns the position of the net in creation order
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Addresses the `index`th pin of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    /// The instance owning the pin
    pub instance: InstanceId,
    /// The position of the pin in the instance's pin list
    pub index: usize,
}

/// A named electrical node and the pins attached to it
#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    /// Pins in the order they were attached
    pins: Vec<PinRef>,
}

impl Net {
    fn new(name: String) -> Self {
        Self {
            name,
            pins: Vec::new(),
        }
    }

    /// Returns the name of the net
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the pins attached to this net
    pub fn pins(&self) -> &[PinRef] {
        &self.pins
    }
}

/// One sizable element of the design: a gate, a keeper, or a wire load.
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    kind: InstanceType,
    /// Step-up target used when sizing a [InstanceType::LeGate]
    le_su: f64,
    /// Current drive strength
    le_x: f64,
    parallel_group: i32,
    mfactor: u32,
    pins: Vec<Pin>,
}

impl Instance {
    /// Creates a new instance with no parallel group and an mfactor of 1
    pub fn new(name: &str, kind: InstanceType, le_su: f64, le_x: f64, pins: Vec<Pin>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            le_su,
            le_x,
            parallel_group: 0,
            mfactor: 1,
            pins,
        }
    }

    /// Places the instance in a parallel group. Nonzero groups sum together as one driver.
    pub fn with_parallel_group(mut self, group: i32) -> Self {
        self.parallel_group = group;
        self
    }

    /// Sets the number of physical copies this instance stands for
    pub fn with_mfactor(mut self, mfactor: u32) -> Self {
        self.mfactor = mfactor;
        self
    }

    /// Returns the name of the instance
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of the instance
    pub fn get_type(&self) -> InstanceType {
        self.kind
    }

    /// Returns the step-up target of the instance
    pub fn get_step_up(&self) -> f64 {
        self.le_su
    }

    /// Returns the current drive strength
    pub fn get_size(&self) -> f64 {
        self.le_x
    }

    pub(crate) fn set_size(&mut self, le_x: f64) {
        self.le_x = le_x;
    }

    /// Returns the parallel group id
    pub fn get_parallel_group(&self) -> i32 {
        self.parallel_group
    }

    /// Returns the multiplicity factor
    pub fn get_mfactor(&self) -> u32 {
        self.mfactor
    }

    /// Returns the pins of the instance
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Returns the pin at position `index`
    pub fn get_pin(&self, index: usize) -> Option<&Pin> {
        self.pins.get(index)
    }

    /// Finds a pin by name
    pub fn find_pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.get_name() == name)
    }

    /// Returns an iterator to the output pins
    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.is_output())
    }

    /// Returns an iterator to the input pins
    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| !p.is_output())
    }

    /// Rejects attributes that would turn the sizing arithmetic non-finite
    fn check(&self) -> Result<(), NetlistError> {
        let invalid = |reason: String| NetlistError::InvalidInstance {
            name: self.name.clone(),
            reason,
        };
        if self.mfactor == 0 {
            return Err(invalid("mfactor must be at least 1".to_string()));
        }
        if !self.le_x.is_finite() || self.le_x < 0.0 {
            return Err(invalid(format!("size {} is not a finite non-negative value", self.le_x)));
        }
        if self.kind.is_sizeable() && !(self.le_su.is_finite() && self.le_su > 0.0) {
            return Err(invalid(format!("step-up {} must be positive", self.le_su)));
        }
        if let Some(pin) = self
            .pins
            .iter()
            .find(|p| !p.get_logical_effort().is_finite() || p.get_logical_effort() < 0.0)
        {
            return Err(invalid(format!(
                "pin {} has logical effort {}",
                pin.get_name(),
                pin.get_logical_effort()
            )));
        }
        Ok(())
    }

    /// Returns the single output pin, or `None` if there are zero or several
    pub fn get_single_output(&self) -> Option<&Pin> {
        let mut outputs = self.outputs();
        match (outputs.next(), outputs.next()) {
            (Some(pin), None) => Some(pin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} x={}", self.kind, self.name, self.le_x)?;
        if self.parallel_group != 0 {
            write!(f, " group={}", self.parallel_group)?;
        }
        if self.mfactor != 1 {
            write!(f, " m={}", self.mfactor)?;
        }
        Ok(())
    }
}

/// A flattened design: every instance and net, with the links between them
#[derive(Debug, Clone)]
pub struct Netlist {
    /// The name of the design
    name: String,
    /// Instances in insertion order
    instances: Vec<Instance>,
    instance_names: HashMap<String, InstanceId>,
    /// Nets in creation order
    nets: Vec<Net>,
    net_names: HashMap<String, NetId>,
}

impl Netlist {
    /// Creates a new, empty netlist with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            instances: Vec::new(),
            instance_names: HashMap::new(),
            nets: Vec::new(),
            net_names: HashMap::new(),
        }
    }

    /// Returns the name of the design
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Registers an instance built from its parts. See [Netlist::insert_instance].
    pub fn add_instance(
        &mut self,
        name: &str,
        kind: InstanceType,
        le_su: f64,
        le_x: f64,
        pins: Vec<Pin>,
    ) -> Result<InstanceId, NetlistError> {
        self.insert_instance(Instance::new(name, kind, le_su, le_x, pins))
    }

    /// Registers an instance and wires each of its pins into the net it names,
    /// creating nets as they are first referenced.
    ///
    /// Fails without touching the netlist when the name is already taken, or when
    /// the instance has a zero mfactor, a negative or non-finite size or pin effort,
    /// or (for sizeable kinds) a step-up that is not positive. Links carried by pins
    /// of an instance cloned from another netlist are replaced.
    pub fn insert_instance(&mut self, mut instance: Instance) -> Result<InstanceId, NetlistError> {
        if self.instance_names.contains_key(&instance.name) {
            log::error!("Instance '{}' already exists", instance.name);
            return Err(NetlistError::DuplicateInstance(instance.name));
        }
        if let Err(e) = instance.check() {
            log::error!("{e}");
            return Err(e);
        }

        let id = InstanceId(self.instances.len());
        for (index, pin) in instance.pins.iter_mut().enumerate() {
            let net = self.resolve_net(pin.get_net_name());
            pin.attach(id, net);
            self.nets[net.0].pins.push(PinRef {
                instance: id,
                index,
            });
        }

        self.instance_names.insert(instance.name.clone(), id);
        self.instances.push(instance);
        Ok(id)
    }

    /// Returns the net with this name, creating it if absent
    fn resolve_net(&mut self, name: &str) -> NetId {
        if let Some(id) = self.net_names.get(name) {
            return *id;
        }
        let id = NetId(self.nets.len());
        self.nets.push(Net::new(name.to_string()));
        self.net_names.insert(name.to_string(), id);
        id
    }

    /// Returns the instance at `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another netlist and is out of bounds.
    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.0]
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id.0]
    }

    /// Returns the net at `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another netlist and is out of bounds.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.0]
    }

    /// Returns the pin addressed by `pin`
    pub fn pin(&self, pin: PinRef) -> &Pin {
        &self.instances[pin.instance.0].pins[pin.index]
    }

    /// Looks up an instance by name
    pub fn find_instance(&self, name: &str) -> Option<InstanceId> {
        self.instance_names.get(name).copied()
    }

    /// Looks up a net by name
    pub fn find_net(&self, name: &str) -> Option<NetId> {
        self.net_names.get(name).copied()
    }

    /// Returns the current size of the named instance
    pub fn get_size(&self, name: &str) -> Result<f64, NetlistError> {
        self.find_instance(name)
            .map(|id| self.instance(id).get_size())
            .ok_or_else(|| NetlistError::UnknownInstance(name.to_string()))
    }

    /// Returns the number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if the netlist holds no instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns the number of nets
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns an iterator over the instances in insertion order
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstanceId(i), inst))
    }

    /// Returns an iterator over the instances of one kind
    pub fn instances_of(&self, kind: InstanceType) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances().filter(move |(_, inst)| inst.kind == kind)
    }

    /// Returns an iterator over the nets in creation order
    pub fn nets(&self) -> impl Iterator<Item = (NetId, &Net)> {
        self.nets.iter().enumerate().map(|(i, net)| (NetId(i), net))
    }

    /// Returns an iterator over the pins on `net`, alongside their owning instance
    pub fn net_pins(&self, net: NetId) -> iter::NetPinIterator<'_> {
        iter::NetPinIterator::new(self, net)
    }

    /// Constructs an analysis of the netlist.
    pub fn get_analysis<'a, A: Analysis<'a>>(&'a self) -> Result<A, NetlistError> {
        A::build(self)
    }

    /// Verifies that the pins and nets refer to each other consistently and that all sizes are valid.
    pub fn verify(&self) -> Result<(), NetlistError> {
        let mut seen = HashSet::new();
        for (net_id, net) in self.nets() {
            if net.pins.is_empty() {
                return Err(NetlistError::Inconsistent(format!(
                    "net {} has no pins",
                    net.name
                )));
            }
            for pin_ref in net.pins.iter() {
                let pin = self
                    .instances
                    .get(pin_ref.instance.0)
                    .and_then(|inst| inst.pins.get(pin_ref.index))
                    .ok_or_else(|| {
                        NetlistError::Inconsistent(format!(
                            "net {} refers to a missing pin",
                            net.name
                        ))
                    })?;
                if pin.get_net() != Some(net_id) || pin.get_net_name() != net.name {
                    return Err(NetlistError::Inconsistent(format!(
                        "pin {} on net {} names net {}",
                        pin.get_name(),
                        net.name,
                        pin.get_net_name()
                    )));
                }
                if !seen.insert(*pin_ref) {
                    return Err(NetlistError::Inconsistent(format!(
                        "pin {} appears twice",
                        pin.get_name()
                    )));
                }
            }
        }

        for (id, inst) in self.instances() {
            if !inst.le_x.is_finite() || inst.le_x < 0.0 {
                return Err(NetlistError::Inconsistent(format!(
                    "instance {} has invalid size {}",
                    inst.name, inst.le_x
                )));
            }
            for (index, pin) in inst.pins.iter().enumerate() {
                if pin.get_instance() != Some(id) || !seen.contains(&PinRef { instance: id, index }) {
                    return Err(NetlistError::Inconsistent(format!(
                        "pin {} of {} is not on any net",
                        pin.get_name(),
                        inst.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Iterators over the netlist
pub mod iter {
    use super::{Instance, NetId, Netlist, Pin, PinRef};

    /// An iterator over the pins attached to one net
    pub struct NetPinIterator<'a> {
        netlist: &'a Netlist,
        pins: std::slice::Iter<'a, PinRef>,
    }

    impl<'a> NetPinIterator<'a> {
        /// Creates a new iterator over the pins on `net`
        pub fn new(netlist: &'a Netlist, net: NetId) -> Self {
            Self {
                netlist,
                pins: netlist.net(net).pins().iter(),
            }
        }
    }

    impl<'a> Iterator for NetPinIterator<'a> {
        type Item = (PinRef, &'a Instance, &'a Pin);

        fn next(&mut self) -> Option<Self::Item> {
            let pin_ref = *self.pins.next()?;
            let inst = self.netlist.instance(pin_ref.instance);
            Some((pin_ref, inst, &inst.pins[pin_ref.index]))
        }
    }
}

impl<'a> IntoIterator for &'a Netlist {
    type Item = &'a Net;
    type IntoIter = std::slice::Iter<'a, Net>;

    fn into_iter(self) -> Self::IntoIter {
        self.nets.iter()
    }
}

impl std::fmt::Display for Netlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "design {} (", self.name)?;
        let indent = " ".repeat(2);
        for inst in self.instances.iter() {
            write!(f, "{indent}{inst}")?;
            for pin in inst.pins.iter() {
                write!(f, " .{}({})", pin.get_name(), pin.get_net_name())?;
            }
            writeln!(f)?;
        }
        writeln!(f, ");")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inverter(input: &str, output: &str) -> Vec<Pin> {
        vec![Pin::input("A", 1.0, input), Pin::output("Y", 1.0, output)]
    }

    #[test]
    fn nets_are_shared_by_name() {
        let mut netlist = Netlist::new("chain".to_string());
        let a = netlist
            .add_instance("inv_a", InstanceType::LeGate, 4.0, 1.0, inverter("in", "mid"))
            .unwrap();
        let b = netlist
            .add_instance("inv_b", InstanceType::LeGate, 4.0, 1.0, inverter("mid", "out"))
            .unwrap();
        assert_eq!(netlist.net_count(), 3);

        let mid = netlist.find_net("mid").unwrap();
        let pins: Vec<_> = netlist.net_pins(mid).map(|(r, _, _)| r).collect();
        assert_eq!(
            pins,
            vec![
                PinRef {
                    instance: a,
                    index: 1
                },
                PinRef {
                    instance: b,
                    index: 0
                }
            ]
        );
        assert_eq!(netlist.instance(b).pins()[0].get_net(), Some(mid));
        assert!(netlist.verify().is_ok());
    }

    #[test]
    fn duplicate_leaves_netlist_unchanged() {
        let mut netlist = Netlist::new("dup".to_string());
        netlist
            .add_instance("inv", InstanceType::LeGate, 4.0, 1.0, inverter("a", "b"))
            .unwrap();
        let res = netlist.add_instance("inv", InstanceType::LeGate, 4.0, 1.0, inverter("c", "d"));
        assert!(matches!(res, Err(NetlistError::DuplicateInstance(ref n)) if n == "inv"));
        assert_eq!(netlist.len(), 1);
        assert_eq!(netlist.net_count(), 2);
        assert!(netlist.find_net("c").is_none());
    }

    #[test]
    fn single_output() {
        let two_outputs = Instance::new(
            "fa",
            InstanceType::LeGate,
            4.0,
            1.0,
            vec![
                Pin::input("A", 1.0, "a"),
                Pin::output("S", 1.0, "s"),
                Pin::output("C", 1.0, "c"),
            ],
        );
        assert!(two_outputs.get_single_output().is_none());
        assert_eq!(two_outputs.outputs().count(), 2);

        let load = Instance::new("cap", InstanceType::Load, 0.0, 3.0, vec![Pin::input("C", 1.0, "a")]);
        assert!(load.get_single_output().is_none());
    }

    #[test]
    fn negative_size_fails_verify() {
        let mut netlist = Netlist::new("neg".to_string());
        let id = netlist
            .add_instance("cap", InstanceType::Load, 0.0, 1.0, vec![Pin::input("C", 1.0, "a")])
            .unwrap();
        assert!(netlist.verify().is_ok());
        netlist.instance_mut(id).set_size(-1.0);
        assert!(matches!(netlist.verify(), Err(NetlistError::Inconsistent(_))));
        netlist.instance_mut(id).set_size(f64::NAN);
        assert!(matches!(netlist.verify(), Err(NetlistError::Inconsistent(_))));
    }

    #[test]
    fn rejects_unusable_instances() {
        let mut netlist = Netlist::new("bad".to_string());
        let bad = [
            Instance::new("m0", InstanceType::LeGate, 4.0, 1.0, inverter("a", "b")).with_mfactor(0),
            Instance::new("su0", InstanceType::LeGate, 0.0, 1.0, inverter("a", "b")),
            Instance::new("su_nan", InstanceType::LeKeeper, f64::NAN, 1.0, inverter("a", "b")),
            Instance::new("neg", InstanceType::Load, 0.0, -1.0, vec![Pin::input("C", 1.0, "a")]),
            Instance::new("inf", InstanceType::StaticGate, 4.0, f64::INFINITY, inverter("a", "b")),
            Instance::new("le", InstanceType::Load, 0.0, 1.0, vec![Pin::input("C", -2.0, "a")]),
        ];
        for instance in bad {
            let res = netlist.insert_instance(instance);
            assert!(matches!(res, Err(NetlistError::InvalidInstance { .. })), "{res:?}");
        }
        assert!(netlist.is_empty());
        assert_eq!(netlist.net_count(), 0);

        // Loads and static gates are never sized, so their step-up is unused
        assert!(
            netlist
                .add_instance("cap", InstanceType::Load, 0.0, 0.0, vec![Pin::input("C", 1.0, "a")])
                .is_ok()
        );
    }

    #[test]
    fn cloned_instance_is_relinked() {
        let mut a = Netlist::new("a".to_string());
        a.add_instance("pad", InstanceType::Load, 0.0, 3.0, vec![Pin::input("C", 1.0, "x")])
            .unwrap();
        let inv = a
            .add_instance("inv", InstanceType::LeGate, 4.0, 1.0, inverter("y", "z"))
            .unwrap();

        let mut b = Netlist::new("b".to_string());
        let id = b.insert_instance(a.instance(inv).clone()).unwrap();
        assert_eq!(id.index(), 0);
        assert!(b.verify().is_ok());
        let inst = b.instance(id);
        for (index, pin) in inst.pins().iter().enumerate() {
            assert_eq!(pin.get_instance(), Some(id));
            let net = pin.get_net().unwrap();
            assert_eq!(b.net(net).get_name(), pin.get_net_name());
            assert_eq!(b.net(net).pins(), &[PinRef { instance: id, index }]);
        }
        assert!(a.verify().is_ok());
    }

    #[test]
    fn display_lists_instances() {
        let mut netlist = Netlist::new("one".to_string());
        netlist
            .insert_instance(
                Instance::new("inv", InstanceType::LeGate, 4.0, 1.5, inverter("a", "b"))
                    .with_mfactor(2),
            )
            .unwrap();
        assert_eq!(
            netlist.to_string(),
            "design one (\n  LEGATE inv x=1.5 m=2 .A(a) .Y(b)\n);\n"
        );
    }
}
