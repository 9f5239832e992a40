/*!

  Leaf types of a sizing netlist: pin directions, instance kinds, and pins.

*/

use crate::netlist::{InstanceId, NetId};

/// The direction of a pin relative to the instance that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The pin loads its net
    Input,
    /// The pin drives its net
    Output,
}

impl Direction {
    /// Returns `true` if the pin drives its net
    pub fn is_output(&self) -> bool {
        matches!(self, Direction::Output)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// The kind of element an instance models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    /// A logical-effort gate, sized for equal gate delay
    LeGate,
    /// A gate with a fixed size. It loads and drives nets but is never resized.
    StaticGate,
    /// A wire capacitance model, not a real gate
    Load,
    /// A weak keeper sized against the other drivers on its net
    LeKeeper,
}

impl InstanceType {
    /// Returns `true` if the sizer computes a new size for this kind of instance
    pub fn is_sizeable(&self) -> bool {
        matches!(self, InstanceType::LeGate | InstanceType::LeKeeper)
    }

    /// Returns `true` if a keeper on the same net has to overpower this kind of driver
    pub fn opposes_keepers(&self) -> bool {
        matches!(self, InstanceType::LeGate | InstanceType::StaticGate)
    }

    /// All instance kinds, in declaration order
    pub fn all() -> [InstanceType; 4] {
        [
            InstanceType::LeGate,
            InstanceType::StaticGate,
            InstanceType::Load,
            InstanceType::LeKeeper,
        ]
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceType::LeGate => write!(f, "LEGATE"),
            InstanceType::StaticGate => write!(f, "STATICGATE"),
            InstanceType::Load => write!(f, "LOAD"),
            InstanceType::LeKeeper => write!(f, "LEKEEPER"),
        }
    }
}

/// One terminal of an instance.
///
/// A pin names the net it attaches to. The links to its net and owning instance are
/// filled in when the instance is inserted into a [Netlist](crate::netlist::Netlist), replacing
/// any links a cloned pin carried from another netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    name: String,
    direction: Direction,
    /// Ratio of this terminal's capacitance to that of a unit reference inverter
    logical_effort: f64,
    net_name: String,
    net: Option<NetId>,
    instance: Option<InstanceId>,
}

impl Pin {
    /// Creates a new unattached pin
    pub fn new(name: &str, direction: Direction, logical_effort: f64, net_name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction,
            logical_effort,
            net_name: net_name.to_string(),
            net: None,
            instance: None,
        }
    }

    /// Creates an input pin
    pub fn input(name: &str, logical_effort: f64, net_name: &str) -> Self {
        Self::new(name, Direction::Input, logical_effort, net_name)
    }

    /// Creates an output pin
    pub fn output(name: &str, logical_effort: f64, net_name: &str) -> Self {
        Self::new(name, Direction::Output, logical_effort, net_name)
    }

    /// Returns the name of the pin
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the direction of the pin
    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if the pin drives its net
    pub fn is_output(&self) -> bool {
        self.direction.is_output()
    }

    /// Returns the logical effort of the pin
    pub fn get_logical_effort(&self) -> f64 {
        self.logical_effort
    }

    /// Returns the name of the net this pin attaches to
    pub fn get_net_name(&self) -> &str {
        &self.net_name
    }

    /// Returns the net this pin is attached to, once the owning instance is inserted
    pub fn get_net(&self) -> Option<NetId> {
        self.net
    }

    /// Returns the instance owning this pin, once it is inserted
    pub fn get_instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// Links the pin to its net and owner, replacing any earlier links.
    /// Only the netlist insertion path calls this.
    pub(crate) fn attach(&mut self, instance: InstanceId, net: NetId) {
        self.instance = Some(instance);
        self.net = Some(net);
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}({}) le={}",
            self.direction, self.name, self.net_name, self.logical_effort
        )
    }
}
