/*!

  Analyses of the driver/load structure of a netlist.

*/

use crate::circuit::InstanceType;
use crate::error::NetlistError;
use crate::netlist::{NetId, Netlist, PinRef};
#[cfg(feature = "graph")]
use crate::netlist::InstanceId;
#[cfg(feature = "graph")]
use petgraph::graph::{DiGraph, NodeIndex};

/// A common trait of analyses than can be performed on a netlist.
/// An analysis becomes stale when the netlist is modified.
pub trait Analysis<'a>
where
    Self: Sized + 'a,
{
    /// Construct the analysis to the current state of the netlist.
    fn build(netlist: &'a Netlist) -> Result<Self, NetlistError>;
}

/// A table that splits the pins of every net into drivers and loads
pub struct DriverTable<'a> {
    netlist: &'a Netlist,
    // Indexed by net
    drivers: Vec<Vec<PinRef>>,
    loads: Vec<Vec<PinRef>>,
}

impl<'a> DriverTable<'a> {
    /// Returns an iterator to the output pins on `net`
    pub fn drivers(&self, net: NetId) -> impl Iterator<Item = PinRef> + '_ {
        self.drivers[net.index()].iter().copied()
    }

    /// Returns an iterator to the input pins on `net`
    pub fn loads(&self, net: NetId) -> impl Iterator<Item = PinRef> + '_ {
        self.loads[net.index()].iter().copied()
    }

    /// Returns the drivers on `net` owned by an instance of `kind` in parallel group `group`
    pub fn matching_drivers(
        &self,
        net: NetId,
        kind: InstanceType,
        group: i32,
    ) -> impl Iterator<Item = PinRef> + '_ {
        self.drivers(net).filter(move |pin| {
            let owner = self.netlist.instance(pin.instance);
            owner.get_type() == kind && owner.get_parallel_group() == group
        })
    }

    /// Returns the drivers on `net` that a keeper has to fight against
    pub fn opposing_drivers(&self, net: NetId) -> impl Iterator<Item = PinRef> + '_ {
        self.drivers(net).filter(|pin| {
            self.netlist
                .instance(pin.instance)
                .get_type()
                .opposes_keepers()
        })
    }

    /// Returns `true` if `net` has more than one driver
    pub fn is_multiply_driven(&self, net: NetId) -> bool {
        self.drivers[net.index()].len() > 1
    }
}

impl<'a> Analysis<'a> for DriverTable<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, NetlistError> {
        let mut drivers = vec![Vec::new(); netlist.net_count()];
        let mut loads = vec![Vec::new(); netlist.net_count()];

        for (id, net) in netlist.nets() {
            for pin_ref in net.pins() {
                if netlist.pin(*pin_ref).is_output() {
                    drivers[id.index()].push(*pin_ref);
                } else {
                    loads[id.index()].push(*pin_ref);
                }
            }
        }

        Ok(DriverTable {
            netlist,
            drivers,
            loads,
        })
    }
}

/// A petgraph view of the netlist: one node per instance and one edge from every driver to every load sharing a net.
#[cfg(feature = "graph")]
pub struct LoadGraph<'a> {
    _netlist: &'a Netlist,
    graph: DiGraph<InstanceId, String>,
    nodes: Vec<NodeIndex>,
}

#[cfg(feature = "graph")]
impl LoadGraph<'_> {
    /// Return a reference to the graph constructed by this analysis
    pub fn get_graph(&self) -> &DiGraph<InstanceId, String> {
        &self.graph
    }

    /// Returns the graph node standing for `id`
    pub fn node(&self, id: InstanceId) -> NodeIndex {
        self.nodes[id.index()]
    }

    /// Returns the instances loading any output of `id`
    pub fn fan_out(&self, id: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        self.graph
            .neighbors_directed(self.node(id), petgraph::Direction::Outgoing)
            .map(|n| self.graph[n])
    }

    /// Returns `true` if some instance sits on a combinational loop
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }
}

#[cfg(feature = "graph")]
impl<'a> Analysis<'a> for LoadGraph<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, NetlistError> {
        let table = DriverTable::build(netlist)?;
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = netlist.instances().map(|(id, _)| graph.add_node(id)).collect();

        for (net_id, net) in netlist.nets() {
            for driver in table.drivers(net_id) {
                for load in table.loads(net_id) {
                    graph.add_edge(
                        nodes[driver.instance.index()],
                        nodes[load.instance.index()],
                        net.get_name().to_string(),
                    );
                }
            }
        }

        Ok(Self {
            _netlist: netlist,
            graph,
            nodes,
        })
    }
}
