/*!

  A reference design for exercising the sizer end to end.

  Three inverters and a NAND form an enabled ring. The net driven by the last
  inverter carries a pull-up/pull-down keeper pair gated by the NAND output, and
  each inverter output carries a fixed wire load.

*/

use crate::circuit::{InstanceType, Pin};
use crate::error::NetlistError;
use crate::netlist::Netlist;

/// Names of the instances in [ring_oscillator], in insertion order
pub const RING_INSTANCES: [&str; 9] = [
    "inv1", "inv2", "inv3", "nand1", "pu", "pd", "cap1", "cap2", "cap3",
];

/// Builds the reference ring with every gate at unit size and the given step-up
pub fn ring_oscillator(step_up: f64) -> Result<Netlist, NetlistError> {
    let mut netlist = Netlist::new("ring".to_string());
    let inverter = |a: &str, y: &str| vec![Pin::input("A", 1.0, a), Pin::output("Y", 1.0, y)];

    netlist.add_instance("inv1", InstanceType::LeGate, step_up, 1.0, inverter("nodeA", "nodeB"))?;
    netlist.add_instance("inv2", InstanceType::LeGate, step_up, 1.0, inverter("nodeB", "nodeC"))?;
    netlist.add_instance("inv3", InstanceType::LeGate, step_up, 1.0, inverter("nodeC", "nodeD"))?;
    netlist.add_instance(
        "nand1",
        InstanceType::LeGate,
        step_up,
        1.0,
        vec![
            Pin::input("A", 4.0 / 3.0, "nodeD"),
            Pin::input("B", 4.0 / 3.0, "enable"),
            Pin::output("Y", 2.0, "nodeA"),
        ],
    )?;

    // Keeper pair on nodeD. Its pins use the pmos/nmos share of an inverter's effort.
    netlist.add_instance(
        "pu",
        InstanceType::LeKeeper,
        step_up,
        1.0,
        vec![Pin::input("G", 2.0 / 3.0, "nodeA"), Pin::output("D", 2.0 / 3.0, "nodeD")],
    )?;
    netlist.add_instance(
        "pd",
        InstanceType::LeKeeper,
        step_up,
        1.0,
        vec![Pin::input("G", 1.0 / 3.0, "nodeA"), Pin::output("D", 1.0 / 3.0, "nodeD")],
    )?;

    netlist.add_instance("cap1", InstanceType::Load, 0.0, 10.0, vec![Pin::input("C", 1.0, "nodeB")])?;
    netlist.add_instance("cap2", InstanceType::Load, 0.0, 20.0, vec![Pin::input("C", 1.0, "nodeC")])?;
    netlist.add_instance("cap3", InstanceType::Load, 0.0, 50.0, vec![Pin::input("C", 1.0, "nodeD")])?;

    Ok(netlist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_shape() {
        let netlist = ring_oscillator(4.0).unwrap();
        assert_eq!(netlist.len(), RING_INSTANCES.len());
        assert_eq!(netlist.net_count(), 5);
        let names: Vec<_> = netlist.sizes().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, RING_INSTANCES);
        assert!(netlist.verify().is_ok());
    }
}
