use le_sizer::NetlistError;
use le_sizer::circuit::{Direction, InstanceType, Pin};
use le_sizer::netlist::{Instance, Netlist, PinRef};

fn nand2(a: &str, b: &str, y: &str) -> Vec<Pin> {
    vec![
        Pin::input("A", 4.0 / 3.0, a),
        Pin::input("B", 4.0 / 3.0, b),
        Pin::output("Y", 2.0, y),
    ]
}

fn get_simple_example() -> Netlist {
    let mut netlist = Netlist::new("example".to_string());
    netlist
        .add_instance("nand_0", InstanceType::LeGate, 4.0, 1.0, nand2("a", "b", "y"))
        .unwrap();
    netlist
        .insert_instance(
            Instance::new("load_0", InstanceType::Load, 0.0, 12.0, vec![Pin::input("C", 1.0, "y")])
                .with_mfactor(2),
        )
        .unwrap();
    netlist
}

#[test]
fn test_lookup() {
    let netlist = get_simple_example();
    assert_eq!(netlist.get_name(), "example");
    assert_eq!(netlist.len(), 2);
    assert_eq!(netlist.net_count(), 3);

    let nand = netlist.find_instance("nand_0").unwrap();
    let inst = netlist.instance(nand);
    assert_eq!(inst.get_type(), InstanceType::LeGate);
    assert_eq!(inst.get_step_up(), 4.0);
    assert_eq!(inst.get_parallel_group(), 0);
    assert_eq!(inst.get_mfactor(), 1);
    assert_eq!(inst.inputs().count(), 2);
    assert_eq!(inst.get_single_output().unwrap().get_name(), "Y");
    assert_eq!(inst.get_pin(1).unwrap().get_name(), "B");
    assert!(inst.get_pin(3).is_none());
    let y = inst.find_pin("Y").unwrap();
    assert_eq!(y.get_direction(), Direction::Output);
    assert_eq!(y.get_logical_effort(), 2.0);
    assert_eq!(netlist.find_net("y"), y.get_net());
    assert!(inst.find_pin("C").is_none());

    let load = netlist.find_instance("load_0").unwrap();
    assert_eq!(netlist.instance(load).get_mfactor(), 2);
    assert_eq!(netlist.get_size("load_0").unwrap(), 12.0);
    assert!(matches!(
        netlist.get_size("nope"),
        Err(NetlistError::UnknownInstance(_))
    ));
}

#[test]
fn test_cross_links() {
    let netlist = get_simple_example();
    assert!(netlist.verify().is_ok());

    let y = netlist.find_net("y").unwrap();
    let on_y: Vec<_> = netlist
        .net_pins(y)
        .map(|(_, inst, pin)| (inst.get_name().to_string(), pin.get_direction()))
        .collect();
    assert_eq!(
        on_y,
        vec![
            ("nand_0".to_string(), Direction::Output),
            ("load_0".to_string(), Direction::Input)
        ]
    );

    // Every pin knows its net and owner
    for (id, inst) in netlist.instances() {
        for (index, pin) in inst.pins().iter().enumerate() {
            assert_eq!(pin.get_instance(), Some(id));
            let net = pin.get_net().unwrap();
            assert_eq!(netlist.net(net).get_name(), pin.get_net_name());
            assert!(netlist.net(net).pins().contains(&PinRef { instance: id, index }));
        }
    }
}

#[test]
fn test_duplicate_name() {
    let mut netlist = get_simple_example();
    let before = netlist.len();
    let res = netlist.add_instance("nand_0", InstanceType::LeGate, 4.0, 1.0, nand2("c", "d", "e"));
    assert!(matches!(res, Err(NetlistError::DuplicateInstance(_))));
    assert_eq!(netlist.len(), before);
    assert!(netlist.find_net("e").is_none());
    assert!(netlist.verify().is_ok());

    // A different name is accepted
    assert!(
        netlist
            .add_instance("nand_1", InstanceType::LeGate, 4.0, 1.0, nand2("c", "d", "e"))
            .is_ok()
    );
    assert_eq!(netlist.len(), before + 1);
}

#[test]
fn test_nets_iterate_in_creation_order() {
    let netlist = get_simple_example();
    let names: Vec<_> = netlist.into_iter().map(|n| n.get_name()).collect();
    assert_eq!(names, vec!["a", "b", "y"]);
    let of_type: Vec<_> = netlist
        .instances_of(InstanceType::Load)
        .map(|(_, i)| i.get_name())
        .collect();
    assert_eq!(of_type, vec!["load_0"]);
}
