use le_sizer::circuit::{InstanceType, Pin};
use le_sizer::netlist::Netlist;
use le_sizer::report::sizes_to_string;
use le_sizer::sizer::Sizer;

fn main() {
    let mut netlist = Netlist::new("simple".to_string());

    // An inverter driving a fixed load of 16 unit inverters
    netlist
        .add_instance(
            "inv",
            InstanceType::LeGate,
            4.0,
            1.0,
            vec![Pin::input("A", 1.0, "in"), Pin::output("Y", 1.0, "out")],
        )
        .unwrap();
    netlist
        .add_instance("wire", InstanceType::Load, 0.0, 16.0, vec![Pin::input("C", 1.0, "out")])
        .unwrap();

    // Converge to within 0.1%, with a diffusion ratio of 0.7 and keeper ratio of 0.1
    let ok = Sizer::new(&mut netlist).optimize(0.001, 30, 0.7, 0.1, || false);
    assert!(ok);

    print!("{}", sizes_to_string(&netlist));
}
