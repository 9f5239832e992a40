/*!

  Size totals and the two-column size dump used for regression comparison.

*/

use crate::circuit::InstanceType;
use crate::config::SizerConfig;
use crate::error::NetlistError;
use crate::netlist::{Instance, Netlist};
use std::io::Write;

impl Netlist {
    /// Returns the sum of the sizes of all instances
    pub fn total_size(&self) -> f64 {
        self.instances().map(|(_, inst)| inst.get_size()).sum()
    }

    /// Returns an iterator of `(name, size)` pairs in insertion order
    pub fn sizes(&self) -> impl Iterator<Item = (&str, f64)> {
        self.instances()
            .map(|(_, inst)| (inst.get_name(), inst.get_size()))
    }
}

/// Writes one `<name> <size>` line per instance
pub fn write_sizes(netlist: &Netlist, mut writer: impl Write) -> Result<(), NetlistError> {
    for (name, size) in netlist.sizes() {
        writeln!(writer, "{name} {size}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the size dump to the file at `path`, replacing it
pub fn dump_sizes(netlist: &Netlist, path: impl AsRef<std::path::Path>) -> Result<(), NetlistError> {
    let file = std::fs::File::create(path.as_ref())?;
    write_sizes(netlist, std::io::BufWriter::new(file))?;
    log::info!("Wrote sizes of {} to {}", netlist.get_name(), path.as_ref().display());
    Ok(())
}

/// Returns the size dump as a string
pub fn sizes_to_string(netlist: &Netlist) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_sizes(netlist, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Summary figures for a sized netlist
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Sum of the sizes of all instances
    pub total_size: f64,
    /// Gate capacitance of all physical copies of the sizeable instances, in fF
    pub total_capacitance: f64,
    /// Number of instances of each kind
    pub counts: Vec<(InstanceType, usize)>,
    /// The sizeable instance with the largest size
    pub largest: Option<(String, f64)>,
}

impl Statistics {
    /// Gathers the statistics of `netlist`
    pub fn collect(netlist: &Netlist, config: &SizerConfig) -> Self {
        let counts = InstanceType::all()
            .into_iter()
            .map(|kind| (kind, netlist.instances_of(kind).count()))
            .collect();

        let mut copies = 0.0;
        let mut largest: Option<&Instance> = None;
        for (_, inst) in netlist.instances() {
            if !inst.get_type().is_sizeable() {
                continue;
            }
            copies += inst.get_size() * inst.get_mfactor() as f64;
            if largest.is_none_or(|l| inst.get_size().total_cmp(&l.get_size()).is_ge()) {
                largest = Some(inst);
            }
        }

        Self {
            total_size: netlist.total_size(),
            total_capacitance: copies * config.gate_capacitance,
            counts,
            largest: largest.map(|inst| (inst.get_name().to_string(), inst.get_size())),
        }
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total size: {:.3}", self.total_size)?;
        writeln!(f, "Total gate capacitance: {:.3} fF", self.total_capacitance)?;
        for (kind, count) in self.counts.iter().filter(|(_, c)| *c > 0) {
            writeln!(f, "  {kind}: {count}")?;
        }
        if let Some((name, size)) = &self.largest {
            writeln!(f, "Largest: {name} ({size:.3})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Pin;

    fn two_gates() -> Netlist {
        let mut netlist = Netlist::new("two".to_string());
        netlist
            .insert_instance(
                Instance::new(
                    "big",
                    InstanceType::LeGate,
                    4.0,
                    2.5,
                    vec![Pin::input("A", 1.0, "a"), Pin::output("Y", 1.0, "b")],
                )
                .with_mfactor(2),
            )
            .unwrap();
        netlist
            .add_instance("cap", InstanceType::Load, 0.0, 10.0, vec![Pin::input("C", 1.0, "b")])
            .unwrap();
        netlist
    }

    #[test]
    fn dump_format() {
        let netlist = two_gates();
        assert_eq!(sizes_to_string(&netlist), "big 2.5\ncap 10\n");
        assert_eq!(netlist.total_size(), 12.5);
    }

    #[test]
    fn statistics() {
        let netlist = two_gates();
        let stats = Statistics::collect(&netlist, &SizerConfig::default());
        assert!((stats.total_capacitance - 2.0).abs() < 1e-12);
        assert_eq!(stats.largest, Some(("big".to_string(), 2.5)));
        assert!(stats.counts.contains(&(InstanceType::Load, 1)));
        assert!(stats.to_string().starts_with("Total size: 12.500\n"));
    }
}
