#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub)]
/*!

`le-sizer`

Logical-effort gate sizing over a flattened netlist. A [netlist::Netlist] is built
instance by instance from pins that name their nets, then a [sizer::Sizer]
iterates every gate and keeper towards equal gate delay until the sizes settle.

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("../demos/simple.rs")]
#![doc = "\n```"]

pub mod circuit;
pub mod config;
pub mod error;
pub mod graph;
pub mod netlist;
pub mod report;
pub mod sizer;
pub mod testcase;
pub mod util;

pub use error::NetlistError;
