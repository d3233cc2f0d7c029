//! The system dependency graph: model, construction, cycle detection and
//! export formats.

pub mod builder;
pub mod cycles;
pub mod export;
pub mod model;

pub use builder::{build_graph, GraphBuilder};
pub use cycles::{find_cycles, format_cycle, Adjacency, Cycle};
pub use model::{Edge, EdgeKind, Graph, GraphStats, NodeKind, NodeMeta};
