//! Core data model for collected BOM graphs.
//!
//! Every input path (remote crawl, level-indexed tables, explicit pair tables)
//! ends in the same representation: a [`BomGraph`] holding a part map keyed
//! by part number and a deduplicated [`EdgeSet`].
//!
//! Part records are created on first sighting and afterwards only ever
//! gain attributes through [`PartAttributes::merge_gaps`]:
//!
//! ```
//! use bom_tools::model::{BomGraph, PartAttributes};
//!
//! let mut graph = BomGraph::new();
//! graph.merge_part("100", &PartAttributes::new().with_name("Frame"));
//! graph.merge_part("100", &PartAttributes::new().with_name("Frame, welded"));
//! assert_eq!(graph.part("100").unwrap().label(), "Frame");
//! ```

mod aliases;
mod edge;
mod graph;
mod links;
mod part;

pub use aliases::{normalize_part_number, scalar_string, FieldAliases};
pub use edge::{Edge, EdgeInsert, EdgeSet};
pub use graph::{BomGraph, EDGES_FILE, PARTS_FILE};
pub(crate) use graph::{read_json, write_json};
pub use links::{
    AlternateLink, DescribeLink, Document, PartLinks, DEFAULT_ALTERNATE_TYPE, LINKS_FILE,
};
pub use part::{PartAttributes, PartRecord};
