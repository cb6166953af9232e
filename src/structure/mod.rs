//! Generic structure flattening for product-data responses.
//!
//! Substructure responses have no fixed schema: children may sit under
//! `Components`, `children`, `items`, ... and the part number may be called
//! `Number`, `number` or `PartNumber`. [`flatten`] walks an arbitrary
//! [`serde_json::Value`] using ordered alias lists ([`StructureAliases`]) and
//! emits parent→child edges plus per-part attribute fragments.

mod flatten;

pub use flatten::{attributes_from_record, flatten, has_nested_children, Flattened};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::FieldAliases;

/// Default recursion bound for [`flatten`].
pub const DEFAULT_MAX_WALK_DEPTH: usize = 256;

/// Field-name aliases used to recognize parts inside structure responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StructureAliases {
    /// Keys holding the human-readable part number
    pub number: FieldAliases,
    /// Keys holding lists of child nodes
    pub children: FieldAliases,
    /// Keys holding the opaque identifier of a node
    pub id: FieldAliases,
    /// Display name (dotted paths descend into nested objects)
    pub name: FieldAliases,
    /// Type tag
    pub part_type: FieldAliases,
    pub state: FieldAliases,
    pub source: FieldAliases,
    pub revision: FieldAliases,
    pub container: FieldAliases,
    pub view: FieldAliases,
    /// Recursion bound for the walk
    pub max_walk_depth: usize,
}

impl Default for StructureAliases {
    fn default() -> Self {
        Self {
            number: FieldAliases::new(["Number", "number", "PartNumber", "partNumber"]),
            children: FieldAliases::new([
                "children",
                "Children",
                "components",
                "Components",
                "items",
                "Items",
                "value",
                "Value",
                "nodes",
                "relations",
                "edges",
                "downstream",
                "structure",
                "Parts",
            ]),
            id: FieldAliases::new(["PartId", "ID", "Id", "id", "oid"]),
            name: FieldAliases::new(["Name", "name", "Identity.Name"]),
            part_type: FieldAliases::new(["Type", "type", "@odata.type"]),
            state: FieldAliases::new(["State", "state"]),
            source: FieldAliases::new(["Source", "source"]),
            revision: FieldAliases::new(["Revision", "revision"]),
            container: FieldAliases::new(["Container", "container", "OrganizationName"]),
            view: FieldAliases::new(["View", "view"]),
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
        }
    }
}
