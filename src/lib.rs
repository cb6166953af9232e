//! **A library for collecting, reconciling and exporting Bill-of-Materials graphs.**
//!
//! `bom-tools` builds a parent/child part graph from a product-data service or
//! from tabular BOM exports, reconciles name-keyed rows against part numbers,
//! derives `used_in` and `part_of_assembly` relations, and hands the result to
//! a graph store. It powers both the `bom-tools` command-line tool and a Rust
//! library for programmatic use.
//!
//! ## Key Features
//!
//! - **Cached Crawling**: Breadth-first collection from a top-level part through
//!   a [`ProductDataService`], with every response kept in an on-disk cache so
//!   a repeated run makes no remote calls and produces the same graph.
//! - **Tabular Parsing**: Level-indexed, number-pair and name-pair CSV tables,
//!   with header detection for exports that carry preamble rows.
//! - **Name Resolution**: Name-keyed rows resolved through a cross-reference
//!   index, strict (abort) or lenient (count and skip).
//! - **Derived Relations**: Inverse edges and the full transitive closure,
//!   cycle-tolerant via strongly connected components.
//! - **Graph-Store Export**: Batched upserts to a [`GraphSink`], with JSON and
//!   N-Triples sinks included.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: [`BomGraph`], a part map plus a deduplicated [`EdgeSet`].
//!   Both the crawler and the table parsers produce it.
//! - **[`crawl`]**: The frontier [`Crawler`] and its [`CrawlStats`].
//! - **[`cache`]**: The [`FileCache`] of remote responses.
//! - **[`structure`]**: Flattening of nested structure responses into edges.
//! - **[`tabular`]**: CSV tables, BOM shape detection and the cross-reference index.
//! - **[`resolve`]**: The [`NameResolver`].
//! - **[`derive`]** and **[`extract`]**: Closure relations and bounded subgraphs.
//! - **[`export`]**: [`GraphExport`] and the bundled sinks.
//! - **[`pipeline`]**: Stages shared by the CLI commands.
//!
//! ## Getting Started: Parsing a Tabular BOM
//!
//! ```no_run
//! use bom_tools::tabular::{parse_tables, read_csv, TabularAliases};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aliases = TabularAliases::default();
//!     let table = read_csv(Path::new("path/to/bom.csv"), &aliases)?;
//!     let parsed = parse_tables([&table], &aliases);
//!
//!     parsed.stats.log_summary();
//!     for edge in parsed.edges.iter() {
//!         println!("{} -> {}", edge.parent, edge.child);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Collecting from a Service
//!
//! ```ignore
//! use bom_tools::cache::FileCache;
//! use bom_tools::crawl::Crawler;
//!
//! let cache = FileCache::new("/tmp/bom-cache")?;
//! let mut crawler = Crawler::with_cache(my_service, cache, false);
//! let outcome = crawler.run("TOP-100");
//! outcome.graph.save(Path::new("out"))?;
//! ```
//!
//! ### Deriving Relations and Exporting
//!
//! ```no_run
//! use bom_tools::derive::DerivedRelations;
//! use bom_tools::export::{GraphExport, JsonBundleSink, DEFAULT_BATCH_SIZE};
//! use bom_tools::model::BomGraph;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let graph = BomGraph::load(Path::new("out"))?;
//!     let derived = DerivedRelations::build(&graph.edges)?;
//!
//!     let mut sink = JsonBundleSink::new();
//!     GraphExport::from_graph(&graph)
//!         .with_derived(derived)
//!         .write_to(&mut sink, DEFAULT_BATCH_SIZE)?;
//!     sink.save(Path::new("bundle.json"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `remote` (default): the JSON-RPC HTTP client for the product-data
//!   service. This adds `reqwest`. Without it, collection runs from the cache only.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools,
    clippy::module_name_repetitions
)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod derive;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod remote;
pub mod resolve;
pub mod structure;
pub mod tabular;
pub mod utils;

// Re-export main types for convenience
pub use cache::{CacheKind, CachedAnswer, FileCache};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, ConfigPreset, Validatable};
pub use crawl::{CollectionIndex, CrawlOptions, CrawlOutcome, CrawlStats, Crawler, DetailsStrategy};
pub use derive::DerivedRelations;
pub use error::{BomError, ErrorContext, OptionContext, Result};
pub use export::{GraphExport, GraphSink, JsonBundleSink, NTriplesSink, RelationKind};
pub use extract::{extract_subgraph, ExtractOptions, Subgraph};
pub use model::{BomGraph, Edge, EdgeSet, PartAttributes, PartLinks, PartRecord};
#[cfg(feature = "remote")]
pub use remote::HttpProductClient;
pub use remote::{OfflineService, ProductDataService, RemoteError};
pub use resolve::{NameResolver, ResolutionMode};
pub use tabular::{CrossReferenceIndex, Table, TabularAliases};
