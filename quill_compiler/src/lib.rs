//! quill_compiler: Markdown design documents to structured game data.
//!
//! Two front ends share one extraction layer:
//!
//! - the assemblage compiler turns a catalog file (YAML frontmatter plus
//!   `## Layers`, `## Collision`, `## Visuals`, `## Objects`, `## Anchors`
//!   sections) into a [`ParsedAssemblage`](quill_data::ParsedAssemblage);
//! - the act-script compiler turns a narrative act document into one
//!   [`SceneDdl`](quill_data::SceneDdl) per `## Scene N: Name` heading.
//!
//! The extraction layer (value parsers, frontmatter, heading slicing, tables
//! and tile grids) is public so that other tools can reuse it. Every compiler
//! entry point is a pure function of its input text.

pub mod act_script;
pub mod assemblage;
pub mod catalog;
pub mod composition;
pub mod config;
pub mod docref;
pub mod frontmatter;
pub mod section;
pub mod slug;
pub mod table;
pub mod values;

pub use act_script::{compile_act_script, compile_act_script_with, extract_field, parse_location};
pub use assemblage::{CompileError, parse_assemblage_markdown, parse_collision_section};
pub use catalog::{Catalog, CatalogError, load_catalog};
pub use composition::{CompositionError, CompositionGraph, resolve_compositions};
pub use config::{CompilerConfig, ConfigError, load_config, try_load_config};
pub use docref::{resolve_doc_ref, resolve_link_path};
pub use frontmatter::{FrontmatterError, extract_frontmatter};
pub use section::{extract_level2_section, extract_section, extract_section_fuzzy, find_best_heading_match};
pub use table::{MarkdownTable, decode_tile_grid, parse_tables};
pub use values::{parse_comma_list, parse_coord, parse_coord_range, parse_markdown_link, parse_size};
