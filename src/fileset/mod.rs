//! Turning include, exclude and dependency declarations into an ordered set of source files.
//!
//! Expansion of patterns into concrete files is delegated to a [`PathExpander`]. Everything
//! after that point is deterministic: the resolver partitions the expanded includes into files
//! that take part in the declared dependency graph and files that do not, and the graph module
//! orders the former.

mod expand;
mod graph;
mod resolver;

pub use expand::{FileSet, FileSetPatterns, LiteralPaths, PathExpander};
pub use graph::DependencyGraph;
pub use resolver::{ResolvedFileSet, resolve_file_set};
