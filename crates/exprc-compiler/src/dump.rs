//! Debug graph dumps.
//!
//! When a debug output path is configured the compiler hands the AST to an
//! [`AstDumper`] after every pipeline stage. Dumps are best effort: a
//! failed dump is logged and the compile carries on.
//!
//! ## Stage tags
//!
//! ```text
//! _00                          input as given
//! _01_TypeConv                 after type deduction
//! _02_ReplacedVectorInst       after vector instruction replacement
//! _03_Scalarized               after input/output and vector scalarization
//! _04_ConstantFolded1          after the first folding pass
//! _05_ReplacedUnsupportedInst  after lowering
//! _06_ConstantFolded2          after the second folding pass
//! _07_Optimized                after CSE, custom passes and validation
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use exprc_core::{Ast, NodeId};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::info;

use crate::traversal::{TraversalState, post_order};

/// Receives a snapshot of the AST after each pipeline stage.
pub trait AstDumper: Send {
    fn dump(&mut self, ast: &Ast, stage: &str) -> io::Result<()>;
}

/// Writes one Graphviz file per stage.
///
/// For a base path `out/expr.dot` the stage `_01_TypeConv` is written to
/// `out/expr_01_TypeConv.dot`. Without an extension `dot` is used.
#[derive(Debug, Clone)]
pub struct DotGraphDumper {
    directory: PathBuf,
    stem: String,
    extension: String,
}

impl DotGraphDumper {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dot".to_string());

        Self {
            directory,
            stem,
            extension,
        }
    }

    /// File the dump for `stage` is written to.
    pub fn stage_path(&self, stage: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}.{}", self.stem, stage, self.extension))
    }
}

impl AstDumper for DotGraphDumper {
    fn dump(&mut self, ast: &Ast, stage: &str) -> io::Result<()> {
        let path = self.stage_path(stage);
        if !self.directory.as_os_str().is_empty() {
            fs::create_dir_all(&self.directory)?;
        }
        fs::write(&path, to_dot(ast))?;
        info!(path = %path.display(), stage, "wrote debug graph");
        Ok(())
    }
}

/// Render the nodes reachable from the output roots, plus the declared
/// inputs, as a Graphviz digraph. Edges point from a node to its operands
/// and are labelled with the operand slot.
pub fn to_dot(ast: &Ast) -> String {
    let mut state = TraversalState::new();
    let roots: Vec<NodeId> = ast.outputs().iter().chain(ast.inputs()).copied().collect();
    post_order(ast, roots, Ast::children, &mut state);

    let mut graph: DiGraph<String, usize> = DiGraph::new();
    let mut indices: FxHashMap<NodeId, NodeIndex> = FxHashMap::default();

    for &id in &state.order {
        let index = graph.add_node(ast.describe(id));
        indices.insert(id, index);
    }
    for &id in &state.order {
        for (slot, child) in ast.children(id).iter().enumerate() {
            if let (Some(&from), Some(&to)) = (indices.get(&id), indices.get(child)) {
                graph.add_edge(from, to, slot);
            }
        }
    }

    format!("{}", Dot::new(&graph))
}
