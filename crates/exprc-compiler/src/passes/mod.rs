//! AST transform passes.
//!
//! A pass is a node-to-node function applied over the whole DAG in either
//! pre-order or post-order. It returns the node unchanged, a replacement
//! node, or an error that aborts the compile.
//!
//! - [`types`]: type deduction and conversion insertion
//! - [`vector`]: vector instruction replacement and input/output scalarization
//! - [`scalarize`]: per-component expansion of the remaining vector nodes
//! - [`fold`]: constant folding and algebraic simplification
//! - [`lower`]: replacement of instructions the VM can't execute
//! - [`cse`]: common subexpression elimination
//! - [`validate`]: final structural checks before code generation
//!
//! ## Memoization
//!
//! Every traversal keeps a memo table from original node to transformed
//! node. A node shared by several parents is transformed once and every
//! parent is pointed at the same replacement.
//!
//! A pre-order transform is applied once per node. The replacement is not
//! transformed again, only its children are visited. Passes that need to
//! rewrite their own output do so inside the transform with
//! `rewrite_until_stable`.
//!
//! ## Output roots
//!
//! Roots are transformed like any other node but must stay output nodes.
//! Replacing a root with anything else fails with
//! [`CompileError::MalformedInput`].

pub mod cse;
pub mod fold;
pub mod lower;
pub mod scalarize;
pub mod types;
pub mod validate;
pub mod vector;

use std::fmt;

use exprc_core::{Ast, CompileError, NodeId};

use crate::traversal::{TraversalState, post_order};

/// Order in which a pass visits the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Parent first; the (possibly new) children are visited afterwards.
    PreOrder,
    /// Children first; a parent sees already transformed children.
    PostOrder,
}

/// Signature of a node transform.
pub type Transform = dyn FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError> + Send;

/// A named transform with its traversal order.
///
/// Used to register additional passes with the compiler; see
/// [`crate::CompilerConfig::with_pass`].
pub struct Pass {
    name: String,
    order: TraversalOrder,
    transform: Box<Transform>,
}

impl Pass {
    pub fn new<F>(name: impl Into<String>, order: TraversalOrder, transform: F) -> Self
    where
        F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError> + Send + 'static,
    {
        Self {
            name: name.into(),
            order,
            transform: Box::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    /// Apply the pass to the whole AST.
    pub fn run(&mut self, ast: &mut Ast, state: &mut TraversalState) -> Result<(), CompileError> {
        run_pass(ast, self.order, state, &mut self.transform)
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Apply `transform` to every node reachable from the output roots.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run_pass<F>(
    ast: &mut Ast,
    order: TraversalOrder,
    state: &mut TraversalState,
    mut transform: F,
) -> Result<(), CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    if ast.outputs().is_empty() {
        return Err(CompileError::malformed("the expression has no outputs"));
    }

    match order {
        TraversalOrder::PreOrder => run_pre_order(ast, state, &mut transform),
        TraversalOrder::PostOrder => run_post_order(ast, state, &mut transform),
    }
}

fn run_pre_order<F>(ast: &mut Ast, state: &mut TraversalState, transform: &mut F) -> Result<(), CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    state.clear();
    let mut pending = Vec::new();

    for index in 0..ast.outputs().len() {
        let root = ast.outputs()[index];
        let root = transform_output(ast, root, transform)?;
        ast.set_output(index, root);

        if state.visited.insert(root) {
            pending.push(root);
        }

        while let Some(parent) = pending.pop() {
            let mut slot = 0;
            while slot < ast.children(parent).len() {
                let child = ast.children(parent)[slot];
                let new_child = resolve_pre_order(ast, state, transform, child)?;
                if new_child != child {
                    ast.set_child(parent, slot, new_child);
                }
                if state.visited.insert(new_child) {
                    pending.push(new_child);
                }
                slot += 1;
            }
        }
    }

    Ok(())
}

/// Transform a node once and memoize the result.
///
/// The result maps to itself, so a parent that already points at it is
/// not rewritten again. Its children are still visited.
fn resolve_pre_order<F>(
    ast: &mut Ast,
    state: &mut TraversalState,
    transform: &mut F,
    node: NodeId,
) -> Result<NodeId, CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    if let Some(&done) = state.memo.get(&node) {
        return Ok(done);
    }

    let done = transform(ast, node)?;
    state.memo.insert(node, done);
    state.memo.entry(done).or_insert(done);
    Ok(done)
}

/// Apply `step` until it returns its input.
///
/// For passes whose replacement may itself need the same rewrite, e.g. a
/// removed conversion exposing another one. `step` must make progress on
/// every call that changes the node.
pub(crate) fn rewrite_until_stable<F>(ast: &mut Ast, id: NodeId, mut step: F) -> Result<NodeId, CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    let mut current = id;
    loop {
        let next = step(ast, current)?;
        if next == current {
            return Ok(current);
        }
        current = next;
    }
}

fn run_post_order<F>(ast: &mut Ast, state: &mut TraversalState, transform: &mut F) -> Result<(), CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    state.clear();
    let roots = ast.outputs().to_vec();
    post_order(ast, roots.iter().copied(), Ast::children, state);
    let order = std::mem::take(&mut state.order);

    for &parent in &order {
        for slot in 0..ast.children(parent).len() {
            let child = ast.children(parent)[slot];
            let new_child = match state.memo.get(&child) {
                Some(&done) => done,
                None => {
                    let done = transform(ast, child)?;
                    state.memo.insert(child, done);
                    done
                }
            };
            if new_child != child {
                ast.set_child(parent, slot, new_child);
            }
        }
    }

    for (index, root) in roots.into_iter().enumerate() {
        let new_root = transform_output(ast, root, transform)?;
        ast.set_output(index, new_root);
    }

    state.order = order;
    Ok(())
}

fn transform_output<F>(ast: &mut Ast, root: NodeId, transform: &mut F) -> Result<NodeId, CompileError>
where
    F: FnMut(&mut Ast, NodeId) -> Result<NodeId, CompileError>,
{
    if !ast.get(root).is_some_and(|node| node.is_output()) {
        return Err(CompileError::malformed(format!(
            "output root {root} is not an output node"
        )));
    }

    let new_root = transform(ast, root)?;
    if new_root != root && !ast.node(new_root).is_output() {
        let name = match &ast.node(root).kind {
            exprc_core::NodeKind::Output { desc, .. } => desc.name.clone(),
            _ => String::new(),
        };
        return Err(CompileError::malformed(format!(
            "transformed output node for '{name}' is invalid: {}",
            ast.describe(new_root)
        )));
    }
    Ok(new_root)
}
