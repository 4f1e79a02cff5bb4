//! Expression AST.
//!
//! The AST is a DAG of [`Node`]s stored in an arena and addressed by
//! [`NodeId`]. A node may be referenced by several parents; passes rely on
//! the id to recognize shared subexpressions and transform them once.
//!
//! ## Roots
//!
//! - `inputs`: the declared input nodes, in declaration order. Input nodes
//!   that are not declared are still legal and get an input slot appended
//!   on first use during emission.
//! - `outputs`: the output roots. Each root is an [`NodeKind::Output`] node.
//! - `declared_outputs`: the output table the program writes to. Output
//!   nodes are matched against it by name.
//!
//! ## Types
//!
//! Every `create_*` method deduces the new node's type from its children
//! when they are already typed, so passes that build replacement nodes get
//! typed results without rerunning type deduction.

mod ops;

pub use ops::{BinaryOp, TernaryOp, UnaryOp};

use std::fmt;

use rustc_hash::FxHashMap;

use crate::signature::{
    binary_signatures, resolve_function, resolve_operator, ternary_signatures, unary_signatures,
};
use crate::{DataType, FunctionDesc, RegisterType, StreamDesc, Value};

// ============================================================================
// Nodes
// ============================================================================

/// Handle of a node in an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The variant data of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Constant(Value),
    Input(StreamDesc),
    Output {
        desc: StreamDesc,
        expression: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        /// `[left, right]`
        operands: [NodeId; 2],
    },
    Ternary {
        op: TernaryOp,
        operands: [NodeId; 3],
    },
    FunctionCall {
        /// Candidate overloads; the node's `overload` selects one.
        functions: Vec<FunctionDesc>,
        arguments: Vec<NodeId>,
    },
    /// Vector construction. Missing trailing components are zero and a
    /// single scalar argument is broadcast to every component.
    Constructor { arguments: Vec<NodeId> },
    /// Component selection, e.g. `v.zyx`.
    Swizzle {
        operand: NodeId,
        components: [u8; 4],
        count: u8,
    },
}

impl NodeKind {
    /// Short name of the node kind, using the operator name for operators.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "Constant",
            NodeKind::Input(_) => "Input",
            NodeKind::Output { .. } => "Output",
            NodeKind::Unary { op, .. } => op.name(),
            NodeKind::Binary { op, .. } => op.name(),
            NodeKind::Ternary { op, .. } => op.name(),
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::Constructor { .. } => "Constructor",
            NodeKind::Swizzle { .. } => "Swizzle",
        }
    }
}

/// A node in the expression DAG.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub return_type: DataType,
    /// Selected operator signature or function overload.
    pub overload: Option<usize>,
}

impl Node {
    pub fn new(kind: NodeKind, return_type: DataType) -> Self {
        Self {
            kind,
            return_type,
            overload: None,
        }
    }

    /// Child handles in operand order.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Constant(_) | NodeKind::Input(_) => &[],
            NodeKind::Output { expression, .. } => std::slice::from_ref(expression),
            NodeKind::Unary { operand, .. } => std::slice::from_ref(operand),
            NodeKind::Binary { operands, .. } => operands,
            NodeKind::Ternary { operands, .. } => operands,
            NodeKind::FunctionCall { arguments, .. } => arguments,
            NodeKind::Constructor { arguments } => arguments,
            NodeKind::Swizzle { operand, .. } => std::slice::from_ref(operand),
        }
    }

    /// Mutable child handles in operand order.
    pub fn children_mut(&mut self) -> &mut [NodeId] {
        match &mut self.kind {
            NodeKind::Constant(_) | NodeKind::Input(_) => &mut [],
            NodeKind::Output { expression, .. } => std::slice::from_mut(expression),
            NodeKind::Unary { operand, .. } => std::slice::from_mut(operand),
            NodeKind::Binary { operands, .. } => operands,
            NodeKind::Ternary { operands, .. } => operands,
            NodeKind::FunctionCall { arguments, .. } => arguments,
            NodeKind::Constructor { arguments } => arguments,
            NodeKind::Swizzle { operand, .. } => std::slice::from_mut(operand),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, NodeKind::Input(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, NodeKind::Output { .. })
    }

    pub fn constant_value(&self) -> Option<Value> {
        match self.kind {
            NodeKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Register class of the result.
    pub fn register_type(&self) -> RegisterType {
        self.return_type.register_type
    }

    /// The function overload selected for a call node.
    pub fn selected_function(&self) -> Option<&FunctionDesc> {
        match &self.kind {
            NodeKind::FunctionCall { functions, .. } => self.overload.and_then(|index| functions.get(index)),
            _ => None,
        }
    }

    /// Human-readable label, e.g. `Add(Float)` or `Input(Float3): pos`.
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Constant(value) => format!("Constant({}): {}", self.return_type, value),
            NodeKind::Input(desc) | NodeKind::Output { desc, .. } => {
                format!("{}({}): {}", self.kind.name(), self.return_type, desc.name)
            }
            NodeKind::FunctionCall { functions, .. } => {
                let name = self
                    .selected_function()
                    .or_else(|| functions.first())
                    .map(|desc| desc.name.as_str())
                    .unwrap_or("?");
                format!("FunctionCall({}): {}", self.return_type, name)
            }
            NodeKind::Swizzle { components, count, .. } => {
                let selection: String = components[..*count as usize]
                    .iter()
                    .map(|&c| crate::COMPONENT_NAMES[c as usize & 3])
                    .collect();
                format!("Swizzle({}): {}", self.return_type, selection)
            }
            kind => format!("{}({})", kind.name(), self.return_type),
        }
    }
}

// ============================================================================
// AST
// ============================================================================

/// An expression DAG with its input and output tables.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    declared_outputs: Vec<StreamDesc>,
    /// Cache of single-component selections, keyed by (vector node, component).
    components: FxHashMap<(NodeId, u8), NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node handles in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Get a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this AST.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn return_type(&self, id: NodeId) -> DataType {
        self.node(id).return_type
    }

    pub fn register_type(&self, id: NodeId) -> RegisterType {
        self.node(id).return_type.register_type
    }

    pub fn is_constant(&self, id: NodeId) -> bool {
        self.node(id).is_constant()
    }

    pub fn constant_value(&self, id: NodeId) -> Option<Value> {
        self.node(id).constant_value()
    }

    /// Description for diagnostics, e.g. `Add(Float) #4`.
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) => format!("{} {}", node.label(), id),
            None => format!("<invalid node {id}>"),
        }
    }

    /// Declared input nodes.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Output roots.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Declared output table.
    pub fn declared_outputs(&self) -> &[StreamDesc] {
        &self.declared_outputs
    }

    /// Replace the declared input list.
    pub fn set_inputs(&mut self, inputs: Vec<NodeId>) {
        self.inputs = inputs;
    }

    /// Replace the output roots.
    pub fn set_outputs(&mut self, outputs: Vec<NodeId>) {
        self.outputs = outputs;
    }

    /// Replace one output root.
    pub fn set_output(&mut self, index: usize, output: NodeId) {
        self.outputs[index] = output;
    }

    /// Replace the declared output table.
    pub fn set_declared_outputs(&mut self, outputs: Vec<StreamDesc>) {
        self.declared_outputs = outputs;
    }

    /// Overwrite a node in place. Every parent observes the new node.
    pub fn replace(&mut self, id: NodeId, node: Node) {
        self.nodes[id.index()] = node;
    }

    /// Set one child handle.
    pub fn set_child(&mut self, id: NodeId, index: usize, child: NodeId) {
        self.nodes[id.index()].children_mut()[index] = child;
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an input node and append it to the declared inputs.
    pub fn add_input(&mut self, desc: StreamDesc) -> NodeId {
        let id = self.create_input(desc);
        self.inputs.push(id);
        id
    }

    /// Create an input node without declaring it.
    pub fn create_input(&mut self, desc: StreamDesc) -> NodeId {
        let data_type = desc.data_type;
        self.push(Node::new(NodeKind::Input(desc), data_type))
    }

    /// Create an output node, add it as a root and declare it.
    pub fn add_output(&mut self, desc: StreamDesc, expression: NodeId) -> NodeId {
        self.declared_outputs.push(desc.clone());
        let id = self.create_output(desc, expression);
        self.outputs.push(id);
        id
    }

    /// Create an output node without adding it as root or declaring it.
    pub fn create_output(&mut self, desc: StreamDesc, expression: NodeId) -> NodeId {
        let data_type = desc.data_type;
        self.push(Node::new(NodeKind::Output { desc, expression }, data_type))
    }

    pub fn create_constant(&mut self, value: impl Into<Value>) -> NodeId {
        let value = value.into();
        self.push(Node::new(
            NodeKind::Constant(value),
            DataType::scalar_of(value.register_type()),
        ))
    }

    pub fn create_unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        let id = self.push(Node::new(NodeKind::Unary { op, operand }, DataType::UNKNOWN));
        self.deduce_type(id);
        id
    }

    /// Create a conversion of `operand` to `target`, keeping its width.
    pub fn create_conversion(&mut self, target: RegisterType, operand: NodeId) -> NodeId {
        let width = self.return_type(operand).width;
        let mut node = Node::new(
            NodeKind::Unary {
                op: UnaryOp::TypeConversion,
                operand,
            },
            DataType::new(target, width),
        );
        node.overload = Some(0);
        self.push(node)
    }

    pub fn create_binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        let id = self.push(Node::new(
            NodeKind::Binary {
                op,
                operands: [left, right],
            },
            DataType::UNKNOWN,
        ));
        self.deduce_type(id);
        id
    }

    pub fn create_ternary(&mut self, op: TernaryOp, first: NodeId, second: NodeId, third: NodeId) -> NodeId {
        let id = self.push(Node::new(
            NodeKind::Ternary {
                op,
                operands: [first, second, third],
            },
            DataType::UNKNOWN,
        ));
        self.deduce_type(id);
        id
    }

    pub fn create_function_call(&mut self, functions: Vec<FunctionDesc>, arguments: Vec<NodeId>) -> NodeId {
        let id = self.push(Node::new(
            NodeKind::FunctionCall { functions, arguments },
            DataType::UNKNOWN,
        ));
        self.deduce_type(id);
        id
    }

    /// Create a vector constructor of the given type.
    pub fn create_constructor(&mut self, data_type: DataType, arguments: Vec<NodeId>) -> NodeId {
        self.push(Node::new(NodeKind::Constructor { arguments }, data_type))
    }

    /// Create a component selection. At most four components are used.
    pub fn create_swizzle(&mut self, operand: NodeId, selection: &[u8]) -> NodeId {
        let count = selection.len().clamp(1, DataType::MAX_WIDTH as usize);
        let mut components = [0u8; 4];
        for (slot, &c) in components.iter_mut().zip(selection) {
            *slot = c.min(DataType::MAX_WIDTH - 1);
        }
        let id = self.push(Node::new(
            NodeKind::Swizzle {
                operand,
                components,
                count: count as u8,
            },
            DataType::UNKNOWN,
        ));
        self.deduce_type(id);
        id
    }

    /// The scalar node selecting `component` of `id`.
    ///
    /// Scalars broadcast, so for a width-1 node this is the node itself.
    /// Selections are cached so every caller asking for the same component
    /// of the same node shares one node.
    pub fn component(&mut self, id: NodeId, component: u8) -> NodeId {
        if !self.return_type(id).is_vector() {
            return id;
        }
        if let Some(&cached) = self.components.get(&(id, component)) {
            return cached;
        }
        let selection = self.create_swizzle(id, &[component]);
        self.components.insert((id, component), selection);
        selection
    }

    // ========================================================================
    // Type deduction
    // ========================================================================

    /// Deduce a node's overload and return type from its children.
    ///
    /// Leaves the type unknown when a child is untyped or no overload
    /// matches. Function calls with a resolved overload have surplus
    /// arguments trimmed.
    pub fn deduce_type(&mut self, id: NodeId) {
        let (return_type, overload) = self.infer(id);
        let node = &mut self.nodes[id.index()];
        node.return_type = return_type;
        node.overload = overload;

        if let (Some(index), NodeKind::FunctionCall { functions, arguments }) = (overload, &mut node.kind) {
            let arity = functions.get(index).map_or(arguments.len(), FunctionDesc::arity);
            arguments.truncate(arity);
        }
    }

    fn infer(&self, id: NodeId) -> (DataType, Option<usize>) {
        let node = self.node(id);
        let types: Vec<DataType> = node.children().iter().map(|&c| self.return_type(c)).collect();
        let registers: Vec<RegisterType> = types.iter().map(|t| t.register_type).collect();

        match &node.kind {
            NodeKind::Constant(value) => (DataType::scalar_of(value.register_type()), None),
            NodeKind::Input(desc) | NodeKind::Output { desc, .. } => (desc.data_type, None),
            NodeKind::Constructor { .. } => (node.return_type, None),
            NodeKind::Swizzle { count, .. } => (types[0].with_width(*count), None),
            NodeKind::Unary {
                op: UnaryOp::TypeConversion,
                ..
            } => (node.return_type.with_width(types[0].width), Some(0)),
            NodeKind::Unary { op, .. } => {
                let Some(index) = resolve_operator(unary_signatures(*op), &registers) else {
                    return (DataType::UNKNOWN, None);
                };
                let width = if op.is_reduction() { 1 } else { types[0].width };
                (DataType::new(unary_signatures(*op)[index].return_type, width), Some(index))
            }
            NodeKind::Binary { op, .. } => {
                let Some(index) = resolve_operator(binary_signatures(*op), &registers) else {
                    return (DataType::UNKNOWN, None);
                };
                let Some(width) = broadcast_width(&types) else {
                    return (DataType::UNKNOWN, None);
                };
                let width = match op {
                    BinaryOp::Dot => 1,
                    BinaryOp::Cross if width == 3 => 3,
                    BinaryOp::Cross => return (DataType::UNKNOWN, None),
                    _ => width,
                };
                (DataType::new(binary_signatures(*op)[index].return_type, width), Some(index))
            }
            NodeKind::Ternary { op, .. } => {
                let Some(index) = resolve_operator(ternary_signatures(*op), &registers) else {
                    return (DataType::UNKNOWN, None);
                };
                let Some(width) = broadcast_width(&types) else {
                    return (DataType::UNKNOWN, None);
                };
                (DataType::new(ternary_signatures(*op)[index].return_type, width), Some(index))
            }
            NodeKind::FunctionCall { functions, .. } => {
                let Some(index) = resolve_function(functions, &registers) else {
                    return (DataType::UNKNOWN, None);
                };
                let arity = functions[index].arity().min(types.len());
                let Some(width) = broadcast_width(&types[..arity]) else {
                    return (DataType::UNKNOWN, None);
                };
                (DataType::new(functions[index].output_type, width), Some(index))
            }
        }
    }

    /// The register type a child is expected to have, if the parent
    /// constrains it.
    pub fn expected_child_type(&self, id: NodeId, child_index: usize) -> Option<RegisterType> {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Unary {
                op: UnaryOp::TypeConversion,
                ..
            } => None,
            NodeKind::Unary { op, .. } => {
                let sig = unary_signatures(*op).get(node.overload?)?;
                Some(sig.argument(child_index))
            }
            NodeKind::Binary { op, .. } => {
                let sig = binary_signatures(*op).get(node.overload?)?;
                Some(sig.argument(child_index))
            }
            NodeKind::Ternary { op, .. } => {
                let sig = ternary_signatures(*op).get(node.overload?)?;
                Some(sig.argument(child_index))
            }
            NodeKind::FunctionCall { .. } => node.selected_function()?.input_types.get(child_index).copied(),
            NodeKind::Output { .. } | NodeKind::Constructor { .. } => Some(node.register_type()),
            NodeKind::Constant(_) | NodeKind::Input(_) | NodeKind::Swizzle { .. } => None,
        }
    }
}

/// Common width of componentwise operands.
///
/// Scalars broadcast to any width; vectors of different widths don't mix.
pub fn broadcast_width(types: &[DataType]) -> Option<u8> {
    let mut width = 1;
    for t in types {
        if t.width == 1 {
            continue;
        }
        if width != 1 && width != t.width {
            return None;
        }
        width = t.width;
    }
    Some(width)
}
