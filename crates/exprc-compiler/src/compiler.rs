//! Compiler entry point.
//!
//! [`Compiler::compile`] runs the whole pipeline over one AST:
//!
//! ```text
//! types ─► vector replacement ─► scalarization ─► fold ─► lower ─► fold
//!       ─► cse ─► custom passes ─► validate
//!       ─► schedule ─► liveness ─► register allocation ─► emit
//! ```
//!
//! A compiler owns scratch buffers that every compile clears and reuses, so
//! one instance must not be shared between concurrent compiles. Separate
//! instances share nothing.

use std::fmt;
use std::path::Path;

use exprc_core::{Ast, CompileError};
use tracing::{debug, error};

use crate::bytecode::Program;
use crate::dump::{AstDumper, DotGraphDumper};
use crate::emit::ByteCodeEmitter;
use crate::liveness::{LiveInterval, analyze};
use crate::passes::cse::Cse;
use crate::passes::fold::fold_constants;
use crate::passes::lower::replace_unsupported_instructions;
use crate::passes::scalarize::scalarize_vector_instructions;
use crate::passes::types::deduce_types;
use crate::passes::validate::validate;
use crate::passes::vector::{replace_vector_instructions, scalarize_inputs, scalarize_outputs};
use crate::passes::{Pass, TraversalOrder, run_pass};
use crate::regalloc::allocate;
use crate::schedule::{Schedule, build_schedule};
use crate::traversal::TraversalState;

// ============================================================================
// Configuration
// ============================================================================

/// Builder for a [`Compiler`].
#[derive(Default)]
pub struct CompilerConfig {
    dumper: Option<Box<dyn AstDumper>>,
    passes: Vec<Pass>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump a Graphviz graph of the AST after every stage.
    ///
    /// See [`DotGraphDumper`] for how `path` is turned into file names.
    pub fn with_debug_output(self, path: impl AsRef<Path>) -> Self {
        self.with_dumper(DotGraphDumper::new(path))
    }

    /// Hand the AST to `dumper` after every stage.
    pub fn with_dumper<D>(mut self, dumper: D) -> Self
    where
        D: AstDumper + 'static,
    {
        self.dumper = Some(Box::new(dumper));
        self
    }

    /// Run `pass` after common subexpression elimination, before validation.
    ///
    /// Passes run in the order they are added.
    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            context: CompileContext::default(),
            dumper: self.dumper,
            passes: self.passes,
        }
    }
}

impl fmt::Debug for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerConfig")
            .field("dumper", &self.dumper.is_some())
            .field("passes", &self.passes)
            .finish()
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Scratch state cleared and reused by every compile.
#[derive(Debug, Default)]
struct CompileContext {
    state: TraversalState,
    cse: Cse,
    schedule: Schedule,
    intervals: Vec<LiveInterval>,
    emitter: ByteCodeEmitter,
}

/// Compiles expression DAGs into VM programs.
pub struct Compiler {
    context: CompileContext,
    dumper: Option<Box<dyn AstDumper>>,
    passes: Vec<Pass>,
}

impl Compiler {
    /// A compiler with the standard pipeline and no debug output.
    pub fn new() -> Self {
        CompilerConfig::new().build()
    }

    /// Compile `ast` into a program.
    ///
    /// The AST is transformed in place; after a successful compile it holds
    /// the optimized scalar DAG the program was generated from. On error no
    /// program is produced and the AST is left in whatever state the failing
    /// stage reached.
    #[tracing::instrument(skip_all)]
    pub fn compile(&mut self, ast: &mut Ast) -> Result<Program, CompileError> {
        match self.run(ast) {
            Ok(program) => {
                debug!(
                    instructions = program.num_instructions(),
                    registers = program.num_temp_registers(),
                    words = program.byte_code().len(),
                    "compiled"
                );
                Ok(program)
            }
            Err(err) => {
                error!(kind = ?err.kind(), error = %err, "compile failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, ast: &mut Ast) -> Result<Program, CompileError> {
        let Self {
            context,
            dumper,
            passes,
        } = self;
        let CompileContext {
            state,
            cse,
            schedule,
            intervals,
            emitter,
        } = context;

        stage(dumper, ast, "_00");

        run_pass(ast, TraversalOrder::PostOrder, state, deduce_types)?;
        stage(dumper, ast, "_01_TypeConv");

        run_pass(ast, TraversalOrder::PreOrder, state, replace_vector_instructions)?;
        stage(dumper, ast, "_02_ReplacedVectorInst");

        scalarize_inputs(ast)?;
        scalarize_outputs(ast)?;
        run_pass(ast, TraversalOrder::PreOrder, state, scalarize_vector_instructions)?;
        stage(dumper, ast, "_03_Scalarized");

        run_pass(ast, TraversalOrder::PostOrder, state, fold_constants)?;
        stage(dumper, ast, "_04_ConstantFolded1");

        run_pass(ast, TraversalOrder::PreOrder, state, replace_unsupported_instructions)?;
        stage(dumper, ast, "_05_ReplacedUnsupportedInst");

        run_pass(ast, TraversalOrder::PostOrder, state, fold_constants)?;
        stage(dumper, ast, "_06_ConstantFolded2");

        cse.clear();
        run_pass(ast, TraversalOrder::PostOrder, state, |ast, id| cse.eliminate(ast, id))?;
        debug!(distinct = cse.len(), "eliminated common subexpressions");
        for pass in passes.iter_mut() {
            debug!(pass = pass.name(), "running custom pass");
            pass.run(ast, state)?;
        }
        run_pass(ast, TraversalOrder::PreOrder, state, validate)?;
        stage(dumper, ast, "_07_Optimized");

        build_schedule(ast, state, schedule)?;
        debug!(
            instructions = schedule.len(),
            virtual_registers = schedule.num_registers(),
            "scheduled"
        );

        analyze(ast, schedule, intervals);
        let allocation = allocate(intervals);
        debug!(registers = allocation.register_count(), "allocated registers");

        emitter.emit(ast, schedule, &allocation)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("dumper", &self.dumper.is_some())
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

/// Log a finished stage and hand the AST to the dumper, if any.
fn stage(dumper: &mut Option<Box<dyn AstDumper>>, ast: &Ast, tag: &str) {
    debug!(
        stage = tag,
        nodes = ast.len(),
        inputs = ast.inputs().len(),
        outputs = ast.outputs().len(),
        "stage finished"
    );
    if let Some(dumper) = dumper
        && let Err(err) = dumper.dump(ast, tag)
    {
        error!(stage = tag, error = %err, "failed to dump debug graph");
    }
}
