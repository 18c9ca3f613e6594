//! Shared code-assembly layer for the compiler backends.
//!
//! Every backend walks a [`TypeNode`](crate::type_def::TypeNode) tree once at
//! compile time and builds a specialized program for it. A program is an
//! ordered list of steps — pre-rendered constant output ("blobs") or dynamic
//! operations — and [`Assembler::compile`] coalesces adjacent blobs so that
//! output known ahead of time (object keys, structural headers, `con`
//! values) is emitted as a single bulk write instead of many small ones.
//!
//! The dynamic-eval concerns of the original design map onto plain Rust:
//! registers and constant pools become closure captures, and linking an
//! already-built function by reference becomes a [`LazyRef`] around the
//! referenced type's own compiled function.

pub mod binary;
pub mod capacity;
pub mod discriminator;
pub mod json_text;
pub mod validator;

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::SchemaError;

/// A unit of pre-rendered constant output.
pub trait Fragment: Default {
    fn append(&mut self, other: &Self);
    fn is_empty(&self) -> bool;
}

impl Fragment for Vec<u8> {
    fn append(&mut self, other: &Self) {
        self.extend_from_slice(other);
    }
    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl Fragment for String {
    fn append(&mut self, other: &Self) {
        self.push_str(other);
    }
    fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// One step of a compiled program.
pub enum Step<B, F> {
    /// Constant output, written verbatim.
    Blob(B),
    /// A dynamic operation over the value being processed.
    Op(F),
}

/// Accumulates steps while a backend walks a type tree.
pub struct Assembler<B, F> {
    steps: Vec<Step<B, F>>,
}

impl<B: Fragment, F> Default for Assembler<B, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Fragment, F> Assembler<B, F> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends constant output. Empty blobs are dropped.
    pub fn blob(&mut self, blob: B) {
        if !blob.is_empty() {
            self.steps.push(Step::Blob(blob));
        }
    }

    /// Appends a dynamic operation.
    pub fn op(&mut self, op: F) {
        self.steps.push(Step::Op(op));
    }

    /// Coalesces adjacent blobs and returns the finished program.
    pub fn compile(self) -> Program<B, F> {
        let mut steps: Vec<Step<B, F>> = Vec::with_capacity(self.steps.len());
        for step in self.steps {
            match step {
                Step::Blob(blob) => match steps.last_mut() {
                    Some(Step::Blob(prev)) => prev.append(&blob),
                    _ => steps.push(Step::Blob(blob)),
                },
                op => steps.push(op),
            }
        }
        Program { steps }
    }
}

/// A compiled program: coalesced steps.
pub struct Program<B, F> {
    pub steps: Vec<Step<B, F>>,
}

impl<B: Fragment, F> Program<B, F> {
    /// If every step folded into constant output, returns it.
    pub fn into_const(mut self) -> Result<B, Self> {
        match self.steps.len() {
            0 => Ok(B::default()),
            1 => match self.steps.pop() {
                Some(Step::Blob(blob)) => Ok(blob),
                Some(step) => {
                    self.steps.push(step);
                    Err(self)
                }
                None => Ok(B::default()),
            },
            _ => Err(self),
        }
    }
}

/// A function memoized on first use.
///
/// `ref` nodes never inline the referenced type's program; they call the
/// target's own compiled function through one of these. Deferring the
/// target's compilation to the first actual invocation is what lets cyclic
/// schemas compile without recursing forever.
pub struct LazyRef<T> {
    cell: OnceLock<Result<T, SchemaError>>,
}

impl<T: Clone> Default for LazyRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LazyRef<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the linked function, building it on first use.
    pub fn get_or_init(
        &self,
        init: impl FnOnce() -> Result<T, SchemaError>,
    ) -> Result<T, SchemaError> {
        self.cell.get_or_init(init).clone()
    }
}

/// Index-dispatched branching over compiled alternatives.
///
/// The structured `switch` of the assembly layer: the discriminator engine
/// supplies the dispatch function, each union alternative supplies an arm,
/// and every backend selects arms the same way.
pub struct Switch<F> {
    dispatch: Arc<dyn Fn(&Value) -> usize + Send + Sync>,
    arms: Vec<F>,
}

impl<F> Switch<F> {
    pub fn new(dispatch: Arc<dyn Fn(&Value) -> usize + Send + Sync>, arms: Vec<F>) -> Self {
        Self { dispatch, arms }
    }

    /// Selects the arm for a value. Out-of-range dispatch indexes fall back
    /// to the first (default) alternative.
    pub fn select(&self, value: &Value) -> &F {
        let index = (self.dispatch)(value);
        self.arms.get(index).unwrap_or(&self.arms[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_blobs_coalesce() {
        let mut asm: Assembler<Vec<u8>, ()> = Assembler::new();
        asm.blob(vec![1]);
        asm.blob(vec![2, 3]);
        asm.op(());
        asm.blob(vec![4]);
        asm.blob(vec![5]);
        let program = asm.compile();
        assert_eq!(program.steps.len(), 3);
        match &program.steps[0] {
            Step::Blob(b) => assert_eq!(b, &[1, 2, 3]),
            _ => panic!("expected blob"),
        }
        match &program.steps[2] {
            Step::Blob(b) => assert_eq!(b, &[4, 5]),
            _ => panic!("expected blob"),
        }
    }

    #[test]
    fn fully_constant_program_folds() {
        let mut asm: Assembler<String, ()> = Assembler::new();
        asm.blob("{\"a\":".into());
        asm.blob("1}".into());
        let folded = asm.compile().into_const().ok().unwrap();
        assert_eq!(folded, "{\"a\":1}");
    }

    #[test]
    fn empty_blobs_are_dropped() {
        let mut asm: Assembler<Vec<u8>, ()> = Assembler::new();
        asm.blob(vec![]);
        asm.op(());
        asm.blob(vec![]);
        let program = asm.compile();
        assert_eq!(program.steps.len(), 1);
    }

    #[test]
    fn lazy_ref_initializes_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = AtomicUsize::new(0);
        let lazy: LazyRef<u32> = LazyRef::new();
        for _ in 0..3 {
            let got = lazy
                .get_or_init(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(got, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
