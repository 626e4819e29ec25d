//! Pass Graph
//!
//! The immutable output of one frame's recording, and the interfaces a GPU
//! backend implements to run it.
//!
//! # Execution model
//!
//! - Passes run strictly in declaration order
//! - One submission per frame
//! - Barriers are derived from each pass's access flags

use crate::errors::{PostFxError, Result};

use super::pass::PassNode;
use super::pool::ResourceAllocator;
use super::resource::{GraphResource, TextureDesc, TransientId};

/// One frame's ordered pass list plus its transient texture table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassGraph {
    pub(crate) passes: Vec<PassNode>,
    pub(crate) transients: Vec<TextureDesc>,
}

impl PassGraph {
    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[PassNode] {
        &self.passes
    }

    #[inline]
    #[must_use]
    pub fn transients(&self) -> &[TextureDesc] {
        &self.transients
    }

    #[inline]
    #[must_use]
    pub fn transient_desc(&self, id: TransientId) -> Option<&TextureDesc> {
        self.transients.get(id.index())
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Pass names in execution order.
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name)
    }

    /// Checks that every transient read is preceded by a write of the same
    /// transient, and that every transient reference is in range.
    pub fn validate(&self) -> Result<()> {
        let mut written = vec![false; self.transients.len()];

        for pass in &self.passes {
            for resource in pass.reads() {
                if let GraphResource::Transient(id) = resource {
                    match written.get(id.index()) {
                        Some(true) => {}
                        Some(false) => {
                            return Err(PostFxError::Execution(format!(
                                "pass `{}` reads transient #{} before any pass writes it",
                                pass.name,
                                id.index()
                            )));
                        }
                        None => {
                            return Err(PostFxError::Execution(format!(
                                "pass `{}` references unknown transient #{}",
                                pass.name,
                                id.index()
                            )));
                        }
                    }
                }
            }
            for resource in pass.writes() {
                if let GraphResource::Transient(id) = resource {
                    let Some(slot) = written.get_mut(id.index()) else {
                        return Err(PostFxError::Execution(format!(
                            "pass `{}` references unknown transient #{}",
                            pass.name,
                            id.index()
                        )));
                    };
                    *slot = true;
                }
            }
        }

        Ok(())
    }
}

/// Executes recorded pass graphs. One implementation per GPU API.
pub trait GraphExecutor {
    /// Whether the named program (kernel or material) is loaded.
    fn has_program(&self, program: &str) -> bool;

    /// Runs every pass of `graph` in order and submits the work.
    fn execute(&mut self, graph: &PassGraph) -> Result<()>;
}

/// Everything the post-processing stack needs from a GPU backend.
pub trait GpuBackend: ResourceAllocator + GraphExecutor {}

impl<T: ResourceAllocator + GraphExecutor> GpuBackend for T {}
