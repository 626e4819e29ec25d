//! Pass Graph Builder
//!
//! `PassGraphBuilder` collects the passes every active effect declares for
//! one frame, in declaration order, and emits a [`PassGraph`].
//!
//! # Effect scopes
//!
//! Each effect records inside a scope opened by
//! [`begin_effect`](PassGraphBuilder::begin_effect). The scope enforces the
//! backbuffer precondition before any pass exists, and lets a failing effect
//! roll back with [`abort_effect`](PassGraphBuilder::abort_effect) so the
//! emitted graph never contains half an effect.
//!
//! ```text
//! begin_effect ─► add_pass … add_pass ─► end_effect
//!                        │
//!                        └─ error ─► abort_effect (truncate)
//! ```

use smallvec::SmallVec;

use crate::errors::{PostFxError, Result};

use super::graph::PassGraph;
use super::pass::PassNode;
use super::resource::{ColorTarget, GraphResource, TextureDesc, TransientId};

/// Recording position at the start of an effect.
#[derive(Debug, Clone, Copy)]
struct EffectScope {
    effect: &'static str,
    pass_start: usize,
    transient_start: usize,
}

/// Per-frame recorder of pass descriptors.
///
/// # Usage
///
/// ```ignore
/// let mut builder = PassGraphBuilder::new();
/// builder.begin_effect("Blur", &source)?;
/// let tmp = builder.create_transient(source.desc);
/// builder.add_pass(PassNode::blit("Blur X", BLUR, 0, source.resource, tmp));
/// builder.add_pass(PassNode::blit("Blur Y", BLUR, 1, tmp, destination));
/// builder.end_effect();
/// let graph = builder.build();
/// ```
#[derive(Debug, Default)]
pub struct PassGraphBuilder {
    passes: Vec<PassNode>,
    transients: SmallVec<[TextureDesc; 16]>,
    scope: Option<EffectScope>,
}

impl PassGraphBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a recording scope for `effect`.
    ///
    /// Fails with [`PostFxError::BackbufferTarget`] when `source` is the
    /// backbuffer; nothing is recorded in that case.
    pub fn begin_effect(&mut self, effect: &'static str, source: &ColorTarget) -> Result<()> {
        debug_assert!(self.scope.is_none(), "effect scopes do not nest");
        if source.is_backbuffer() {
            return Err(PostFxError::BackbufferTarget { effect });
        }
        self.scope = Some(EffectScope {
            effect,
            pass_start: self.passes.len(),
            transient_start: self.transients.len(),
        });
        Ok(())
    }

    /// Closes the current scope, keeping its passes.
    pub fn end_effect(&mut self) {
        self.scope = None;
    }

    /// Closes the current scope and drops every pass and transient it
    /// declared. Returns the number of passes dropped.
    pub fn abort_effect(&mut self) -> usize {
        let Some(scope) = self.scope.take() else {
            return 0;
        };
        let dropped = self.passes.len() - scope.pass_start;
        self.passes.truncate(scope.pass_start);
        self.transients.truncate(scope.transient_start);
        if dropped > 0 {
            log::debug!("Discarded {dropped} recorded passes of {}", scope.effect);
        }
        dropped
    }

    /// Name of the effect currently recording.
    #[inline]
    #[must_use]
    pub fn current_effect(&self) -> Option<&'static str> {
        self.scope.map(|s| s.effect)
    }

    /// Declares a texture that lives for this frame only.
    pub fn create_transient(&mut self, desc: TextureDesc) -> GraphResource {
        let id = TransientId(self.transients.len() as u32);
        self.transients.push(desc);
        GraphResource::Transient(id)
    }

    #[inline]
    #[must_use]
    pub fn transient_desc(&self, id: TransientId) -> Option<&TextureDesc> {
        self.transients.get(id.index())
    }

    /// Appends a pass. Passes are never reordered.
    pub fn add_pass(&mut self, pass: PassNode) -> &mut Self {
        self.passes.push(pass);
        self
    }

    #[inline]
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    #[must_use]
    pub fn passes(&self) -> &[PassNode] {
        &self.passes
    }

    /// Emits the frame's graph and resets the builder.
    pub fn build(&mut self) -> PassGraph {
        if let Some(scope) = self.scope.take() {
            log::warn!("Effect scope `{}` was never closed", scope.effect);
        }

        let graph = PassGraph {
            passes: std::mem::take(&mut self.passes),
            transients: self.transients.drain(..).collect(),
        };

        if cfg!(debug_assertions)
            && let Err(e) = graph.validate()
        {
            log::warn!("{e}");
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::graph::pass::MaterialRef;
    use crate::renderer::graph::resource::ImportedId;

    const MAT: MaterialRef = MaterialRef::new("Test");

    fn source() -> ColorTarget {
        ColorTarget::new(
            GraphResource::Imported(ImportedId(0)),
            TextureDesc::color(64, 64, wgpu::TextureFormat::Rgba16Float),
        )
    }

    #[test]
    fn backbuffer_source_is_rejected_before_recording() {
        let mut b = PassGraphBuilder::new();
        let bb = ColorTarget::new(GraphResource::Backbuffer, source().desc);
        let err = b.begin_effect("Fx", &bb).unwrap_err();
        assert!(matches!(err, PostFxError::BackbufferTarget { effect: "Fx" }));
        assert_eq!(b.pass_count(), 0);
        assert_eq!(b.current_effect(), None);
    }

    #[test]
    fn abort_truncates_only_current_effect() {
        let mut b = PassGraphBuilder::new();
        let src = source();

        b.begin_effect("A", &src).unwrap();
        let t = b.create_transient(src.desc);
        b.add_pass(PassNode::blit("A0", MAT, 0, src.resource, t));
        b.end_effect();

        b.begin_effect("B", &src).unwrap();
        let t2 = b.create_transient(src.desc);
        b.add_pass(PassNode::blit("B0", MAT, 0, t, t2));
        b.add_pass(PassNode::blit("B1", MAT, 1, t2, t));
        assert_eq!(b.abort_effect(), 2);

        let graph = b.build();
        assert_eq!(graph.pass_names().collect::<Vec<_>>(), ["A0"]);
        assert_eq!(graph.transients().len(), 1);
    }

    #[test]
    fn declaration_order_is_preserved() {
        let mut b = PassGraphBuilder::new();
        let src = source();
        b.begin_effect("Fx", &src).unwrap();
        let t = b.create_transient(src.desc);
        b.add_pass(PassNode::blit("second", MAT, 1, t, src.resource));
        b.add_pass(PassNode::blit("first", MAT, 0, src.resource, t));
        b.end_effect();
        let graph = b.build();
        assert_eq!(graph.pass_names().collect::<Vec<_>>(), ["second", "first"]);
        // Read-before-write of a transient is reported, not fixed.
        assert!(graph.validate().is_err());
    }
}
