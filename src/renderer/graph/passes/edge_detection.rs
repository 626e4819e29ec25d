//! Edge Detection Pass
//!
//! Outlines depth and normal discontinuities in one blit.

use smallvec::{SmallVec, smallvec};

use crate::errors::{PostFxError, Result};
use crate::renderer::graph::context::EffectContext;
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{MaterialRef, PassNode};
use crate::renderer::graph::resource::ColorTarget;
use crate::resources::edge_detection::{EdgeDetectionSettings, EdgeDetectionUniforms};

pub const EDGE_DETECTION_MATERIAL: &str = "EdgeDetection";

#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetectionPass;

impl EdgeDetectionPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostEffect for EdgeDetectionPass {
    type Settings = EdgeDetectionSettings;
    type State = ();

    fn name(&self) -> &'static str {
        "Edge Detection"
    }

    fn programs(&self, _settings: &EdgeDetectionSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![EDGE_DETECTION_MATERIAL]
    }

    fn record(
        &self,
        settings: &EdgeDetectionSettings,
        _state: &mut (),
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let Some(depth) = ctx.frame.depth else {
            return Err(PostFxError::MissingInput {
                effect: self.name(),
                input: "depth",
            });
        };

        let source = ctx.source;
        let camera = &ctx.frame.camera;
        let uniforms =
            EdgeDetectionUniforms::new(settings, source.texel_size(), camera.near, camera.far);
        let normals = ctx.frame.normals;

        let destination = ctx.create_destination();
        let mut pass = PassNode::blit(
            "Edge Detection",
            MaterialRef::new(EDGE_DETECTION_MATERIAL),
            0,
            source.resource,
            destination.resource,
        )
        .read(depth, "depth")
        .with_params(&uniforms);
        if let Some(normals) = normals {
            pass = pass.read(normals, "normals");
        }
        ctx.builder.add_pass(pass);

        Ok(destination)
    }
}
