//! Difference-of-Gaussians Pass
//!
//! ```text
//! source ─[0]─► Gaussian1 (transient) ─[1]─► Gaussian2 (persistent)
//!    │                                            │
//!    └──────────────────[2] Blend ◄───────────────┘
//!                          │
//!                     destination
//! ```

use smallvec::{SmallVec, smallvec};

use crate::errors::Result;
use crate::renderer::graph::context::EffectContext;
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{MaterialRef, PassNode};
use crate::renderer::graph::resource::{ColorTarget, GraphResource};
use crate::resources::dog::{DifferenceOfGaussiansSettings, DifferenceOfGaussiansUniforms};

pub const DOG_MATERIAL: &str = "DifferenceOfGaussians";
pub const GAUSSIAN2_TEXTURE: &str = "DoG_Gaussian2";

const MATERIAL: MaterialRef = MaterialRef::new(DOG_MATERIAL);

#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceOfGaussiansPass;

impl DifferenceOfGaussiansPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostEffect for DifferenceOfGaussiansPass {
    type Settings = DifferenceOfGaussiansSettings;
    type State = ();

    fn name(&self) -> &'static str {
        "Difference of Gaussians"
    }

    fn programs(&self, _settings: &DifferenceOfGaussiansSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![DOG_MATERIAL]
    }

    fn record(
        &self,
        settings: &DifferenceOfGaussiansSettings,
        _state: &mut (),
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let source = ctx.source;
        let uniforms = DifferenceOfGaussiansUniforms::new(settings, source.texel_size());

        let gaussian2 = ctx.acquire(GAUSSIAN2_TEXTURE, source.desc)?;
        let gaussian2 = GraphResource::Persistent(gaussian2.handle);
        let gaussian1 = ctx.builder.create_transient(source.desc);
        let destination = ctx.create_destination();

        ctx.builder
            .add_pass(
                PassNode::blit("DOG - Gaussian1", MATERIAL, 0, source.resource, gaussian1)
                    .with_params(&uniforms),
            )
            .add_pass(
                PassNode::blit("DOG - Gaussian2", MATERIAL, 1, gaussian1, gaussian2)
                    .with_params(&uniforms),
            )
            .add_pass(
                PassNode::blit(
                    "Difference of Gaussians",
                    MATERIAL,
                    2,
                    source.resource,
                    destination.resource,
                )
                .read(gaussian2, "gaussian")
                .with_params(&uniforms),
            );

        Ok(destination)
    }
}
