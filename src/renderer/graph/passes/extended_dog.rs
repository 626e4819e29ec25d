//! Extended Difference-of-Gaussians Pass
//!
//! ```text
//! source ─► RGBtoLAB ─► Lab ─┬─► (flow field) Eigenvectors ─► TFM Blur 1 ─► TFM Blur 2 ─► EigenVectors2
//!                            │                                                               │ tfm
//!                            └─► Blur 1 ─► Gaussian1 ─► Blur 2 ─► Gaussian2 ◄────────────────┤
//!                                (FDoG or non-FDoG)                  │                       │
//!                                             AntiAliasing or copy ──┴─► DifferenceOfGaussians
//!                                                                                  │
//! source ─────────────────────────────────────────────────► Blend ◄────────────────┘
//!                                                              │
//!                                                         destination
//! ```
//!
//! Lab, the structure tensor and both gaussians are transients at the
//! super-sampled size. The blurred eigenvectors and the final line term are
//! persistent, so hosts can inspect them after the frame.

use smallvec::{SmallVec, smallvec};

use crate::errors::{PostFxError, Result};
use crate::renderer::graph::context::EffectContext;
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{MaterialRef, PassNode};
use crate::renderer::graph::resource::{ColorTarget, GraphResource, ImportedId};
use crate::resources::extended_dog::{ExtendedDogSettings, ExtendedDogUniforms};

pub const EXTENDED_DOG_MATERIAL: &str = "ExtendedDifferenceOfGaussians";
pub const EIGENVECTORS_TEXTURE: &str = "_EigenVectors2";
pub const DOG_TEXTURE: &str = "_DifferenceOfGaussians";

const MATERIAL: MaterialRef = MaterialRef::new(EXTENDED_DOG_MATERIAL);

const RGB_TO_LAB_PASS: u32 = 0;
const EIGENVECTORS_PASS: u32 = 1;
const TFM_BLUR1_PASS: u32 = 2;
const TFM_BLUR2_PASS: u32 = 3;
const FDOG_BLUR1_PASS: u32 = 4;
const FDOG_BLUR2_PASS: u32 = 5;
const NON_FDOG_BLUR1_PASS: u32 = 6;
const NON_FDOG_BLUR2_PASS: u32 = 7;
const ANTI_ALIASING_PASS: u32 = 8;
const BLEND_PASS: u32 = 9;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedDogPass;

impl ExtendedDogPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostEffect for ExtendedDogPass {
    type Settings = ExtendedDogSettings;
    type State = ();

    fn name(&self) -> &'static str {
        "Extended Difference of Gaussians"
    }

    fn programs(&self, _settings: &ExtendedDogSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![EXTENDED_DOG_MATERIAL]
    }

    fn record(
        &self,
        settings: &ExtendedDogSettings,
        _state: &mut (),
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let hatch = match (settings.enable_hatching.value, settings.hatch_texture.value) {
            (true, None) => {
                return Err(PostFxError::MissingInput {
                    effect: self.name(),
                    input: "hatch_texture",
                });
            }
            (true, Some(slot)) => Some(GraphResource::Imported(ImportedId(slot))),
            (false, _) => None,
        };

        let source = ctx.source;
        let (width, height) = settings.super_sampled_size(source.desc.width, source.desc.height);
        let ss_desc = source.desc.with_size(width, height);
        let uniforms = ExtendedDogUniforms::new(settings, source.texel_size());

        let eigenvectors2 = ctx.acquire(EIGENVECTORS_TEXTURE, ss_desc)?;
        let eigenvectors2 = GraphResource::Persistent(eigenvectors2.handle);
        let dog = ctx.acquire(DOG_TEXTURE, ss_desc)?;
        let dog = GraphResource::Persistent(dog.handle);

        let lab = ctx.builder.create_transient(ss_desc);
        let gaussian1 = ctx.builder.create_transient(ss_desc);
        let gaussian2 = ctx.builder.create_transient(ss_desc);

        ctx.builder.add_pass(
            PassNode::blit("RGBtoLAB_Pass", MATERIAL, RGB_TO_LAB_PASS, source.resource, lab)
                .with_params(&uniforms),
        );

        let tfm = if settings.needs_flow_field() {
            let structure_tensor = ctx.builder.create_transient(ss_desc);
            let eigenvectors1 = ctx.builder.create_transient(ss_desc);
            ctx.builder
                .add_pass(
                    PassNode::blit(
                        "CalcEigenvectors_Pass",
                        MATERIAL,
                        EIGENVECTORS_PASS,
                        lab,
                        structure_tensor,
                    )
                    .with_params(&uniforms),
                )
                .add_pass(
                    PassNode::blit(
                        "TFMBlur1_Pass",
                        MATERIAL,
                        TFM_BLUR1_PASS,
                        structure_tensor,
                        eigenvectors1,
                    )
                    .with_params(&uniforms),
                )
                .add_pass(
                    PassNode::blit(
                        "TFMBlur2_Pass",
                        MATERIAL,
                        TFM_BLUR2_PASS,
                        eigenvectors1,
                        eigenvectors2,
                    )
                    .with_params(&uniforms),
                );
            Some(eigenvectors2)
        } else {
            None
        };

        let (blur1, blur2) = if settings.use_flow.value {
            (
                ("FDoGBlur1_Pass", FDOG_BLUR1_PASS),
                ("FDoGBlur2_Pass", FDOG_BLUR2_PASS),
            )
        } else {
            (
                ("NonFDoGBlur1_Pass", NON_FDOG_BLUR1_PASS),
                ("NonFDoGBlur2_Pass", NON_FDOG_BLUR2_PASS),
            )
        };
        let with_tfm = |pass: PassNode| match tfm {
            Some(tfm) if settings.use_flow.value => pass.read(tfm, "tfm"),
            _ => pass,
        };
        ctx.builder
            .add_pass(with_tfm(
                PassNode::blit(blur1.0, MATERIAL, blur1.1, lab, gaussian1).with_params(&uniforms),
            ))
            .add_pass(with_tfm(
                PassNode::blit(blur2.0, MATERIAL, blur2.1, gaussian1, gaussian2)
                    .with_params(&uniforms),
            ));

        match tfm {
            Some(tfm) if settings.smooth_edges.value => {
                ctx.builder.add_pass(
                    PassNode::blit("AntiAliasing_Pass", MATERIAL, ANTI_ALIASING_PASS, gaussian2, dog)
                        .read(tfm, "tfm")
                        .with_params(&uniforms),
                );
            }
            _ => {
                ctx.builder
                    .add_pass(PassNode::copy("Copy Difference of Gaussians", gaussian2, dog));
            }
        }

        let destination = ctx.create_destination();
        let mut blend = PassNode::blit(
            "Blend_Pass",
            MATERIAL,
            BLEND_PASS,
            source.resource,
            destination.resource,
        )
        .read(dog, "dog")
        .with_params(&uniforms);
        if let Some(hatch) = hatch {
            blend = blend.read(hatch, "hatch");
        }
        ctx.builder.add_pass(blend);

        Ok(destination)
    }
}
