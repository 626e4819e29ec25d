//! Tone Mapping Pass
//!
//! Single full-screen blit selecting the operator by material pass index.
//! The custom operator additionally reads the imported 3D LUT.

use smallvec::{SmallVec, smallvec};

use crate::errors::{PostFxError, Result};
use crate::renderer::graph::context::EffectContext;
use crate::renderer::graph::node::PostEffect;
use crate::renderer::graph::pass::{MaterialRef, PassNode};
use crate::renderer::graph::resource::{ColorTarget, GraphResource, ImportedId};
use crate::resources::tone_mapping::{ToneMapper, ToneMappingSettings, ToneMappingUniforms};

pub const TONE_MAPPING_MATERIAL: &str = "ToneMapping";

#[derive(Debug, Clone, Copy, Default)]
pub struct ToneMappingPass;

impl ToneMappingPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PostEffect for ToneMappingPass {
    type Settings = ToneMappingSettings;
    type State = ();

    fn name(&self) -> &'static str {
        "Tone Mapping"
    }

    fn programs(&self, _settings: &ToneMappingSettings) -> SmallVec<[&'static str; 4]> {
        smallvec![TONE_MAPPING_MATERIAL]
    }

    fn record(
        &self,
        settings: &ToneMappingSettings,
        _state: &mut (),
        ctx: &mut EffectContext<'_>,
    ) -> Result<ColorTarget> {
        let mapper = settings.tone_mapper.value;
        let lut = settings.active_lut();

        if mapper == ToneMapper::Custom && lut.is_none() {
            return Err(PostFxError::MissingInput {
                effect: self.name(),
                input: "lut",
            });
        }

        let source = ctx.source;
        let destination = ctx.create_destination();

        let mut pass = PassNode::blit(
            "Tone Mapping",
            MaterialRef::new(TONE_MAPPING_MATERIAL),
            mapper.pass_index(),
            source.resource,
            destination.resource,
        )
        .with_params(&ToneMappingUniforms::new(settings));
        if let Some(lut) = lut {
            pass = pass.read(GraphResource::Imported(ImportedId(lut.texture)), "lut");
        }
        ctx.builder.add_pass(pass);

        Ok(destination)
    }
}
