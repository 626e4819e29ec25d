//! Shared fixtures for the integration tests.
//!
//! `RecordingBackend` is a GPU-less backend that records every allocation,
//! destruction and executed graph, so tests can count what the stack asked
//! the GPU to do.

#![allow(dead_code)]

use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use pulse_fx::errors::{PostFxError, Result};
use pulse_fx::renderer::graph::{
    CameraData, ColorTarget, FrameInputs, GraphExecutor, GraphResource, ImportedId, PassGraph,
    PassOp, ResourceAllocator, ResourceDesc, ResourceHandle, TextureDesc,
};

pub const COLOR: ImportedId = ImportedId(0);
pub const DEPTH: ImportedId = ImportedId(1);
pub const NORMALS: ImportedId = ImportedId(2);

/// Every program the built-in effects use.
pub const ALL_PROGRAMS: [&str; 8] = [
    "GTAO",
    "EdgeDetection",
    "DifferenceOfGaussians",
    "ExtendedDifferenceOfGaussians",
    "LogHistogram",
    "AutoExposure",
    "AutoExposureApply",
    "ToneMapping",
];

/// Routes `log` output of the stack to the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct RecordingBackend {
    pub live: SlotMap<ResourceHandle, (String, ResourceDesc)>,
    pub created: Vec<String>,
    pub destroyed: usize,
    pub graphs: Vec<PassGraph>,
    pub missing_programs: FxHashSet<&'static str>,
    /// Labels containing this string fail to allocate.
    pub fail_allocation: Option<&'static str>,
    pub fail_execution: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_program(mut self, program: &'static str) -> Self {
        self.missing_programs.insert(program);
        self
    }

    pub fn last_graph(&self) -> &PassGraph {
        self.graphs.last().expect("no graph executed")
    }

    pub fn last_pass_names(&self) -> Vec<&'static str> {
        self.last_graph().pass_names().collect()
    }

    /// Dispatch and blit passes across every executed graph.
    pub fn program_invocations(&self) -> usize {
        self.graphs
            .iter()
            .flat_map(PassGraph::passes)
            .filter(|p| matches!(p.op, PassOp::Dispatch { .. } | PassOp::Blit { .. }))
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl ResourceAllocator for RecordingBackend {
    fn create_resource(&mut self, label: &str, desc: &ResourceDesc) -> Result<ResourceHandle> {
        if let Some(pattern) = self.fail_allocation
            && label.contains(pattern)
        {
            return Err(PostFxError::Allocation {
                name: label.to_owned(),
                reason: "out of memory".to_owned(),
            });
        }
        self.created.push(label.to_owned());
        Ok(self.live.insert((label.to_owned(), *desc)))
    }

    fn destroy_resource(&mut self, handle: ResourceHandle) {
        if self.live.remove(handle).is_some() {
            self.destroyed += 1;
        }
    }
}

impl GraphExecutor for RecordingBackend {
    fn has_program(&self, program: &str) -> bool {
        ALL_PROGRAMS.contains(&program) && !self.missing_programs.contains(program)
    }

    fn execute(&mut self, graph: &PassGraph) -> Result<()> {
        self.graphs.push(graph.clone());
        if self.fail_execution {
            return Err(PostFxError::Execution("device lost".to_owned()));
        }
        Ok(())
    }
}

pub fn color_desc(width: u32, height: u32) -> TextureDesc {
    TextureDesc::color(width, height, wgpu::TextureFormat::Rgba16Float)
}

pub fn scene_color(width: u32, height: u32) -> ColorTarget {
    ColorTarget::new(GraphResource::Imported(COLOR), color_desc(width, height))
}

/// Frame inputs with color, depth and normals at `width`×`height`.
pub fn inputs(width: u32, height: u32) -> FrameInputs {
    FrameInputs::new(scene_color(width, height), CameraData::default(), 1.0 / 60.0)
        .with_depth(GraphResource::Imported(DEPTH))
        .with_normals(GraphResource::Imported(NORMALS))
}
