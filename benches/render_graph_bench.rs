//! Frame recording benchmarks.
//! Run: cargo bench
//!
//! Measures CPU-side cost only: graph recording against a backend that
//! allocates handles and discards the executed graph.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use slotmap::SlotMap;

use pulse_fx::errors::Result;
use pulse_fx::renderer::graph::{
    CameraData, ColorTarget, FrameInputs, GraphExecutor, GraphResource, ImportedId, PassGraph,
    PostProcessStack, ResourceAllocator, ResourceDesc, ResourceHandle, TextureDesc,
};
use pulse_fx::resources::PostProcessVolume;
use pulse_fx::resources::auto_exposure::{AutoExposureSettings, ExposureMeteringEngine};
use pulse_fx::resources::log_histogram::LogHistogram;

#[derive(Default)]
struct NullBackend {
    resources: SlotMap<ResourceHandle, ResourceDesc>,
    passes: usize,
}

impl ResourceAllocator for NullBackend {
    fn create_resource(&mut self, _label: &str, desc: &ResourceDesc) -> Result<ResourceHandle> {
        Ok(self.resources.insert(*desc))
    }

    fn destroy_resource(&mut self, handle: ResourceHandle) {
        self.resources.remove(handle);
    }
}

impl GraphExecutor for NullBackend {
    fn has_program(&self, _program: &str) -> bool {
        true
    }

    fn execute(&mut self, graph: &PassGraph) -> Result<()> {
        self.passes += graph.len();
        Ok(())
    }
}

fn full_volume() -> PostProcessVolume {
    let mut volume = PostProcessVolume::default();
    volume.gtao.enabled.set(true);
    volume.edge_detection.enabled.set(true);
    volume.dog.set_kernel_size(5);
    volume.extended_dog.enabled.set(true);
    volume.auto_exposure.enabled.set(true);
    volume.tone_mapping.enabled.set(true);
    volume
}

fn frame_inputs() -> FrameInputs {
    let color = ColorTarget::new(
        GraphResource::Imported(ImportedId(0)),
        TextureDesc::color(1920, 1080, wgpu::TextureFormat::Rgba16Float),
    );
    FrameInputs::new(color, CameraData::default(), 1.0 / 60.0)
        .with_depth(GraphResource::Imported(ImportedId(1)))
}

fn bench_record_frame(c: &mut Criterion) {
    let volume = full_volume();
    let inputs = frame_inputs();

    let mut group = c.benchmark_group("render_graph");

    group.bench_function("full_stack_steady_state", |b| {
        let mut backend = NullBackend::default();
        let mut stack = PostProcessStack::new();
        b.iter(|| {
            black_box(
                stack
                    .render_frame(&mut backend, black_box(&volume), &inputs)
                    .expect("render"),
            )
        });
    });

    group.bench_function("all_inactive", |b| {
        let mut backend = NullBackend::default();
        let mut stack = PostProcessStack::new();
        let volume = PostProcessVolume::default();
        b.iter(|| {
            black_box(
                stack
                    .render_frame(&mut backend, &volume, &inputs)
                    .expect("render"),
            )
        });
    });

    group.finish();
}

fn bench_metering(c: &mut Criterion) {
    let settings = AutoExposureSettings::default();
    let mut histogram = LogHistogram::default();
    histogram.accumulate_all((0..65_536).map(|i| (i % 1024) as f32 / 64.0));

    c.bench_function("metering_adapt", |b| {
        let mut engine = ExposureMeteringEngine::new();
        b.iter(|| black_box(engine.adapt(black_box(&histogram), &settings, 1.0 / 60.0)));
    });
}

criterion_group!(benches, bench_record_frame, bench_metering);
criterion_main!(benches);
