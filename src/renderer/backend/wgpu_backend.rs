//! `wgpu` Backend
//!
//! [`WgpuBackend`] implements [`ResourceAllocator`] and [`GraphExecutor`] on
//! top of a `wgpu::Device`/`wgpu::Queue` pair.
//!
//! | Operation | Encoding |
//! |-----------|----------|
//! | `Clear` (texture) | Render pass with `LoadOp::Clear` |
//! | `Clear` (buffer) | `clear_buffer`, or a copy from a filled staging buffer |
//! | `Copy` | `copy_texture_to_texture` / `copy_buffer_to_buffer` |
//! | `Dispatch` / `Blit` | Forwarded to the registered [`WgpuProgram`] |
//!
//! Each pass is wrapped in a debug group named after it. The whole graph is
//! encoded into one command encoder and submitted once. `wgpu` tracks
//! resource states itself, so declared accesses are only validated here
//! (every referenced resource must resolve) before encoding begins.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use crate::errors::{PostFxError, Result};
use crate::renderer::graph::{
    GraphExecutor, GraphResource, ImportedId, PassGraph, PassNode, PassOp, ResourceAllocator,
    ResourceDesc, ResourceHandle,
};

use super::transient_pool::TransientTexturePool;

// ─── Resources ───────────────────────────────────────────────────────────────

/// A persistent GPU resource.
pub enum WgpuResource {
    Texture {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
    },
    Buffer {
        buffer: wgpu::Buffer,
    },
}

/// A host-owned texture bound to an [`ImportedId`] or to the backbuffer.
pub struct ImportedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl ImportedTexture {
    #[must_use]
    pub fn new(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Resolves graph references to GPU objects while a graph is encoded.
pub struct ResolvedResources<'a> {
    persistent: &'a SlotMap<ResourceHandle, WgpuResource>,
    imported: &'a FxHashMap<ImportedId, ImportedTexture>,
    backbuffer: Option<&'a ImportedTexture>,
    transients: &'a TransientTexturePool,
}

impl ResolvedResources<'_> {
    /// The texture behind `resource`, if it is one.
    #[must_use]
    pub fn texture(&self, resource: GraphResource) -> Option<&wgpu::Texture> {
        match resource {
            GraphResource::Persistent(handle) => match self.persistent.get(handle)? {
                WgpuResource::Texture { texture, .. } => Some(texture),
                WgpuResource::Buffer { .. } => None,
            },
            GraphResource::Transient(id) => self.transients.get(id).map(|t| &t.texture),
            GraphResource::Imported(id) => self.imported.get(&id).map(|t| &t.texture),
            GraphResource::Backbuffer => self.backbuffer.map(|t| &t.texture),
        }
    }

    /// The default view of the texture behind `resource`.
    #[must_use]
    pub fn view(&self, resource: GraphResource) -> Option<&wgpu::TextureView> {
        match resource {
            GraphResource::Persistent(handle) => match self.persistent.get(handle)? {
                WgpuResource::Texture { view, .. } => Some(view),
                WgpuResource::Buffer { .. } => None,
            },
            GraphResource::Transient(id) => self.transients.get(id).map(|t| &t.view),
            GraphResource::Imported(id) => self.imported.get(&id).map(|t| &t.view),
            GraphResource::Backbuffer => self.backbuffer.map(|t| &t.view),
        }
    }

    /// The buffer behind `resource`, if it is one.
    #[must_use]
    pub fn buffer(&self, resource: GraphResource) -> Option<&wgpu::Buffer> {
        match resource {
            GraphResource::Persistent(handle) => match self.persistent.get(handle)? {
                WgpuResource::Buffer { buffer } => Some(buffer),
                WgpuResource::Texture { .. } => None,
            },
            _ => None,
        }
    }

    fn exists(&self, resource: GraphResource) -> bool {
        self.texture(resource).is_some() || self.buffer(resource).is_some()
    }
}

// ─── Programs ────────────────────────────────────────────────────────────────

/// A caller-supplied GPU program (compute kernel set or full-screen material).
///
/// Implementations build their pipelines and bind groups from the pass's
/// declared accesses (looked up by binding name) and its parameter block.
pub trait WgpuProgram {
    fn encode(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassNode,
        resources: &ResolvedResources<'_>,
    ) -> Result<()>;
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// `wgpu` implementation of the post-processing backend.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    resources: SlotMap<ResourceHandle, WgpuResource>,
    imported: FxHashMap<ImportedId, ImportedTexture>,
    backbuffer: Option<ImportedTexture>,
    transients: TransientTexturePool,
    programs: FxHashMap<&'static str, Box<dyn WgpuProgram>>,
}

impl WgpuBackend {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            resources: SlotMap::with_key(),
            imported: FxHashMap::default(),
            backbuffer: None,
            transients: TransientTexturePool::new(),
            programs: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Registers (or replaces) the program passes refer to as `name`.
    pub fn register_program(&mut self, name: &'static str, program: impl WgpuProgram + 'static) {
        if self.programs.insert(name, Box::new(program)).is_some() {
            log::debug!("Replaced GPU program `{name}`");
        }
    }

    /// Binds a host texture (scene color, depth, LUT) to `id`.
    pub fn import_texture(&mut self, id: ImportedId, texture: wgpu::Texture) {
        self.imported.insert(id, ImportedTexture::new(texture));
    }

    pub fn release_imported(&mut self, id: ImportedId) {
        self.imported.remove(&id);
    }

    /// Sets the swap-chain image for the next graph.
    pub fn set_backbuffer(&mut self, texture: Option<wgpu::Texture>) {
        self.backbuffer = texture.map(ImportedTexture::new);
    }

    /// Drops transient textures idle for more than `max_idle_frames` frames.
    pub fn trim_transients(&mut self, max_idle_frames: u32) {
        self.transients.trim(max_idle_frames);
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    fn validate_desc(&self, label: &str, desc: &ResourceDesc) -> Result<()> {
        let limits = self.device.limits();
        let reason = match desc {
            ResourceDesc::Texture(t) if t.width == 0 || t.height == 0 => {
                Some("zero-sized texture".to_owned())
            }
            ResourceDesc::Texture(t)
                if t.width > limits.max_texture_dimension_2d
                    || t.height > limits.max_texture_dimension_2d =>
            {
                Some(format!(
                    "{}x{} exceeds the device limit of {}",
                    t.width, t.height, limits.max_texture_dimension_2d
                ))
            }
            ResourceDesc::Buffer(b) if b.size == 0 => Some("zero-sized buffer".to_owned()),
            ResourceDesc::Buffer(b) if b.size > limits.max_buffer_size => Some(format!(
                "{} bytes exceeds the device limit of {}",
                b.size, limits.max_buffer_size
            )),
            _ => None,
        };

        match reason {
            Some(reason) => Err(PostFxError::Allocation {
                name: label.to_owned(),
                reason,
            }),
            None => Ok(()),
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PassNode,
        resources: &ResolvedResources<'_>,
    ) -> Result<()> {
        match &pass.op {
            PassOp::Clear { target, value } => {
                if let Some(view) = resources.view(*target) {
                    let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(pass.name),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: f64::from(*value),
                                    g: 0.0,
                                    b: 0.0,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        ..Default::default()
                    });
                } else if let Some(buffer) = resources.buffer(*target) {
                    if value.to_bits() == 0 {
                        encoder.clear_buffer(buffer, 0, None);
                    } else {
                        let words = (buffer.size() / 4) as usize;
                        let fill = vec![value.to_bits(); words];
                        let staging =
                            self.device
                                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                    label: Some(pass.name),
                                    contents: bytemuck::cast_slice(&fill),
                                    usage: wgpu::BufferUsages::COPY_SRC,
                                });
                        encoder.copy_buffer_to_buffer(&staging, 0, buffer, 0, (words * 4) as u64);
                    }
                }
                Ok(())
            }
            PassOp::Copy {
                source,
                destination,
            } => {
                if let (Some(src), Some(dst)) =
                    (resources.texture(*source), resources.texture(*destination))
                {
                    encoder.copy_texture_to_texture(
                        src.as_image_copy(),
                        dst.as_image_copy(),
                        src.size(),
                    );
                } else if let (Some(src), Some(dst)) =
                    (resources.buffer(*source), resources.buffer(*destination))
                {
                    encoder.copy_buffer_to_buffer(src, 0, dst, 0, src.size().min(dst.size()));
                } else {
                    return Err(PostFxError::Execution(format!(
                        "pass `{}` copies between incompatible resources",
                        pass.name
                    )));
                }
                Ok(())
            }
            PassOp::Dispatch { .. } | PassOp::Blit { .. } => {
                let Some(name) = pass.op.program() else {
                    return Ok(());
                };
                let program = self.programs.get(name).ok_or_else(|| {
                    PostFxError::Execution(format!(
                        "pass `{}` uses unregistered program `{name}`",
                        pass.name
                    ))
                })?;
                program.encode(&self.device, encoder, pass, resources)
            }
        }
    }
}

impl ResourceAllocator for WgpuBackend {
    fn create_resource(&mut self, label: &str, desc: &ResourceDesc) -> Result<ResourceHandle> {
        self.validate_desc(label, desc)?;

        let resource = match desc {
            ResourceDesc::Texture(t) => {
                let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: t.extent(),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: t.format,
                    usage: t.usage,
                    view_formats: &[],
                });
                let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
                WgpuResource::Texture { texture, view }
            }
            ResourceDesc::Buffer(b) => WgpuResource::Buffer {
                buffer: self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size: b.size,
                    usage: b.usage,
                    mapped_at_creation: false,
                }),
            },
        };

        log::debug!("Allocated {label}");
        Ok(self.resources.insert(resource))
    }

    fn destroy_resource(&mut self, handle: ResourceHandle) {
        match self.resources.remove(handle) {
            Some(WgpuResource::Texture { texture, .. }) => texture.destroy(),
            Some(WgpuResource::Buffer { buffer }) => buffer.destroy(),
            None => {}
        }
    }
}

impl GraphExecutor for WgpuBackend {
    fn has_program(&self, program: &str) -> bool {
        self.programs.contains_key(program)
    }

    fn execute(&mut self, graph: &PassGraph) -> Result<()> {
        if graph.is_empty() {
            return Ok(());
        }

        self.transients.bind_graph(&self.device, graph);

        let result = {
            let resources = ResolvedResources {
                persistent: &self.resources,
                imported: &self.imported,
                backbuffer: self.backbuffer.as_ref(),
                transients: &self.transients,
            };
            self.encode_graph(graph, &resources)
        };

        match result {
            Ok(commands) => {
                self.queue.submit(Some(commands));
                self.transients.reset();
                Ok(())
            }
            Err(e) => {
                self.transients.reset();
                Err(e)
            }
        }
    }
}

impl WgpuBackend {
    fn encode_graph(
        &self,
        graph: &PassGraph,
        resources: &ResolvedResources<'_>,
    ) -> Result<wgpu::CommandBuffer> {
        for pass in graph.passes() {
            if let Some(access) = pass.accesses.iter().find(|a| !resources.exists(a.resource)) {
                return Err(PostFxError::Execution(format!(
                    "pass `{}` binds unresolved resource `{}` ({:?})",
                    pass.name, access.binding, access.resource
                )));
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Post Process"),
            });

        for pass in graph.passes() {
            encoder.push_debug_group(pass.name);
            let encoded = self.encode_pass(&mut encoder, pass, resources);
            encoder.pop_debug_group();
            encoded?;
        }

        Ok(encoder.finish())
    }
}
