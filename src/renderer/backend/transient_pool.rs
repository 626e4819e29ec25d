//! Transient Texture Pool
//!
//! Backs the per-frame transient textures of a [`PassGraph`] with real GPU
//! textures. Before execution every transient of the graph is bound to a
//! pooled texture; after submission all of them return to the free list and
//! are reused by the next frame.
//!
//! ```text
//!  bind_graph(graph) ─► active[TransientId] ─► execute ─► reset()
//!        ▲                                                   │
//!        └──────────── free: FxHashMap<TextureDesc, Vec> ◄───┘
//! ```
//!
//! Textures are only destroyed by [`TransientTexturePool::trim`], which
//! drops free textures left idle for too many frames (stale resolutions).

use rustc_hash::FxHashMap;

use crate::renderer::graph::{PassGraph, TextureDesc, TransientId};

/// A pooled texture with its default view.
pub(crate) struct PooledTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    desc: TextureDesc,
    idle_frames: u32,
}

impl PooledTexture {
    fn new(device: &wgpu::Device, desc: &TextureDesc) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("PostFx Transient"),
            size: desc.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            desc: *desc,
            idle_frames: 0,
        }
    }
}

/// Free-list of transient GPU textures keyed by description.
#[derive(Default)]
pub struct TransientTexturePool {
    /// Textures bound to the current graph, indexed by [`TransientId`].
    active: Vec<PooledTexture>,
    free: FxHashMap<TextureDesc, Vec<PooledTexture>>,
}

impl TransientTexturePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds every transient of `graph` to a pooled texture.
    ///
    /// Any binding left from a previous graph is returned to the pool first.
    pub fn bind_graph(&mut self, device: &wgpu::Device, graph: &PassGraph) {
        self.reset();
        for desc in graph.transients() {
            let pooled = self
                .free
                .get_mut(desc)
                .and_then(Vec::pop)
                .map_or_else(
                    || PooledTexture::new(device, desc),
                    |mut t| {
                        t.idle_frames = 0;
                        t
                    },
                );
            self.active.push(pooled);
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: TransientId) -> Option<&PooledTexture> {
        self.active.get(id.index())
    }

    /// Returns every bound texture to the free list.
    pub fn reset(&mut self) {
        for t in self.active.drain(..) {
            self.free.entry(t.desc).or_default().push(t);
        }
    }

    /// Ages free textures and drops those idle for more than
    /// `max_idle_frames` calls.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for t in bucket.iter_mut() {
                t.idle_frames += 1;
            }
            bucket.retain(|t| t.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Textures held by the pool, bound or free.
    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.active.len() + self.free.values().map(Vec::len).sum::<usize>()
    }
}
