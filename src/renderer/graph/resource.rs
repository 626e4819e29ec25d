//! Graph Resources
//!
//! Descriptors and references for everything a pass can read or write.
//!
//! | Kind | Lifetime | Owner |
//! |------|----------|-------|
//! | [`GraphResource::Persistent`] | Many frames | One effect's [`ResourcePool`](super::ResourcePool) |
//! | [`GraphResource::Transient`] | One frame | The [`PassGraph`](super::PassGraph) |
//! | [`GraphResource::Imported`] | Host-defined | The host (scene color, depth, LUTs) |
//! | [`GraphResource::Backbuffer`] | One frame | The swap chain |

slotmap::new_key_type! {
    /// Handle of a persistent resource allocated through a
    /// [`ResourceAllocator`](super::ResourceAllocator).
    pub struct ResourceHandle;
}

/// Description of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

impl TextureDesc {
    /// Usage shared by every post-processing color target.
    pub const COLOR_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
        .union(wgpu::TextureUsages::TEXTURE_BINDING)
        .union(wgpu::TextureUsages::COPY_SRC)
        .union(wgpu::TextureUsages::COPY_DST);

    #[inline]
    #[must_use]
    pub const fn new(
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        Self {
            width,
            height,
            format,
            usage,
        }
    }

    /// A sampled, renderable, copyable color target.
    #[inline]
    #[must_use]
    pub const fn color(width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self::new(width, height, format, Self::COLOR_USAGE)
    }

    /// Same usage and size, different format.
    #[inline]
    #[must_use]
    pub const fn with_format(self, format: wgpu::TextureFormat) -> Self {
        Self { format, ..self }
    }

    /// Same format and usage, different size.
    #[inline]
    #[must_use]
    pub const fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width.max(1),
            height: self.height.max(1),
            depth_or_array_layers: 1,
        }
    }
}

/// Description of a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: wgpu::BufferUsages,
}

/// Description of a persistent resource. Part of its pool identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDesc {
    Texture(TextureDesc),
    Buffer(BufferDesc),
}

impl From<TextureDesc> for ResourceDesc {
    fn from(desc: TextureDesc) -> Self {
        Self::Texture(desc)
    }
}

impl From<BufferDesc> for ResourceDesc {
    fn from(desc: BufferDesc) -> Self {
        Self::Buffer(desc)
    }
}

/// Index of a transient texture within one [`PassGraph`](super::PassGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransientId(pub(crate) u32);

impl TransientId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot of a host-owned texture bound before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportedId(pub u32);

/// A resource reference as seen by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphResource {
    Persistent(ResourceHandle),
    Transient(TransientId),
    Imported(ImportedId),
    Backbuffer,
}

/// The color target flowing between effects, with its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTarget {
    pub resource: GraphResource,
    pub desc: TextureDesc,
}

impl ColorTarget {
    #[inline]
    #[must_use]
    pub const fn new(resource: GraphResource, desc: TextureDesc) -> Self {
        Self { resource, desc }
    }

    /// Whether this target is the swap-chain image.
    #[inline]
    #[must_use]
    pub fn is_backbuffer(&self) -> bool {
        matches!(self.resource, GraphResource::Backbuffer)
    }

    /// `(1/w, 1/h, w, h)`
    #[must_use]
    pub fn texel_size(&self) -> glam::Vec4 {
        let w = self.desc.width.max(1) as f32;
        let h = self.desc.height.max(1) as f32;
        glam::Vec4::new(1.0 / w, 1.0 / h, w, h)
    }
}
