//! Pass Descriptors
//!
//! A [`PassNode`] is a typed, backend-agnostic record of one GPU operation
//! plus the resources it touches. Access flags are the only synchronization
//! contract: the executor derives barriers from them and never reorders.

use bitflags::bitflags;
use bytemuck::Pod;
use smallvec::SmallVec;

use super::resource::GraphResource;

bitflags! {
    /// How a pass touches a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// One declared resource access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceAccess {
    pub resource: GraphResource,
    pub flags: AccessFlags,
    /// Name the program binds the resource under.
    pub binding: &'static str,
}

/// A compute kernel entry point inside a named program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelRef {
    pub program: &'static str,
    pub entry: &'static str,
}

impl KernelRef {
    #[inline]
    #[must_use]
    pub const fn new(program: &'static str, entry: &'static str) -> Self {
        Self { program, entry }
    }
}

/// A full-screen material program. The pass index picks its variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialRef {
    pub program: &'static str,
}

impl MaterialRef {
    #[inline]
    #[must_use]
    pub const fn new(program: &'static str) -> Self {
        Self { program }
    }
}

/// Raw parameter bytes handed to a program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBlock(SmallVec<[u8; 256]>);

impl ParamBlock {
    #[must_use]
    pub fn from_pod<T: Pod>(value: &T) -> Self {
        Self(SmallVec::from_slice(bytemuck::bytes_of(value)))
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the block back as `T`. `None` on a size mismatch.
    #[must_use]
    pub fn read<T: Pod>(&self) -> Option<T> {
        (self.0.len() == std::mem::size_of::<T>()).then(|| bytemuck::pod_read_unaligned(&self.0))
    }
}

/// The operation a pass performs.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOp {
    /// Fill a texture with `(value, 0, 0, 1)`, or every `u32` word of a
    /// buffer with the bits of `value`.
    Clear { target: GraphResource, value: f32 },
    /// Compute dispatch of `groups` work groups.
    Dispatch { kernel: KernelRef, groups: [u32; 3] },
    /// Full-screen draw from `source` into `destination`.
    Blit {
        material: MaterialRef,
        pass_index: u32,
        source: GraphResource,
        destination: GraphResource,
    },
    /// Raw copy between resources of identical description.
    Copy {
        source: GraphResource,
        destination: GraphResource,
    },
}

impl PassOp {
    /// Program this operation needs, if any.
    #[must_use]
    pub fn program(&self) -> Option<&'static str> {
        match self {
            Self::Dispatch { kernel, .. } => Some(kernel.program),
            Self::Blit { material, .. } => Some(material.program),
            Self::Clear { .. } | Self::Copy { .. } => None,
        }
    }
}

/// One recorded pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassNode {
    pub name: &'static str,
    pub op: PassOp,
    pub accesses: SmallVec<[ResourceAccess; 8]>,
    pub params: ParamBlock,
}

impl PassNode {
    #[must_use]
    pub fn new(name: &'static str, op: PassOp) -> Self {
        Self {
            name,
            op,
            accesses: SmallVec::new(),
            params: ParamBlock::default(),
        }
    }

    /// Clear pass. Declares the write to `target`.
    #[must_use]
    pub fn clear(name: &'static str, target: GraphResource, value: f32) -> Self {
        Self::new(name, PassOp::Clear { target, value }).write(target, "target")
    }

    /// Compute dispatch. Accesses are declared by the caller.
    #[must_use]
    pub fn dispatch(name: &'static str, kernel: KernelRef, groups: [u32; 3]) -> Self {
        Self::new(name, PassOp::Dispatch { kernel, groups })
    }

    /// Full-screen blit. Declares the read of `source` and the write of
    /// `destination`.
    #[must_use]
    pub fn blit(
        name: &'static str,
        material: MaterialRef,
        pass_index: u32,
        source: GraphResource,
        destination: GraphResource,
    ) -> Self {
        Self::new(
            name,
            PassOp::Blit {
                material,
                pass_index,
                source,
                destination,
            },
        )
        .read(source, "source")
        .write(destination, "destination")
    }

    /// Copy. Declares the read of `source` and the write of `destination`.
    #[must_use]
    pub fn copy(name: &'static str, source: GraphResource, destination: GraphResource) -> Self {
        Self::new(
            name,
            PassOp::Copy {
                source,
                destination,
            },
        )
        .read(source, "source")
        .write(destination, "destination")
    }

    #[must_use]
    pub fn read(mut self, resource: GraphResource, binding: &'static str) -> Self {
        self.accesses.push(ResourceAccess {
            resource,
            flags: AccessFlags::READ,
            binding,
        });
        self
    }

    #[must_use]
    pub fn write(mut self, resource: GraphResource, binding: &'static str) -> Self {
        self.accesses.push(ResourceAccess {
            resource,
            flags: AccessFlags::WRITE,
            binding,
        });
        self
    }

    #[must_use]
    pub fn read_write(mut self, resource: GraphResource, binding: &'static str) -> Self {
        self.accesses.push(ResourceAccess {
            resource,
            flags: AccessFlags::READ_WRITE,
            binding,
        });
        self
    }

    #[must_use]
    pub fn with_params<T: Pod>(mut self, params: &T) -> Self {
        self.params = ParamBlock::from_pod(params);
        self
    }

    /// Resources this pass reads.
    pub fn reads(&self) -> impl Iterator<Item = GraphResource> + '_ {
        self.accesses
            .iter()
            .filter(|a| a.flags.contains(AccessFlags::READ))
            .map(|a| a.resource)
    }

    /// Resources this pass writes.
    pub fn writes(&self) -> impl Iterator<Item = GraphResource> + '_ {
        self.accesses
            .iter()
            .filter(|a| a.flags.contains(AccessFlags::WRITE))
            .map(|a| a.resource)
    }

    /// First access bound under `binding`.
    #[must_use]
    pub fn binding(&self, binding: &str) -> Option<GraphResource> {
        self.accesses
            .iter()
            .find(|a| a.binding == binding)
            .map(|a| a.resource)
    }
}
