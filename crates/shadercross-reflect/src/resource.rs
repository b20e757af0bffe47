/// The pipeline stage a shader module executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment (pixel) shader.
    Fragment,
    /// Compute shader.
    Compute,
}

impl ShaderStage {
    /// Lowercase stage name, matching the CLI spelling.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }
}

/// The kind of a reflected shader resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A combined texture-sampler (`OpTypeSampledImage`).
    SampledImage,
    /// A sampler declared separately from its texture (HLSL-origin modules).
    SeparateSampler,
    /// A storage image (writable texture).
    StorageImage,
    /// A storage (structured/byte-address) buffer.
    StorageBuffer,
    /// A uniform (constant) buffer.
    UniformBuffer,
}

impl ResourceKind {
    /// Human-readable kind name used in diagnostics.
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::SampledImage | Self::SeparateSampler => "sampler",
            Self::StorageImage => "storage texture",
            Self::StorageBuffer => "storage buffer",
            Self::UniformBuffer => "uniform buffer",
        }
    }
}

/// A single reflected resource.
///
/// Every resource in a well-formed module carries both a descriptor-set and a
/// binding decoration; the reflection driver rejects modules where either is
/// absent, so descriptors in this crate are always complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// The SPIR-V variable id of the resource.
    pub id: u32,
    /// What the resource is.
    pub kind: ResourceKind,
    /// The descriptor-set decoration.
    pub set: u32,
    /// The binding decoration.
    pub binding: u32,
}

/// All resources reflected from one shader module, grouped by kind.
///
/// Lists preserve the backend's enumeration order; the MSL remapper's flat
/// index assignment is order-sensitive, so callers must not reorder them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderResources {
    /// Combined texture-samplers.
    pub sampled_images: Vec<ResourceDescriptor>,
    /// Images declared separately from their samplers.
    pub separate_images: Vec<ResourceDescriptor>,
    /// Samplers declared separately from their images.
    pub separate_samplers: Vec<ResourceDescriptor>,
    /// Storage images.
    pub storage_images: Vec<ResourceDescriptor>,
    /// Storage buffers.
    pub storage_buffers: Vec<ResourceDescriptor>,
    /// Uniform buffers.
    pub uniform_buffers: Vec<ResourceDescriptor>,
}

impl ShaderResources {
    /// The texture-sampler slots of this module.
    ///
    /// GLSL-origin modules declare combined image-samplers; HLSL-origin
    /// modules declare the image and the sampler separately, sharing a
    /// (set, binding) slot per pair. When no combined resources exist the
    /// separate images stand in for the slot list.
    pub fn texture_samplers(&self) -> &[ResourceDescriptor] {
        if self.sampled_images.is_empty() {
            &self.separate_images
        } else {
            &self.sampled_images
        }
    }

    /// The number of sampler slots for metadata purposes.
    ///
    /// Counts combined image-samplers; when there are none, counts separate
    /// samplers instead (the HLSL front-end emits separate images and
    /// samplers).
    pub fn sampler_count(&self) -> u32 {
        if self.sampled_images.is_empty() {
            self.separate_samplers.len() as u32
        } else {
            self.sampled_images.len() as u32
        }
    }
}
