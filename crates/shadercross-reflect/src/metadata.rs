use serde::Serialize;

/// Resource counts reflected from a vertex or fragment shader.
///
/// Serializes to the compact one-line JSON shape consumed by tooling:
/// `{"samplers":N,"storage_textures":N,"storage_buffers":N,"uniform_buffers":N}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphicsShaderMetadata {
    /// Number of sampler slots.
    pub samplers: u32,
    /// Number of storage textures.
    pub storage_textures: u32,
    /// Number of storage buffers.
    pub storage_buffers: u32,
    /// Number of uniform buffers.
    pub uniform_buffers: u32,
}

/// Resource counts and threadgroup size reflected from a compute shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComputePipelineMetadata {
    /// Number of sampler slots.
    pub samplers: u32,
    /// Number of readonly storage textures (set 0).
    pub readonly_storage_textures: u32,
    /// Number of readonly storage buffers (set 0).
    pub readonly_storage_buffers: u32,
    /// Number of readwrite storage textures (set 1).
    pub readwrite_storage_textures: u32,
    /// Number of readwrite storage buffers (set 1).
    pub readwrite_storage_buffers: u32,
    /// Number of uniform buffers (set 2).
    pub uniform_buffers: u32,
    /// Threadgroup size in X, from the module's `LocalSize` execution mode.
    pub threadcount_x: u32,
    /// Threadgroup size in Y.
    pub threadcount_y: u32,
    /// Threadgroup size in Z.
    pub threadcount_z: u32,
}

impl GraphicsShaderMetadata {
    /// Compact one-line JSON rendering of the counts.
    pub fn to_json(&self) -> String {
        // A struct of plain integers cannot fail to serialize.
        serde_json::to_string(self).expect("graphics metadata serialization cannot fail")
    }
}

impl ComputePipelineMetadata {
    /// Compact one-line JSON rendering of the counts and thread counts.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("compute metadata serialization cannot fail")
    }
}
