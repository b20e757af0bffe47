/// The descriptor-set convention shaders are authored against.
///
/// The remapper and the compute classifier only accept resources on the sets
/// the active convention allows. Today there is a single convention, but the
/// set indices are deliberately routed through this type rather than written
/// inline so an alternative layout can be added without touching the
/// remapping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum BindingConvention {
    /// The standard layout:
    ///
    /// - graphics vertex samplers/textures/storage on set 0, vertex uniform
    ///   buffers on set 1;
    /// - graphics fragment samplers/textures/storage on set 2, fragment
    ///   uniform buffers on set 3;
    /// - compute readonly resources on set 0, readwrite resources on set 1,
    ///   uniform buffers on set 2.
    #[default]
    Standard,
}

impl BindingConvention {
    /// Sets that may hold graphics samplers, storage textures and storage
    /// buffers (one per stage).
    pub const fn graphics_resource_sets(&self) -> [u32; 2] {
        match self {
            Self::Standard => [0, 2],
        }
    }

    /// Sets that may hold graphics uniform buffers (one per stage).
    pub const fn graphics_uniform_sets(&self) -> [u32; 2] {
        match self {
            Self::Standard => [1, 3],
        }
    }

    /// The set holding readonly compute resources.
    pub const fn compute_readonly_set(&self) -> u32 {
        match self {
            Self::Standard => 0,
        }
    }

    /// The set holding readwrite compute resources.
    pub const fn compute_readwrite_set(&self) -> u32 {
        match self {
            Self::Standard => 1,
        }
    }

    /// The set holding compute uniform buffers.
    pub const fn compute_uniform_set(&self) -> u32 {
        match self {
            Self::Standard => 2,
        }
    }
}
