//! Classification of reflected resources into pipeline metadata.

use crate::convention::BindingConvention;
use crate::error::ReflectError;
use crate::metadata::{ComputePipelineMetadata, GraphicsShaderMetadata};
use crate::resource::{ResourceDescriptor, ShaderResources};

/// Counts the resources of a vertex or fragment shader.
///
/// Graphics classification is pure counting; descriptor-set placement is only
/// enforced later, by the MSL remapper, because SPIR-V and DXIL destinations
/// carry the sets through unchanged.
pub fn classify_graphics(resources: &ShaderResources) -> GraphicsShaderMetadata {
    GraphicsShaderMetadata {
        samplers: resources.sampler_count(),
        storage_textures: resources.storage_images.len() as u32,
        storage_buffers: resources.storage_buffers.len() as u32,
        uniform_buffers: resources.uniform_buffers.len() as u32,
    }
}

/// Counts the resources of a compute shader, partitioning storage resources
/// into readonly and readwrite by descriptor-set index.
///
/// `threadcount` is the module's `LocalSize` execution-mode arguments; the
/// reflection driver reads them, this function only carries them through.
///
/// Fails with [`ReflectError::InvalidDescriptorSet`] when a storage texture or
/// storage buffer sits on a set other than the convention's readonly and
/// readwrite sets.
pub fn classify_compute(
    resources: &ShaderResources,
    convention: BindingConvention,
    threadcount: [u32; 3],
) -> Result<ComputePipelineMetadata, ReflectError> {
    let (readonly_storage_textures, readwrite_storage_textures) =
        partition_compute_storage(&resources.storage_images, convention)?;
    let (readonly_storage_buffers, readwrite_storage_buffers) =
        partition_compute_storage(&resources.storage_buffers, convention)?;

    Ok(ComputePipelineMetadata {
        samplers: resources.sampler_count(),
        readonly_storage_textures,
        readonly_storage_buffers,
        readwrite_storage_textures,
        readwrite_storage_buffers,
        uniform_buffers: resources.uniform_buffers.len() as u32,
        threadcount_x: threadcount[0],
        threadcount_y: threadcount[1],
        threadcount_z: threadcount[2],
    })
}

/// Splits compute storage resources into (readonly, readwrite) counts.
fn partition_compute_storage(
    resources: &[ResourceDescriptor],
    convention: BindingConvention,
) -> Result<(u32, u32), ReflectError> {
    let readonly_set = convention.compute_readonly_set();
    let readwrite_set = convention.compute_readwrite_set();

    let mut readonly = 0u32;
    let mut readwrite = 0u32;
    for resource in resources {
        if resource.set == readonly_set {
            readonly += 1;
        } else if resource.set == readwrite_set {
            readwrite += 1;
        } else {
            return Err(ReflectError::invalid_set(
                "compute",
                resource.kind,
                resource.set,
                format!("{readonly_set} or {readwrite_set}"),
            ));
        }
    }
    Ok((readonly, readwrite))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;

    fn resource(kind: ResourceKind, set: u32, binding: u32) -> ResourceDescriptor {
        ResourceDescriptor {
            id: 100 + set * 16 + binding,
            kind,
            set,
            binding,
        }
    }

    #[test]
    fn graphics_counts_each_kind() {
        let resources = ShaderResources {
            sampled_images: vec![
                resource(ResourceKind::SampledImage, 0, 0),
                resource(ResourceKind::SampledImage, 2, 1),
            ],
            storage_images: vec![resource(ResourceKind::StorageImage, 0, 2)],
            storage_buffers: vec![resource(ResourceKind::StorageBuffer, 2, 0)],
            uniform_buffers: vec![
                resource(ResourceKind::UniformBuffer, 1, 0),
                resource(ResourceKind::UniformBuffer, 3, 0),
            ],
            ..ShaderResources::default()
        };

        let metadata = classify_graphics(&resources);
        assert_eq!(
            metadata,
            GraphicsShaderMetadata {
                samplers: 2,
                storage_textures: 1,
                storage_buffers: 1,
                uniform_buffers: 2,
            }
        );
    }

    #[test]
    fn graphics_falls_back_to_separate_samplers() {
        // HLSL-origin modules declare `Texture2D` and `SamplerState`
        // separately; the sampler count must come from the sampler list when
        // no combined image-samplers exist.
        let resources = ShaderResources {
            separate_images: vec![resource(ResourceKind::SampledImage, 0, 0)],
            separate_samplers: vec![
                resource(ResourceKind::SeparateSampler, 0, 0),
                resource(ResourceKind::SeparateSampler, 0, 1),
            ],
            ..ShaderResources::default()
        };

        assert_eq!(classify_graphics(&resources).samplers, 2);
    }

    #[test]
    fn compute_partitions_by_set() {
        let resources = ShaderResources {
            storage_images: vec![
                resource(ResourceKind::StorageImage, 0, 0),
                resource(ResourceKind::StorageImage, 1, 0),
                resource(ResourceKind::StorageImage, 1, 1),
            ],
            storage_buffers: vec![
                resource(ResourceKind::StorageBuffer, 0, 1),
                resource(ResourceKind::StorageBuffer, 1, 2),
            ],
            uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 2, 0)],
            ..ShaderResources::default()
        };

        let metadata =
            classify_compute(&resources, BindingConvention::Standard, [8, 8, 1]).unwrap();
        assert_eq!(
            metadata,
            ComputePipelineMetadata {
                samplers: 0,
                readonly_storage_textures: 1,
                readonly_storage_buffers: 1,
                readwrite_storage_textures: 2,
                readwrite_storage_buffers: 1,
                uniform_buffers: 1,
                threadcount_x: 8,
                threadcount_y: 8,
                threadcount_z: 1,
            }
        );
    }

    #[test]
    fn compute_rejects_storage_buffer_on_uniform_set() {
        let resources = ShaderResources {
            storage_buffers: vec![resource(ResourceKind::StorageBuffer, 2, 0)],
            ..ShaderResources::default()
        };

        let err =
            classify_compute(&resources, BindingConvention::Standard, [1, 1, 1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Descriptor set index for compute storage buffer must be 0 or 1 (resource uses set 2)"
        );
    }

    #[test]
    fn compute_counts_match_manual_partition() {
        // Classification must agree with classifying each resource by set by
        // hand, for any decoration layout within the convention.
        let storage_buffers: Vec<_> = (0..6)
            .map(|i| resource(ResourceKind::StorageBuffer, i % 2, i))
            .collect();
        let manual_readonly = storage_buffers.iter().filter(|r| r.set == 0).count() as u32;
        let manual_readwrite = storage_buffers.iter().filter(|r| r.set == 1).count() as u32;

        let resources = ShaderResources {
            storage_buffers,
            ..ShaderResources::default()
        };
        let metadata =
            classify_compute(&resources, BindingConvention::Standard, [1, 1, 1]).unwrap();
        assert_eq!(metadata.readonly_storage_buffers, manual_readonly);
        assert_eq!(metadata.readwrite_storage_buffers, manual_readwrite);
    }
}
