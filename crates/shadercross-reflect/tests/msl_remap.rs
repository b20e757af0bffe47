use std::collections::HashSet;

use pretty_assertions::assert_eq;
use shadercross_reflect::{
    remap_compute, remap_graphics, BindingConvention, MslResourceBinding, ResourceDescriptor,
    ResourceKind, ShaderResources,
};

fn resource(kind: ResourceKind, set: u32, binding: u32) -> ResourceDescriptor {
    ResourceDescriptor {
        id: set * 100 + binding,
        kind,
        set,
        binding,
    }
}

fn entry_for(bindings: &[MslResourceBinding], set: u32, binding: u32) -> MslResourceBinding {
    *bindings
        .iter()
        .find(|b| b.set == set && b.binding == binding)
        .unwrap_or_else(|| panic!("no entry for (set={set}, binding={binding})"))
}

#[test]
fn graphics_vertex_sampler_and_uniform() {
    // One sampler at (set=0, binding=0) and one uniform buffer at
    // (set=1, binding=0): the sampler takes texture/sampler slot 0, and with
    // no storage buffers the uniform buffer takes buffer slot 0.
    let resources = ShaderResources {
        sampled_images: vec![resource(ResourceKind::SampledImage, 0, 0)],
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 1, 0)],
        ..ShaderResources::default()
    };

    let bindings = remap_graphics(&resources, BindingConvention::Standard).unwrap();
    assert_eq!(bindings.len(), 2);

    let sampler = entry_for(&bindings, 0, 0);
    assert_eq!((sampler.msl_texture, sampler.msl_sampler), (0, 0));

    let uniform = entry_for(&bindings, 1, 0);
    assert_eq!(uniform.msl_buffer, 0);
}

#[test]
fn graphics_storage_textures_follow_texture_samplers() {
    let resources = ShaderResources {
        sampled_images: vec![
            resource(ResourceKind::SampledImage, 0, 0),
            resource(ResourceKind::SampledImage, 0, 1),
        ],
        storage_images: vec![
            resource(ResourceKind::StorageImage, 0, 0),
            resource(ResourceKind::StorageImage, 0, 1),
        ],
        storage_buffers: vec![
            resource(ResourceKind::StorageBuffer, 0, 0),
            resource(ResourceKind::StorageBuffer, 0, 1),
        ],
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 1, 0)],
        ..ShaderResources::default()
    };

    let bindings = remap_graphics(&resources, BindingConvention::Standard).unwrap();

    // Storage textures are offset past the two texture-samplers.
    assert_eq!(entry_for(&bindings, 0, 0).msl_texture, 0);
    let storage_texture = bindings
        .iter()
        .filter(|b| b.set == 0 && b.binding == 0)
        .nth(1)
        .unwrap();
    assert_eq!(storage_texture.msl_texture, 2);

    // Uniform buffers are offset past the two storage buffers.
    assert_eq!(entry_for(&bindings, 1, 0).msl_buffer, 2);
}

#[test]
fn graphics_fragment_sets_are_accepted() {
    let resources = ShaderResources {
        sampled_images: vec![resource(ResourceKind::SampledImage, 2, 0)],
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 3, 1)],
        ..ShaderResources::default()
    };

    let bindings = remap_graphics(&resources, BindingConvention::Standard).unwrap();
    assert_eq!(entry_for(&bindings, 2, 0).msl_texture, 0);
    assert_eq!(entry_for(&bindings, 3, 1).msl_buffer, 1);
}

#[test]
fn graphics_rejects_sampler_on_uniform_set() {
    let resources = ShaderResources {
        sampled_images: vec![resource(ResourceKind::SampledImage, 1, 0)],
        ..ShaderResources::default()
    };

    let err = remap_graphics(&resources, BindingConvention::Standard).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Descriptor set index for graphics sampler must be 0 or 2 (resource uses set 1)"
    );
}

#[test]
fn graphics_rejects_uniform_on_resource_set() {
    let resources = ShaderResources {
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 0, 0)],
        ..ShaderResources::default()
    };

    let err = remap_graphics(&resources, BindingConvention::Standard).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Descriptor set index for graphics uniform buffer must be 1 or 3 (resource uses set 0)"
    );
}

#[test]
fn compute_counters_roll_across_rules() {
    // Worked example across every compute rule:
    //   2 texture-samplers            -> texture/sampler 0 and 1, T = 2
    //   readonly storage tex  b0      -> texture 2 + 0 = 2, T = 3
    //   readwrite storage tex b0      -> texture 3 + 0 = 3, T = 4
    //   readonly storage buf  b0      -> buffer 0, B = 1
    //   readwrite storage buf b0      -> buffer 1 + 0 = 1, B = 2
    //   uniform buffer        b0      -> buffer 2 + 0 = 2, B = 3
    let resources = ShaderResources {
        sampled_images: vec![
            resource(ResourceKind::SampledImage, 0, 0),
            resource(ResourceKind::SampledImage, 0, 1),
        ],
        storage_images: vec![
            resource(ResourceKind::StorageImage, 0, 0),
            resource(ResourceKind::StorageImage, 1, 0),
        ],
        storage_buffers: vec![
            resource(ResourceKind::StorageBuffer, 0, 0),
            resource(ResourceKind::StorageBuffer, 1, 0),
        ],
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 2, 0)],
        ..ShaderResources::default()
    };

    let bindings = remap_compute(&resources, BindingConvention::Standard).unwrap();
    assert_eq!(bindings.len(), 7);

    // Entries are emitted in rule order.
    let textures: Vec<u32> = bindings[..4].iter().map(|b| b.msl_texture).collect();
    assert_eq!(textures, [0, 1, 2, 3]);

    let buffers: Vec<u32> = bindings[4..].iter().map(|b| b.msl_buffer).collect();
    assert_eq!(buffers, [0, 1, 2]);
}

#[test]
fn compute_rejects_storage_buffer_outside_convention() {
    let resources = ShaderResources {
        storage_buffers: vec![resource(ResourceKind::StorageBuffer, 2, 0)],
        ..ShaderResources::default()
    };

    let err = remap_compute(&resources, BindingConvention::Standard).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Descriptor set index for compute storage buffer must be 0 or 1 (resource uses set 2)"
    );
}

#[test]
fn compute_rejects_sampler_outside_readonly_set() {
    let resources = ShaderResources {
        sampled_images: vec![resource(ResourceKind::SampledImage, 1, 0)],
        ..ShaderResources::default()
    };

    let err = remap_compute(&resources, BindingConvention::Standard).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Descriptor set index for compute sampler must be 0 (resource uses set 1)"
    );
}

#[test]
fn compute_rejects_uniform_outside_uniform_set() {
    let resources = ShaderResources {
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 0, 0)],
        ..ShaderResources::default()
    };

    let err = remap_compute(&resources, BindingConvention::Standard).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Descriptor set index for compute uniform buffer must be 2 (resource uses set 0)"
    );
}

#[test]
fn remapped_indices_are_distinct_per_space() {
    // With bindings allocated contiguously from zero per kind (how shaders
    // following the convention are authored), no two resources may land on
    // the same index of the same Metal index space.
    let graphics = ShaderResources {
        sampled_images: vec![
            resource(ResourceKind::SampledImage, 0, 0),
            resource(ResourceKind::SampledImage, 0, 1),
        ],
        storage_images: vec![resource(ResourceKind::StorageImage, 0, 0)],
        storage_buffers: vec![
            resource(ResourceKind::StorageBuffer, 0, 0),
            resource(ResourceKind::StorageBuffer, 0, 1),
        ],
        uniform_buffers: vec![resource(ResourceKind::UniformBuffer, 1, 0)],
        ..ShaderResources::default()
    };
    let bindings = remap_graphics(&graphics, BindingConvention::Standard).unwrap();

    let texture_indices: Vec<u32> = bindings[..3].iter().map(|b| b.msl_texture).collect();
    let buffer_indices: Vec<u32> = bindings[3..].iter().map(|b| b.msl_buffer).collect();
    assert_eq!(
        texture_indices.iter().collect::<HashSet<_>>().len(),
        texture_indices.len()
    );
    assert_eq!(
        buffer_indices.iter().collect::<HashSet<_>>().len(),
        buffer_indices.len()
    );
}

#[test]
fn separate_images_stand_in_for_texture_samplers() {
    // HLSL-origin module: the image and sampler share (set, binding), so a
    // single entry remaps both.
    let resources = ShaderResources {
        separate_images: vec![resource(ResourceKind::SampledImage, 0, 0)],
        separate_samplers: vec![resource(ResourceKind::SeparateSampler, 0, 0)],
        ..ShaderResources::default()
    };

    let bindings = remap_graphics(&resources, BindingConvention::Standard).unwrap();
    assert_eq!(bindings.len(), 1);
    assert_eq!(
        (bindings[0].msl_texture, bindings[0].msl_sampler),
        (0, 0)
    );
}
