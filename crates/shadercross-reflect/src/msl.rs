//! Vulkan (set, binding) to Metal flat-index remapping.
//!
//! Metal has no descriptor sets: every resource lives in one of three flat
//! index spaces (texture, sampler, buffer). The functions here compute the
//! complete assignment for one shader module; the transpile driver installs
//! each entry into SPIRV-Cross before compiling so the emitted MSL carries
//! the remapped `[[texture(n)]]` / `[[sampler(n)]]` / `[[buffer(n)]]`
//! attributes.
//!
//! Assignment is order-sensitive: entries are produced in rule order, and the
//! rolling counters in the compute rules make the final indices depend on how
//! many resources earlier rules visited.

use crate::convention::BindingConvention;
use crate::error::ReflectError;
use crate::resource::{ResourceDescriptor, ShaderResources};

/// One remapped resource slot.
///
/// Entries are keyed by (set, binding); a separate image and a separate
/// sampler sharing a slot are both served by the same entry. Fields that do
/// not apply to the resource kind are zero and ignored by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MslResourceBinding {
    /// The descriptor-set decoration this entry matches.
    pub set: u32,
    /// The binding decoration this entry matches.
    pub binding: u32,
    /// Assigned index in Metal's texture space.
    pub msl_texture: u32,
    /// Assigned index in Metal's sampler space.
    pub msl_sampler: u32,
    /// Assigned index in Metal's buffer space.
    pub msl_buffer: u32,
}

impl MslResourceBinding {
    fn texture_sampler(resource: &ResourceDescriptor, texture: u32, sampler: u32) -> Self {
        Self {
            set: resource.set,
            binding: resource.binding,
            msl_texture: texture,
            msl_sampler: sampler,
            msl_buffer: 0,
        }
    }

    fn texture(resource: &ResourceDescriptor, texture: u32) -> Self {
        Self {
            set: resource.set,
            binding: resource.binding,
            msl_texture: texture,
            msl_sampler: 0,
            msl_buffer: 0,
        }
    }

    fn buffer(resource: &ResourceDescriptor, buffer: u32) -> Self {
        Self {
            set: resource.set,
            binding: resource.binding,
            msl_texture: 0,
            msl_sampler: 0,
            msl_buffer: buffer,
        }
    }
}

fn require_set(
    resource: &ResourceDescriptor,
    allowed: &[u32],
    scope: &'static str,
    expected: &str,
) -> Result<(), ReflectError> {
    if allowed.contains(&resource.set) {
        Ok(())
    } else {
        Err(ReflectError::invalid_set(
            scope,
            resource.kind,
            resource.set,
            expected.to_owned(),
        ))
    }
}

/// Computes the Metal index assignment for a vertex or fragment shader.
///
/// Rules, in order (sets per the convention; `{0, 2}` resources, `{1, 3}`
/// uniforms under [`BindingConvention::Standard`]):
///
/// 1. texture-samplers: `msl_texture = msl_sampler = binding`;
/// 2. storage textures: `msl_texture = texture_sampler_count + binding`;
/// 3. storage buffers: `msl_buffer = binding`;
/// 4. uniform buffers: `msl_buffer = storage_buffer_count + binding`.
pub fn remap_graphics(
    resources: &ShaderResources,
    convention: BindingConvention,
) -> Result<Vec<MslResourceBinding>, ReflectError> {
    let resource_sets = convention.graphics_resource_sets();
    let uniform_sets = convention.graphics_uniform_sets();
    let resource_expected = format!("{} or {}", resource_sets[0], resource_sets[1]);
    let uniform_expected = format!("{} or {}", uniform_sets[0], uniform_sets[1]);

    let texture_samplers = resources.texture_samplers();
    let mut bindings = Vec::with_capacity(
        texture_samplers.len()
            + resources.storage_images.len()
            + resources.storage_buffers.len()
            + resources.uniform_buffers.len(),
    );

    for resource in texture_samplers {
        require_set(resource, &resource_sets, "graphics", &resource_expected)?;
        bindings.push(MslResourceBinding::texture_sampler(
            resource,
            resource.binding,
            resource.binding,
        ));
    }

    let texture_sampler_count = texture_samplers.len() as u32;
    for resource in &resources.storage_images {
        require_set(resource, &resource_sets, "graphics", &resource_expected)?;
        bindings.push(MslResourceBinding::texture(
            resource,
            texture_sampler_count + resource.binding,
        ));
    }

    for resource in &resources.storage_buffers {
        require_set(resource, &resource_sets, "graphics", &resource_expected)?;
        bindings.push(MslResourceBinding::buffer(resource, resource.binding));
    }

    let storage_buffer_count = resources.storage_buffers.len() as u32;
    for resource in &resources.uniform_buffers {
        require_set(resource, &uniform_sets, "graphics", &uniform_expected)?;
        bindings.push(MslResourceBinding::buffer(
            resource,
            storage_buffer_count + resource.binding,
        ));
    }

    Ok(bindings)
}

/// Computes the Metal index assignment for a compute shader.
///
/// The readonly set comes first in every index space, so readwrite indices
/// start past everything the readonly rules assigned. With texture counter
/// `T` and buffer counter `B` starting at zero, in rule order:
///
/// 1. texture-samplers (readonly set): `msl_texture = msl_sampler = T`, then
///    `T += 1`;
/// 2. readonly storage textures: `msl_texture = T + binding`, `T += 1` per
///    resource;
/// 3. readwrite storage textures: `msl_texture = T + binding`, `T += 1` per
///    resource;
/// 4. readonly storage buffers: `msl_buffer = binding`, `B += 1`;
/// 5. readwrite storage buffers: `msl_buffer = B + binding`, `B += 1`;
/// 6. uniform buffers (uniform set): `msl_buffer = B + binding`, `B += 1`.
pub fn remap_compute(
    resources: &ShaderResources,
    convention: BindingConvention,
) -> Result<Vec<MslResourceBinding>, ReflectError> {
    let readonly_set = convention.compute_readonly_set();
    let readwrite_set = convention.compute_readwrite_set();
    let uniform_set = convention.compute_uniform_set();
    let storage_expected = format!("{readonly_set} or {readwrite_set}");

    let (readonly_images, readwrite_images) = partition_storage(
        &resources.storage_images,
        readonly_set,
        readwrite_set,
        &storage_expected,
    )?;
    let (readonly_buffers, readwrite_buffers) = partition_storage(
        &resources.storage_buffers,
        readonly_set,
        readwrite_set,
        &storage_expected,
    )?;

    let mut bindings = Vec::new();
    let mut texture_index = 0u32;
    let mut buffer_index = 0u32;

    for resource in resources.texture_samplers() {
        require_set(
            resource,
            &[readonly_set],
            "compute",
            &readonly_set.to_string(),
        )?;
        bindings.push(MslResourceBinding::texture_sampler(
            resource,
            texture_index,
            texture_index,
        ));
        texture_index += 1;
    }

    for resource in readonly_images.iter().chain(&readwrite_images) {
        bindings.push(MslResourceBinding::texture(
            resource,
            texture_index + resource.binding,
        ));
        texture_index += 1;
    }

    for resource in &readonly_buffers {
        bindings.push(MslResourceBinding::buffer(resource, resource.binding));
        buffer_index += 1;
    }

    for resource in &readwrite_buffers {
        bindings.push(MslResourceBinding::buffer(
            resource,
            buffer_index + resource.binding,
        ));
        buffer_index += 1;
    }

    for resource in &resources.uniform_buffers {
        require_set(
            resource,
            &[uniform_set],
            "compute",
            &uniform_set.to_string(),
        )?;
        bindings.push(MslResourceBinding::buffer(
            resource,
            buffer_index + resource.binding,
        ));
        buffer_index += 1;
    }

    Ok(bindings)
}

fn partition_storage<'a>(
    resources: &'a [ResourceDescriptor],
    readonly_set: u32,
    readwrite_set: u32,
    expected: &str,
) -> Result<(Vec<&'a ResourceDescriptor>, Vec<&'a ResourceDescriptor>), ReflectError> {
    let mut readonly = Vec::new();
    let mut readwrite = Vec::new();
    for resource in resources {
        if resource.set == readonly_set {
            readonly.push(resource);
        } else if resource.set == readwrite_set {
            readwrite.push(resource);
        } else {
            return Err(ReflectError::invalid_set(
                "compute",
                resource.kind,
                resource.set,
                expected.to_owned(),
            ));
        }
    }
    Ok((readonly, readwrite))
}
