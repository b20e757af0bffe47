use shadercross::{ShaderCross, ShaderFormats};

#[test]
fn spirv_formats_always_include_spirv_and_msl() {
    // The identity and transpile capabilities do not depend on which native
    // libraries the host has.
    let context = ShaderCross::init();
    let formats = context.spirv_shader_formats();
    assert!(formats.contains(ShaderFormats::SPIRV));
    assert!(formats.contains(ShaderFormats::MSL));
}

#[test]
fn hlsl_formats_are_a_subset_of_the_backend_set() {
    let context = ShaderCross::init();
    let formats = context.hlsl_shader_formats();
    assert!(ShaderFormats::all().contains(formats));
    // DXIL from HLSL requires the same compiler as SPIR-V from HLSL, so
    // reporting DXIL without SPIR-V would be inconsistent.
    if formats.contains(ShaderFormats::DXIL) {
        assert!(formats.contains(ShaderFormats::SPIRV));
    }
}

#[test]
fn init_and_drop_are_balanced() {
    // Init followed immediately by teardown must not leave dangling library
    // handles; libloading unloads on drop, so this is a leak smoke test.
    for _ in 0..3 {
        let context = ShaderCross::init();
        drop(context);
    }
}
