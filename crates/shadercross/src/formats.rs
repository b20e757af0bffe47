use bitflags::bitflags;
use shadercross_reflect::ShaderStage;

bitflags! {
    /// Shader bytecode/text formats, used both for process capabilities and
    /// for the formats a GPU device accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ShaderFormats: u32 {
        /// SPIR-V words.
        const SPIRV = 1 << 0;
        /// Legacy Direct3D bytecode (FXC output).
        const DXBC = 1 << 1;
        /// DXIL (DXC output).
        const DXIL = 1 << 2;
        /// Metal Shading Language text.
        const MSL = 1 << 3;
    }
}

/// The HLSL shader model a destination is compiled against.
///
/// Shader model 5.0 pairs with the legacy DXBC compiler, 6.0 with DXC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderModel {
    /// Shader model 5.0.
    Sm50,
    /// Shader model 6.0.
    Sm60,
}

impl ShaderModel {
    /// The numeric form SPIRV-Cross expects (`50` or `60`).
    pub const fn hlsl_version(&self) -> u32 {
        match self {
            Self::Sm50 => 50,
            Self::Sm60 => 60,
        }
    }

    /// The compiler target profile for `stage` under this model.
    pub const fn profile(&self, stage: ShaderStage) -> &'static str {
        match (stage, self) {
            (ShaderStage::Vertex, Self::Sm50) => "vs_5_0",
            (ShaderStage::Vertex, Self::Sm60) => "vs_6_0",
            (ShaderStage::Fragment, Self::Sm50) => "ps_5_0",
            (ShaderStage::Fragment, Self::Sm60) => "ps_6_0",
            (ShaderStage::Compute, Self::Sm50) => "cs_5_0",
            (ShaderStage::Compute, Self::Sm60) => "cs_6_0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_cover_every_stage_and_model() {
        assert_eq!(ShaderModel::Sm50.profile(ShaderStage::Vertex), "vs_5_0");
        assert_eq!(ShaderModel::Sm50.profile(ShaderStage::Fragment), "ps_5_0");
        assert_eq!(ShaderModel::Sm50.profile(ShaderStage::Compute), "cs_5_0");
        assert_eq!(ShaderModel::Sm60.profile(ShaderStage::Vertex), "vs_6_0");
        assert_eq!(ShaderModel::Sm60.profile(ShaderStage::Fragment), "ps_6_0");
        assert_eq!(ShaderModel::Sm60.profile(ShaderStage::Compute), "cs_6_0");
    }

    #[test]
    fn hlsl_versions() {
        assert_eq!(ShaderModel::Sm50.hlsl_version(), 50);
        assert_eq!(ShaderModel::Sm60.hlsl_version(), 60);
    }
}
