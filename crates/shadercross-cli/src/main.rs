use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use shadercross::{
    translate, OutputFormat, ShaderCross, ShaderModel, ShaderSource, ShaderStage, TranslateOptions,
};

#[derive(Debug, Parser)]
#[command(
    name = "shadercross",
    about = "Translate shaders between SPIRV, HLSL, DXBC, DXIL, MSL and JSON reflection metadata"
)]
struct Args {
    /// Input shader file.
    input: PathBuf,

    /// Source language format. Inferred from the input filename when omitted.
    #[arg(short = 's', long = "source", value_enum, ignore_case = true)]
    source: Option<SourceArg>,

    /// Destination format. Inferred from the output filename when omitted.
    #[arg(short = 'd', long = "dest", value_enum, ignore_case = true)]
    dest: Option<DestArg>,

    /// Shader stage. Inferred from the input filename when omitted.
    #[arg(short = 't', long = "stage", value_enum, ignore_case = true)]
    stage: Option<StageArg>,

    /// Entrypoint function name.
    #[arg(short = 'e', long = "entrypoint", default_value = "main")]
    entrypoint: String,

    /// HLSL shader model. Required for HLSL destinations. Values: 50, 60.
    #[arg(short = 'm', long = "shadermodel")]
    shader_model: Option<u32>,

    /// Include directory for HLSL compilation.
    #[arg(short = 'I', long = "include")]
    include_dir: Option<PathBuf>,

    /// Preprocessor define (NAME or NAME=VALUE). May be repeated.
    #[arg(short = 'D', value_name = "DEFINE")]
    defines: Vec<String>,

    /// Request debug information from the backends (best effort).
    #[arg(short = 'g', long = "debug")]
    debug: bool,

    /// Output file.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Spirv,
    Hlsl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DestArg {
    Spirv,
    Dxbc,
    Dxil,
    Msl,
    Hlsl,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StageArg {
    Vertex,
    Fragment,
    Compute,
}

impl DestArg {
    fn output_format(self) -> OutputFormat {
        match self {
            Self::Spirv => OutputFormat::Spirv,
            Self::Dxbc => OutputFormat::Dxbc,
            Self::Dxil => OutputFormat::Dxil,
            Self::Msl => OutputFormat::Msl,
            Self::Hlsl => OutputFormat::Hlsl,
            Self::Json => OutputFormat::Json,
        }
    }
}

impl StageArg {
    fn stage(self) -> ShaderStage {
        match self {
            Self::Vertex => ShaderStage::Vertex,
            Self::Fragment => ShaderStage::Fragment,
            Self::Compute => ShaderStage::Compute,
        }
    }
}

/// Infers the source language from the input filename (`.spv` / `.hlsl`).
fn infer_source(path: &Path) -> Option<SourceArg> {
    let name = path.to_string_lossy();
    if name.contains(".spv") {
        Some(SourceArg::Spirv)
    } else if name.contains(".hlsl") {
        Some(SourceArg::Hlsl)
    } else {
        None
    }
}

/// Infers the destination format from the output filename.
fn infer_dest(path: &Path) -> Option<DestArg> {
    let name = path.to_string_lossy();
    if name.contains(".dxbc") {
        Some(DestArg::Dxbc)
    } else if name.contains(".dxil") {
        Some(DestArg::Dxil)
    } else if name.contains(".msl") {
        Some(DestArg::Msl)
    } else if name.contains(".spv") {
        Some(DestArg::Spirv)
    } else if name.contains(".hlsl") {
        Some(DestArg::Hlsl)
    } else if name.contains(".json") {
        Some(DestArg::Json)
    } else {
        None
    }
}

/// Infers the shader stage from `.vert` / `.frag` / `.comp` in the input
/// filename (case-insensitive).
fn infer_stage(path: &Path) -> Option<StageArg> {
    let name = path.to_string_lossy().to_ascii_lowercase();
    if name.contains(".vert") {
        Some(StageArg::Vertex)
    } else if name.contains(".frag") {
        Some(StageArg::Fragment)
    } else if name.contains(".comp") {
        Some(StageArg::Compute)
    } else {
        None
    }
}

fn parse_shader_model(value: u32) -> Result<ShaderModel> {
    match value {
        50 => Ok(ShaderModel::Sm50),
        60 => Ok(ShaderModel::Sm60),
        other => bail!("unrecognized shader model {other} (expected 50 or 60)"),
    }
}

fn run(args: &Args) -> Result<()> {
    let source = args
        .source
        .or_else(|| infer_source(&args.input))
        .context("could not infer source format from the input filename; pass --source")?;
    let dest = args
        .dest
        .or_else(|| infer_dest(&args.output))
        .context("could not infer destination format from the output filename; pass --dest")?;
    let stage = args
        .stage
        .or_else(|| infer_stage(&args.input))
        .context("could not infer shader stage from the input filename; pass --stage")?;

    let shader_model = args.shader_model.map(parse_shader_model).transpose()?;
    if dest == DestArg::Hlsl && shader_model.is_none() {
        bail!("HLSL destination requires --shadermodel 50 or 60");
    }

    // Read the input up front so argument mistakes surface before any
    // backend is touched.
    let spirv_bytes;
    let hlsl_text;
    let shader_source = match source {
        SourceArg::Spirv => {
            spirv_bytes = fs::read(&args.input)
                .with_context(|| format!("failed to read {}", args.input.display()))?;
            ShaderSource::Spirv(&spirv_bytes)
        }
        SourceArg::Hlsl => {
            hlsl_text = fs::read_to_string(&args.input)
                .with_context(|| format!("failed to read {}", args.input.display()))?;
            ShaderSource::Hlsl(&hlsl_text)
        }
    };

    let context = ShaderCross::init();
    let options = TranslateOptions {
        stage: stage.stage(),
        entrypoint: &args.entrypoint,
        include_dir: args.include_dir.as_deref(),
        defines: &args.defines,
        shader_model,
        debug: args.debug,
    };

    let translated = translate(&context, shader_source, dest.output_format(), &options)?;
    fs::write(&args.output, translated.into_bytes())
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_inference() {
        assert_eq!(infer_source(Path::new("shader.vert.spv")), Some(SourceArg::Spirv));
        assert_eq!(infer_source(Path::new("shader.vert.hlsl")), Some(SourceArg::Hlsl));
        assert_eq!(infer_source(Path::new("shader.bin")), None);
    }

    #[test]
    fn dest_inference() {
        assert_eq!(infer_dest(Path::new("out.dxbc")), Some(DestArg::Dxbc));
        assert_eq!(infer_dest(Path::new("out.dxil")), Some(DestArg::Dxil));
        assert_eq!(infer_dest(Path::new("out.msl")), Some(DestArg::Msl));
        assert_eq!(infer_dest(Path::new("out.spv")), Some(DestArg::Spirv));
        assert_eq!(infer_dest(Path::new("out.hlsl")), Some(DestArg::Hlsl));
        assert_eq!(infer_dest(Path::new("out.json")), Some(DestArg::Json));
        assert_eq!(infer_dest(Path::new("out.txt")), None);
    }

    #[test]
    fn stage_inference_is_case_insensitive() {
        assert_eq!(infer_stage(Path::new("a.VERT.spv")), Some(StageArg::Vertex));
        assert_eq!(infer_stage(Path::new("a.frag.spv")), Some(StageArg::Fragment));
        assert_eq!(infer_stage(Path::new("a.comp.spv")), Some(StageArg::Compute));
        assert_eq!(infer_stage(Path::new("a.spv")), None);
    }

    #[test]
    fn shader_model_values() {
        assert_eq!(parse_shader_model(50).unwrap(), ShaderModel::Sm50);
        assert_eq!(parse_shader_model(60).unwrap(), ShaderModel::Sm60);
        assert!(parse_shader_model(51).is_err());
    }

    #[test]
    fn args_parse_the_documented_surface() {
        let args = Args::try_parse_from([
            "shadercross",
            "shader.vert.spv",
            "-s",
            "SPIRV",
            "-d",
            "MSL",
            "-t",
            "vertex",
            "-e",
            "main",
            "-DFOO=1",
            "-DBAR",
            "-g",
            "-o",
            "out.msl",
        ])
        .unwrap();
        assert_eq!(args.source, Some(SourceArg::Spirv));
        assert_eq!(args.dest, Some(DestArg::Msl));
        assert_eq!(args.stage, Some(StageArg::Vertex));
        assert_eq!(args.entrypoint, "main");
        assert_eq!(args.defines, ["FOO=1", "BAR"]);
        assert!(args.debug);
    }

    #[test]
    fn entrypoint_defaults_to_main() {
        let args =
            Args::try_parse_from(["shadercross", "a.comp.hlsl", "-o", "a.json"]).unwrap();
        assert_eq!(args.entrypoint, "main");
        assert_eq!(args.shader_model, None);
    }

    #[test]
    fn missing_output_is_an_error() {
        assert!(Args::try_parse_from(["shadercross", "a.vert.spv"]).is_err());
    }

    #[test]
    fn hlsl_dest_without_model_fails_before_io() {
        let args = Args::try_parse_from([
            "shadercross",
            "missing.vert.spv",
            "-o",
            "out.hlsl",
        ])
        .unwrap();
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("--shadermodel"));
    }

    #[test]
    fn missing_input_file_surfaces_as_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.msl");
        let args = Args::try_parse_from([
            "shadercross",
            "definitely-missing.vert.spv",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
