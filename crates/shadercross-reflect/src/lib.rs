//! Binding model, resource classification and MSL index remapping for the
//! shadercross translation pipeline.
//!
//! This crate is pure data manipulation: it receives resource descriptors that
//! a reflection backend has already extracted from a SPIR-V module and decides
//! how they map onto pipeline metadata and onto Metal's flat index spaces.
//! Nothing in here touches a compiler library, so the whole binding contract
//! is unit-testable without any native dependencies.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod classify;
mod convention;
mod error;
mod metadata;
mod msl;
mod resource;

pub use crate::classify::{classify_compute, classify_graphics};
pub use crate::convention::BindingConvention;
pub use crate::error::{DecorationKind, ReflectError};
pub use crate::metadata::{ComputePipelineMetadata, GraphicsShaderMetadata};
pub use crate::msl::{remap_compute, remap_graphics, MslResourceBinding};
pub use crate::resource::{ResourceDescriptor, ResourceKind, ShaderResources, ShaderStage};
