//! SDF model resolution and typed element-tree access
//!
//! This crate locates named, versioned SDF models on the filesystem and
//! exposes the parsed documents as a navigable, typed element tree:
//! - Model path search and per-request document caching ([`ModelDatabase`])
//! - Per-model manifest parsing and SDF version selection ([`ModelManifest`])
//! - Typed wrappers over parsed elements ([`Model`], [`Link`], [`Joint`])
//! - Pose and vector string conversion to glam transforms ([`convert`])
//!
//! Note the deliberate unit divergence in pose handling: the standalone
//! [`pose_from_str`] converter takes radian angles, while the element-tree
//! [`Posed::pose`] accessor interprets the `<pose>` text as degrees. See
//! the [`convert`] module docs.

pub mod cache;
pub mod convert;
pub mod element;
pub mod loader;
pub mod manifest;
pub mod xml;

pub use cache::{CacheKey, DocumentCache};
pub use convert::{pose_from_str, vector3_from_str, ConversionError, Pose};
pub use element::{ElementRef, Joint, Link, Model, Posed};
pub use loader::{load_sdf_file, LoadError, ModelDatabase};
pub use manifest::{ManifestError, ModelManifest, SdfVersion};
pub use xml::{Document, NodeId, XmlError};
