// error.rs — error taxonomy for mesh, texture, orbit, config and GPU setup

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("sphere resolution too low: theta={theta}, phi={phi} (need at least 3 each)")]
    InvalidResolution { theta: usize, phi: usize },
    #[error("texture coordinate count {uvs} does not match vertex count {positions}")]
    LengthMismatch { positions: usize, uvs: usize },
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("cannot open texture {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode texture {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    #[error("{field}: '{value}' is not a number")]
    Parse { field: &'static str, value: String },
    #[error("semi-major axis must be positive, got {0}")]
    SemiMajorAxis(f64),
    #[error("eccentricity must be in [0, 1), got {0}")]
    Eccentricity(f64),
    #[error("inclination must be in [0, 180] degrees, got {0}")]
    Inclination(f64),
    #[error("periapsis {periapsis:.0} m is inside the body (radius {radius:.0} m)")]
    Periapsis { periapsis: f64, radius: f64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum RendererError {
    #[error("cannot create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("cannot open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Orbit(#[from] OrbitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Renderer(#[from] RendererError),
    #[error("cannot create window: {0}")]
    Window(#[from] winit::error::OsError),
}
