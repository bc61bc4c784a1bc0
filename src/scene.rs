// scene.rs — assemble a complete, render-ready scene from configuration
//
// Every update builds a fresh SceneData; the renderer swaps it in wholesale.

use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::error::AppError;
use crate::mesh::{build_sphere, SphereSpec, TexturedMesh};
use crate::orbit::OrbitalElements;
use crate::texture::load_texture;
use crate::uv::{map_spherical_uvs, SEAM_THETA_DEG};
use image::RgbaImage;

/// Seam gap of the Moon mesh, degrees.
pub const MOON_SEAM_GAP_DEG: f64 = 0.001;
/// Seam gap of the star sphere. Smaller because the sphere is 100x larger.
pub const STARS_SEAM_GAP_DEG: f64 = 0.000_01;
pub const ORBIT_SAMPLES: usize = 256;

pub struct BodyData {
    pub name: &'static str,
    pub radius: f32,
    pub mesh: TexturedMesh,
    pub texture: RgbaImage,
    /// Unlit bodies show their texture as-is (the star backdrop).
    pub lit: bool,
}

pub struct SceneData {
    pub bodies: Vec<BodyData>,
    pub orbit_path: Option<Vec<[f32; 3]>>,
    pub camera: OrbitCamera,
}

impl SceneData {
    pub fn vertex_count(&self) -> usize {
        self.bodies.iter().map(|b| b.mesh.vertex_count()).sum()
    }
}

/// Tessellate a seamed sphere and map its texture coordinates with the same
/// radius it was generated at.
pub fn textured_sphere(radius: f32, resolution: usize, seam_gap_deg: f64) -> Result<TexturedMesh, AppError> {
    let mesh = build_sphere(&SphereSpec::seamed(radius, resolution, SEAM_THETA_DEG, seam_gap_deg))?;
    let uvs = map_spherical_uvs(&mesh.positions, radius)?;
    Ok(TexturedMesh::new(mesh, uvs)?)
}

pub fn build_scene(cfg: &SceneConfig, orbit: Option<&OrbitalElements>) -> Result<SceneData, AppError> {
    // validate before decoding any 8k texture, drawn or not
    if let Some(el) = orbit {
        el.validate(cfg.moon_radius as f64)?;
    }
    let orbit_path = orbit
        .filter(|_| cfg.show_orbit)
        .map(|el| el.sample_path(ORBIT_SAMPLES));

    let mut bodies = Vec::with_capacity(2);

    bodies.push(BodyData {
        name: "moon",
        radius: cfg.moon_radius,
        mesh: textured_sphere(cfg.moon_radius, cfg.resolution, MOON_SEAM_GAP_DEG)?,
        texture: load_texture(&cfg.moon_texture)?,
        lit: true,
    });

    if cfg.show_stars {
        let star_radius = cfg.star_radius();
        bodies.push(BodyData {
            name: "stars",
            radius: star_radius,
            mesh: textured_sphere(star_radius, cfg.resolution, STARS_SEAM_GAP_DEG)?,
            texture: load_texture(&cfg.stars_texture)?,
            lit: false,
        });
    }

    let scene = SceneData {
        bodies,
        orbit_path,
        camera: OrbitCamera::initial(cfg.moon_radius, cfg.star_radius()),
    };
    log::info!(
        "built scene: {} bodies, {} vertices, orbit {}",
        scene.bodies.len(),
        scene.vertex_count(),
        if scene.orbit_path.is_some() { "shown" } else { "hidden" }
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OrbitError, TextureError};
    use image::Rgba;
    use std::path::PathBuf;

    fn write_png(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lunar_viewer_scene_{}_{}.png", std::process::id(), name));
        RgbaImage::from_pixel(8, 4, Rgba([200, 200, 200, 255])).save(&path).unwrap();
        path
    }

    fn config(tag: &str, stars: bool) -> SceneConfig {
        SceneConfig {
            resolution: 12,
            moon_texture: write_png(&format!("{}_moon", tag)),
            stars_texture: write_png(&format!("{}_stars", tag)),
            show_stars: stars,
            ..SceneConfig::default()
        }
    }

    #[test]
    fn moon_and_stars_with_orbit() {
        let el = OrbitalElements {
            semi_major_axis_m: 2e6,
            eccentricity: 0.01,
            inclination_deg: 30.0,
        };
        let scene = build_scene(&config("both", true), Some(&el)).unwrap();
        assert_eq!(scene.bodies.len(), 2);
        assert!(scene.bodies[0].lit);
        assert!(!scene.bodies[1].lit);
        assert_eq!(scene.bodies[1].radius, 100.0 * 1_737_400.0);
        for b in &scene.bodies {
            assert_eq!(b.mesh.uvs().len(), b.mesh.positions().len());
        }
        assert_eq!(scene.orbit_path.as_ref().map(Vec::len), Some(ORBIT_SAMPLES + 1));
        assert_eq!(scene.vertex_count(), 2 * (2 + 11 * 13));
    }

    #[test]
    fn stars_can_be_disabled() {
        let scene = build_scene(&config("no_stars", false), None).unwrap();
        assert_eq!(scene.bodies.len(), 1);
        assert!(scene.orbit_path.is_none());
    }

    #[test]
    fn missing_texture_fails_the_build() {
        let cfg = SceneConfig {
            moon_texture: PathBuf::from("no/such/moon.jpg"),
            ..config("missing", false)
        };
        assert!(matches!(
            build_scene(&cfg, None),
            Err(AppError::Texture(TextureError::Open { .. }))
        ));
    }

    #[test]
    fn orbit_inside_the_moon_fails_the_build() {
        let el = OrbitalElements {
            semi_major_axis_m: 1e6,
            eccentricity: 0.0,
            inclination_deg: 0.0,
        };
        assert!(matches!(
            build_scene(&config("inside", false), Some(&el)),
            Err(AppError::Orbit(OrbitError::Periapsis { .. }))
        ));
    }

    #[test]
    fn hidden_orbit_is_still_validated() {
        let el = OrbitalElements {
            semi_major_axis_m: -5.0,
            eccentricity: 3.0,
            inclination_deg: 999.0,
        };
        let cfg = SceneConfig {
            show_orbit: false,
            ..config("hidden", false)
        };
        assert!(matches!(
            build_scene(&cfg, Some(&el)),
            Err(AppError::Orbit(OrbitError::SemiMajorAxis(_)))
        ));

        let ok = OrbitalElements {
            semi_major_axis_m: 2e6,
            eccentricity: 0.0,
            inclination_deg: 0.0,
        };
        let scene = build_scene(&cfg, Some(&ok)).unwrap();
        assert!(scene.orbit_path.is_none());
    }
}
