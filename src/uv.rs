// uv.rs — equirectangular texture coordinates for sphere vertices

use crate::error::MeshError;
use std::f32::consts::PI;

/// Longitude of the `atan2` discontinuity, measured in the xy-plane from +x
/// towards +y. Sphere meshes must put their duplicated seam column here.
pub const SEAM_THETA_DEG: f64 = 270.0;

/// Compute one `(u, v)` per vertex, in input order.
///
/// Vertices are expected to lie on a sphere of `radius` centred at the
/// origin. `u` wraps at the meridian `x = 0, y < 0` and `v` runs from 0 at
/// the south pole (-z) to 1 at the north pole (+z).
pub fn map_spherical_uvs(vertices: &[[f32; 3]], radius: f32) -> Result<Vec<[f32; 2]>, MeshError> {
    // `!(r > 0)` also rejects NaN
    if !(radius > 0.0) || !radius.is_finite() {
        return Err(MeshError::InvalidRadius(radius));
    }

    let uvs = vertices
        .iter()
        .map(|v| {
            let x = v[0] / radius;
            let y = v[1] / radius;
            let z = (v[2] / radius).clamp(-1.0, 1.0);

            let u = 0.5 + (-x).atan2(y) / (2.0 * PI);
            let v = 0.5 + z.asin() / PI;
            [u, v]
        })
        .collect();

    Ok(uvs)
}
