// mesh.rs — UV sphere tessellation and the textured mesh handed to the renderer
//
// Layout follows the classic VTK sphere source: theta is longitude around +z,
// phi the polar angle from the north pole. Poles are single vertices; a sweep
// short of 360° gets an extra column so the seam vertices are duplicated.

use crate::error::MeshError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSpec {
    pub radius: f32,
    pub theta_resolution: usize,
    pub phi_resolution: usize,
    pub start_theta_deg: f64,
    pub end_theta_deg: f64,
}

impl SphereSpec {
    /// Full sphere whose open seam starts `gap_deg` past `seam_deg` and ends on it.
    pub fn seamed(radius: f32, resolution: usize, seam_deg: f64, gap_deg: f64) -> Self {
        Self {
            radius,
            theta_resolution: resolution,
            phi_resolution: resolution,
            start_theta_deg: seam_deg + gap_deg,
            end_theta_deg: seam_deg,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Positions, texture coordinates and triangles of one body. The two vertex
/// arrays are parallel; `new` is the only way to build one.
#[derive(Debug, Clone)]
pub struct TexturedMesh {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl TexturedMesh {
    pub fn new(mesh: SphereMesh, uvs: Vec<[f32; 2]>) -> Result<Self, MeshError> {
        if uvs.len() != mesh.positions.len() {
            return Err(MeshError::LengthMismatch {
                positions: mesh.positions.len(),
                uvs: uvs.len(),
            });
        }
        Ok(Self {
            positions: mesh.positions,
            uvs,
            indices: mesh.indices,
        })
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

pub fn build_sphere(spec: &SphereSpec) -> Result<SphereMesh, MeshError> {
    let radius = spec.radius;
    if !(radius > 0.0) || !radius.is_finite() {
        return Err(MeshError::InvalidRadius(radius));
    }
    if spec.theta_resolution < 3 || spec.phi_resolution < 3 {
        return Err(MeshError::InvalidResolution {
            theta: spec.theta_resolution,
            phi: spec.phi_resolution,
        });
    }

    let start = spec.start_theta_deg;
    let mut end = spec.end_theta_deg;
    while end <= start {
        end += 360.0;
    }
    let sweep = end - start;
    let closed = (sweep - 360.0).abs() < 1e-9;

    let res = spec.theta_resolution;
    let columns = if closed { res } else { res + 1 };
    let rings = spec.phi_resolution - 1;
    let delta_theta = sweep / res as f64;

    // Last open column sits exactly on the end angle given by the caller so
    // that it lands on the same side of the seam every time.
    let column_angles: Vec<f64> = (0..columns)
        .map(|i| {
            let deg = if !closed && i == res {
                spec.end_theta_deg
            } else {
                start + i as f64 * delta_theta
            };
            deg.to_radians()
        })
        .collect();

    let r = radius as f64;
    let mut positions = Vec::with_capacity(2 + rings * columns);
    positions.push([0.0, 0.0, radius]);
    positions.push([0.0, 0.0, -radius]);

    for j in 1..=rings {
        let phi = std::f64::consts::PI * j as f64 / spec.phi_resolution as f64;
        let z = r * phi.cos();
        let ring_r = r * phi.sin();
        for &theta in &column_angles {
            positions.push([
                (ring_r * theta.cos()) as f32,
                (ring_r * theta.sin()) as f32,
                z as f32,
            ]);
        }
    }

    let at = |ring: usize, col: usize| -> u32 { (2 + ring * columns + col % columns) as u32 };
    let quads = res; // closed: last quad wraps via `col % columns`

    let mut indices = Vec::with_capacity(6 * quads * rings);

    for i in 0..quads {
        indices.extend_from_slice(&[0, at(0, i), at(0, i + 1)]);
    }

    for j in 0..rings - 1 {
        for i in 0..quads {
            let a = at(j, i);
            let b = at(j, i + 1);
            let c = at(j + 1, i);
            let d = at(j + 1, i + 1);

            indices.extend_from_slice(&[
                a, c, d,
                a, d, b,
            ]);
        }
    }

    for i in 0..quads {
        indices.extend_from_slice(&[at(rings - 1, i), 1, at(rings - 1, i + 1)]);
    }

    Ok(SphereMesh { positions, indices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uv::{map_spherical_uvs, SEAM_THETA_DEG};
    use approx::assert_abs_diff_eq;

    fn unit(res: usize) -> SphereSpec {
        SphereSpec::seamed(1.0, res, SEAM_THETA_DEG, 0.001)
    }

    fn len(p: [f32; 3]) -> f32 {
        (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt()
    }

    #[test]
    fn open_sweep_counts() {
        let m = build_sphere(&unit(8)).unwrap();
        // 2 poles + 7 rings of 9 columns
        assert_eq!(m.positions.len(), 2 + 7 * 9);
        // 8 north + 8 south caps + 6 bands of 8 quads
        assert_eq!(m.indices.len(), 3 * (8 + 8 + 2 * 6 * 8));
        let max = m.positions.len() as u32;
        assert!(m.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn closed_sweep_has_no_duplicate_column() {
        let spec = SphereSpec {
            radius: 1.0,
            theta_resolution: 6,
            phi_resolution: 4,
            start_theta_deg: 0.0,
            end_theta_deg: 360.0,
        };
        let m = build_sphere(&spec).unwrap();
        assert_eq!(m.positions.len(), 2 + 3 * 6);
        assert_eq!(m.indices.len(), 3 * (6 + 6 + 2 * 2 * 6));
        let max = m.positions.len() as u32;
        assert!(m.indices.iter().all(|&i| i < max));
    }

    #[test]
    fn vertices_lie_on_sphere() {
        let spec = SphereSpec::seamed(1_737_400.0, 24, SEAM_THETA_DEG, 0.001);
        let m = build_sphere(&spec).unwrap();
        assert_eq!(m.positions[0], [0.0, 0.0, 1_737_400.0]);
        assert_eq!(m.positions[1], [0.0, 0.0, -1_737_400.0]);
        for p in &m.positions {
            assert_abs_diff_eq!(len(*p) / 1_737_400.0, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn triangles_face_outwards() {
        let m = build_sphere(&unit(12)).unwrap();
        for tri in m.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| m.positions[i as usize]);
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let n = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let centre = [(a[0] + b[0] + c[0]) / 3.0, (a[1] + b[1] + c[1]) / 3.0, (a[2] + b[2] + c[2]) / 3.0];
            let dot = n[0] * centre[0] + n[1] * centre[1] + n[2] * centre[2];
            assert!(dot >= -1e-6, "inward triangle {:?}", tri);
        }
    }

    #[test]
    fn seam_columns_hit_opposite_texture_edges() {
        let res = 16;
        let m = build_sphere(&unit(res)).unwrap();
        let uvs = map_spherical_uvs(&m.positions, 1.0).unwrap();
        let columns = res + 1;
        // equator-ish ring
        let ring = 7;
        let first = uvs[2 + ring * columns][0];
        let last = uvs[2 + ring * columns + res][0];
        assert!(first < 0.01, "first seam column u = {}", first);
        assert!(last > 0.99, "last seam column u = {}", last);

        // u grows monotonically along the ring
        let row: Vec<f32> = (0..columns).map(|i| uvs[2 + ring * columns + i][0]).collect();
        assert!(row.windows(2).all(|w| w[1] > w[0]), "{:?}", row);
    }

    #[test]
    fn rejects_bad_input() {
        let mut spec = unit(8);
        spec.radius = 0.0;
        assert_eq!(build_sphere(&spec).unwrap_err(), MeshError::InvalidRadius(0.0));

        let mut spec = unit(8);
        spec.phi_resolution = 2;
        assert_eq!(
            build_sphere(&spec).unwrap_err(),
            MeshError::InvalidResolution { theta: 8, phi: 2 }
        );
    }

    #[test]
    fn textured_mesh_requires_parallel_arrays() {
        let m = build_sphere(&unit(4)).unwrap();
        let n = m.positions.len();
        let err = TexturedMesh::new(m.clone(), vec![[0.0, 0.0]; n - 1]).unwrap_err();
        assert_eq!(err, MeshError::LengthMismatch { positions: n, uvs: n - 1 });

        let uvs = map_spherical_uvs(&m.positions, 1.0).unwrap();
        let t = TexturedMesh::new(m, uvs).unwrap();
        assert_eq!(t.vertex_count(), n);
        assert_eq!(t.uvs().len(), t.positions().len());
    }
}
