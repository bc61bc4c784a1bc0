// orbit.rs — orbital-parameter form and a static Keplerian orbit path

use crate::error::OrbitError;
use std::f64::consts::PI;

/// Lunar standard gravitational parameter, m³/s².
pub const MOON_MU: f64 = 4.904_869_5e12;

/// Raw text of the three form fields, exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitForm {
    pub semi_major_axis: String,
    pub eccentricity: String,
    pub inclination: String,
}

impl Default for OrbitForm {
    fn default() -> Self {
        Self {
            semi_major_axis: "2000000".to_string(),
            eccentricity: "0.01".to_string(),
            inclination: "30".to_string(),
        }
    }
}

impl OrbitForm {
    pub fn parse(&self) -> Result<OrbitalElements, OrbitError> {
        fn field(name: &'static str, text: &str) -> Result<f64, OrbitError> {
            text.trim().parse::<f64>().map_err(|_| OrbitError::Parse {
                field: name,
                value: text.to_string(),
            })
        }

        let elements = OrbitalElements {
            semi_major_axis_m: field("semi-major axis", &self.semi_major_axis)?,
            eccentricity: field("eccentricity", &self.eccentricity)?,
            inclination_deg: field("inclination", &self.inclination)?,
        };
        log::info!(
            "orbital parameters: a={} m, e={}, i={}°",
            elements.semi_major_axis_m,
            elements.eccentricity,
            elements.inclination_deg
        );
        Ok(elements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub semi_major_axis_m: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
}

impl OrbitalElements {
    /// Closed orbits only, and the periapsis has to clear the surface.
    pub fn validate(&self, body_radius: f64) -> Result<(), OrbitError> {
        let a = self.semi_major_axis_m;
        let e = self.eccentricity;
        let i = self.inclination_deg;

        if !a.is_finite() || a <= 0.0 {
            return Err(OrbitError::SemiMajorAxis(a));
        }
        if !(0.0..1.0).contains(&e) {
            return Err(OrbitError::Eccentricity(e));
        }
        if !(0.0..=180.0).contains(&i) {
            return Err(OrbitError::Inclination(i));
        }
        let periapsis = self.periapsis_m();
        if periapsis <= body_radius {
            return Err(OrbitError::Periapsis {
                periapsis,
                radius: body_radius,
            });
        }
        Ok(())
    }

    pub fn periapsis_m(&self) -> f64 {
        self.semi_major_axis_m * (1.0 - self.eccentricity)
    }

    pub fn apoapsis_m(&self) -> f64 {
        self.semi_major_axis_m * (1.0 + self.eccentricity)
    }

    pub fn period_s(&self, mu: f64) -> f64 {
        2.0 * PI * (self.semi_major_axis_m.powi(3) / mu).sqrt()
    }

    /// `samples + 1` points around the ellipse, focus at the origin, periapsis
    /// on +x, orbit plane tilted about +x by the inclination. First and last
    /// points coincide. `samples == 0` gives the periapsis alone.
    pub fn sample_path(&self, samples: usize) -> Vec<[f32; 3]> {
        let a = self.semi_major_axis_m;
        let e = self.eccentricity;
        let p = a * (1.0 - e * e);
        let (sin_i, cos_i) = self.inclination_deg.to_radians().sin_cos();

        (0..=samples)
            .map(|k| {
                let nu = if k == samples {
                    0.0
                } else {
                    2.0 * PI * k as f64 / samples as f64
                };
                let r = p / (1.0 + e * nu.cos());
                let x = r * nu.cos();
                let y = r * nu.sin();
                [x as f32, (y * cos_i) as f32, (y * sin_i) as f32]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const MOON_R: f64 = 1_737_400.0;

    fn elements(a: f64, e: f64, i: f64) -> OrbitalElements {
        OrbitalElements {
            semi_major_axis_m: a,
            eccentricity: e,
            inclination_deg: i,
        }
    }

    #[test]
    fn default_form_parses_and_validates() {
        let el = OrbitForm::default().parse().unwrap();
        assert_eq!(el, elements(2_000_000.0, 0.01, 30.0));
        el.validate(MOON_R).unwrap();
    }

    #[test]
    fn parse_error_names_the_field() {
        let form = OrbitForm {
            eccentricity: "zero point one".to_string(),
            ..OrbitForm::default()
        };
        assert_eq!(
            form.parse().unwrap_err(),
            OrbitError::Parse {
                field: "eccentricity",
                value: "zero point one".to_string()
            }
        );
    }

    #[test]
    fn whitespace_is_tolerated() {
        let form = OrbitForm {
            semi_major_axis: " 2500000 ".to_string(),
            ..OrbitForm::default()
        };
        assert_eq!(form.parse().unwrap().semi_major_axis_m, 2_500_000.0);
    }

    #[test]
    fn validation_bounds() {
        assert_eq!(
            elements(-1.0, 0.0, 0.0).validate(MOON_R),
            Err(OrbitError::SemiMajorAxis(-1.0))
        );
        assert_eq!(
            elements(3e6, 1.0, 0.0).validate(MOON_R),
            Err(OrbitError::Eccentricity(1.0))
        );
        assert_eq!(
            elements(3e6, 0.1, 181.0).validate(MOON_R),
            Err(OrbitError::Inclination(181.0))
        );
        assert!(matches!(
            elements(1_800_000.0, 0.1, 0.0).validate(MOON_R),
            Err(OrbitError::Periapsis { .. })
        ));
        assert!(elements(3e6, 0.0, 180.0).validate(MOON_R).is_ok());
    }

    #[test]
    fn circular_path_has_constant_radius() {
        let path = elements(2e6, 0.0, 45.0).sample_path(64);
        assert_eq!(path.len(), 65);
        assert_eq!(path[0], path[64]);
        for p in &path {
            let r = ((p[0] as f64).powi(2) + (p[1] as f64).powi(2) + (p[2] as f64).powi(2)).sqrt();
            assert_abs_diff_eq!(r, 2e6, epsilon = 1.0);
        }
    }

    #[test]
    fn coarse_paths_keep_the_point_count() {
        let el = elements(2e6, 0.1, 10.0);
        for n in 0..4 {
            let path = el.sample_path(n);
            assert_eq!(path.len(), n + 1);
            assert_eq!(path[0], path[n]);
        }
        assert_abs_diff_eq!(el.sample_path(0)[0][0] as f64, el.periapsis_m(), epsilon = 1.0);
    }

    #[test]
    fn polar_orbit_lies_in_xz_plane() {
        let path = elements(2e6, 0.2, 90.0).sample_path(32);
        for p in &path {
            assert!(p[1].abs() < 1.0, "y = {}", p[1]);
        }
        // periapsis on +x
        assert_abs_diff_eq!(path[0][0] as f64, 2e6 * 0.8, epsilon = 1.0);
        // apoapsis on -x
        assert_abs_diff_eq!(path[16][0] as f64, -2e6 * 1.2, epsilon = 1.0);
    }

    #[test]
    fn period_matches_kepler() {
        // ~2 h for a 100 km altitude circular orbit
        let el = elements(MOON_R + 100_000.0, 0.0, 0.0);
        let t = el.period_s(MOON_MU);
        assert!((7000.0..7100.0).contains(&t), "period = {}", t);
        assert_abs_diff_eq!(el.apoapsis_m(), el.periapsis_m(), epsilon = 1e-9);
    }
}
