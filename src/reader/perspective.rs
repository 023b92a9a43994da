use crate::geometry::PointF;

// Perspective transform
//------------------------------------------------------------------------------

/// 3x3 plane-to-plane projection, built from four point correspondences as
/// the composition square -> source quad -> destination quad.
#[derive(Debug, Clone, Copy)]
pub struct Homography {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
    a33: f64,
}

impl Homography {
    /// Solves the 8-parameter perspective mapping `src[i] -> dst[i]`.
    /// Degenerate correspondences (collinear points) come back as `None`.
    pub fn compute(src: [PointF; 4], dst: [PointF; 4]) -> Option<Homography> {
        let s_to_q = Self::square_to_quad(dst);
        let q_to_s = Self::square_to_quad(src).adjugate();
        let h = s_to_q.times(&q_to_s);
        if h.is_degenerate() {
            None
        } else {
            Some(h)
        }
    }

    pub fn map(&self, x: f64, y: f64) -> PointF {
        let den = self.a13 * x + self.a23 * y + self.a33;
        PointF::new(
            (self.a11 * x + self.a21 * y + self.a31) / den,
            (self.a12 * x + self.a22 * y + self.a32) / den,
        )
    }

    fn square_to_quad(q: [PointF; 4]) -> Homography {
        let [p0, p1, p2, p3] = q;
        let d3 = PointF::new(p0.x - p1.x + p2.x - p3.x, p0.y - p1.y + p2.y - p3.y);
        if d3.x == 0.0 && d3.y == 0.0 {
            // Affine case
            return Homography {
                a11: p1.x - p0.x,
                a21: p2.x - p1.x,
                a31: p0.x,
                a12: p1.y - p0.y,
                a22: p2.y - p1.y,
                a32: p0.y,
                a13: 0.0,
                a23: 0.0,
                a33: 1.0,
            };
        }
        let d1 = PointF::new(p1.x - p2.x, p1.y - p2.y);
        let d2 = PointF::new(p3.x - p2.x, p3.y - p2.y);
        let den = d1.cross(d2);
        let a13 = d3.cross(d2) / den;
        let a23 = d1.cross(d3) / den;
        Homography {
            a11: p1.x - p0.x + a13 * p1.x,
            a21: p3.x - p0.x + a23 * p3.x,
            a31: p0.x,
            a12: p1.y - p0.y + a13 * p1.y,
            a22: p3.y - p0.y + a23 * p3.y,
            a32: p0.y,
            a13,
            a23,
            a33: 1.0,
        }
    }

    // Inverse up to scale, which a projective transform doesn't care about
    fn adjugate(&self) -> Homography {
        Homography {
            a11: self.a22 * self.a33 - self.a23 * self.a32,
            a21: self.a23 * self.a31 - self.a21 * self.a33,
            a31: self.a21 * self.a32 - self.a22 * self.a31,
            a12: self.a13 * self.a32 - self.a12 * self.a33,
            a22: self.a11 * self.a33 - self.a13 * self.a31,
            a32: self.a12 * self.a31 - self.a11 * self.a32,
            a13: self.a12 * self.a23 - self.a13 * self.a22,
            a23: self.a13 * self.a21 - self.a11 * self.a23,
            a33: self.a11 * self.a22 - self.a12 * self.a21,
        }
    }

    fn times(&self, o: &Homography) -> Homography {
        Homography {
            a11: self.a11 * o.a11 + self.a21 * o.a12 + self.a31 * o.a13,
            a21: self.a11 * o.a21 + self.a21 * o.a22 + self.a31 * o.a23,
            a31: self.a11 * o.a31 + self.a21 * o.a32 + self.a31 * o.a33,
            a12: self.a12 * o.a11 + self.a22 * o.a12 + self.a32 * o.a13,
            a22: self.a12 * o.a21 + self.a22 * o.a22 + self.a32 * o.a23,
            a32: self.a12 * o.a31 + self.a22 * o.a32 + self.a32 * o.a33,
            a13: self.a13 * o.a11 + self.a23 * o.a12 + self.a33 * o.a13,
            a23: self.a13 * o.a21 + self.a23 * o.a22 + self.a33 * o.a23,
            a33: self.a13 * o.a31 + self.a23 * o.a32 + self.a33 * o.a33,
        }
    }

    fn is_degenerate(&self) -> bool {
        let vals = [
            self.a11, self.a12, self.a13, self.a21, self.a22, self.a23, self.a31, self.a32,
            self.a33,
        ];
        !vals.iter().all(|v| v.is_finite()) || vals.iter().all(|v| v.abs() < 1e-12)
    }
}

#[cfg(test)]
mod perspective_tests {
    use super::Homography;
    use crate::geometry::PointF;

    fn pt(x: f64, y: f64) -> PointF {
        PointF::new(x, y)
    }

    #[test]
    fn test_identity_on_matching_quads() {
        let q = [pt(3.5, 3.5), pt(17.5, 3.5), pt(17.5, 17.5), pt(3.5, 17.5)];
        let h = Homography::compute(q, q).unwrap();
        let p = h.map(10.0, 5.0);
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_translate() {
        let src = [pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)];
        let dst = [pt(10.0, 20.0), pt(30.0, 20.0), pt(30.0, 60.0), pt(10.0, 60.0)];
        let h = Homography::compute(src, dst).unwrap();
        let c = h.map(0.5, 0.5);
        assert!((c.x - 20.0).abs() < 1e-9 && (c.y - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_maps_corners_exactly() {
        let src = [pt(0.0, 0.0), pt(4.0, 0.0), pt(4.0, 4.0), pt(0.0, 4.0)];
        // A genuinely projective quad
        let dst = [pt(0.0, 0.0), pt(100.0, 10.0), pt(80.0, 90.0), pt(5.0, 70.0)];
        let h = Homography::compute(src, dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let p = h.map(s.x, s.y);
            assert!((p.x - d.x).abs() < 1e-6 && (p.y - d.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rotation_quad() {
        // 90 degree rotated destination
        let src = [pt(0.0, 0.0), pt(2.0, 0.0), pt(2.0, 2.0), pt(0.0, 2.0)];
        let dst = [pt(10.0, 0.0), pt(10.0, 2.0), pt(8.0, 2.0), pt(8.0, 0.0)];
        let h = Homography::compute(src, dst).unwrap();
        let p = h.map(1.0, 0.0);
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
    }
}
