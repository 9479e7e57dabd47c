// math.rs - small vector/matrix helpers shared by the collector and builder

use serde::{Deserialize, Serialize};

/// Local transform of a scene node: position, Euler XYZ rotation (radians)
/// and a uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn to_affine(&self) -> Affine {
        let rot = matrix3_from_euler_xyz(self.rotation[0], self.rotation[1], self.rotation[2]);
        let mut linear = rot;
        for row in linear.iter_mut() {
            for v in row.iter_mut() {
                *v *= self.scale;
            }
        }
        Affine {
            linear,
            translation: self.position,
        }
    }
}

/// Affine transform (3x3 linear part + translation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub linear: [[f32; 3]; 3],
    pub translation: [f32; 3],
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        linear: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0; 3],
    };

    /// `self` applied after `child`: world = parent * local
    pub fn then_local(&self, child: &Affine) -> Affine {
        let t = mat3_mul_vec3(&self.linear, &child.translation);
        Affine {
            linear: mat3_mul_mat3(&self.linear, &child.linear),
            translation: [
                t[0] + self.translation[0],
                t[1] + self.translation[1],
                t[2] + self.translation[2],
            ],
        }
    }

    pub fn transform_point(&self, p: &[f32; 3]) -> [f32; 3] {
        let v = mat3_mul_vec3(&self.linear, p);
        [
            v[0] + self.translation[0],
            v[1] + self.translation[1],
            v[2] + self.translation[2],
        ]
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: [f32::MAX; 3],
            max: [f32::MIN; 3],
        }
    }

    pub fn include(&mut self, p: &[f32; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn extent(&self, axis: usize) -> f32 {
        self.max[axis] - self.min[axis]
    }
}

/// Which scene axis points up.
///
/// The voxelizer works with Z up. Y-up geometry is swapped into that frame
/// (y <-> z) on the way in and back on the way out; the swap mirrors the
/// scene, so triangle winding is reversed along with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Scene point to voxelizer frame; the swap is its own inverse
    pub fn to_build(self, p: [f32; 3]) -> [f32; 3] {
        match self {
            UpAxis::Y => [p[0], p[2], p[1]],
            UpAxis::Z => p,
        }
    }

    pub fn from_build(self, p: [f32; 3]) -> [f32; 3] {
        self.to_build(p)
    }

    /// Scene triangle to voxelizer frame with its facing preserved
    pub fn to_build_triangle(self, tri: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
        match self {
            UpAxis::Y => [self.to_build(tri[0]), self.to_build(tri[2]), self.to_build(tri[1])],
            UpAxis::Z => tri,
        }
    }

    /// Voxelizer polygon back to the scene, keeping it counter-clockwise
    /// seen from above
    pub fn polygon_from_build(self, mut poly: Vec<[f32; 3]>) -> Vec<[f32; 3]> {
        if self == UpAxis::Y {
            for v in poly.iter_mut() {
                *v = self.from_build(*v);
            }
            poly.reverse();
        }
        poly
    }

    /// Scene point at `height` above the ground-plane coordinates `(a, b)`
    pub fn ground_point(self, a: f32, b: f32, height: f32) -> [f32; 3] {
        self.from_build([a, b, height])
    }
}

impl std::str::FromStr for UpAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "y" | "Y" => Ok(UpAxis::Y),
            "z" | "Z" => Ok(UpAxis::Z),
            other => Err(format!("unknown up axis '{}', expected Y or Z", other)),
        }
    }
}

pub fn matrix3_from_euler_xyz(x: f32, y: f32, z: f32) -> [[f32; 3]; 3] {
    let cx = x.cos();
    let sx = x.sin();
    let cy = y.cos();
    let sy = y.sin();
    let cz = z.cos();
    let sz = z.sin();

    [
        [cy * cz, -cy * sz, sy],
        [cz * sx * sy + cx * sz, cx * cz - sx * sy * sz, -cy * sx],
        [-cx * cz * sy + sx * sz, cz * sx + cx * sy * sz, cx * cy],
    ]
}

pub fn mat3_mul_vec3(m: &[[f32; 3]; 3], v: &[f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn mat3_mul_mat3(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
        }
    }
    out
}

/// Unit normal of a triangle (zero vector for degenerate triangles)
pub fn triangle_normal(tri: &[[f32; 3]; 3]) -> [f32; 3] {
    let e0 = [tri[1][0] - tri[0][0], tri[1][1] - tri[0][1], tri[1][2] - tri[0][2]];
    let e1 = [tri[2][0] - tri[0][0], tri[2][1] - tri[0][1], tri[2][2] - tri[0][2]];

    let mut norm = [
        e0[1] * e1[2] - e0[2] * e1[1],
        e0[2] * e1[0] - e0[0] * e1[2],
        e0[0] * e1[1] - e0[1] * e1[0],
    ];
    let len = (norm[0] * norm[0] + norm[1] * norm[1] + norm[2] * norm[2]).sqrt();
    if len > 0.0 {
        norm[0] /= len;
        norm[1] /= len;
        norm[2] /= len;
    }
    norm
}
