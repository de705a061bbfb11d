use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Interleaved vertex as laid out in the vertex buffers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle mesh in separate attribute streams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleave attributes; missing normals or uvs are zero-filled
    pub fn to_vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0; 3]),
                uv: self.uvs.get(i).copied().unwrap_or([0.0; 2]),
            })
            .collect()
    }

    /// Area-weighted vertex normals from the triangle list
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let face = (pc - pb).cross(pa - pb);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }
}

/// Flat disc in the XY plane facing +Z
pub fn circle(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let mut mesh = MeshData::default();

    mesh.positions.push([0.0, 0.0, 0.0]);
    mesh.normals.push([0.0, 0.0, 1.0]);
    mesh.uvs.push([0.5, 0.5]);

    for s in 0..=segments {
        let theta = s as f32 / segments as f32 * std::f32::consts::TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.positions.push([radius * cos, radius * sin, 0.0]);
        mesh.normals.push([0.0, 0.0, 1.0]);
        mesh.uvs.push([(cos + 1.0) / 2.0, (sin + 1.0) / 2.0]);
    }

    for i in 1..=segments {
        mesh.indices.extend_from_slice(&[i, i + 1, 0]);
    }
    mesh
}

/// Subdivided rectangle in the XY plane facing +Z, centred on the origin
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let gx = width_segments.max(1);
    let gy = height_segments.max(1);
    let seg_w = width / gx as f32;
    let seg_h = height / gy as f32;

    let row = (gx + 1) as usize;
    let count = row * (gy + 1) as usize;
    let mut mesh = MeshData {
        positions: Vec::with_capacity(count),
        normals: Vec::with_capacity(count),
        uvs: Vec::with_capacity(count),
        indices: Vec::with_capacity((gx * gy * 6) as usize),
    };

    for iy in 0..=gy {
        let y = height / 2.0 - iy as f32 * seg_h;
        for ix in 0..=gx {
            let x = ix as f32 * seg_w - width / 2.0;
            mesh.positions.push([x, y, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.uvs.push([ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32]);
        }
    }

    let stride = gx + 1;
    for iy in 0..gy {
        for ix in 0..gx {
            let a = ix + stride * iy;
            let b = ix + stride * (iy + 1);
            let c = ix + 1 + stride * (iy + 1);
            let d = ix + 1 + stride * iy;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_counts() {
        let disc = circle(4.0, 16);
        assert_eq!(disc.vertex_count(), 18);
        assert_eq!(disc.triangle_count(), 16);
        let rim = Vec3::from_array(disc.positions[5]);
        assert!((rim.length() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_plane_counts_and_extent() {
        let water = plane(60.0, 60.0, 128, 128);
        assert_eq!(water.vertex_count(), 129 * 129);
        assert_eq!(water.triangle_count(), 128 * 128 * 2);
        assert_eq!(water.positions[0], [-30.0, 30.0, 0.0]);
        assert_eq!(*water.positions.last().unwrap(), [30.0, -30.0, 0.0]);
        assert!(water.indices.iter().all(|&i| (i as usize) < water.vertex_count()));
    }

    #[test]
    fn test_plane_winding_faces_positive_z() {
        let quad = plane(2.0, 2.0, 1, 1);
        let mut recomputed = quad.clone();
        recomputed.compute_normals();
        for n in recomputed.normals {
            assert!((Vec3::from_array(n) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let verts = circle(1.0, 3).to_vertices();
        assert_eq!(verts.len(), 5);
        assert_eq!(verts[0].normal, [0.0, 0.0, 1.0]);
    }
}
