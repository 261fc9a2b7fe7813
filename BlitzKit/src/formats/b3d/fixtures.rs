//! In-memory B3D builders for tests

/// Builds one chunk: tag, length, body.
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    tag: [u8; 4],
    body: Vec<u8>,
}

impl ChunkBuilder {
    pub fn new(tag: &[u8; 4]) -> Self {
        Self {
            tag: *tag,
            body: Vec::new(),
        }
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.body.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn ints(mut self, values: &[i32]) -> Self {
        for value in values {
            self.body.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.body.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn floats(mut self, values: &[f32]) -> Self {
        for value in values {
            self.body.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn cstr(mut self, value: &str) -> Self {
        self.body.extend_from_slice(value.as_bytes());
        self.body.push(0);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn child(mut self, child: ChunkBuilder) -> Self {
        self.body.extend(child.build());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 8);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&(self.body.len() as i32).to_le_bytes());
        out.extend(self.body);
        out
    }
}

/// `BB3D` root with version 1 and the given children.
pub fn model(children: Vec<ChunkBuilder>) -> Vec<u8> {
    children
        .into_iter()
        .fold(ChunkBuilder::new(b"BB3D").i32(1), ChunkBuilder::child)
        .build()
}

/// `NODE` with identity transform.
pub fn node(name: &str) -> ChunkBuilder {
    node_at(name, [0.0, 0.0, 0.0])
}

/// `NODE` at `position` with unit scale and identity rotation.
pub fn node_at(name: &str, position: [f32; 3]) -> ChunkBuilder {
    ChunkBuilder::new(b"NODE")
        .cstr(name)
        .floats(&position)
        .floats(&[1.0, 1.0, 1.0])
        .floats(&[1.0, 0.0, 0.0, 0.0])
}

/// `MESH` with one `VRTS` (positions only) and one `TRIS`.
pub fn mesh(brush_id: i32, positions: &[[f32; 3]], triangles: &[[i32; 3]]) -> ChunkBuilder {
    let vrts = positions
        .iter()
        .fold(ChunkBuilder::new(b"VRTS").ints(&[0, 0, 0]), |chunk, p| {
            chunk.floats(p)
        });
    let tris = triangles
        .iter()
        .fold(ChunkBuilder::new(b"TRIS").i32(brush_id), |chunk, t| {
            chunk.ints(t)
        });
    ChunkBuilder::new(b"MESH").i32(brush_id).child(vrts).child(tris)
}

/// `BONE` from `(vertex, weight)` pairs.
pub fn bone(pairs: &[(i32, f32)]) -> ChunkBuilder {
    pairs
        .iter()
        .fold(ChunkBuilder::new(b"BONE"), |chunk, &(vertex, weight)| {
            chunk.i32(vertex).f32(weight)
        })
}

/// `ANIM` declaring `frames` frames at 30 fps.
pub fn anim(frames: i32) -> ChunkBuilder {
    ChunkBuilder::new(b"ANIM").i32(0).i32(frames).f32(30.0)
}
