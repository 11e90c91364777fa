//! Self-collision primitives.
//!
//! A primitive is one test unit: a point, an edge, or a triangle of
//! particles. Primitive sets are built once per team from the topology and
//! refreshed per frame: swept AABB from previous and predicted positions
//! expanded by contact thickness, then sorted on one axis for the
//! sweep-and-prune broad phase.

use weft_arena::DataChunk;
use weft_math::Aabb;
use weft_mesh::ClothTopology;
use weft_solver::parameters::ClothParameters;
use weft_solver::ParticleStore;

/// What a primitive is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Point,
    Edge,
    Triangle,
}

impl PrimitiveKind {
    /// Particle count of this kind.
    pub fn arity(self) -> usize {
        match self {
            PrimitiveKind::Point => 1,
            PrimitiveKind::Edge => 2,
            PrimitiveKind::Triangle => 3,
        }
    }
}

/// Status bits of one primitive, with named accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrimitiveFlags(u8);

impl PrimitiveFlags {
    const FIX0: u8 = 1 << 0;
    const FIX1: u8 = 1 << 1;
    const FIX2: u8 = 1 << 2;
    const ALL_FIX: u8 = 1 << 3;
    const IGNORE: u8 = 1 << 4;

    fn get(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn fixed(self, slot: usize) -> bool {
        self.get(match slot {
            0 => Self::FIX0,
            1 => Self::FIX1,
            _ => Self::FIX2,
        })
    }

    pub fn set_fixed(&mut self, slot: usize, on: bool) {
        self.set(
            match slot {
                0 => Self::FIX0,
                1 => Self::FIX1,
                _ => Self::FIX2,
            },
            on,
        );
    }

    /// Every vertex of the primitive is fixed.
    pub fn all_fixed(self) -> bool {
        self.get(Self::ALL_FIX)
    }
    pub fn set_all_fixed(&mut self, on: bool) {
        self.set(Self::ALL_FIX, on)
    }

    /// Skipped by detection this frame (entangled).
    pub fn ignored(self) -> bool {
        self.get(Self::IGNORE)
    }
    pub fn set_ignored(&mut self, on: bool) {
        self.set(Self::IGNORE, on)
    }
}

/// One self-collision primitive. Vertex slots beyond the kind's arity are
/// unused.
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    /// Local (chunk-relative) vertex indices.
    pub vertices: [u32; 3],
    pub flags: PrimitiveFlags,
    /// Contact thickness this frame (m).
    pub thickness: f32,
    /// Swept box this frame, expanded by thickness.
    pub aabb: Aabb,
}

impl Primitive {
    /// True if the primitive shares a vertex with `other`.
    pub fn shares_vertex(&self, arity: usize, other: &Primitive, other_arity: usize) -> bool {
        self.vertices[..arity]
            .iter()
            .any(|v| other.vertices[..other_arity].contains(v))
    }
}

/// Sort key of one primitive on the sweep axis.
#[derive(Debug, Clone, Copy)]
pub struct SortEntry {
    pub min: f32,
    pub max: f32,
    pub index: u32,
}

/// All primitives of one kind for one team, with the sorted sweep array.
#[derive(Debug, Clone)]
pub struct PrimitiveSet {
    pub kind: PrimitiveKind,
    pub primitives: Vec<Primitive>,
    /// Sorted ascending by `min` on the sweep axis (Y).
    pub sorted: Vec<SortEntry>,
}

impl PrimitiveSet {
    /// Derive the set of one kind from a topology. Invalid vertices spawn
    /// no primitive.
    pub fn build(kind: PrimitiveKind, topology: &ClothTopology) -> Self {
        let mut primitives = Vec::new();
        let mut push = |vertices: [u32; 3]| {
            let arity = kind.arity();
            if vertices[..arity]
                .iter()
                .any(|&v| topology.attributes[v as usize].is_invalid())
            {
                return;
            }
            let mut flags = PrimitiveFlags::default();
            let mut all_fixed = true;
            for (slot, &v) in vertices[..arity].iter().enumerate() {
                let fixed = topology.attributes[v as usize].is_fixed();
                flags.set_fixed(slot, fixed);
                all_fixed &= fixed;
            }
            flags.set_all_fixed(all_fixed);
            primitives.push(Primitive {
                vertices,
                flags,
                thickness: 0.0,
                aabb: Aabb::from_point(weft_math::Vec3::ZERO),
            });
        };

        match kind {
            PrimitiveKind::Point => {
                for v in 0..topology.vertex_count() as u32 {
                    push([v, u32::MAX, u32::MAX]);
                }
            }
            PrimitiveKind::Edge => {
                for e in &topology.edges {
                    push([e[0], e[1], u32::MAX]);
                }
            }
            PrimitiveKind::Triangle => {
                for t in &topology.triangles {
                    push(*t);
                }
            }
        }

        PrimitiveSet {
            kind,
            primitives,
            sorted: Vec::new(),
        }
    }

    /// Refresh thickness, swept boxes, and the ignore flags, then rebuild
    /// the sorted sweep array.
    pub fn refresh(
        &mut self,
        particles: &ParticleStore,
        chunk: DataChunk,
        params: &ClothParameters,
        scale_ratio: f32,
        tangled: &[bool],
    ) {
        let base = chunk.start;
        let next = particles.next_pos.data();
        let old = particles.old_pos.data();
        let depth = particles.depth.data();
        let arity = self.kind.arity();

        for prim in &mut self.primitives {
            let mut thickness = 0.0f32;
            let mut tangled_any = false;
            let first = base + prim.vertices[0] as usize;
            let mut aabb = Aabb::from_points(old[first], next[first]);
            for &lv in &prim.vertices[..arity] {
                let i = base + lv as usize;
                let t = params
                    .self_collision
                    .surface_thickness
                    .evaluate_clamped(depth[i], 0.0, 1.0)
                    * scale_ratio;
                thickness = thickness.max(t);
                tangled_any |= tangled.get(lv as usize).copied().unwrap_or(false);
                aabb.encapsulate(old[i]);
                aabb.encapsulate(next[i]);
            }
            aabb.expand(thickness);
            prim.thickness = thickness;
            prim.aabb = aabb;
            prim.flags.set_ignored(tangled_any);
        }

        self.sorted.clear();
        self.sorted.reserve(self.primitives.len());
        for (i, prim) in self.primitives.iter().enumerate() {
            let (min, max) = prim.aabb.interval(1);
            self.sorted.push(SortEntry {
                min,
                max,
                index: i as u32,
            });
        }
        self.sorted
            .sort_unstable_by(|a, b| a.min.total_cmp(&b.min));
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}
