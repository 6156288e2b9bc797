use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A vertex in normalized canvas coordinates, both components in [0, 1].
pub type Point = [f64; 2];

/// Straight (non-premultiplied) RGBA color, one byte per channel.
pub type Rgba = [u8; 4];

/// Lower bound of the alpha channel for freshly seeded triangles.
const SEED_ALPHA_MIN: u8 = 20;
/// Upper bound of the alpha channel for freshly seeded triangles.
const SEED_ALPHA_MAX: u8 = 200;

/// A single gene: one colored triangle.
///
/// Triangles are plain `Copy` values. Any operator that "changes" a triangle
/// produces a new value, so two candidates can never observe each other's edits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
    pub color: Rgba,
    /// Depth value in [0, 255]. Paint order is the position in the candidate.
    pub z_index: f64,
}

impl Triangle {
    pub fn new(p1: Point, p2: Point, p3: Point, color: Rgba, z_index: f64) -> Self {
        Self {
            p1,
            p2,
            p3,
            color,
            z_index,
        }
    }

    /// Returns the three vertices in declaration order.
    pub fn vertices(&self) -> [Point; 3] {
        [self.p1, self.p2, self.p3]
    }

    /// Generates a random triangle anywhere on the canvas.
    ///
    /// # Arguments
    /// * `rng` - The random source to draw from
    /// * `z_index` - Depth value to assign to the new triangle
    ///
    /// # Returns
    /// * `Triangle` - Vertices uniform in [0, 1], opaque-ish random color
    pub fn random<R: Rng + ?Sized>(rng: &mut R, z_index: f64) -> Self {
        let mut point = || [rng.random::<f64>(), rng.random::<f64>()];
        let (p1, p2, p3) = (point(), point(), point());
        let color = [
            rng.random::<u8>(),
            rng.random::<u8>(),
            rng.random::<u8>(),
            rng.random_range(SEED_ALPHA_MIN..=SEED_ALPHA_MAX),
        ];
        Self::new(p1, p2, p3, color, z_index)
    }
}

/// One candidate solution: an ordered, fixed-length list of triangles.
///
/// The gene list is shared behind an `Arc<[Triangle]>` and never handed out
/// mutably, so cloning an individual (e.g. for elitism) is cheap and a clone
/// can never be used to edit the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Individual {
    triangles: Arc<[Triangle]>,
}

impl Individual {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles: triangles.into(),
        }
    }

    /// Read-only view of the genes in paint order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Copies the genes into a fresh vector that the caller may edit freely.
    pub fn to_genes(&self) -> Vec<Triangle> {
        self.triangles.to_vec()
    }

    /// True when both individuals point at the same gene storage.
    pub fn shares_genes_with(&self, other: &Individual) -> bool {
        Arc::ptr_eq(&self.triangles, &other.triangles)
    }
}

impl From<Vec<Triangle>> for Individual {
    fn from(triangles: Vec<Triangle>) -> Self {
        Self::new(triangles)
    }
}

/// Alias for the engine-owned set of candidates of one generation.
pub type Population = Vec<Individual>;

/// Builds a random starting population.
///
/// # Arguments
/// * `pop_size` - Number of individuals to create
/// * `num_triangles` - Number of genes of every individual
/// * `rng` - Random source
///
/// # Returns
/// * `Population` - `pop_size` individuals, each with exactly `num_triangles` genes.
///   The depth of each gene is initialised to its position.
pub fn init_population<R: Rng + ?Sized>(
    pop_size: usize,
    num_triangles: usize,
    rng: &mut R,
) -> Population {
    (0..pop_size)
        .map(|_| {
            (0..num_triangles)
                .map(|i| Triangle::random(&mut *rng, (i as f64).min(255.0)))
                .collect::<Vec<_>>()
                .into()
        })
        .collect()
}
