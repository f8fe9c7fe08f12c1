use ahash::AHashMap;
use kex_structs::core::Instance;

/// Adjacency and weight storage with per-vertex neighbor indices.
///
/// Built once per formulation in `O(V + E)` and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Graph {
    pub num_vertices: usize,
    /// Edge tuples in input order; edge ids index into this list.
    pub edges: Vec<(usize, usize)>,
    pub in_neighbors: Vec<Vec<usize>>,
    pub out_neighbors: Vec<Vec<usize>>,
    pub in_edges: Vec<Vec<usize>>,
    pub out_edges: Vec<Vec<usize>>,
    pub sources: Vec<usize>,
    pub is_source: Vec<bool>,
    pub is_forbidden: Vec<bool>,
    weights: AHashMap<(usize, usize), f64>,
}

impl Graph {
    pub fn new(instance: &Instance) -> Self {
        let n = instance.num_vertices;
        let mut in_neighbors = vec![Vec::new(); n];
        let mut out_neighbors = vec![Vec::new(); n];
        let mut in_edges = vec![Vec::new(); n];
        let mut out_edges = vec![Vec::new(); n];
        let mut edges = Vec::with_capacity(instance.edges.len());
        let mut weights = AHashMap::with_capacity(instance.edges.len());
        for (id, &(u, v, w)) in instance.edges.iter().enumerate() {
            edges.push((u, v));
            weights.insert((u, v), w);
            out_neighbors[u].push(v);
            in_neighbors[v].push(u);
            out_edges[u].push(id);
            in_edges[v].push(id);
        }
        let mut is_source = vec![false; n];
        for &s in &instance.sources {
            is_source[s] = true;
        }
        let mut is_forbidden = vec![false; n];
        for &f in &instance.forbidden {
            is_forbidden[f] = true;
        }
        let mut sources = instance.sources.clone();
        sources.sort_unstable();
        Self {
            num_vertices: n,
            edges,
            in_neighbors,
            out_neighbors,
            in_edges,
            out_edges,
            sources,
            is_source,
            is_forbidden,
            weights,
        }
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Weight of the arc `(u, v)`, 0 when there is no such arc.
    pub fn weight(&self, u: usize, v: usize) -> f64 {
        self.weights.get(&(u, v)).copied().unwrap_or(0.0)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.weights.contains_key(&(u, v))
    }

    pub fn patients(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_vertices).filter(move |&v| !self.is_source[v])
    }

    pub fn num_patients(&self) -> usize {
        self.num_vertices - self.sources.len()
    }

    pub fn has_forbidden(&self) -> bool {
        self.is_forbidden.iter().any(|&f| f)
    }

    /// Per-step weights of a closed walk through `cycle`, including the closing arc.
    pub fn cycle_weights(&self, cycle: &[usize]) -> Vec<f64> {
        let c = cycle.len();
        (0..c)
            .map(|j| self.weight(cycle[j], cycle[(j + 1) % c]))
            .collect()
    }
}
