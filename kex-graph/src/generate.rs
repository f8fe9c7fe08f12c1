use anyhow::{anyhow, Result};
use kex_structs::core::Instance;
use rand::{
    rngs::{SmallRng, StdRng},
    Rng, SeedableRng,
};
use serde::{Deserialize, Serialize};

/// Shape of a synthetic exchange pool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub num_vertices: usize,
    pub num_sources: usize,
    pub edge_percent: u32,
    pub max_cycle_length: usize,
    pub max_chain_length: usize,
    #[serde(default)]
    pub forbidden_percent: u32,
}

/// Seeded random instance. Vertices `0..num_sources` are sources and never receive an edge.
pub fn generate_instance(seed: &[u8; 32], track: &Track) -> Result<Instance> {
    if track.num_sources > track.num_vertices {
        return Err(anyhow!(
            "num_sources ({}) cannot exceed num_vertices ({})",
            track.num_sources,
            track.num_vertices
        ));
    }
    if track.edge_percent > 100 || track.forbidden_percent > 100 {
        return Err(anyhow!("Percentages must be in [0, 100]"));
    }
    let mut rng = SmallRng::from_seed(StdRng::from_seed(seed.clone()).gen());
    let n = track.num_vertices;
    let density = track.edge_percent as f64 / 100.0;

    let mut edges = Vec::new();
    for u in 0..n {
        for v in track.num_sources..n {
            if u == v {
                continue;
            }
            if rng.gen_bool(density) {
                edges.push((u, v, rng.gen_range(1..=10) as f64));
            }
        }
    }

    let forbidden_density = track.forbidden_percent as f64 / 100.0;
    let forbidden = (track.num_sources..n)
        .filter(|_| rng.gen_bool(forbidden_density))
        .collect();

    Ok(Instance {
        num_vertices: n,
        edges,
        sources: (0..track.num_sources).collect(),
        forbidden,
        max_cycle_length: track.max_cycle_length,
        max_chain_length: track.max_chain_length,
    })
}
