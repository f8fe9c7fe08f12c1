use std::collections::VecDeque;

/// Residual network with paired arcs: arc `a` and `a ^ 1` are each other's reverse.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    heads: Vec<Vec<usize>>,
    to: Vec<usize>,
    capacity: Vec<f64>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            heads: vec![Vec::new(); num_nodes],
            to: Vec::new(),
            capacity: Vec::new(),
        }
    }

    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64, reverse_capacity: f64) {
        self.heads[from].push(self.to.len());
        self.to.push(to);
        self.capacity.push(capacity);
        self.heads[to].push(self.to.len());
        self.to.push(from);
        self.capacity.push(reverse_capacity);
    }

    fn bfs(&self, source: usize, eps: f64) -> Vec<Option<usize>> {
        let mut parent_arc = vec![None; self.heads.len()];
        let mut seen = vec![false; self.heads.len()];
        seen[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            for &arc in &self.heads[u] {
                let v = self.to[arc];
                if !seen[v] && self.capacity[arc] > eps {
                    seen[v] = true;
                    parent_arc[v] = Some(arc);
                    queue.push_back(v);
                }
            }
        }
        parent_arc
    }

    /// Edmonds-Karp. Returns the cut value and, per node, whether it lies on the sink side
    /// (not reachable from `source` in the final residual network).
    pub fn min_cut(&mut self, source: usize, sink: usize, eps: f64) -> (f64, Vec<bool>) {
        let mut flow = 0.0;
        loop {
            let parent_arc = self.bfs(source, eps);
            if parent_arc[sink].is_none() {
                let sink_side = (0..self.heads.len())
                    .map(|v| v != source && parent_arc[v].is_none())
                    .collect();
                return (flow, sink_side);
            }
            let mut bottleneck = f64::INFINITY;
            let mut v = sink;
            while let Some(arc) = parent_arc[v] {
                bottleneck = bottleneck.min(self.capacity[arc]);
                v = self.to[arc ^ 1];
            }
            let mut v = sink;
            while let Some(arc) = parent_arc[v] {
                self.capacity[arc] -= bottleneck;
                self.capacity[arc ^ 1] += bottleneck;
                v = self.to[arc ^ 1];
            }
            flow += bottleneck;
        }
    }
}
