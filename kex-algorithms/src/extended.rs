use crate::{cycles::find_cycles, max_flow::FlowNetwork};
use anyhow::Result;
use kex_graph::Graph;
use kex_solver::{
    create_model, Callback, Constraint, Incumbent, LinExpr, Model, Trigger, ValueSource, Vars,
};
use kex_structs::{
    config::SolverConfig,
    core::{Instance, Output},
};
use kex_utils::Deadline;
use log::{debug, info, warn};
use logging_timer::time;
use std::{collections::BTreeMap, time::Duration};

type EdgeVars = Vars<(usize, usize)>;

/// Cycle-indexed formulation. Cycles up to the bound are enumerated up front and chosen
/// through one variable each; chains run over edge variables whose connection to a source is
/// enforced lazily by min-cut separation.
pub struct Extended<'a> {
    instance: &'a Instance,
    graph: Graph,
    cycles: Vec<Vec<usize>>,
    model: Box<dyn Model>,
    x: EdgeVars,
    in_flow: Vars<usize>,
    z: Vars<usize>,
    eps: f64,
}

/// Finds in-flow claims that cannot be routed from any source under the edge values `x_vals`
/// and returns, per violated vertex, the sorted edges entering its side of the cut.
pub fn find_sets(
    graph: &Graph,
    x_vals: &BTreeMap<(usize, usize), f64>,
    in_vals: &BTreeMap<usize, f64>,
    eps: f64,
) -> Vec<(usize, Vec<(usize, usize)>)> {
    let n = graph.num_vertices;
    let super_source = n;
    let mut network = FlowNetwork::new(n + 1);
    for &s in &graph.sources {
        network.add_edge(super_source, s, 1.0, f64::INFINITY);
    }
    for (&(u, v), &value) in x_vals {
        network.add_edge(u, v, value.max(0.0), 0.0);
    }

    let mut sets = Vec::new();
    for p in graph.patients() {
        let in_value = in_vals.get(&p).copied().unwrap_or(0.0);
        if in_value <= eps {
            continue;
        }
        let (flow, sink_side) = network.clone().min_cut(super_source, p, eps);
        if flow >= in_value - eps {
            continue;
        }
        let mut edges = Vec::new();
        for j in (0..n).filter(|&j| sink_side[j] && !graph.is_source[j]) {
            for &k in &graph.in_neighbors[j] {
                if !sink_side[k] {
                    edges.push((k, j));
                }
            }
        }
        edges.sort_unstable();
        sets.push((p, edges));
    }
    sets
}

fn connectivity_cuts<S: ValueSource + ?Sized>(
    graph: &Graph,
    x: &EdgeVars,
    in_flow: &Vars<usize>,
    source: &S,
    eps: f64,
) -> Result<Vec<Constraint>> {
    if graph.sources.is_empty() {
        return Ok(Vec::new());
    }
    let x_vals = x.values(source)?;
    let in_vals = in_flow.values(source)?;
    Ok(find_sets(graph, &x_vals, &in_vals, eps)
        .into_iter()
        .map(|(v, edges)| {
            let expr = LinExpr::sum(edges.iter().map(|e| x[e])).plus(in_flow[&v], -1.0);
            Constraint::ge(expr, 0.0)
        })
        .collect())
}

struct ConnectivityCallback<'g> {
    graph: &'g Graph,
    x: &'g EdgeVars,
    in_flow: &'g Vars<usize>,
    eps: f64,
}

impl Callback for ConnectivityCallback<'_> {
    fn call(&mut self, _: Trigger, incumbent: &mut Incumbent) -> Result<()> {
        match connectivity_cuts(self.graph, self.x, self.in_flow, &*incumbent, self.eps) {
            Ok(cuts) => {
                for cut in cuts {
                    incumbent.add_constraint(cut);
                }
            }
            Err(_) => incumbent.mark_inconsistent(),
        }
        Ok(())
    }
}

impl<'a> Extended<'a> {
    /// Enumerates cycles and builds the model. `None` when the enumeration ran out of time.
    pub fn new(instance: &'a Instance, config: &SolverConfig, deadline: &Deadline) -> Result<Option<Self>> {
        Self::with_model(instance, config, deadline, create_model(config.backend, "extended"))
    }

    /// Builds the formulation into `model`, which must be empty.
    pub fn with_model(
        instance: &'a Instance,
        config: &SolverConfig,
        deadline: &Deadline,
        mut model: Box<dyn Model>,
    ) -> Result<Option<Self>> {
        let graph = Graph::new(instance);
        let n = graph.num_vertices;
        let max_cycle_length = instance.max_cycle_length.min(graph.num_patients());
        let Some(mut cycles) = find_cycles(&graph, max_cycle_length, deadline) else {
            warn!("Extended formulation: cycle enumeration timed out");
            return Ok(None);
        };
        if max_cycle_length >= 1 {
            cycles.extend(
                graph
                    .edges
                    .iter()
                    .filter(|&&(u, v)| u == v && !graph.is_source[u])
                    .map(|&(u, _)| vec![u]),
            );
            cycles.sort();
        }
        info!(
            "Found {} cycles of length at most {}",
            cycles.len(),
            max_cycle_length
        );

        let edges = graph.edges.clone();
        let x: EdgeVars = Vars::new(model.as_mut(), edges.iter().copied());
        let in_flow = Vars::new(model.as_mut(), 0..n);
        let out_flow = Vars::new(model.as_mut(), 0..n);
        let z = Vars::new(model.as_mut(), 0..cycles.len());

        let mut cycles_part_of = vec![Vec::new(); n];
        for (c, cycle) in cycles.iter().enumerate() {
            for &v in cycle {
                cycles_part_of[v].push(c);
            }
        }
        for p in graph.patients() {
            let expr = LinExpr::term(in_flow[&p], 1.0).plus(out_flow[&p], -1.0);
            if graph.is_forbidden[p] {
                model.add_constraint(Constraint::eq(expr, 0.0))?;
            } else {
                model.add_constraint(Constraint::ge(expr, 0.0))?;
            }
            let packing = LinExpr::sum(cycles_part_of[p].iter().map(|c| z[c])).plus(in_flow[&p], 1.0);
            model.add_constraint(Constraint::le(packing, 1.0))?;
        }
        for &s in &graph.sources {
            model.add_constraint(Constraint::eq(LinExpr::term(in_flow[&s], 1.0), 0.0))?;
        }

        if graph.sources.is_empty() {
            for (_, var) in x.iter() {
                model.add_constraint(Constraint::eq(LinExpr::term(var, 1.0), 0.0))?;
            }
        } else if !instance.chains_unbounded() {
            Self::source_replicas(model.as_mut(), &graph, instance.max_chain_length, &x)?;
        }

        let mut objective = LinExpr::new();
        for (c, cycle) in cycles.iter().enumerate() {
            let weight: f64 = graph.cycle_weights(cycle).iter().sum();
            objective.add_term(z[&c], weight);
        }
        for v in 0..n {
            let in_edges = graph.in_edges[v].iter().map(|&id| x[&graph.edges[id]]);
            let out_edges = graph.out_edges[v].iter().map(|&id| x[&graph.edges[id]]);
            model.add_constraint(Constraint::eq(
                LinExpr::sum(in_edges).plus(in_flow[&v], -1.0),
                0.0,
            ))?;
            model.add_constraint(Constraint::eq(
                LinExpr::sum(out_edges).plus(out_flow[&v], -1.0),
                0.0,
            ))?;
            for &j in &graph.out_neighbors[v] {
                objective.add_term(x[&(v, j)], graph.weight(v, j));
            }
        }
        model.set_objective(objective);
        info!(
            "Extended model: {} variables, {} constraints",
            model.num_vars(),
            model.num_constraints()
        );

        Ok(Some(Self {
            instance,
            graph,
            cycles,
            model,
            x,
            in_flow,
            z,
            eps: config.eps,
        }))
    }

    fn source_replicas(
        model: &mut dyn Model,
        graph: &Graph,
        max_chain_length: usize,
        x: &EdgeVars,
    ) -> Result<()> {
        let n = graph.num_vertices;
        let mut x_replicas = Vec::with_capacity(graph.sources.len());
        for _ in &graph.sources {
            let x_s: EdgeVars = Vars::new(model, graph.edges.iter().copied());
            let in_s = Vars::new(model, 0..n);
            let out_s = Vars::new(model, 0..n);
            model.add_constraint(Constraint::le(
                LinExpr::sum(x_s.iter().map(|(_, var)| var)),
                max_chain_length as f64,
            ))?;
            for k in 0..n {
                let in_edges = graph.in_edges[k].iter().map(|&id| x_s[&graph.edges[id]]);
                let out_edges = graph.out_edges[k].iter().map(|&id| x_s[&graph.edges[id]]);
                model.add_constraint(Constraint::eq(
                    LinExpr::sum(in_edges).plus(in_s[&k], -1.0),
                    0.0,
                ))?;
                model.add_constraint(Constraint::eq(
                    LinExpr::sum(out_edges).plus(out_s[&k], -1.0),
                    0.0,
                ))?;
            }
            for p in graph.patients() {
                model.add_constraint(Constraint::le(
                    LinExpr::term(out_s[&p], 1.0).plus(in_s[&p], -1.0),
                    0.0,
                ))?;
            }
            x_replicas.push(x_s);
        }
        for e in &graph.edges {
            model.add_constraint(Constraint::eq(
                LinExpr::sum(x_replicas.iter().map(|x_s| x_s[e])).plus(x[e], -1.0),
                0.0,
            ))?;
        }
        Ok(())
    }

    pub fn cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }

    /// Solve and separate until every claimed in-flow is reachable from a source. Candidate
    /// incumbents are separated inside the solve, fractional ones only when the backend
    /// produces them.
    pub fn solve(&mut self, deadline: &Deadline, min_quantum: f64) -> Result<Option<Output>> {
        let fractional = self.model.produces_fractional_incumbents();
        self.model.set_callback_triggers(true, fractional);
        let mut rounds = 0;
        loop {
            let remaining = deadline.remaining_secs();
            if remaining <= min_quantum {
                warn!(
                    "Extended formulation ({} cycles, bound {}): time limit reached after {} rounds",
                    self.cycles.len(),
                    self.instance.max_cycle_length,
                    rounds
                );
                return Ok(None);
            }
            rounds += 1;
            let mut callback = ConnectivityCallback {
                graph: &self.graph,
                x: &self.x,
                in_flow: &self.in_flow,
                eps: self.eps,
            };
            let (objective, optimal) = self.model.solve(
                Duration::from_secs_f64(remaining),
                Some(&mut callback as &mut dyn Callback),
            )?;
            if !optimal {
                return Ok(None);
            }
            let cuts = connectivity_cuts(
                &self.graph,
                &self.x,
                &self.in_flow,
                self.model.as_ref(),
                self.eps,
            )?;
            if cuts.is_empty() {
                debug!("Extended formulation converged after {} rounds", rounds);
                return Ok(Some(self.output(objective, optimal)?));
            }
            debug!("Extended formulation: {} connectivity cuts in round {}", cuts.len(), rounds);
            for cut in cuts {
                self.model.add_constraint(cut)?;
            }
        }
    }

    fn output(&self, value: f64, optimal: bool) -> Result<Output> {
        let match_edges = self
            .x
            .values(self.model.as_ref())?
            .into_iter()
            .map(|((u, v), value)| (u, v, value))
            .collect();
        let match_cycles = self.z.values(self.model.as_ref())?.into_values().collect();
        Ok(Output {
            match_edges,
            match_cycles: Some(match_cycles),
            graph_cycles: Some(self.cycles.clone()),
            value,
            optimal,
            time: -1.0,
        })
    }
}

#[time]
pub fn solve(instance: &Instance, config: &SolverConfig, deadline: &Deadline) -> Result<Option<Output>> {
    match Extended::new(instance, config, deadline)? {
        Some(mut extended) => extended.solve(deadline, config.min_solve_quantum_secs),
        None => Ok(None),
    }
}
