use anyhow::Result;
use kex_graph::{decompose_edges, Graph};
use kex_solver::{
    create_model, Callback, Constraint, Incumbent, LinExpr, Model, Trigger, ValueSource, Vars,
};
use kex_structs::{
    config::SolverConfig,
    core::{EntryKind, Instance, Output},
};
use kex_utils::Deadline;
use log::{debug, info, warn};
use logging_timer::time;
use std::time::Duration;

type EdgeVars = Vars<(usize, usize)>;

/// Edge-based formulation with lazy elimination of cycles longer than the bound.
///
/// `x` carries plain edges, `y` chain edges from the per-source replicas and `z = x + y` is
/// the selection that enters the objective.
pub struct Basic<'a> {
    instance: &'a Instance,
    graph: Graph,
    model: Box<dyn Model>,
    z: EdgeVars,
    eps: f64,
}

fn flow_links(
    model: &mut dyn Model,
    graph: &Graph,
    x: &EdgeVars,
    in_flow: &Vars<usize>,
    out_flow: &Vars<usize>,
) -> Result<()> {
    for v in 0..graph.num_vertices {
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
    }
    Ok(())
}

/// `out - in <= 0` for patients, equality for forbidden vertices.
fn patient_balance(
    model: &mut dyn Model,
    graph: &Graph,
    in_flow: &Vars<usize>,
    out_flow: &Vars<usize>,
) -> Result<()> {
    for p in graph.patients() {
        let expr = LinExpr::term(out_flow[&p], 1.0).plus(in_flow[&p], -1.0);
        if graph.is_forbidden[p] {
            model.add_constraint(Constraint::eq(expr, 0.0))?;
        } else {
            model.add_constraint(Constraint::le(expr, 0.0))?;
        }
    }
    Ok(())
}

fn fix_zero(model: &mut dyn Model, vars: &EdgeVars) -> Result<()> {
    for (_, var) in vars.iter() {
        model.add_constraint(Constraint::eq(LinExpr::term(var, 1.0), 0.0))?;
    }
    Ok(())
}

/// Closed walks in the selection that are longer than `max_cycle_length`, as cuts
/// `sum(z over the cycle) <= length - 1`.
fn long_cycle_cuts(
    graph: &Graph,
    z: &EdgeVars,
    values: &[(usize, usize, f64)],
    max_cycle_length: usize,
) -> Vec<Constraint> {
    decompose_edges(graph, values)
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::Cycle && entry.vertices.len() > max_cycle_length)
        .map(|entry| {
            let c = entry.vertices.len();
            let vars = (0..c).map(|j| z[&(entry.vertices[j], entry.vertices[(j + 1) % c])]);
            Constraint::le(LinExpr::sum(vars), (c - 1) as f64)
        })
        .collect()
}

fn edge_values<S: ValueSource + ?Sized>(z: &EdgeVars, source: &S) -> Result<Vec<(usize, usize, f64)>> {
    Ok(z
        .values(source)?
        .into_iter()
        .map(|((u, v), value)| (u, v, value))
        .collect())
}

struct CycleLengthCallback<'g> {
    graph: &'g Graph,
    z: &'g EdgeVars,
    max_cycle_length: usize,
}

impl Callback for CycleLengthCallback<'_> {
    fn call(&mut self, _: Trigger, incumbent: &mut Incumbent) -> Result<()> {
        if !incumbent.is_integral() {
            return Ok(());
        }
        let values = match edge_values(self.z, &*incumbent) {
            Ok(values) => values,
            Err(_) => {
                incumbent.mark_inconsistent();
                return Ok(());
            }
        };
        for cut in long_cycle_cuts(self.graph, self.z, &values, self.max_cycle_length) {
            incumbent.add_constraint(cut);
        }
        Ok(())
    }
}

impl<'a> Basic<'a> {
    pub fn new(instance: &'a Instance, config: &SolverConfig) -> Result<Self> {
        Self::with_model(instance, config, create_model(config.backend, "basic"))
    }

    /// Builds the formulation into `model`, which must be empty.
    pub fn with_model(instance: &'a Instance, config: &SolverConfig, mut model: Box<dyn Model>) -> Result<Self> {
        let graph = Graph::new(instance);
        let n = graph.num_vertices;
        let edges = graph.edges.clone();

        let x = Vars::new(model.as_mut(), edges.iter().copied());
        let y = Vars::new(model.as_mut(), edges.iter().copied());
        let z = Vars::new(model.as_mut(), edges.iter().copied());
        for e in &edges {
            model.add_constraint(Constraint::eq(
                LinExpr::term(x[e], 1.0).plus(y[e], 1.0).plus(z[e], -1.0),
                0.0,
            ))?;
        }

        let in_flow = Vars::new(model.as_mut(), 0..n);
        let out_flow = Vars::new(model.as_mut(), 0..n);
        flow_links(model.as_mut(), &graph, &x, &in_flow, &out_flow)?;
        patient_balance(model.as_mut(), &graph, &in_flow, &out_flow)?;
        for &s in &graph.sources {
            model.add_constraint(Constraint::eq(LinExpr::term(in_flow[&s], 1.0), 0.0))?;
        }

        let max_chain_length = instance.max_chain_length;
        if max_chain_length == 0 || graph.sources.is_empty() {
            Self::cycles_only(model.as_mut(), &graph, &in_flow, &out_flow)?;
            fix_zero(model.as_mut(), &y)?;
        } else if !instance.chains_unbounded() {
            Self::cycles_only(model.as_mut(), &graph, &in_flow, &out_flow)?;
            Self::source_replicas(model.as_mut(), &graph, max_chain_length, &y, &in_flow, &out_flow)?;
        } else {
            fix_zero(model.as_mut(), &y)?;
        }

        model.set_objective(LinExpr::weighted(
            instance
                .edges
                .iter()
                .filter(|(_, _, w)| *w != 0.0)
                .map(|&(u, v, w)| (z[&(u, v)], w)),
        ));
        info!(
            "Basic model: {} variables, {} constraints",
            model.num_vars(),
            model.num_constraints()
        );

        Ok(Self {
            instance,
            graph,
            model,
            z,
            eps: config.eps,
        })
    }

    /// Plain edges may only form cycles: balanced patients, silent sources.
    fn cycles_only(
        model: &mut dyn Model,
        graph: &Graph,
        in_flow: &Vars<usize>,
        out_flow: &Vars<usize>,
    ) -> Result<()> {
        for p in graph.patients() {
            model.add_constraint(Constraint::eq(
                LinExpr::term(out_flow[&p], 1.0).plus(in_flow[&p], -1.0),
                0.0,
            ))?;
        }
        for &s in &graph.sources {
            model.add_constraint(Constraint::eq(LinExpr::term(out_flow[&s], 1.0), 0.0))?;
        }
        Ok(())
    }

    /// One copy of the edge variables per source, each with its own length budget.
    fn source_replicas(
        model: &mut dyn Model,
        graph: &Graph,
        max_chain_length: usize,
        y: &EdgeVars,
        in_flow: &Vars<usize>,
        out_flow: &Vars<usize>,
    ) -> Result<()> {
        let n = graph.num_vertices;
        let mut in_replicas = Vec::with_capacity(graph.sources.len());
        let mut out_replicas = Vec::with_capacity(graph.sources.len());
        let mut x_replicas = Vec::with_capacity(graph.sources.len());
        for _ in &graph.sources {
            let x_s: EdgeVars = Vars::new(model, graph.edges.iter().copied());
            let in_s = Vars::new(model, 0..n);
            let out_s = Vars::new(model, 0..n);
            for &m in &graph.sources {
                model.add_constraint(Constraint::eq(LinExpr::term(in_s[&m], 1.0), 0.0))?;
            }
            model.add_constraint(Constraint::le(
                LinExpr::sum(x_s.iter().map(|(_, var)| var)),
                max_chain_length as f64,
            ))?;
            flow_links(model, graph, &x_s, &in_s, &out_s)?;
            patient_balance(model, graph, &in_s, &out_s)?;
            x_replicas.push(x_s);
            in_replicas.push(in_s);
            out_replicas.push(out_s);
        }
        for k in 0..n {
            let in_total = LinExpr::sum(in_replicas.iter().map(|in_s| in_s[&k])).plus(in_flow[&k], 1.0);
            let out_total =
                LinExpr::sum(out_replicas.iter().map(|out_s| out_s[&k])).plus(out_flow[&k], 1.0);
            model.add_constraint(Constraint::le(in_total, 1.0))?;
            model.add_constraint(Constraint::le(out_total, 1.0))?;
        }
        for e in &graph.edges {
            model.add_constraint(Constraint::eq(
                LinExpr::sum(x_replicas.iter().map(|x_s| x_s[e])).plus(y[e], -1.0),
                0.0,
            ))?;
        }
        Ok(())
    }

    /// Solve, cut every over-long cycle, repeat. Gives up once less than `min_quantum` of the
    /// budget is left. The same check runs inside the solve only on backends that can show it
    /// fractional incumbents.
    pub fn solve(&mut self, deadline: &Deadline, min_quantum: f64) -> Result<Option<Output>> {
        let max_cycle_length = self.instance.max_cycle_length;
        let in_solve = self.model.produces_fractional_incumbents();
        self.model.set_callback_triggers(in_solve, in_solve);
        let mut cuts: Vec<Constraint> = Vec::new();
        let mut rounds = 0;
        loop {
            for cut in cuts.drain(..) {
                self.model.add_constraint(cut)?;
            }
            let remaining = deadline.remaining_secs();
            if remaining <= min_quantum {
                warn!("Basic formulation: time limit reached after {} rounds", rounds);
                return Ok(None);
            }
            rounds += 1;
            let mut callback = CycleLengthCallback {
                graph: &self.graph,
                z: &self.z,
                max_cycle_length,
            };
            let callback = if in_solve {
                Some(&mut callback as &mut dyn Callback)
            } else {
                None
            };
            let (objective, optimal) = self
                .model
                .solve(Duration::from_secs_f64(remaining), callback)?;
            if !optimal {
                return Ok(None);
            }
            let values = edge_values(&self.z, self.model.as_ref())?;
            cuts = long_cycle_cuts(&self.graph, &self.z, &values, max_cycle_length);
            if cuts.is_empty() {
                debug!("Basic formulation converged after {} rounds", rounds);
                let match_edges = values
                    .into_iter()
                    .map(|(u, v, value)| (u, v, if value > self.eps { value } else { 0.0 }))
                    .collect();
                return Ok(Some(Output::from_edges(match_edges, objective, optimal)));
            }
            debug!("Basic formulation: {} cycles too long in round {}", cuts.len(), rounds);
        }
    }
}

#[time]
pub fn solve(instance: &Instance, config: &SolverConfig, deadline: &Deadline) -> Result<Option<Output>> {
    let mut basic = Basic::new(instance, config)?;
    basic.solve(deadline, config.min_solve_quantum_secs)
}
