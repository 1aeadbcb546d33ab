//! Unidirectional Dijkstra and A* queries.

use super::*;
use crate::report::*;

/// One to one queries by settling nodes from the source until a target is settled.
/// With a potential other than `ZeroPotential` this is A*.
pub struct Server<'g, Pot = ZeroPotential> {
    graph: &'g TraversalGraph,
    data: DijkstraData,
    potential: Pot,
    params: QueryParams,
    // search graph node that ended the last query, INVALID_ID for trivial queries
    target_node: NodeId,
}

impl<'g> Server<'g, ZeroPotential> {
    pub fn new(graph: &'g TraversalGraph, params: QueryParams) -> Self {
        Self::with_potential(graph, ZeroPotential, params)
    }
}

impl<'g, Pot: Potential> Server<'g, Pot> {
    pub fn with_potential(graph: &'g TraversalGraph, potential: Pot, params: QueryParams) -> Self {
        Server {
            graph,
            data: DijkstraData::new(graph.num_nodes()),
            potential,
            params,
            target_node: INVALID_ID,
        }
    }

    pub fn potential(&self) -> &Pot {
        &self.potential
    }

    fn distance(&mut self, query: Query) -> Result<Label, QueryError> {
        check_query(self.graph, query)?;
        self.target_node = INVALID_ID;
        if query.from == query.to {
            return Ok(Label::ZERO);
        }

        let graph = self.graph;
        let mut budget = SearchBudget::new(&self.params);
        let potential = &mut self.potential;
        potential.init(query.to);
        let targets = graph.targets(query.to);

        let mut run = DijkstraRun::new(graph.forward(), &mut self.data);
        for (node, label) in graph.sources(query.from) {
            if let Some(pot) = potential.potential(graph.road_node(node)) {
                run.add_source(node, label, label.weight + pot);
            }
        }

        let mut result = Err(connection_not_found(graph, query));
        while !run.queue_is_empty() {
            if let Err(e) = budget.visit() {
                log::debug!("aborted query {:?} after settling {} nodes", query, budget.visited_nodes());
                return Err(e);
            }
            let node = match run.pop() {
                Some(node) => node,
                None => break,
            };
            if targets.contains(&node) {
                self.target_node = node;
                result = Ok(*run.tentative_distance(node));
                break;
            }
            run.relax(node, |_| true, |_, _| (), |head| potential.potential(graph.road_node(head)));
        }

        report_silent!("num_settled_nodes", run.num_settled_nodes());
        report_silent!("num_relaxed_arcs", run.num_relaxed_arcs());
        report_silent!("num_queue_pushs", run.num_queue_pushs());

        result
    }

    fn path(&self, query: Query) -> RoutePath {
        if self.target_node == INVALID_ID {
            return RoutePath::trivial(query.from);
        }
        let (first, arcs) = self.data.arc_path(self.target_node);
        self.graph.route(first, &arcs, self.data.labels[self.target_node as usize])
    }
}

/// Weights from `source` to every node of `graph`, `INFINITY` for unreachable ones.
pub fn one_to_all<G: LinkIterable<Link>>(graph: &G, data: &mut DijkstraData, source: NodeId) -> Vec<Weight> {
    let mut run = DijkstraRun::new(graph, data);
    run.add_source(source, Label::ZERO, 0.0);
    while run.next_step().is_some() {}
    (0..graph.num_nodes() as NodeId).map(|node| run.tentative_distance(node).weight).collect()
}

pub struct PathServerWrapper<'s, 'g, Pot>(&'s Server<'g, Pot>, Query);

impl<'s, 'g, Pot: Potential> PathServer for PathServerWrapper<'s, 'g, Pot> {
    fn reconstruct_path(&mut self) -> RoutePath {
        Server::path(self.0, self.1)
    }
}

impl<'g, Pot: Potential> QueryServer for Server<'g, Pot> {
    type P<'s> = PathServerWrapper<'s, 'g, Pot> where Self: 's;

    fn query(&mut self, query: Query) -> Result<QueryResult<Self::P<'_>>, QueryError> {
        let costs = self.distance(query)?;
        Ok(QueryResult::new(costs, PathServerWrapper(self, query)))
    }
}
