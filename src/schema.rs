//! The catalog schema graph: physical tables as vertices, joinable table
//! pairs as undirected edges. Each edge stores its join predicate in a fixed
//! canonical order so the rendered condition is independent of the order in
//! which the query mentioned the tables.

use once_cell::sync::Lazy;

pub(crate) const TABLE_NAMES: &[&str] = &[
    "R_COLL_MAIN",
    "R_DATA_MAIN",
    "R_META_MAIN",
    "R_OBJT_ACCESS",
    "R_OBJT_METAMAP",
    "R_RESC_MAIN",
    "R_RULE_EXEC",
    "R_SPECIFIC_QUERY",
    "R_TICKET_ALLOWED_HOSTS",
    "R_TICKET_ALLOWED_USERS",
    "R_TICKET_ALLOWED_GROUPS",
    "R_TICKET_MAIN",
    "R_TOKN_MAIN",
    "R_USER_AUTH",
    "R_USER_GROUP",
    "R_USER_MAIN",
    "R_USER_PASSWORD",
    "R_USER_SESSION_KEY",
    "R_ZONE_MAIN",
    "R_QUOTA_MAIN",
];

/// An undirected edge. `lhs`/`rhs` fix the order the join predicate is
/// rendered in, whichever side of the join each table ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub lhs: &'static str,
    pub lhs_column: &'static str,
    pub rhs: &'static str,
    pub rhs_column: &'static str,
}

impl Edge {
    pub fn predicate(&self, lhs_alias: &str, rhs_alias: &str) -> String {
        format!(
            "{lhs_alias}.{} = {rhs_alias}.{}",
            self.lhs_column, self.rhs_column
        )
    }
}

const fn edge(
    lhs: &'static str,
    lhs_column: &'static str,
    rhs: &'static str,
    rhs_column: &'static str,
) -> Edge {
    Edge {
        lhs,
        lhs_column,
        rhs,
        rhs_column,
    }
}

const EDGES: &[Edge] = &[
    edge("R_DATA_MAIN", "coll_id", "R_COLL_MAIN", "coll_id"),
    edge("R_COLL_MAIN", "coll_id", "R_OBJT_ACCESS", "object_id"),
    edge("R_COLL_MAIN", "coll_id", "R_OBJT_METAMAP", "object_id"),
    edge("R_COLL_MAIN", "coll_id", "R_TICKET_MAIN", "object_id"),
    edge("R_DATA_MAIN", "data_id", "R_OBJT_ACCESS", "object_id"),
    edge("R_DATA_MAIN", "data_id", "R_OBJT_METAMAP", "object_id"),
    edge("R_DATA_MAIN", "resc_id", "R_RESC_MAIN", "resc_id"),
    edge("R_DATA_MAIN", "data_id", "R_TICKET_MAIN", "object_id"),
    edge("R_META_MAIN", "meta_id", "R_OBJT_METAMAP", "meta_id"),
    edge("R_OBJT_ACCESS", "access_type_id", "R_TOKN_MAIN", "token_id"),
    edge("R_OBJT_METAMAP", "object_id", "R_RESC_MAIN", "resc_id"),
    edge("R_OBJT_METAMAP", "object_id", "R_USER_MAIN", "user_id"),
    edge("R_TICKET_MAIN", "user_id", "R_USER_MAIN", "user_id"),
    edge("R_TICKET_MAIN", "ticket_id", "R_TICKET_ALLOWED_HOSTS", "ticket_id"),
    edge("R_TICKET_MAIN", "ticket_id", "R_TICKET_ALLOWED_USERS", "ticket_id"),
    edge("R_TICKET_MAIN", "ticket_id", "R_TICKET_ALLOWED_GROUPS", "ticket_id"),
    edge("R_USER_MAIN", "user_id", "R_USER_AUTH", "user_id"),
    edge("R_USER_MAIN", "user_id", "R_USER_GROUP", "group_user_id"),
    edge("R_USER_MAIN", "user_id", "R_USER_PASSWORD", "user_id"),
    edge("R_USER_MAIN", "user_id", "R_USER_SESSION_KEY", "user_id"),
    edge("R_QUOTA_MAIN", "user_id", "R_USER_MAIN", "user_id"),
    edge("R_QUOTA_MAIN", "resc_id", "R_RESC_MAIN", "resc_id"),
];

pub(crate) struct SchemaGraph {
    // Edge indices adjacent to each vertex, keyed by table index.
    adjacency: Vec<Vec<usize>>,
}

static GRAPH: Lazy<SchemaGraph> = Lazy::new(|| {
    let mut adjacency = vec![Vec::new(); TABLE_NAMES.len()];

    for (i, edge) in EDGES.iter().enumerate() {
        let lhs = index_of(edge.lhs).expect("edge endpoint is a known table");
        let rhs = index_of(edge.rhs).expect("edge endpoint is a known table");
        adjacency[lhs].push(i);
        adjacency[rhs].push(i);
    }

    SchemaGraph { adjacency }
});

pub(crate) fn graph() -> &'static SchemaGraph {
    &GRAPH
}

pub(crate) fn is_table(name: &str) -> bool {
    index_of(name).is_some()
}

fn index_of(name: &str) -> Option<usize> {
    TABLE_NAMES.iter().position(|t| *t == name)
}

impl SchemaGraph {
    /// The edge between two tables, if they are directly joinable.
    pub fn edge(&self, t1: &str, t2: &str) -> Option<&'static Edge> {
        let i1 = index_of(t1)?;
        index_of(t2)?;

        self.adjacency[i1]
            .iter()
            .map(|i| &EDGES[*i])
            .find(|e| (e.lhs == t1 && e.rhs == t2) || (e.lhs == t2 && e.rhs == t1))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_edge_lookup_is_undirected() {
        let graph = graph();

        let forward = graph.edge("R_DATA_MAIN", "R_COLL_MAIN").unwrap();
        let backward = graph.edge("R_COLL_MAIN", "R_DATA_MAIN").unwrap();
        assert_eq!(forward, backward);

        // The predicate renders in canonical order regardless of lookup order.
        assert_eq!(forward.predicate("t0", "t1"), "t0.coll_id = t1.coll_id");
    }

    #[test]
    fn test_unconnected_tables_have_no_edge() {
        let graph = graph();
        assert!(graph.edge("R_ZONE_MAIN", "R_DATA_MAIN").is_none());
        assert!(graph.edge("R_COLL_MAIN", "R_RESC_MAIN").is_none());
        assert!(graph.edge("R_COLL_MAIN", "NOT_A_TABLE").is_none());
    }

    #[test]
    fn test_quota_edges() {
        let graph = graph();
        let edge = graph.edge("R_QUOTA_MAIN", "R_USER_MAIN").unwrap();
        assert_eq!(edge.predicate("t1", "t0"), "t1.user_id = t0.user_id");
        assert!(graph.edge("R_QUOTA_MAIN", "R_RESC_MAIN").is_some());
    }

    #[test]
    fn test_every_edge_endpoint_is_a_vertex() {
        for edge in EDGES {
            assert!(is_table(edge.lhs));
            assert!(is_table(edge.rhs));
        }
    }
}
