//! Citation graph assembly
//!
//! Graphs are read from cached citation edges. With upstream expansion the
//! neighbors of each expanded paper are fetched first and their edges
//! persisted, so the read that follows sees them.

use crate::cache::PaperCache;
use crate::db::models::Paper;
use crate::errors::Result;
use crate::metrics;
use crate::openalex::WorkQuery;
use crate::views::PaperView;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// Deepest traversal served
pub const MAX_DEPTH: u8 = 3;

/// Clamp a requested depth into `1..=MAX_DEPTH`
pub fn clamp_depth(requested: i64) -> u8 {
    requested.clamp(1, MAX_DEPTH as i64) as u8
}

/// Directed edge, citer -> cited
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl GraphEdge {
    fn cites(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            kind: "cites".to_string(),
        }
    }
}

/// Node/edge graph around a center paper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationGraph {
    pub nodes: Vec<PaperView>,
    pub edges: Vec<GraphEdge>,
    pub center_node: String,
    pub depth: u8,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// Neighbors fetched from upstream in one expansion step
#[derive(Debug, Default)]
pub struct Neighbors {
    pub citing: Vec<Paper>,
    pub references: Vec<Paper>,
}

/// One-hop upstream view of a paper
#[derive(Debug, Clone, Serialize)]
pub struct PaperCitations {
    pub paper: PaperView,
    pub cited_by: Vec<PaperView>,
    pub references: Vec<PaperView>,
    pub citation_graph: CitationGraph,
}

/// Builds citation graphs over the cache
pub struct GraphBuilder {
    cache: PaperCache,
    neighbor_limit: u32,
}

impl GraphBuilder {
    pub fn new(cache: PaperCache, neighbor_limit: u32) -> Self {
        Self { cache, neighbor_limit }
    }

    /// Graph of every paper within `depth` hops of `root_id`.
    ///
    /// `depth` is clamped to `1..=MAX_DEPTH`. With `expand`, each paper that
    /// gets expanded first has its neighbors fetched from upstream.
    pub async fn build(&self, root_id: &str, depth: i64, expand: bool) -> Result<CitationGraph> {
        let depth = clamp_depth(depth);
        let root = self.cache.resolve_paper(root_id, false).await?;
        self.traverse(&root, depth, expand).await
    }

    /// Depth-1 graph from cached edges only
    pub async fn star(&self, root: &Paper) -> Result<CitationGraph> {
        self.traverse(root, 1, false).await
    }

    async fn traverse(&self, root: &Paper, depth: u8, expand: bool) -> Result<CitationGraph> {
        let repo = self.cache.repository();

        // A paper is visited when it is discovered, so it is queued at most once
        let mut visited: HashSet<String> = HashSet::from([root.id.clone()]);
        let mut order: Vec<String> = vec![root.id.clone()];
        let mut queue: VecDeque<(String, u8)> = VecDeque::from([(root.id.clone(), 0)]);

        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut seen_edges: HashSet<(String, String)> = HashSet::new();

        while let Some((paper_id, hop)) = queue.pop_front() {
            if hop >= depth {
                continue;
            }

            if expand {
                self.fetch_neighbors(&paper_id, true, true).await;
            }

            let (outgoing, incoming) = match repo.get_citations(&paper_id).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(paper_id = %paper_id, error = %e, "Failed to read citations, treating as none");
                    continue;
                }
            };

            let discovered = incoming
                .into_iter()
                .map(|c| (c.citing_paper_id, c.cited_paper_id))
                .chain(outgoing.into_iter().map(|c| (c.citing_paper_id, c.cited_paper_id)));

            for (citing, cited) in discovered {
                let neighbor = if citing == paper_id { cited.clone() } else { citing.clone() };

                if seen_edges.insert((citing.clone(), cited.clone())) {
                    edges.push(GraphEdge::cites(&citing, &cited));
                }

                if visited.insert(neighbor.clone()) {
                    order.push(neighbor.clone());
                    queue.push_back((neighbor, hop + 1));
                }
            }
        }

        let papers = repo.find_papers(&order).await?;
        let mut by_id: HashMap<String, Paper> = papers.into_iter().map(|p| (p.id.clone(), p)).collect();
        let ordered: Vec<Paper> = order.iter().filter_map(|id| by_id.remove(id)).collect();

        // Edges must only reference returned nodes
        if ordered.len() != order.len() {
            let present: HashSet<&str> = ordered.iter().map(|p| p.id.as_str()).collect();
            edges.retain(|e| present.contains(e.source.as_str()) && present.contains(e.target.as_str()));
        }

        let nodes = PaperView::load_many(repo, &ordered, false).await?;

        metrics::record_graph(depth, nodes.len(), edges.len());
        info!(
            center = %root.id,
            depth = depth,
            nodes = nodes.len(),
            edges = edges.len(),
            "Citation graph built"
        );

        Ok(CitationGraph {
            total_nodes: nodes.len(),
            total_edges: edges.len(),
            center_node: root.id.clone(),
            depth,
            nodes,
            edges,
        })
    }

    /// Fetch a paper's citing works and/or references from upstream, cache
    /// them and persist the edges. Upstream or cache failures yield fewer
    /// neighbors, never an error.
    pub async fn fetch_neighbors(&self, paper_id: &str, citing: bool, references: bool) -> Neighbors {
        let mut neighbors = Neighbors::default();

        if citing {
            let query = WorkQuery::citing(paper_id, self.neighbor_limit);
            for paper in self.fetch_and_cache(paper_id, &query).await {
                self.link(&paper.id, paper_id).await;
                neighbors.citing.push(paper);
            }
        }

        if references {
            let query = WorkQuery::referenced_by(paper_id, self.neighbor_limit);
            for paper in self.fetch_and_cache(paper_id, &query).await {
                self.link(paper_id, &paper.id).await;
                neighbors.references.push(paper);
            }
        }

        debug!(
            paper_id = %paper_id,
            citing = neighbors.citing.len(),
            references = neighbors.references.len(),
            "Neighbors fetched"
        );

        neighbors
    }

    async fn fetch_and_cache(&self, paper_id: &str, query: &WorkQuery) -> Vec<Paper> {
        let page = match self.cache.source().list_works(query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(paper_id = %paper_id, error = %e, "Neighbor fetch failed, treating as none");
                return Vec::new();
            }
        };

        let mut papers = Vec::with_capacity(page.results.len());
        for work in page.results {
            if let Some(paper) = self.cache.cache_work(work, false).await {
                papers.push(paper);
            }
        }
        papers
    }

    async fn link(&self, citing: &str, cited: &str) {
        if let Err(e) = self.cache.repository().create_citation(citing, cited).await {
            warn!(citing = %citing, cited = %cited, error = %e, "Failed to record citation");
        }
    }

    /// Resolve a paper, fetch its neighbors from upstream and return them
    /// together with the refreshed star graph.
    pub async fn get_paper_citations(&self, paper_id: &str, include_references: bool) -> Result<PaperCitations> {
        self.expand(paper_id, true, include_references).await
    }

    /// Like `get_paper_citations` with independent control of both directions
    pub async fn expand(&self, paper_id: &str, citing: bool, references: bool) -> Result<PaperCitations> {
        let paper = self.cache.resolve_paper(paper_id, false).await?;
        let repo = self.cache.repository();

        let neighbors = self.fetch_neighbors(&paper.id, citing, references).await;
        let citation_graph = self.star(&paper).await?;

        Ok(PaperCitations {
            paper: PaperView::load(repo, &paper, true).await?,
            cited_by: PaperView::load_many(repo, &neighbors.citing, false).await?,
            references: PaperView::load_many(repo, &neighbors.references, false).await?,
            citation_graph,
        })
    }
}
