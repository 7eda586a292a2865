//! Knowledge store backends: a remote vector-search endpoint and an in-memory corpus.

use async_trait::async_trait;
use mentor_core::knowledge::{KnowledgeError, KnowledgeHit, KnowledgeQuery, KnowledgeStore};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

/// Ranks hits by similarity (descending), drops those below the threshold and
/// keeps at most `result_count`.
fn rank(mut hits: Vec<KnowledgeHit>, query: &KnowledgeQuery) -> Vec<KnowledgeHit> {
    hits.retain(|h| h.similarity >= query.min_similarity);
    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits.truncate(query.result_count);
    hits
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Vector search service reached over HTTP.
///
/// The endpoint receives the [`KnowledgeQuery`] as a JSON body and answers
/// either `{"results": [...]}` or a bare array of hits.
#[derive(Clone)]
pub struct HttpKnowledgeStore {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped { results: Vec<KnowledgeHit> },
    Bare(Vec<KnowledgeHit>),
}

impl SearchResponse {
    fn into_hits(self) -> Vec<KnowledgeHit> {
        match self {
            SearchResponse::Wrapped { results } => results,
            SearchResponse::Bare(hits) => hits,
        }
    }
}

impl HttpKnowledgeStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, KnowledgeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KnowledgeError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn parse_search_body(body: &str) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(SearchResponse::into_hits)
        .map_err(|e| KnowledgeError::Malformed(e.to_string()))
}

#[async_trait]
impl KnowledgeStore for HttpKnowledgeStore {
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(query)
            .send()
            .await
            .map_err(|e| KnowledgeError::Unavailable(format!("search request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KnowledgeError::Unavailable(format!("failed to read search body: {e}")))?;
        if !status.is_success() {
            return Err(KnowledgeError::Unavailable(format!(
                "search endpoint returned {status}: {body}"
            )));
        }

        let hits = rank(parse_search_body(&body)?, query);
        tracing::debug!(
            target: "mentor::knowledge",
            hits = hits.len(),
            "Remote knowledge search"
        );
        Ok(hits)
    }
}

// ---------------------------------------------------------------------------
// Static corpus
// ---------------------------------------------------------------------------

/// One document of the in-memory corpus.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusEntry {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Extra terms that should match even when absent from the content.
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
struct CorpusFile {
    #[serde(rename = "entry", default)]
    entries: Vec<CorpusEntry>,
}

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "what", "which", "how", "why", "with", "about", "that", "this",
    "best", "can", "you", "your", "does", "should", "into", "from", "when", "where", "some",
    "tell", "explain", "there", "their", "them", "they", "have", "has", "any", "more", "give",
];

/// Lowercase alphanumeric words longer than two characters, minus stopwords.
fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Keyword-overlap search over a fixed set of documents.
///
/// Similarity is the fraction of query tokens found in an entry's title,
/// content or keywords.
#[derive(Debug, Clone)]
pub struct StaticKnowledgeStore {
    entries: Vec<(CorpusEntry, BTreeSet<String>)>,
}

impl StaticKnowledgeStore {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| {
                let mut vocab = tokens(&entry.title);
                vocab.extend(tokens(&entry.content));
                for keyword in &entry.keywords {
                    vocab.extend(tokens(keyword));
                }
                (entry, vocab)
            })
            .collect();
        Self { entries }
    }

    /// Loads `[[entry]]` tables from a TOML file.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CorpusFile = toml::from_str(&content)?;
        Ok(Self::new(file.entries))
    }

    /// Built-in corpus of core architectural design topics.
    pub fn builtin() -> Self {
        Self::new(builtin_corpus())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for StaticKnowledgeStore {
    async fn search(&self, query: &KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
        let wanted = tokens(&query.query);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .entries
            .iter()
            .map(|(entry, vocab)| {
                let matched = wanted.iter().filter(|t| vocab.contains(*t)).count();
                KnowledgeHit {
                    content: entry.content.clone(),
                    source_title: entry.title.clone(),
                    similarity: matched as f32 / wanted.len() as f32,
                    citation_url: entry.url.clone(),
                }
            })
            .collect();
        Ok(rank(hits, query))
    }
}

fn entry(title: &str, keywords: &[&str], content: &str) -> CorpusEntry {
    CorpusEntry {
        title: title.to_string(),
        content: content.to_string(),
        url: None,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

fn builtin_corpus() -> Vec<CorpusEntry> {
    vec![
        entry(
            "Circulation Design Principles",
            &["circulation", "corridor", "wayfinding", "movement", "practices"],
            "Circulation should be legible from the entrance, with a clear primary route and secondary routes branching from it. \
             Keep corridors short and give them daylight at their ends. \
             Separate public, staff and service flows where they would otherwise conflict. \
             Use nodes such as stairs and atria as orientation points along the route.",
        ),
        entry(
            "Natural Daylighting",
            &["daylight", "light", "sun", "glare", "windows", "orientation"],
            "Orient main spaces so that they receive diffuse north light in the northern hemisphere. \
             Room depth should stay within about two and a half times the window head height for useful daylight. \
             Control glare with overhangs, fins or light shelves instead of relying on blinds alone.",
        ),
        entry(
            "Universal Accessibility",
            &["accessibility", "accessible", "ramp", "wheelchair", "inclusive", "everyone"],
            "Provide step-free routes from the site boundary to every public space. \
             Ramps need resting landings and handrails on both sides. \
             Combine visual, tactile and audible cues so that wayfinding works for people with different abilities.",
        ),
        entry(
            "Library Design",
            &["library", "reading", "stacks", "books", "study"],
            "Contemporary libraries zone from loud to quiet as visitors move deeper into the building. \
             Flexible reading areas, maker spaces and community rooms now share floor area with collections. \
             Placing the stacks so that they do not block views keeps the plan easy to read.",
        ),
        entry(
            "Learning Environments",
            &["school", "classroom", "learning", "education", "students"],
            "Classrooms work best with daylight from two sides and clusters that share a breakout space. \
             Wide circulation can double as informal learning space when it is treated as a street rather than a corridor. \
             Outdoor classrooms extend learning into the landscape.",
        ),
        entry(
            "Sustainable Design Strategies",
            &["sustainable", "sustainability", "energy", "passive", "ventilation", "thermal"],
            "Passive strategies come first: orientation, shading, thermal mass and cross ventilation. \
             Compact massing reduces heat loss. \
             Choose low-carbon materials such as timber and specify them for disassembly and reuse.",
        ),
        entry(
            "Spatial Organization and Zoning",
            &["zoning", "program", "layout", "plan", "adjacency", "spaces"],
            "Start from an adjacency diagram that groups spaces by how often they are used together. \
             Organize the plan around a clear ordering idea such as a spine, a courtyard or a cluster. \
             Keep service spaces together so that structure and services stay rational.",
        ),
        entry(
            "Structural Systems",
            &["structure", "structural", "grid", "span", "column", "beam"],
            "A regular structural grid simplifies construction and keeps the plan flexible. \
             Long spans suit halls and reading rooms, while cellular spaces can sit on shorter spans. \
             Expressing the structure can reinforce the spatial idea of the building.",
        ),
        entry(
            "Adaptive Reuse",
            &["reuse", "adaptive", "existing", "renovation", "heritage", "warehouse"],
            "Adaptive reuse begins with a careful survey of what the existing building does well. \
             New insertions should be legible as new while respecting the original structure. \
             Reusing a building keeps its embodied carbon out of the atmosphere.",
        ),
        entry(
            "Community and Public Space",
            &["community", "public", "plaza", "civic", "gathering", "entrance"],
            "Public buildings need a generous threshold where people can pause before entering. \
             Active ground floors with visible uses invite passers-by in. \
             Flexible halls allow a community to host events the designer never anticipated.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(text: &str) -> KnowledgeQuery {
        KnowledgeQuery {
            query: text.to_string(),
            result_count: 4,
            min_similarity: 0.35,
        }
    }

    #[tokio::test]
    async fn test_builtin_finds_circulation() {
        let store = StaticKnowledgeStore::builtin();
        let hits = store
            .search(&query("What are the best practices for circulation design?"))
            .await
            .unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].source_title, "Circulation Design Principles");
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_unrelated_query_yields_nothing() {
        let store = StaticKnowledgeStore::builtin();
        let hits = store.search(&query("quantum chromodynamics lattice")).await.unwrap();
        assert!(hits.is_empty());
        assert!(store.search(&query("the and")).await.unwrap().is_empty());
    }

    #[test]
    fn test_corpus_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.toml");
        std::fs::write(
            &path,
            r#"
            [[entry]]
            title = "Courtyards"
            content = "Courtyards bring light into deep plans."
            url = "https://example.org/courtyards"
            "#,
        )
        .unwrap();
        let store = StaticKnowledgeStore::from_toml_file(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_search_body_accepts_both_shapes() {
        let wrapped = r#"{"results":[{"content":"c","source_title":"t","similarity":0.8}]}"#;
        let bare = r#"[{"content":"c","source_title":"t","similarity":0.8,"citation_url":"u"}]"#;
        assert_eq!(parse_search_body(wrapped).unwrap().len(), 1);
        assert_eq!(
            parse_search_body(bare).unwrap()[0].citation_url.as_deref(),
            Some("u")
        );
        assert!(matches!(
            parse_search_body("{\"oops\":1}"),
            Err(KnowledgeError::Malformed(_))
        ));
    }

    #[test]
    fn test_rank_filters_and_truncates() {
        let hit = |s: f32| KnowledgeHit {
            content: String::new(),
            source_title: format!("{s}"),
            similarity: s,
            citation_url: None,
        };
        let ranked = rank(
            vec![hit(0.4), hit(0.9), hit(0.1), hit(0.5), hit(0.6), hit(0.7)],
            &query("x"),
        );
        let sims: Vec<_> = ranked.iter().map(|h| h.similarity).collect();
        assert_eq!(sims, vec![0.9, 0.7, 0.6, 0.5]);
    }
}
