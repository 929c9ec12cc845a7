//! Query expansion
//!
//! Static lookup-and-template expansion of a genre/style query. The result
//! always starts with the original query and holds at most [`MAX_QUERIES`]
//! distinct strings.

/// Upper bound on expanded queries sent to the embedder
pub const MAX_QUERIES: usize = 5;

/// Synonyms substituted per genre keyword
const SYNONYMS_PER_GENRE: usize = 2;

/// Genre keyword → synonyms (Turkish and English), in lookup order
pub const GENRE_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "aksiyon",
        &["aksiyon", "action", "macera", "adventure", "gerilim", "thriller"],
    ),
    ("komedi", &["komedi", "comedy", "mizah", "güldürü"]),
    ("drama", &["drama", "dramatik", "duygusal"]),
    (
        "korku",
        &["korku", "horror", "gerilim", "thriller", "korku filmi"],
    ),
    (
        "bilim kurgu",
        &["bilim kurgu", "sci-fi", "science fiction", "gelecek", "uzay"],
    ),
    ("romantik", &["romantik", "romance", "aşk", "romantik komedi"]),
    ("gerilim", &["gerilim", "thriller", "suspense", "heyecanlı"]),
];

/// Expand a query into paraphrased variants
pub fn expand_query(query: &str) -> Vec<String> {
    let mut queries = vec![query.to_string()];
    let query_lower = query.to_lowercase();

    for (genre, synonyms) in GENRE_SYNONYMS {
        if !query_lower.contains(genre) {
            continue;
        }
        for synonym in synonyms.iter().take(SYNONYMS_PER_GENRE) {
            if synonym != genre {
                push_unique(&mut queries, query.replace(genre, synonym));
            }
        }
    }

    if !query_lower.contains("film") && !query_lower.contains("movie") {
        queries.push(format!("{} film", query));
        queries.push(format!("{} filmleri", query));
    }

    for variant in [
        format!("{} öner", query),
        format!("{} tavsiye et", query),
        format!("{} türünde film", query),
    ] {
        push_unique(&mut queries, variant);
    }

    queries.truncate(MAX_QUERIES);
    queries
}

fn push_unique(queries: &mut Vec<String>, candidate: String) {
    if !queries.contains(&candidate) {
        queries.push(candidate);
    }
}
