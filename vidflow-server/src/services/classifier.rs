//! Evergreen title analysis
//!
//! Nearest-neighbour vote over stored embeddings first; the LLM classifier
//! only runs when the vote is inconclusive.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use vidflow_common::db::titulin;
use vidflow_common::titulin::vector::{
    build_classification_prompt, find_similar, vote, with_default_examples, DEFAULT_EVERGREEN_EXAMPLES,
    DEFAULT_NEIGHBOURS, DEFAULT_NON_EVERGREEN_EXAMPLES,
};
use vidflow_common::titulin::{Classification, SimilarTitle};
use vidflow_common::Result;

use super::{EmbeddingProvider, TitleClassifier};

/// Stored examples per class fed to the classifier prompt
const PROMPT_EXAMPLES_PER_CLASS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Vote,
    Classifier,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleAnalysis {
    #[serde(flatten)]
    pub classification: Classification,
    pub source: AnalysisSource,
    pub similar_titles: Vec<SimilarTitle>,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Labelled titles closest to `embedding`, best first
pub async fn find_similar_titles(
    db: &SqlitePool,
    embedding: &[f32],
    exclude_video_id: Option<i64>,
    limit: usize,
) -> Result<Vec<SimilarTitle>> {
    let labelled = titulin::labelled_embeddings(db, exclude_video_id).await?;
    debug!("Comparing against {} labelled titles", labelled.len());
    Ok(find_similar(embedding, &labelled, limit))
}

/// Classify `title` as evergreen or not
///
/// `exclude_video_id` keeps a harvested video from voting on itself when it
/// is re-analyzed.
pub async fn analyze_title(
    db: &SqlitePool,
    embeddings: &dyn EmbeddingProvider,
    classifier: &dyn TitleClassifier,
    title: &str,
    exclude_video_id: Option<i64>,
) -> Result<TitleAnalysis> {
    let embedding = embeddings.embed(title).await?;
    let similar = find_similar_titles(db, &embedding, exclude_video_id, DEFAULT_NEIGHBOURS).await?;

    if let Some(classification) = vote(&similar) {
        info!(
            "Vote classified '{}': evergreen={} ({:.2})",
            title, classification.is_evergreen, classification.confidence
        );
        return Ok(TitleAnalysis {
            classification,
            source: AnalysisSource::Vote,
            similar_titles: similar,
            embedding,
        });
    }

    let evergreen = with_default_examples(
        titulin::example_titles(db, true, PROMPT_EXAMPLES_PER_CLASS).await?,
        &DEFAULT_EVERGREEN_EXAMPLES,
    );
    let non_evergreen = with_default_examples(
        titulin::example_titles(db, false, PROMPT_EXAMPLES_PER_CLASS).await?,
        &DEFAULT_NON_EVERGREEN_EXAMPLES,
    );
    let prompt = build_classification_prompt(title, &evergreen, &non_evergreen, &similar);

    let classification = classifier.classify(&prompt).await?;
    info!(
        "Classifier analyzed '{}': evergreen={} ({:.2})",
        title, classification.is_evergreen, classification.confidence
    );
    Ok(TitleAnalysis {
        classification,
        source: AnalysisSource::Classifier,
        similar_titles: similar,
        embedding,
    })
}
