//! Evergreen classification by nearest-neighbour vote
//!
//! A title is embedded, compared by cosine similarity against labelled
//! titles, and classified by a similarity-weighted vote when enough close
//! neighbours agree strongly. Otherwise the caller falls back to an
//! external classifier, using [`build_classification_prompt`].

use serde::{Deserialize, Serialize};

/// Neighbours below this similarity do not vote
pub const VOTE_SIMILARITY_THRESHOLD: f64 = 0.70;
/// Minimum number of voting neighbours
pub const MIN_VOTERS: usize = 3;
/// Minimum winning share for the vote to decide
pub const VOTE_CONFIDENCE_THRESHOLD: f64 = 0.70;
/// Neighbours at or above this similarity are quoted to the fallback classifier
pub const PROMPT_SIMILARITY_THRESHOLD: f64 = 0.75;
/// Neighbours retrieved per analysis
pub const DEFAULT_NEIGHBOURS: usize = 5;

pub const DEFAULT_EVERGREEN_EXAMPLES: [&str; 5] = [
    "Cómo hacer pan casero - Tutorial completo",
    "5 ejercicios para fortalecer la espalda",
    "Guía definitiva para aprender a tocar guitarra",
    "Aprende inglés en 10 minutos al día",
    "Tutorial: Cómo configurar WordPress desde cero",
];

pub const DEFAULT_NON_EVERGREEN_EXAMPLES: [&str; 5] = [
    "Reacción al tráiler de la película que se estrena mañana",
    "Predicciones para tendencias de 2023",
    "Análisis de las elecciones presidenciales",
    "Lo mejor que ha pasado esta semana en YouTube",
    "Novedades para iPhone en el evento de Apple",
];

/// A labelled title with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledEmbedding {
    pub id: i64,
    pub title: String,
    pub is_evergreen: bool,
    pub embedding: Vec<f32>,
}

/// A labelled title ranked against the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTitle {
    pub id: i64,
    pub title: String,
    pub is_evergreen: bool,
    pub similarity: f64,
}

/// Classification produced by either the vote or the fallback classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_evergreen: bool,
    pub confidence: f64,
    pub reason: String,
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// The `limit` candidates most similar to `query`, best first
pub fn find_similar(
    query: &[f32],
    candidates: &[LabelledEmbedding],
    limit: usize,
) -> Vec<SimilarTitle> {
    let mut ranked: Vec<SimilarTitle> = candidates
        .iter()
        .map(|c| SimilarTitle {
            id: c.id,
            title: c.title.clone(),
            is_evergreen: c.is_evergreen,
            similarity: cosine_similarity(query, &c.embedding),
        })
        .collect();

    ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    ranked.truncate(limit);
    ranked
}

/// Round to two decimals, the precision confidences are stored with
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Similarity-weighted vote over close neighbours
///
/// Returns `None` when fewer than [`MIN_VOTERS`] neighbours reach
/// [`VOTE_SIMILARITY_THRESHOLD`] or the winning share is below
/// [`VOTE_CONFIDENCE_THRESHOLD`]. Ties go to non-evergreen.
pub fn vote(similar: &[SimilarTitle]) -> Option<Classification> {
    let voters: Vec<&SimilarTitle> = similar
        .iter()
        .filter(|t| t.similarity >= VOTE_SIMILARITY_THRESHOLD)
        .collect();
    if voters.len() < MIN_VOTERS {
        return None;
    }

    let (evergreen, non_evergreen) = voters.iter().fold((0.0, 0.0), |(e, n), t| {
        if t.is_evergreen {
            (e + t.similarity, n)
        } else {
            (e, n + t.similarity)
        }
    });

    let total = evergreen + non_evergreen;
    let is_evergreen = evergreen > non_evergreen;
    let winning = if is_evergreen { evergreen } else { non_evergreen };
    let confidence = winning / total;
    if confidence < VOTE_CONFIDENCE_THRESHOLD {
        return None;
    }

    let percent = (confidence * 100.0).round();
    let reason = if is_evergreen {
        format!(
            "Este título es considerado evergreen con {}% de confianza basado en {} títulos similares. La mayoría de títulos similares también son evergreen.",
            percent,
            voters.len()
        )
    } else {
        format!(
            "Este título no es considerado evergreen con {}% de confianza basado en {} títulos similares. La mayoría de títulos similares no son evergreen.",
            percent,
            voters.len()
        )
    };

    Some(Classification {
        is_evergreen,
        confidence: round_confidence(confidence),
        reason,
    })
}

/// Pad stored examples with built-in ones when fewer than three exist
pub fn with_default_examples(mut examples: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if examples.len() < 3 {
        for default in defaults {
            if examples.len() >= 5 {
                break;
            }
            examples.push(default.to_string());
        }
    }
    examples
}

/// Prompt for the fallback classifier
pub fn build_classification_prompt(
    title: &str,
    evergreen_examples: &[String],
    non_evergreen_examples: &[String],
    similar: &[SimilarTitle],
) -> String {
    let quote = |titles: &[String]| {
        titles
            .iter()
            .map(|t| format!("- \"{}\"", t))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let quote_similar = |evergreen: bool| {
        similar
            .iter()
            .filter(|t| t.is_evergreen == evergreen && t.similarity >= PROMPT_SIMILARITY_THRESHOLD)
            .map(|t| format!("- \"{}\" (similaridad: {:.0}%)", t.title, t.similarity * 100.0))
            .collect::<Vec<_>>()
    };

    let mut similar_context = String::new();
    let close_evergreen = quote_similar(true);
    if !close_evergreen.is_empty() {
        similar_context.push_str("\n# Títulos similares que son evergreen:\n");
        similar_context.push_str(&close_evergreen.join("\n"));
    }
    let close_other = quote_similar(false);
    if !close_other.is_empty() {
        similar_context.push_str("\n# Títulos similares que NO son evergreen:\n");
        similar_context.push_str(&close_other.join("\n"));
    }

    format!(
        r#"Analiza el siguiente título de YouTube y determina si es "evergreen" (contenido atemporal) o no.

Título: "{title}"

# Criterios para contenido evergreen
1. Aborda temas que las personas buscan constantemente
2. Enseña funciones básicas de aplicaciones populares
3. Muestra cómo hacer algo que seguirá siendo útil por un período prolongado
4. Resuelve problemas comunes y recurrentes

# Criterios para contenido NO evergreen
1. Menciona eventos, noticias o tendencias de corta duración
2. Incluye fechas, años o referencias temporales explícitas
3. Contiene reacciones u opiniones sobre eventos específicos

# Ejemplos de títulos evergreen:
{evergreen}

# Ejemplos de títulos NO evergreen:
{non_evergreen}
{similar_context}

Responde EXACTAMENTE en este formato JSON:
{{"isEvergreen": true/false, "confidence": 0.0-1.0, "reason": "explicación"}}"#,
        title = title,
        evergreen = quote(evergreen_examples),
        non_evergreen = quote(non_evergreen_examples),
        similar_context = similar_context,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn similar(similarity: f64, is_evergreen: bool) -> SimilarTitle {
        SimilarTitle {
            id: 0,
            title: "t".into(),
            is_evergreen,
            similarity,
        }
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_find_similar_orders_and_limits() {
        let candidates = vec![
            LabelledEmbedding { id: 1, title: "a".into(), is_evergreen: true, embedding: vec![0.0, 1.0] },
            LabelledEmbedding { id: 2, title: "b".into(), is_evergreen: false, embedding: vec![1.0, 0.0] },
            LabelledEmbedding { id: 3, title: "c".into(), is_evergreen: true, embedding: vec![1.0, 1.0] },
        ];
        let ranked = find_similar(&[1.0, 0.1], &candidates, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, 2);
        assert_eq!(ranked[1].id, 3);
    }

    #[test]
    fn test_vote_decides_with_three_agreeing_neighbours() {
        let result = vote(&[similar(0.9, true), similar(0.8, true), similar(0.75, true), similar(0.5, false)])
            .expect("vote should decide");
        assert!(result.is_evergreen);
        assert_eq!(result.confidence, 1.0);
        assert!(result.reason.contains("3 títulos similares"));
    }

    #[test]
    fn test_vote_needs_three_close_neighbours() {
        assert!(vote(&[similar(0.95, true), similar(0.9, true), similar(0.69, true)]).is_none());
    }

    #[test]
    fn test_vote_needs_strong_majority() {
        // 0.8 + 0.8 vs 0.8: winning share 0.67
        assert!(vote(&[similar(0.8, true), similar(0.8, true), similar(0.8, false)]).is_none());
    }

    #[test]
    fn test_vote_non_evergreen_majority() {
        let result = vote(&[
            similar(0.9, false),
            similar(0.9, false),
            similar(0.9, false),
            similar(0.7, true),
        ])
        .unwrap();
        assert!(!result.is_evergreen);
        assert_eq!(result.confidence, 0.79);
    }

    #[test]
    fn test_default_examples_pad_to_five() {
        let padded = with_default_examples(vec!["uno".into()], &DEFAULT_EVERGREEN_EXAMPLES);
        assert_eq!(padded.len(), 5);
        let kept = with_default_examples(vec!["a".into(), "b".into(), "c".into()], &DEFAULT_EVERGREEN_EXAMPLES);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_prompt_quotes_only_close_neighbours() {
        let prompt = build_classification_prompt(
            "Cómo activar WhatsApp",
            &["Guía".into()],
            &["Noticias".into()],
            &[
                SimilarTitle { id: 1, title: "Activar modo oscuro".into(), is_evergreen: true, similarity: 0.8 },
                SimilarTitle { id: 2, title: "Lejano".into(), is_evergreen: false, similarity: 0.5 },
            ],
        );
        assert!(prompt.contains("Activar modo oscuro"));
        assert!(prompt.contains("80%"));
        assert!(!prompt.contains("Lejano"));
    }
}
