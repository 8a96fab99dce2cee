//! Reference passages injected into prompts.
//!
//! Passages are ranked by plain token overlap with the query; tags count
//! double. No embeddings are involved.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReferencePassage {
    pub id: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    passages: Vec<ReferencePassage>,
}

/// Passages selected for one prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RagContext {
    pub passages: Vec<ReferencePassage>,
}

/// Shortest ASCII token that counts. Short words in other scripts (`바다`,
/// `海`) carry meaning and are always kept.
const MIN_ASCII_TOKEN_LEN: usize = 3;

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && (!t.is_ascii() || t.len() >= MIN_ASCII_TOKEN_LEN))
        .map(|t| t.to_lowercase())
        .collect()
}

impl ReferenceLibrary {
    pub fn new(passages: Vec<ReferencePassage>) -> Self {
        Self { passages }
    }

    /// Load passages from a JSON array on disk.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let passages: Vec<ReferencePassage> = serde_json::from_str(&raw)?;
        Ok(Self::new(passages))
    }

    /// Built-in notes on curatorial practice.
    pub fn builtin() -> Self {
        let passage = |id: &str, title: &str, text: &str, tags: &[&str]| ReferencePassage {
            id: id.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };

        Self::new(vec![
            passage(
                "wall-text",
                "Writing wall texts",
                "Wall texts address a standing reader. Lead with what the visitor can see, keep sentences short, avoid jargon, and connect each work to the exhibition theme in one clear idea.",
                &["introduction", "label", "writing", "visitor"],
            ),
            passage(
                "exhibition-titles",
                "Exhibition titles",
                "Strong exhibition titles are short, evocative and specific. A poetic main title is often paired with a descriptive subtitle naming the artists, period or medium.",
                &["title", "subtitle", "naming"],
            ),
            passage(
                "curatorial-essay",
                "The curatorial essay",
                "A curatorial essay frames the question the exhibition asks, situates the works historically and critically, and explains the logic of selection and sequence.",
                &["essay", "curatorial", "context", "history"],
            ),
            passage(
                "sequencing",
                "Sequencing a show",
                "Rooms are sequenced to build a narrative: an opening statement work, clusters that develop themes, moments of contrast, and a closing work that lingers.",
                &["gallery", "layout", "sequence", "room", "wall"],
            ),
            passage(
                "poster-design",
                "Exhibition posters",
                "Effective exhibition posters rely on a single strong image, generous negative space and a restrained palette drawn from the works on view.",
                &["poster", "design", "image", "typography"],
            ),
            passage(
                "press-release",
                "Press releases",
                "A press release states the essentials first: title, dates, venue, artists. It then offers one memorable angle and a quotable line from the curator.",
                &["press", "release", "media"],
            ),
            passage(
                "contemporary-photography",
                "Photography exhibitions",
                "Photography shows benefit from attention to print size, series integrity and the rhythm of images across a wall; captions should credit edition and process.",
                &["photography", "photo", "print", "series"],
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Top `k` passages for the query terms. Passages with no overlap are
    /// never returned; equal scores are ordered by id.
    pub fn retrieve<S: AsRef<str>>(&self, query_terms: &[S], k: usize) -> RagContext {
        let query: HashSet<String> = query_terms
            .iter()
            .flat_map(|term| tokenize(term.as_ref()))
            .collect();

        if query.is_empty() || k == 0 {
            return RagContext::default();
        }

        let mut scored: Vec<(usize, &ReferencePassage)> = self
            .passages
            .iter()
            .map(|passage| {
                let body = tokenize(&format!("{} {}", passage.title, passage.text));
                let tags: HashSet<String> =
                    passage.tags.iter().flat_map(|t| tokenize(t)).collect();
                let score = query.intersection(&body).count() + 2 * query.intersection(&tags).count();
                (score, passage)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|(sa, pa), (sb, pb)| sb.cmp(sa).then_with(|| pa.id.cmp(&pb.id)));

        RagContext {
            passages: scored.into_iter().take(k).map(|(_, p)| p.clone()).collect(),
        }
    }
}

impl RagContext {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Render as a prompt block, at most `max_chars` characters long.
    pub fn render(&self, max_chars: usize) -> String {
        if self.passages.is_empty() {
            return String::new();
        }

        let mut block = String::from("Reference material:\n");
        for passage in &self.passages {
            block.push_str(&format!("- {}: {}\n", passage.title, passage.text));
        }

        if block.chars().count() > max_chars {
            block = block.chars().take(max_chars).collect();
        }
        block
    }
}
