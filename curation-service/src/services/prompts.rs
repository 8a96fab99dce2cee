//! Prompt templates for the curation assistant.

use crate::models::{Artwork, ChatStep, ContentKind, Exhibition, ExhibitionContent};
use crate::services::rag::RagContext;

pub const CURATOR_SYSTEM_PROMPT: &str = "You are an experienced exhibition curator. \
You help artists and curators shape exhibitions: titles, wall texts, essays, \
posters and the arrangement of works. Write with clarity and warmth, avoid \
academic jargon, and never invent facts about real artists or artworks.";

pub const TITLE_CANDIDATES: usize = 5;

fn with_reference(rag: &str, task: String) -> String {
    if rag.is_empty() {
        task
    } else {
        format!("{}\n{}", rag.trim_end(), task)
    }
}

fn describe_exhibition(exhibition: &Exhibition) -> String {
    let mut lines = Vec::new();
    if let Some(title) = &exhibition.title {
        lines.push(format!("Title: {}", title));
    }
    if let Some(subtitle) = &exhibition.subtitle {
        lines.push(format!("Subtitle: {}", subtitle));
    }
    if !exhibition.keywords.is_empty() {
        lines.push(format!("Keywords: {}", exhibition.keywords.join(", ")));
    }
    if let Some(description) = &exhibition.description {
        lines.push(format!("Description: {}", description));
    }
    if lines.is_empty() {
        lines.push("No details yet.".to_string());
    }
    lines.join("\n")
}

pub fn title_prompt(keywords: &[String], description: Option<&str>, rag: &str) -> String {
    let mut task = format!(
        "Propose {} exhibition titles for a show built around these keywords: {}.\n",
        TITLE_CANDIDATES,
        keywords.join(", ")
    );
    if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
        task.push_str(&format!("The curator describes it as: {}\n", description.trim()));
    }
    task.push_str(
        "Each title gets a short subtitle and a one-sentence rationale.\n\
         Reply with JSON only, in the form \
         {\"titles\":[{\"title\":\"...\",\"subtitle\":\"...\",\"rationale\":\"...\"}]}",
    );
    with_reference(rag, task)
}

pub fn content_prompt(
    exhibition: &Exhibition,
    kinds: &[ContentKind],
    artworks: &[Artwork],
    rag: &str,
) -> String {
    let mut task = format!(
        "Write exhibition texts for the following exhibition.\n{}\n",
        describe_exhibition(exhibition)
    );

    if !artworks.is_empty() {
        task.push_str("Artworks:\n");
        for artwork in artworks {
            task.push_str(&format!("- [{}] {}", artwork.id, artwork.caption()));
            if let Some(description) = &artwork.description {
                task.push_str(&format!(": {}", description));
            }
            task.push('\n');
        }
    }

    task.push_str("Produce these texts:\n");
    for kind in kinds {
        task.push_str(&format!("- {}: {}\n", kind.as_str(), kind.guidance()));
    }

    task.push_str(
        "Reply with JSON only, in the form \
         {\"blocks\":[{\"kind\":\"...\",\"heading\":\"...\",\"body\":\"...\",\"artwork_id\":\"...\"}]}. \
         Use artwork_id only for artwork_label blocks, copying the id in brackets.",
    );
    with_reference(rag, task)
}

/// Image-model prompt. Image models render text badly, so the poster is
/// requested without lettering.
pub fn poster_prompt(exhibition: &Exhibition, content: &[ExhibitionContent]) -> String {
    let theme = exhibition
        .title
        .clone()
        .unwrap_or_else(|| exhibition.keywords.join(", "));

    let mut prompt = format!(
        "An exhibition poster artwork for a show titled \"{}\".",
        theme
    );
    if !exhibition.keywords.is_empty() {
        prompt.push_str(&format!(" Themes: {}.", exhibition.keywords.join(", ")));
    }

    let summary = content
        .iter()
        .find(|c| c.kind == ContentKind::PosterCopy)
        .or_else(|| content.iter().find(|c| c.kind == ContentKind::Introduction))
        .map(|c| first_sentences(&c.body, 2));
    if let Some(summary) = summary {
        prompt.push_str(&format!(" Mood and subject: {}", summary));
    }

    prompt.push_str(
        " Contemporary gallery aesthetic, a single strong central image, generous \
         negative space, restrained palette. No text, letters or typography.",
    );
    prompt
}

fn first_sentences(text: &str, n: usize) -> String {
    let mut out = String::new();
    let mut count = 0;
    for ch in text.chars() {
        out.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            count += 1;
            if count == n {
                break;
            }
        }
    }
    out.trim().to_string()
}

/// System instruction for one step of the streamed conversation.
pub fn chat_prompt(step: ChatStep, exhibition: Option<&Exhibition>, rag: &str) -> String {
    let focus = match step {
        ChatStep::Title => {
            "We are finding a title. Ask about the theme and mood, then suggest a few \
             titles with subtitles and explain the choices briefly."
        }
        ChatStep::Content => {
            "We are writing the exhibition texts. Help draft and refine the introduction, \
             essay and artwork labels, keeping the established title in mind."
        }
        ChatStep::Poster => {
            "We are designing the poster. Discuss imagery, palette and composition drawn \
             from the exhibition texts, and describe a concrete poster concept."
        }
        ChatStep::Gallery => {
            "We are arranging the virtual gallery. Suggest an order and grouping of the \
             artworks across the walls and explain the visitor's path."
        }
    };

    let mut prompt = format!("{}\n\n{}", CURATOR_SYSTEM_PROMPT, focus);
    if let Some(exhibition) = exhibition {
        prompt.push_str(&format!(
            "\n\nCurrent exhibition:\n{}",
            describe_exhibition(exhibition)
        ));
    }
    if !rag.is_empty() {
        prompt.push_str(&format!("\n\n{}", rag.trim_end()));
    }
    prompt
}

pub fn artwork_analysis_prompt(artwork: &Artwork) -> String {
    let mut prompt = String::from("Look closely at this artwork image");
    if !artwork.title.trim().is_empty() {
        prompt.push_str(&format!(" (catalogued as \"{}\")", artwork.caption()));
    }
    prompt.push_str(
        ". Describe what is visible without guessing the artist. Reply with JSON only, \
         in the form {\"title\":\"...\",\"description\":\"...\",\"medium\":\"...\",\
         \"mood\":\"...\",\"keywords\":[\"...\"]}. The description is two or three sentences.",
    );
    prompt
}

/// Query terms used to retrieve reference material.
pub fn rag_query(exhibition: Option<&Exhibition>, extra: &[&str]) -> Vec<String> {
    let mut terms: Vec<String> = exhibition
        .map(|e| {
            let mut terms = e.keywords.clone();
            terms.extend(e.title.clone());
            terms
        })
        .unwrap_or_default();
    terms.extend(extra.iter().map(|s| s.to_string()));
    terms
}
