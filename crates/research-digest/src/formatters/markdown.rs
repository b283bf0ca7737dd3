//! Markdown output formatting.

use std::borrow::Cow;

use crate::models::{FetchResult, Paper};

/// Abstract preview length in characters.
const ABSTRACT_PREVIEW: usize = 300;

/// Format a fetch result as a Markdown digest.
#[must_use]
pub fn format_result_markdown(result: &FetchResult) -> String {
    let mut output = format!(
        "# Research digest ({} of {} matching papers, {} candidates)\n\n",
        result.papers.len(),
        result.total_after_filter,
        result.total_before_filter
    );

    if !result.must_have_keywords.is_empty() {
        output.push_str(&format!("**Must have**: {}\n\n", result.must_have_keywords.join(", ")));
    }

    if !result.errors.is_empty() {
        output.push_str("## Source errors\n\n");
        for err in &result.errors {
            output.push_str(&format!("- {err}\n"));
        }
        output.push('\n');
    }

    output.push_str(&format_papers_markdown(&result.papers));
    output
}

/// Format a list of papers as Markdown.
#[must_use]
pub fn format_papers_markdown(papers: &[Paper]) -> String {
    if papers.is_empty() {
        return "No papers found.\n".to_string();
    }

    let mut output = String::new();

    for (i, paper) in papers.iter().enumerate() {
        output.push_str(&format_paper_markdown(paper, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single paper as Markdown.
#[must_use]
pub fn format_paper_markdown(paper: &Paper, index: usize) -> String {
    let mut output = String::new();

    // Title
    let star = if paper.is_high_impact { " ★" } else { "" };
    output.push_str(&format!("## {}. {}{star}\n\n", index, paper.title));

    // Authors
    if !paper.authors.is_empty() {
        output.push_str(&format!("**Authors**: {}\n\n", paper.authors));
    }

    // Date, source, venue, score
    let mut meta = Vec::new();
    if !paper.published.is_empty() {
        meta.push(format!("**Published**: {}", paper.published));
    }
    meta.push(format!("**Source**: {}", paper.source));

    if paper.has_journal() {
        meta.push(format!("**Journal**: {}", journal_citation(paper)));
    }
    meta.push(format!("**Score**: {:.2}", paper.relevance_score));

    output.push_str(&format!("{}\n\n", meta.join(" | ")));

    if !paper.matched_keywords.is_empty() {
        output.push_str(&format!("**Keywords**: {}\n\n", paper.matched_keywords.join(", ")));
    }

    if !paper.url.is_empty() {
        output.push_str(&format!("**Link**: <{}>\n\n", paper.url));
    }

    // Abstract (truncated on a char boundary)
    if !paper.r#abstract.is_empty() {
        let truncated: Cow<'_, str> = match paper.r#abstract.char_indices().nth(ABSTRACT_PREVIEW) {
            Some((idx, _)) => Cow::Owned(format!("{}...", &paper.r#abstract[..idx])),
            None => Cow::Borrowed(&paper.r#abstract),
        };
        output.push_str(&format!("**Abstract**: {truncated}\n"));
    }

    output
}

/// `Journal 12(3)` style venue string.
fn journal_citation(paper: &Paper) -> String {
    let mut venue = paper.journal.clone();
    if !paper.volume.is_empty() {
        venue.push_str(&format!(" {}", paper.volume));
    }
    if !paper.issue.is_empty() {
        venue.push_str(&format!("({})", paper.issue));
    }
    venue
}
