//! Reference-manager and report exports of a fetch result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::formatters::{compact_result, format_result_markdown};
use crate::models::{FetchResult, Paper};

/// Export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values, safe to open in a spreadsheet.
    #[default]
    Csv,
    /// RIS for reference managers.
    Ris,
    /// BibTeX.
    Bibtex,
    /// EndNote tagged format.
    Endnote,
    /// Markdown digest.
    Markdown,
    /// Compact JSON digest: counts, errors and papers without abstracts.
    Json,
}

impl ExportFormat {
    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Ris => "ris",
            Self::Bibtex => "bib",
            Self::Endnote => "enw",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Ris => "ris",
            Self::Bibtex => "bibtex",
            Self::Endnote => "endnote",
            Self::Markdown => "markdown",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "ris" => Ok(Self::Ris),
            "bibtex" | "bib" => Ok(Self::Bibtex),
            "endnote" | "enw" => Ok(Self::Endnote),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown export format '{other}' (expected csv, ris, bibtex, endnote, markdown, json)"
            )),
        }
    }
}

/// Render a result in the requested format.
#[must_use]
pub fn render(result: &FetchResult, format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => format_csv(&result.papers),
        ExportFormat::Ris => format_ris(&result.papers),
        ExportFormat::Bibtex => format_bibtex(&result.papers),
        ExportFormat::Endnote => format_endnote(&result.papers),
        ExportFormat::Markdown => format_result_markdown(result),
        ExportFormat::Json => {
            serde_json::to_string_pretty(&compact_result(result)).unwrap_or_default()
        }
    }
}

fn authors(paper: &Paper) -> impl Iterator<Item = &str> {
    paper.authors.split(',').map(str::trim).filter(|a| !a.is_empty())
}

fn one_line(s: &str) -> String {
    s.replace('\r', "").replace('\n', " ")
}

/// Format papers as RIS.
fn format_ris(papers: &[Paper]) -> String {
    let mut output = String::new();

    for paper in papers {
        let kind = if paper.source.is_preprint() { "UNPB" } else { "JOUR" };
        output.push_str(&format!("TY  - {kind}\n"));
        output.push_str(&format!("TI  - {}\n", one_line(&paper.title)));

        for author in authors(paper) {
            output.push_str(&format!("AU  - {author}\n"));
        }

        if !paper.published.is_empty() {
            output.push_str(&format!("DA  - {}\n", paper.published.replace('-', "/")));
        }
        if let Some(year) = paper.year() {
            output.push_str(&format!("PY  - {year}\n"));
        }

        if paper.has_journal() {
            output.push_str(&format!("JO  - {}\n", paper.journal));
        }
        if !paper.volume.is_empty() {
            output.push_str(&format!("VL  - {}\n", paper.volume));
        }
        if !paper.issue.is_empty() {
            output.push_str(&format!("IS  - {}\n", paper.issue));
        }

        if !paper.r#abstract.is_empty() {
            output.push_str(&format!("AB  - {}\n", one_line(&paper.r#abstract)));
        }

        for keyword in &paper.matched_keywords {
            output.push_str(&format!("KW  - {keyword}\n"));
        }

        if !paper.url.is_empty() {
            output.push_str(&format!("UR  - {}\n", paper.url));
        }

        output.push_str(&format!("DB  - {}\n", paper.source.display_name()));
        output.push_str("ER  - \n\n");
    }

    output
}

/// Format papers as BibTeX. Citation keys are made unique with a suffix.
fn format_bibtex(papers: &[Paper]) -> String {
    let mut output = String::new();
    let mut used_keys = std::collections::HashMap::<String, usize>::new();

    for paper in papers {
        let base = citation_key(paper);
        let count = used_keys.entry(base.clone()).or_insert(0);
        *count += 1;
        let key = if *count == 1 { base } else { format!("{base}_{count}") };

        let kind = if paper.has_journal() { "article" } else { "misc" };
        output.push_str(&format!("@{kind}{{{key},\n"));
        output.push_str(&format!("  title = {{{}}},\n", escape_bibtex(&paper.title)));

        let author_field = authors(paper).collect::<Vec<_>>().join(" and ");
        if !author_field.is_empty() {
            output.push_str(&format!("  author = {{{}}},\n", escape_bibtex(&author_field)));
        }

        if let Some(year) = paper.year() {
            output.push_str(&format!("  year = {{{year}}},\n"));
        }

        if paper.has_journal() {
            output.push_str(&format!("  journal = {{{}}},\n", escape_bibtex(&paper.journal)));
            if !paper.volume.is_empty() {
                output.push_str(&format!("  volume = {{{}}},\n", escape_bibtex(&paper.volume)));
            }
            if !paper.issue.is_empty() {
                output.push_str(&format!("  number = {{{}}},\n", escape_bibtex(&paper.issue)));
            }
        } else {
            output.push_str(&format!("  howpublished = {{{}}},\n", escape_bibtex(paper.source.display_name())));
        }

        if !paper.r#abstract.is_empty() {
            output.push_str(&format!("  abstract = {{{}}},\n", escape_bibtex(&paper.r#abstract)));
        }

        if !paper.matched_keywords.is_empty() {
            let keywords = paper.matched_keywords.join(", ");
            output.push_str(&format!("  keywords = {{{}}},\n", escape_bibtex(&keywords)));
        }

        if !paper.url.is_empty() {
            output.push_str(&format!("  url = {{{}}},\n", paper.url));
        }

        output.push_str("}\n\n");
    }

    output
}

/// `lastnameYEAR` from the first author, ASCII alphanumerics only.
fn citation_key(paper: &Paper) -> String {
    let surname = paper
        .first_author()
        .and_then(|a| a.split_whitespace().last())
        .map(|s| s.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}{}", surname.to_lowercase(), paper.year().unwrap_or("nd"))
}

/// Format papers as CSV.
fn format_csv(papers: &[Paper]) -> String {
    let mut output = String::new();

    // Header
    output.push_str(
        "title,authors,published,source,journal,volume,issue,score,high_impact,matched_keywords,url,abstract\n",
    );

    for paper in papers {
        let row = [
            csv_escape(&paper.title),
            csv_escape(&paper.authors),
            csv_escape(&paper.published),
            csv_escape(paper.source.display_name()),
            csv_escape(&paper.journal),
            csv_escape(&paper.volume),
            csv_escape(&paper.issue),
            format!("{:.2}", paper.relevance_score),
            paper.is_high_impact.to_string(),
            csv_escape(&paper.matched_keywords.join("; ")),
            csv_escape(&paper.url),
            csv_escape(&paper.r#abstract),
        ];
        output.push_str(&row.join(","));
        output.push('\n');
    }

    output
}

/// Format papers as EndNote.
fn format_endnote(papers: &[Paper]) -> String {
    let mut output = String::new();

    for paper in papers {
        let kind = if paper.has_journal() { "Journal Article" } else { "Electronic Article" };
        output.push_str(&format!("%0 {kind}\n"));
        output.push_str(&format!("%T {}\n", one_line(&paper.title)));

        for author in authors(paper) {
            output.push_str(&format!("%A {author}\n"));
        }

        if let Some(year) = paper.year() {
            output.push_str(&format!("%D {year}\n"));
        }

        if paper.has_journal() {
            output.push_str(&format!("%J {}\n", paper.journal));
        }
        if !paper.volume.is_empty() {
            output.push_str(&format!("%V {}\n", paper.volume));
        }
        if !paper.issue.is_empty() {
            output.push_str(&format!("%N {}\n", paper.issue));
        }

        if !paper.r#abstract.is_empty() {
            output.push_str(&format!("%X {}\n", one_line(&paper.r#abstract)));
        }

        for keyword in &paper.matched_keywords {
            output.push_str(&format!("%K {keyword}\n"));
        }

        if !paper.url.is_empty() {
            output.push_str(&format!("%U {}\n", paper.url));
        }

        output.push('\n');
    }

    output
}

/// Escape a string for BibTeX output.
fn escape_bibtex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '{' | '}' | '&' | '%' | '$' | '#' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escape a string for CSV output.
fn csv_escape(s: &str) -> String {
    // Spreadsheet formula injection
    let guarded = if s.starts_with(['=', '+', '-', '@']) { format!("'{s}") } else { s.to_string() };

    if guarded.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", guarded.replace('"', "\"\""))
    } else {
        guarded
    }
}
