//! Workflow integration tests for Redlines.
//!
//! Tests complete pipelines from loading an export through rendering notes and
//! generating reports.

mod common;

use anyhow::{Context, Result};
use common::{PORT_SCAN_ID, SQLI_ID};
use redlines::{
    Highlighter, MarkdownRenderer, NoteStore, ReportFormat, ReportGenerator, ReportOptions,
    linked_note_ids, report_file_name,
};
use std::fs;

fn report_options(format: ReportFormat) -> ReportOptions {
    ReportOptions {
        title: "Acme External Test".to_string(),
        format,
        generated_on: "2024-04-05 19:21:18 UTC".to_string(),
    }
}

/// Tests loading an export from disk and rendering a note with its links.
///
/// Exercises the preview path: store lookup, markdown rendering, then link
/// resolution against the same store.
#[test]
fn test_workflow_load_store_to_rendered_note() -> Result<()> {
    // Arrange
    let (_dir, path) = common::sample_export_dir()?;
    let store = NoteStore::load(&path)?;
    let renderer = MarkdownRenderer::new();

    // Act
    let note = store.find_by_id(PORT_SCAN_ID).context("Port scan note")?;
    let html = renderer.render_with_links(note.content(), &store)?;

    // Assert
    assert!(html.starts_with("<h1>Port Scan</h1>"), "Got: {}", html);
    assert!(html.contains("<th>Port</th><th>Service</th>"));
    assert!(html.contains("<td>22</td><td>ssh</td>"));
    assert!(
        html.contains(&format!(
            "<a class=\"note-link\" data-note-id=\"{}\">SQL Injection</a>",
            SQLI_ID
        )),
        "Got: {}",
        html
    );
    Ok(())
}

/// Tests mixed resolution when a note links to known and missing notes.
#[test]
fn test_workflow_mixed_links() -> Result<()> {
    // Arrange
    let store = NoteStore::from_json(common::SAMPLE_EXPORT)?;
    let renderer = MarkdownRenderer::new();
    let note = store.find_by_id(SQLI_ID).context("SQLi note")?;

    // Act
    let html = renderer.render_with_links(note.content(), &store)?;

    // Assert
    assert!(html.contains(&format!("data-note-id=\"{}\">Port Scan</a>", PORT_SCAN_ID)));
    assert!(html.contains("see also Ghost."), "Unknown link becomes text: {}", html);
    assert!(!html.contains("[[note-999"), "Got: {}", html);
    assert!(html.contains("<input type=\"checkbox\" checked disabled><label>Confirmed</label>"));
    assert!(html.contains("<input type=\"checkbox\" disabled><label>Reported</label>"));
    Ok(())
}

/// Tests that link targets found in raw content can be looked up.
#[test]
fn test_workflow_linked_ids_to_paths() -> Result<()> {
    // Arrange
    let store = NoteStore::from_json(common::SAMPLE_EXPORT)?;
    let note = store.find_by_id(SQLI_ID).context("SQLi note")?;

    // Act
    let paths: Vec<Option<String>> = linked_note_ids(note.content())
        .into_iter()
        .map(|id| store.note_path(id))
        .collect();

    // Assert
    assert_eq!(
        paths,
        vec![Some("Acme Corp > Recon > Port Scan".to_string()), None]
    );
    Ok(())
}

/// Tests highlighted rendering of a note with a fenced command.
#[test]
fn test_workflow_highlighted_note() -> Result<()> {
    // Arrange
    let store = NoteStore::from_json(common::SAMPLE_EXPORT)?;
    let renderer = MarkdownRenderer::with_highlighter(Highlighter::new());
    let note = store.find_by_id(SQLI_ID).context("SQLi note")?;

    // Act
    let html = renderer.render_with_links(note.content(), &store)?;

    // Assert
    assert!(
        html.contains("<code class=\"code-block language-bash\"><span class=\"hl-"),
        "Fence should be highlighted: {}",
        html
    );
    assert!(html.contains("sqlmap"));
    assert!(!html.contains("&amp;quot;"), "No double escaping: {}", html);
    Ok(())
}

/// Tests markdown report written to disk under its derived file name.
#[test]
fn test_workflow_markdown_report_to_file() -> Result<()> {
    // Arrange
    let (dir, path) = common::sample_export_dir()?;
    let store = NoteStore::load(&path)?;
    let renderer = MarkdownRenderer::new();
    let options = report_options(ReportFormat::Markdown);
    let ids: Vec<String> = store.notes().iter().map(|n| n.id.clone()).collect();

    // Act
    let report = ReportGenerator::new(&store, &renderer).generate(&ids, &options)?;
    let out = dir.path().join(report_file_name(&options.title, options.format));
    fs::write(&out, &report)?;

    // Assert
    assert!(out.ends_with("acme_external_test.md"));
    let written = fs::read_to_string(&out)?;
    assert!(written.starts_with("# Acme External Test\n\n*Generated on 2024-04-05 19:21:18 UTC*"));
    assert!(written.contains("## Port Scan\n\n*Path: Acme Corp > Recon > Port Scan*\n\nTags: recon\n\n"));
    assert!(written.contains("## SQL Injection\n\n*Path: Acme Corp > SQL Injection*\n\nTags: critical, web\n\n"));
    assert!(
        written.contains("[[note-999|Ghost]]"),
        "Markdown report keeps raw content"
    );
    Ok(())
}

/// Tests HTML report renders every note and strips note links.
#[test]
fn test_workflow_html_report() -> Result<()> {
    // Arrange
    let store = NoteStore::from_json(common::SAMPLE_EXPORT)?;
    let renderer = MarkdownRenderer::with_highlighter(Highlighter::new());
    let options = report_options(ReportFormat::Html);

    // Act
    let report =
        ReportGenerator::new(&store, &renderer).generate(&[SQLI_ID, PORT_SCAN_ID], &options)?;

    // Assert
    assert!(report.starts_with("<!DOCTYPE html>"));
    assert!(report.contains("<h1>Acme External Test</h1>"));
    assert!(report.contains(".hl-"), "Highlight stylesheet embedded");
    assert!(report.contains("<table class=\"markdown-table\">"));
    assert!(report.contains("Back to Port Scan, see also Ghost."), "Got: {}", report);
    assert!(!report.contains("note-link"));

    let sqli = report.find("<h2>SQL Injection</h2>").context("SQLi section")?;
    let scan = report.find("<h2>Port Scan</h2>").context("Port scan section")?;
    assert!(sqli < scan, "Sections follow selection order");
    Ok(())
}

/// Tests that a missing export file reports the path.
#[test]
fn test_workflow_error_missing_export() {
    // Act
    let result = NoteStore::load("/nonexistent/redlines/notes.json");

    // Assert
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("Failed to read notes file"), "Got: {}", msg);
}

/// Tests that a corrupt export file fails with a parse error.
#[test]
fn test_workflow_error_corrupt_export() -> Result<()> {
    // Arrange
    let dir = tempfile::TempDir::new()?;
    let path = common::write_file(dir.path(), "notes.json", "{ not json")?;

    // Act
    let result = NoteStore::load(&path);

    // Assert
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("Failed to parse notes file"), "Got: {}", msg);
    Ok(())
}

/// Tests rendering a markdown file from disk.
#[test]
fn test_workflow_render_file() -> Result<()> {
    // Arrange
    let dir = tempfile::TempDir::new()?;
    let path = common::write_file(dir.path(), "notes/finding.md", "## Finding\n\nRun `id;whoami` first")?;

    // Act
    let html = MarkdownRenderer::new().render_file(&path)?;

    // Assert
    assert_eq!(
        html,
        "<h2>Finding</h2>\n\n<p>Run <code class=\"inline-code\">id;whoami</code> first</p>"
    );
    Ok(())
}
