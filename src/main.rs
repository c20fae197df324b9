use anyhow::{Context, Result};
use redlines::{
    Command, Config, Highlighter, MarkdownRenderer, NoteStore, RenderArgs, ReportArgs,
    ReportFormat, ReportGenerator, ReportOptions,
};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Builds renderer with or without highlighting.
///
/// An unknown theme is not fatal: the warning is printed and the renderer
/// falls back to the default theme.
fn build_renderer(highlight: bool, theme: &str) -> MarkdownRenderer {
    if !highlight {
        return MarkdownRenderer::new();
    }

    let highlighter = Highlighter::with_theme(theme).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load theme: {:#}", e);
        Highlighter::new()
    });
    MarkdownRenderer::with_highlighter(highlighter)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated: {}", path.display());
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let renderer = build_renderer(args.highlight, &args.theme);
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read markdown file: {}", args.input.display()))?;

    // Links stay as written when no store is available
    let store = args.notes.as_ref().and_then(|path| {
        NoteStore::load(path)
            .map_err(|e| eprintln!("Warning: Failed to load notes: {:#}", e))
            .ok()
    });

    let html = match &store {
        Some(store) => renderer.render_with_links(&content, store)?,
        None => renderer.render(&content)?,
    };

    match &args.output {
        Some(path) => write_output(path, &html),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .context("Failed to write to stdout")
        }
    }
}

fn run_report(args: &ReportArgs) -> Result<()> {
    let store = NoteStore::load(&args.notes).context("Failed to load notes")?;
    let renderer = build_renderer(args.highlight, &args.theme);

    let note_ids: Vec<String> = if args.note_ids.is_empty() {
        store.notes().iter().map(|note| note.id.clone()).collect()
    } else {
        for id in &args.note_ids {
            if store.find_by_id(id).is_none_or(|node| !node.is_note()) {
                eprintln!("Warning: Note not found: {}", id);
            }
        }
        args.note_ids.clone()
    };

    let options = ReportOptions {
        title: args.title().to_string(),
        format: args.format,
        ..ReportOptions::default()
    };

    let report = ReportGenerator::new(&store, &renderer)
        .generate(&note_ids, &options)
        .context("Failed to generate report")?;

    let output = args.output_path();
    write_output(&output, &report)?;

    if args.format == ReportFormat::Html
        && !args.no_open
        && let Err(e) = open::that(&output)
    {
        eprintln!("Warning: Failed to open report: {:#}", e);
    }

    Ok(())
}

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    match &config.command {
        Command::Render(args) => run_render(args),
        Command::Report(args) => run_report(args),
    }
}
