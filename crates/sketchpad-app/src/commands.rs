//! Command execution against file-backed documents.

use crate::cli::{Cli, Command, KindArg};
use crate::replay::{parse_taps, replay};
use anyhow::{Context, Result, anyhow, bail};
use kurbo::Rect;
use sketchpad_core::{
    DocumentCatalog, DocumentSession, EditorConfig, FileRecordStore, GestureEvent, SaveStatus, Shape,
    ShapeRecord,
};
use sketchpad_render::{ArtifactLocation, FileArtifactSink, PdfExporter, spawn_export};
use std::io::Write;

type Session = DocumentSession<FileRecordStore>;

/// Run one parsed command, writing its output to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let mut store = open_store(cli)?;

    match &cli.command {
        Command::List => {
            for doc in store.list_documents()? {
                writeln!(out, "{}\t{}", doc.id, doc.created_at)?;
            }
        }
        Command::New => {
            let id = store.create_document()?;
            writeln!(out, "{}", id)?;
        }
        Command::Delete { document } => {
            store
                .delete_document(document)
                .with_context(|| format!("Failed to delete document {}", document))?;
            log::info!("Deleted document {}", document);
        }
        Command::Show { document, json } => {
            let session = open_session(store, document, load_config(cli)?)?;
            let shapes = session.editor().snapshot();
            if *json {
                let records: Vec<ShapeRecord> = shapes
                    .iter()
                    .map(|shape| ShapeRecord::from_shape(shape, document))
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
            } else {
                for shape in &shapes {
                    write_shape(out, shape)?;
                }
                if let Some(bounds) = session.editor().store().bounds() {
                    writeln!(
                        out,
                        "bounds\t{} {} {} {}",
                        bounds.x0,
                        bounds.y0,
                        bounds.width(),
                        bounds.height()
                    )?;
                }
            }
        }
        Command::Tap { document, x, y } => {
            let mut session = open_session(store, document, load_config(cli)?)?;
            let before = session.editor().store().len();
            let status = session.handle_gesture(GestureEvent::SingleTap { x: *x, y: *y });
            ensure_saved(status)?;
            let shapes = session.editor().store();
            match shapes.shapes_ordered().next_back() {
                Some(shape) if shapes.len() > before => write_shape(out, shape)?,
                _ => {}
            }
        }
        Command::DoubleTap { document, x, y } => {
            let mut session = open_session(store, document, load_config(cli)?)?;
            let status = session.handle_gesture(GestureEvent::DoubleTap { x: *x, y: *y });
            ensure_saved(status)?;
            match session.editor().selected() {
                Some(id) => writeln!(out, "Selected {}", id)?,
                None => writeln!(out, "Nothing selected")?,
            }
        }
        Command::Add {
            document,
            kind,
            x,
            y,
            width,
            height,
            text,
        } => {
            let frame = Rect::new(*x, *y, x + width, y + height);
            let shape = match kind {
                KindArg::Rectangle => Shape::rectangle(frame),
                KindArg::Circle => Shape::circle(frame),
                KindArg::Text => {
                    let content = text
                        .clone()
                        .ok_or_else(|| anyhow!("Text shapes need --text"))?;
                    Shape::text(frame, content)
                }
            };
            let mut session = open_session(store, document, load_config(cli)?)?;
            ensure_saved(session.add_shape(shape.clone())?)?;
            write_shape(out, &shape)?;
        }
        Command::Move {
            document,
            id,
            x,
            y,
            width,
            height,
        } => {
            let mut session = open_session(store, document, load_config(cli)?)?;
            let frame = Rect::new(*x, *y, x + width, y + height);
            ensure_saved(session.move_shape(*id, frame)?)?;
            if let Some(shape) = session.editor().store().get(*id) {
                write_shape(out, shape)?;
            }
        }
        Command::Remove { document, id } => {
            let mut session = open_session(store, document, load_config(cli)?)?;
            if !session.editor().store().contains(*id) {
                writeln!(out, "No shape {}", id)?;
                return Ok(());
            }
            ensure_saved(session.remove_shape(*id))?;
            writeln!(out, "Removed {}", id)?;
        }
        Command::Replay { document, taps } => {
            let json = std::fs::read_to_string(taps)
                .with_context(|| format!("Failed to read {}", taps.display()))?;
            let taps = parse_taps(&json)?;
            let mut session = open_session(store, document, load_config(cli)?)?;
            ensure_saved(replay(&mut session, &taps))?;
            for shape in session.editor().store().shapes_ordered() {
                write_shape(out, shape)?;
            }
            if let Some(id) = session.editor().selected() {
                writeln!(out, "Selected {}", id)?;
            }
        }
        Command::Export {
            document,
            output,
            heading,
            title,
            author,
        } => {
            let config = load_config(cli)?;
            let mut export = config.export.clone();
            if heading.is_some() {
                export.heading = heading.clone();
            }
            if title.is_some() {
                export.title = title.clone();
            }
            if author.is_some() {
                export.author = author.clone();
            }

            let session = open_session(store, document, config)?;
            let handle = spawn_export(
                PdfExporter::new(export),
                session.editor().snapshot(),
                FileArtifactSink::new(output),
            );
            match handle
                .join()
                .map_err(|_| anyhow!("Export thread panicked"))??
            {
                ArtifactLocation::File(path) => writeln!(out, "Exported to {}", path.display())?,
                ArtifactLocation::Memory { len } => writeln!(out, "Exported {} bytes", len)?,
            }
        }
    }
    Ok(())
}

fn open_store(cli: &Cli) -> Result<FileRecordStore> {
    let store = match &cli.data_dir {
        Some(dir) => FileRecordStore::new(dir.clone()),
        None => FileRecordStore::default_location(),
    };
    store.context("Failed to open document storage")
}

fn load_config(cli: &Cli) -> Result<EditorConfig> {
    match &cli.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EditorConfig::default()),
    }
}

fn open_session(store: FileRecordStore, document: &str, config: EditorConfig) -> Result<Session> {
    if !store.list_documents()?.iter().any(|doc| doc.id == document) {
        bail!("Document not found: {}", document);
    }
    let (session, report) = DocumentSession::open(store, document, config)?;
    if !report.is_clean() {
        log::warn!(
            "Loaded {} shapes, skipped {} corrupt records",
            report.loaded,
            report.skipped.len()
        );
    }
    Ok(session)
}

fn ensure_saved(status: SaveStatus) -> Result<()> {
    match status {
        SaveStatus::Saved => Ok(()),
        SaveStatus::NotSaved(e) => Err(anyhow!(e).context("Changes were not saved")),
    }
}

fn write_shape<W: Write>(out: &mut W, shape: &Shape) -> Result<()> {
    let frame = shape.frame();
    write!(
        out,
        "{}\t{}\t{} {} {} {}",
        shape.id(),
        shape.kind(),
        frame.x0,
        frame.y0,
        frame.width(),
        frame.height()
    )?;
    if let Some(text) = shape.text_content() {
        write!(out, "\t{:?}", text)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;
    use tempfile::tempdir;

    fn exec(data_dir: &Path, args: &[&str]) -> Result<String> {
        let mut argv = vec!["sketchpad", "--data-dir", data_dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        run(&cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn new_document(data_dir: &Path) -> String {
        exec(data_dir, &["new"]).unwrap().trim().to_string()
    }

    #[test]
    fn test_new_list_delete() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());

        let listed = exec(dir.path(), &["list"]).unwrap();
        assert!(listed.starts_with(&doc));

        exec(dir.path(), &["delete", &doc]).unwrap();
        assert!(exec(dir.path(), &["list"]).unwrap().is_empty());
        assert!(exec(dir.path(), &["delete", &doc]).is_err());
    }

    #[test]
    fn test_tap_places_default_rectangle() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());

        let line = exec(dir.path(), &["tap", &doc, "200", "200"]).unwrap();
        assert!(line.contains("\trectangle\t150 150 100 100"));

        let json = exec(dir.path(), &["show", &doc, "--json"]).unwrap();
        let records: Vec<ShapeRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 1);
        assert!((records[0].x - 150.0).abs() < f64::EPSILON);
        assert_eq!(records[0].document_id, doc);
    }

    #[test]
    fn test_double_tap_never_creates() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());

        let out = exec(dir.path(), &["double-tap", &doc, "200", "200"]).unwrap();
        assert_eq!(out.trim(), "Nothing selected");

        exec(dir.path(), &["tap", &doc, "200", "200"]).unwrap();
        let out = exec(dir.path(), &["double-tap", &doc, "210", "190"]).unwrap();
        assert!(out.starts_with("Selected "));
        let shown = exec(dir.path(), &["show", &doc]).unwrap();
        assert_eq!(shown.lines().filter(|l| l.contains("\trectangle\t")).count(), 1);
        assert!(shown.ends_with("bounds\t150 150 100 100\n"));
    }

    #[test]
    fn test_add_move_remove() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());

        let added = exec(dir.path(), &["add", &doc, "text", "10", "10", "200", "30", "--text", "Hello"]).unwrap();
        let id = added.split('\t').next().unwrap().to_string();
        assert!(added.trim_end().ends_with("\"Hello\""));
        assert!(exec(dir.path(), &["add", &doc, "text", "0", "0", "10", "10"]).is_err());

        let moved = exec(dir.path(), &["move", &doc, &id, "-20", "50", "200", "30"]).unwrap();
        assert!(moved.contains("-20 50 200 30"));

        assert_eq!(exec(dir.path(), &["remove", &doc, &id]).unwrap().trim(), format!("Removed {}", id));
        assert!(exec(dir.path(), &["show", &doc]).unwrap().is_empty());
        assert!(exec(dir.path(), &["remove", &doc, &id]).unwrap().starts_with("No shape"));
    }

    #[test]
    fn test_unknown_document() {
        let dir = tempdir().unwrap();
        let err = exec(dir.path(), &["show", "missing"]).unwrap_err();
        assert!(err.to_string().contains("Document not found"));
    }

    #[test]
    fn test_replay() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());
        let taps = dir.path().join("taps.json");
        std::fs::write(
            &taps,
            r#"[{"x": 100, "y": 100, "atMs": 0}, {"x": 101, "y": 100, "atMs": 100}, {"x": 400, "y": 400, "atMs": 800}]"#,
        )
        .unwrap();

        let out = exec(dir.path(), &["replay", &doc, taps.to_str().unwrap()]).unwrap();
        let shapes: Vec<_> = out.lines().filter(|l| l.contains("\trectangle\t")).collect();
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].contains("350 350 100 100"));
    }

    #[test]
    fn test_export_writes_pdf() {
        let dir = tempdir().unwrap();
        let doc = new_document(dir.path());
        exec(dir.path(), &["tap", &doc, "200", "200"]).unwrap();
        let output = dir.path().join("out.pdf");

        let out = exec(
            dir.path(),
            &["export", &doc, "--output", output.to_str().unwrap(), "--heading", "Hello, PDF!"],
        )
        .unwrap();
        assert!(out.starts_with("Exported to"));
        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
