//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

/// Sketch rectangles, circles and text on a canvas document.
#[derive(Parser, Debug)]
#[command(name = "sketchpad", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding document files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Editor configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List documents, newest first
    List,
    /// Create an empty document
    New,
    /// Delete a document and all of its shapes
    Delete { document: String },
    /// Print the shapes of a document in drawing order
    Show {
        document: String,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Single tap: place a default rectangle centered on the point
    #[command(allow_negative_numbers = true)]
    Tap { document: String, x: f64, y: f64 },
    /// Double tap: toggle selection of the shape under the point
    #[command(allow_negative_numbers = true)]
    DoubleTap { document: String, x: f64, y: f64 },
    /// Add a shape with an explicit frame
    #[command(allow_negative_numbers = true)]
    Add {
        document: String,
        #[arg(value_enum)]
        kind: KindArg,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// Content of a text shape
        #[arg(long)]
        text: Option<String>,
    },
    /// Move a shape to a new frame
    #[command(allow_negative_numbers = true)]
    Move {
        document: String,
        id: Uuid,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Remove a shape
    Remove { document: String, id: Uuid },
    /// Feed timed raw taps from a JSON file through the tap arbiter
    Replay { document: String, taps: PathBuf },
    /// Export a document as a single-page PDF
    Export {
        document: String,
        /// Output file
        #[arg(short, long, default_value = "canvas.pdf")]
        output: PathBuf,
        /// Heading line drawn at the top of the page
        #[arg(long)]
        heading: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Rectangle,
    Circle,
    Text,
}
