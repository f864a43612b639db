//! CubeStore Demo Binary
//!
//! Stores three documents along the cube diagonal, prints the cube, deletes
//! the middle document and prints the cube again.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use cubestore::{Config, Coord, CubeStore, DisplayDocument, Document, Layout, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// CubeStore Demo
#[derive(Parser, Debug)]
#[command(name = "cubestore-demo")]
#[command(about = "Walk through put/get/delete on a document cube")]
#[command(version)]
struct Args {
    /// Backing file
    #[arg(short, long, default_value = "document_cube.bin")]
    path: PathBuf,

    /// Cells per axis (at least 3, so the three diagonal cells are distinct)
    #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u32).range(3..))]
    dimension: u32,

    /// File layout
    #[arg(short, long, value_enum, default_value = "strided")]
    layout: LayoutArg,

    /// Keep the backing file after the run
    #[arg(short, long)]
    keep: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    Strided,
    Indexed,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Strided => Layout::Strided,
            LayoutArg::Indexed => Layout::Indexed,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,cubestore=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("CubeStore Demo v{}", cubestore::VERSION);

    let result = run(&args);

    if !args.keep {
        if let Err(e) = std::fs::remove_file(&args.path) {
            tracing::warn!("Failed to remove {}: {}", args.path.display(), e);
        }
    }

    if let Err(e) = result {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> cubestore::Result<()> {
    let config = Config::builder()
        .path(&args.path)
        .dimension(args.dimension)
        .layout(args.layout.into())
        .build();

    let mut store = CubeStore::open(config)?;
    let last = i64::from(args.dimension) - 1;
    let middle = last / 2;

    let people = [
        (Coord::new(0, 0, 0), person("John", 25, "New York", "Male")),
        (
            Coord::new(middle, middle, middle),
            person("Jane", 30, "San Francisco", "Female"),
        ),
        (Coord::new(last, last, last), person("Bob", 25, "New York", "Male")),
    ];

    for (coord, document) in &people {
        store.put(*coord, document)?;
    }

    println!("Cube Contents (Before Deletion):");
    print_cube(&mut store)?;

    store.delete(Coord::new(middle, middle, middle))?;

    println!("\nCube Contents (After Deletion):");
    print_cube(&mut store)?;

    store.close()
}

fn person(name: &str, age: i64, city: &str, gender: &str) -> Document {
    Document::from([
        ("name".to_string(), Value::from(name)),
        ("age".to_string(), Value::from(age)),
        ("city".to_string(), Value::from(city)),
        ("gender".to_string(), Value::from(gender)),
    ])
}

fn print_cube(store: &mut CubeStore) -> cubestore::Result<()> {
    for (coord, document) in store.scan()? {
        println!("{}: {}", coord, DisplayDocument(&document));
    }
    Ok(())
}
