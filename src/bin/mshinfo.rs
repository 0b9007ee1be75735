//! Command line tool to inspect Gmsh tetrahedral meshes
//!
//! Reads a Gmsh msh 4.1 ascii file exactly as the simulation geometry would,
//! so any problem with the mesh shows up here first with a useful message.
//!
//! # Usage
//!
//! ```text
//! Usage: mshinfo <file> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default a simple summary of the mesh is printed.
//!
//! ```bash
//! # Print element, node, and media counts with the bounding box
//! mshinfo water.msh
//! ```
//!
//! ### Check the face connectivity
//!
//! Building the neighbour table will catch non-manifold faces and reports how
//! many faces are on the boundary.
//!
//! ```bash
//! # Also build the face-neighbour table
//! mshinfo water.msh --neighbours
//! ```
//!
//! ### Convert to JSON file
//!
//! The assembled mesh can be written out for use in other languages. The
//! neighbour table is included whenever `--neighbours` is also given.
//!
//! ```bash
//! # Output a file named 'water.json'
//! mshinfo water.msh --neighbours --json water.json
//! ```
//!

// standard libraries
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

// crate modules
use tetmesh::mesh::Mesh;
use tetmesh::neighbours::NeighbourTable;
use tetmesh::readers::MshReader;
use tetmesh::utils::*;

// external crates
use anyhow::Result;
use clap::{arg, Parser};
use log::*;
use serde::Serialize;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    // Try to read the mesh, with a progress bar unless told to be quiet
    info!("Reading {}", &cli.file);
    let mut reader = MshReader::new();
    if cli.quiet {
        reader.disable_progress();
    }
    let mesh = reader.parse(Path::new(&cli.file))?;

    // Neighbours are only built on request, large meshes take a moment
    let neighbours = match cli.neighbours {
        true => {
            info!("Building face neighbours");
            Some(mesh.neighbours()?)
        }
        false => None,
    };

    // Log a summary of the mesh to the terminal for reference
    if !cli.quiet {
        print_summary(&mesh, neighbours.as_ref());
    }

    if let Some(path) = &cli.json {
        write_json(&mesh, neighbours.as_ref(), path)?;
    }

    Ok(())
}

/// Inspect Gmsh msh 4.1 tetrahedral meshes
///
/// Reads the mesh the same way the simulation geometry does, summarises
/// what was found, and optionally converts it to JSON.
///
/// Only 4-node tetrahedra in 3D volumes with a physical group are kept,
/// everything else in the file is skipped.
///
/// Examples
/// --------
///
///  Print a summary of the mesh
///     $ mshinfo water.msh
///
///  Check face connectivity
///     $ mshinfo water.msh --neighbours
///
///  Convert to JSON
///     $ mshinfo water.msh --json water.json
///     $ mshinfo water.msh --neighbours --json water.json
///
/// Notes
/// -----
///
/// Binary msh files are not supported. Convert them to ascii in Gmsh first
/// with File > Export, choosing "Version 4 ASCII".
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: mshinfo water.msh --neighbours\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("mshinfo <file> [options]")
)]
struct Cli {
    // * Positional
    /// Path to msh file
    #[arg(name = "file")]
    file: String,

    /// Build the face-neighbour table
    ///
    /// Fails on any face shared by more than two tetrahedra.
    #[arg(help_heading("Mesh options"))]
    #[arg(short, long)]
    neighbours: bool,

    /// Write the mesh to a JSON file
    ///
    /// Includes the neighbour table if --neighbours is also used.
    #[arg(help_heading("Mesh options"))]
    #[arg(short, long)]
    #[arg(value_name = "path")]
    json: Option<String>,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Everything written to the JSON output
#[doc(hidden)]
#[derive(Serialize)]
struct JsonMesh<'a> {
    #[serde(flatten)]
    mesh: &'a Mesh,
    #[serde(skip_serializing_if = "Option::is_none")]
    neighbours: Option<&'a NeighbourTable>,
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    let result = stderrlog::new()
        .modules(vec![
            module_path!(),
            "tetmesh::readers",
            "tetmesh::mesh",
            "tetmesh::neighbours",
        ])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init();

    if let Err(e) = result {
        eprintln!("Unable to initialise logging: {e}");
    }
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Tetmesh :: Msh Inspector");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Helper function for cleaning up file IO boilerplate
fn get_writer(path: &str) -> Result<BufWriter<File>> {
    let file: File = File::create(path)?;
    debug!("New bufwriter for {path}");
    Ok(BufWriter::new(file))
}

#[doc(hidden)]
/// Write the mesh, and neighbours if there are any, to json
fn write_json(mesh: &Mesh, neighbours: Option<&NeighbourTable>, path: &str) -> Result<()> {
    debug!("Writing JSON format to {}", path);
    let writer = get_writer(path)?;
    Ok(serde_json::to_writer_pretty(
        writer,
        &JsonMesh { mesh, neighbours },
    )?)
}

#[doc(hidden)]
/// Write summary to the terminal
fn print_summary(mesh: &Mesh, neighbours: Option<&NeighbourTable>) {
    let mut s = "Summary of mesh file\n".to_string();
    s += &f!("tetrahedra : {}\n", mesh.elements.len());
    s += &f!("nodes      : {}\n", mesh.nodes.len());
    s += &f!("media      : {}\n", mesh.media.len());
    for (medium, (_, n)) in mesh.media.iter().zip(mesh.elements_per_medium()) {
        s += &f!("  - {medium} ({n} tetrahedra)\n");
    }
    if let Some([lo, hi]) = mesh.bounds() {
        s += &f!(
            "bounds     : [{}, {}, {}] -> [{}, {}, {}]\n",
            lo[0].sci(5, 2),
            lo[1].sci(5, 2),
            lo[2].sci(5, 2),
            hi[0].sci(5, 2),
            hi[1].sci(5, 2),
            hi[2].sci(5, 2)
        );
    }
    if let Some(table) = neighbours {
        s += &f!("boundary   : {} faces\n", table.n_boundary_faces());
    }
    println!("{}", s.trim_end())
}
