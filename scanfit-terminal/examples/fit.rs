/// Example: Fit a plane to selected faces of an STL file without a UI
///
/// Usage: cargo run --example fit -- path/to/file.stl 0 1 2 3

use scanfit_core::Viewer;
use std::env;
use std::fs;
use std::io;

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <stl-file> [face-index...]", args[0]);
        return Ok(());
    }

    let data = fs::read(&args[1])?;
    let mut viewer = Viewer::new();
    viewer
        .load_mesh(&data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    let triangles = viewer.mesh().map_or(0, |mesh| mesh.triangle_count());
    println!("Loaded {triangles} triangles");

    for arg in &args[2..] {
        match arg.parse::<usize>() {
            Ok(face) if viewer.select_face(face) => {}
            Ok(face) => eprintln!("Skipping face {face}: out of range or repeated"),
            Err(_) => eprintln!("Skipping {arg}: not a face index"),
        }
    }

    println!("{}", viewer.status_text());

    if let Some(plane) = viewer.fitted_plane() {
        println!("RMS residual: {:.6}", plane.rms_residual);
        if let Some(mesh) = viewer.mesh() {
            for face in viewer.selected_faces() {
                let center = mesh.triangles()[face].center();
                println!("  face {face}: distance {:+.6}", plane.distance_to(&center));
            }
        }
    }

    Ok(())
}
