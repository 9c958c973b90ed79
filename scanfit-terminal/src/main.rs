/// Scanfit Terminal - interactive plane fitting on STL meshes
///
/// Usage: scanfit-terminal [PATH] [--log FILE]
///
/// Without a path a built-in cube is shown. Logging goes to FILE, filtered
/// by `SCANFIT_LOG` (default `info`).
use scanfit_core::{Mesh, Viewer};
use scanfit_terminal::{Config, TerminalApp};
use std::fs::File;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Edge length of the cube shown without a mesh file
const DEFAULT_CUBE_SIZE: f32 = 25.0;

fn main() -> ExitCode {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}\n{}", scanfit_terminal::config::USAGE);
            return ExitCode::from(2);
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("scanfit-terminal: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> io::Result<()> {
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }

    let mut viewer = Viewer::new();
    let title = match &config.mesh_path {
        Some(path) => {
            let data = fs_read(path)?;
            viewer
                .load_mesh(&data)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", path.display())))?;
            path.display().to_string()
        }
        None => {
            viewer.set_mesh(Mesh::cube(DEFAULT_CUBE_SIZE));
            "built-in cube".to_string()
        }
    };

    let mut app = TerminalApp::new(viewer, title)?;
    app.run()?;

    if let Some(eq) = app.viewer().plane_equation() {
        println!("Plane equation: {eq}");
    }
    Ok(())
}

fn fs_read(path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| io::Error::new(e.kind(), format!("failed to read {}: {e}", path.display())))
}

fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env("SCANFIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(log = %path.display(), "logging started");
    Ok(())
}
