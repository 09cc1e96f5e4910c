// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builds a small floor plan and reports what the kernel produced.
//!
//! A T-junction of three walls (one with a window), a slab under them, then
//! a width change and an endpoint move to exercise the update paths.
//!
//! Configuration is read from `BIM_*` environment variables and logging is
//! controlled with `RUST_LOG`.

use bim_editor_kernel::{KernelConfig, Result, Slabs, Walls};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info,bim_editor_kernel=debug".into()))
        .init();

    let config = KernelConfig::from_env();
    tracing::info!(
        buffer_increase = config.buffer_increase,
        precision = config.precision,
        wall_height = config.wall_height,
        wall_width = config.wall_width,
        slab_height = config.slab_height,
        "Starting wall demo"
    );

    if let Err(err) = run(&config) {
        tracing::error!(%err, "Wall demo failed");
        std::process::exit(1);
    }
}

fn run(config: &KernelConfig) -> Result<()> {
    let mut walls = Walls::with_config(config);

    let points = walls.add_points(&[[-4.0, 0.0, 0.0], [0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 0.0, 4.0]]);
    let main = walls.add(&points[..3], None, 0.0)?;
    let branch = walls.add(&[points[1], points[3]], None, 0.0)?;

    // Window in the first wall, on the side of its p1 → p4 edge.
    let side = config.wall_width / 2.0;
    let window = walls.add_hole_points(&[[-3.0, 1.0, side], [-2.0, 1.0, side], [-2.0, 2.0, side], [-3.0, 2.0, side]]);
    walls.add_hole(main[0], &[window])?;
    walls.regenerate(&main[..1])?;

    report_walls(&walls);

    walls.set_width(&branch, config.wall_width * 2.0)?;
    walls.set_point(points[3], [1.0, 0.0, 5.0])?;
    tracing::info!("Edited branch wall");
    report_walls(&walls);

    let mut slabs = Slabs::with_config(config);
    let corners = slabs.add_points(&[[-5.0, 0.0, -1.0], [5.0, 0.0, -1.0], [5.0, 0.0, 6.0], [-5.0, 0.0, 6.0]]);
    let outline = slabs.add_polyline(&corners)?;
    let slab = slabs.add(&[outline], None)?;
    tracing::info!(
        slab,
        faces = slabs.extrusions.faces.len(),
        triangles = slabs.extrusions.faces.triangle_count(),
        "Created slab"
    );

    Ok(())
}

fn report_walls(walls: &Walls) {
    let faces = &walls.extrusions.faces;
    tracing::info!(
        walls = walls.len(),
        knots = walls.knots().len(),
        faces = faces.len(),
        triangles = faces.triangle_count(),
        vertices = faces.vertices.len(),
        capacity = faces.vertices.buffers().capacity(),
        "Wall geometry"
    );
}
