// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Derived transforms per configured canvas, as data and as text.

use std::io::{self, Write};
use std::sync::Arc;

use parallax_config::Configured;
use parallax_math::{rad_to_deg, Mat4, Vec3};
use parallax_view::host::read;
use parallax_view::{AutoUpdate, CanvasId, InfoRegistry, Stereo, ViewInfo, ViewResult};
use serde::Serialize;

/// Everything `inspect` prints for one canvas.
#[derive(Debug, Serialize)]
pub struct CanvasReport {
    /// View name in the configuration.
    pub view: String,
    /// Screen name in the configuration.
    pub screen: String,
    /// Canvas id assigned at build time.
    pub canvas: CanvasId,
    /// Derived values, or why they could not be derived.
    pub outcome: Outcome,
}

/// Result of deriving one canvas.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every requested value.
    Derived(Box<Transforms>),
    /// The view error, rendered.
    Error(String),
}

/// Physical and projection values of one canvas.
#[derive(Debug, Serialize)]
pub struct Transforms {
    pub coexistence_to_image_plate: Stereo<Mat4>,
    pub eye_in_image_plate: Stereo<Vec3>,
    pub eye_to_image_plate: Stereo<Mat4>,
    pub projection: Stereo<Mat4>,
    pub front_clip_distance: Stereo<f64>,
    pub back_clip_distance: Stereo<f64>,
    pub physical_to_virtual_scale: f64,
    /// Horizontal field of view of the view, in degrees.
    pub field_of_view_degrees: f64,
    /// Present with `--world`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world: Option<WorldTransforms>,
}

/// Values that need the rig transform.
#[derive(Debug, Serialize)]
pub struct WorldTransforms {
    pub view_platform_to_world: Mat4,
    pub image_plate_to_world: Stereo<Mat4>,
    pub eye_to_world: Stereo<Mat4>,
    pub inverse_world_projection: Stereo<Mat4>,
}

fn derive(info: &mut ViewInfo, canvas: CanvasId, field_of_view: f64, world: bool) -> ViewResult<Transforms> {
    let world = if world {
        Some(WorldTransforms {
            view_platform_to_world: info.view_platform_to_world()?,
            image_plate_to_world: info.image_plate_to_world(canvas)?,
            eye_to_world: info.eye_to_world(canvas)?,
            inverse_world_projection: info.inverse_world_projection(canvas)?,
        })
    } else {
        None
    };
    Ok(Transforms {
        coexistence_to_image_plate: info.coexistence_to_image_plate(canvas)?,
        eye_in_image_plate: info.eye_in_image_plate(canvas)?,
        eye_to_image_plate: info.eye_to_image_plate(canvas)?,
        projection: info.projection(canvas)?,
        front_clip_distance: info.physical_front_clip_distance(canvas)?,
        back_clip_distance: info.physical_back_clip_distance(canvas)?,
        physical_to_virtual_scale: info.physical_to_virtual_scale(canvas)?,
        field_of_view_degrees: rad_to_deg(field_of_view),
        world,
    })
}

/// Derives every canvas of every configured view.
pub fn inspect(configured: &Configured, world: bool) -> Vec<CanvasReport> {
    let registry = Arc::new(InfoRegistry::new());
    let mut infos = configured.view_infos(&registry, AutoUpdate::ALL);
    let mut reports = Vec::new();
    for (view, (_, info)) in configured.views.iter().zip(infos.iter_mut()) {
        let field_of_view = read(&view.view).field_of_view;
        for (screen, canvas) in &view.canvases {
            let id = read(canvas).id;
            let outcome = match derive(info, id, field_of_view, world) {
                Ok(t) => Outcome::Derived(Box::new(t)),
                Err(err) => {
                    tracing::warn!(view = %view.name, canvas = %id, error = %err, "derivation failed");
                    Outcome::Error(err.to_string())
                }
            };
            reports.push(CanvasReport {
                view: view.name.clone(),
                screen: screen.clone(),
                canvas: id,
                outcome,
            });
        }
    }
    reports
}

fn write_matrix(out: &mut impl Write, label: &str, m: &Mat4) -> io::Result<()> {
    writeln!(out, "  {label}:")?;
    for row in m.to_rows() {
        writeln!(
            out,
            "    [{:>10.5} {:>10.5} {:>10.5} {:>10.5}]",
            row[0], row[1], row[2], row[3]
        )?;
    }
    Ok(())
}

fn write_pair(out: &mut impl Write, label: &str, pair: &Stereo<Mat4>) -> io::Result<()> {
    match &pair.right {
        None => write_matrix(out, label, &pair.left),
        Some(right) => {
            write_matrix(out, &format!("{label} (left)"), &pair.left)?;
            write_matrix(out, &format!("{label} (right)"), right)
        }
    }
}

/// Human-readable rendering of `reports`.
pub fn write_text(out: &mut impl Write, reports: &[CanvasReport]) -> io::Result<()> {
    for report in reports {
        writeln!(
            out,
            "{} / {} ({})",
            report.view, report.screen, report.canvas
        )?;
        let t = match &report.outcome {
            Outcome::Error(message) => {
                writeln!(out, "  error: {message}")?;
                continue;
            }
            Outcome::Derived(t) => t,
        };
        let eye = t.eye_in_image_plate.left;
        writeln!(out, "  eye in image plate: ({:.5}, {:.5}, {:.5})", eye.x, eye.y, eye.z)?;
        if let Some(right) = t.eye_in_image_plate.right {
            writeln!(
                out,
                "  right eye in image plate: ({:.5}, {:.5}, {:.5})",
                right.x, right.y, right.z
            )?;
        }
        writeln!(
            out,
            "  clip distances: front {:.5} m, back {:.5} m",
            t.front_clip_distance.left, t.back_clip_distance.left
        )?;
        if let (Some(front), Some(back)) = (t.front_clip_distance.right, t.back_clip_distance.right) {
            writeln!(out, "  right clip distances: front {front:.5} m, back {back:.5} m")?;
        }
        writeln!(out, "  physical to virtual scale: {:.5}", t.physical_to_virtual_scale)?;
        writeln!(out, "  field of view: {:.2} deg", t.field_of_view_degrees)?;
        write_pair(out, "coexistence to image plate", &t.coexistence_to_image_plate)?;
        write_pair(out, "eye to image plate", &t.eye_to_image_plate)?;
        write_pair(out, "projection", &t.projection)?;
        if let Some(w) = &t.world {
            write_matrix(out, "view platform to world", &w.view_platform_to_world)?;
            write_pair(out, "image plate to world", &w.image_plate_to_world)?;
            write_pair(out, "eye to world", &w.eye_to_world)?;
            write_pair(out, "inverse world projection", &w.inverse_world_projection)?;
        }
    }
    Ok(())
}
