//! CPU ray-caster for the extruded scene.
//!
//! Every pixel casts one ray against the ground plane and all box instances
//! (slab test), then shades the nearest hit with a key light and distance fog.
//! Rows are rendered in parallel with rayon.

use glam::Vec3;
use rayon::prelude::*;

use crate::codec::color::Rgba;

use super::camera::{ray_box, CameraParams};
use super::extruded::BoxInstance;

/// Everything the ray-caster needs besides the camera.
pub struct RasterScene<'a> {
    pub instances: &'a [BoxInstance],
    /// Side of the map square centered on the origin.
    pub extent: f32,
    pub background: Rgba,
    pub ground: Rgba,
    /// Hovered instance and how far to lighten it.
    pub highlight: Option<(usize, f32)>,
}

enum Hit {
    Box { index: usize, t: f32 },
    Ground { t: f32 },
}

/// Render to a tightly packed RGBA8 buffer of `width × height` pixels.
pub fn render_scene(scene: &RasterScene<'_>, camera: &CameraParams, width: usize, height: usize) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 || height == 0 {
        return pixels;
    }

    let cam = camera.camera();
    let light_dir = Vec3::new(0.5, 0.8, 0.3).normalize();
    let ambient = 0.35_f32;
    let background = rgb(scene.background);
    let ground = rgb(scene.ground);
    let half = scene.extent * 0.5;
    let fog_start = scene.extent * 1.2;
    let fog_end = scene.extent * 3.5;
    let (w, h) = (width as f32, height as f32);
    let row_size = width * 4;

    pixels
        .par_chunks_exact_mut(row_size)
        .enumerate()
        .for_each(|(py, row_buf)| {
            for px in 0..width {
                let dir = cam.ray_through_pixel(px as f32 + 0.5, py as f32 + 0.5, w, h);
                let col = match nearest_hit(scene, cam.origin, dir, half) {
                    None => sky(dir, background),
                    Some(hit) => {
                        let (base, normal, t) = match hit {
                            Hit::Ground { t } => (ground, Vec3::Y, t),
                            Hit::Box { index, t } => {
                                let b = &scene.instances[index];
                                let mut color = Rgba {
                                    r: (b.color[0] * 255.0) as u8,
                                    g: (b.color[1] * 255.0) as u8,
                                    b: (b.color[2] * 255.0) as u8,
                                    a: 255,
                                };
                                if let Some((hovered, amount)) = scene.highlight {
                                    if hovered == index {
                                        color = color.lighten(amount);
                                    }
                                }
                                (rgb(color), box_normal(b, cam.origin + dir * t), t)
                            }
                        };
                        let diffuse = normal.dot(light_dir).max(0.0);
                        let lit = base * (ambient + (1.0 - ambient) * diffuse);
                        let fog = ((t - fog_start) / (fog_end - fog_start)).clamp(0.0, 1.0);
                        lit * (1.0 - fog) + background * fog
                    }
                };

                let idx = px * 4;
                row_buf[idx] = (col.x.clamp(0.0, 1.0) * 255.0) as u8;
                row_buf[idx + 1] = (col.y.clamp(0.0, 1.0) * 255.0) as u8;
                row_buf[idx + 2] = (col.z.clamp(0.0, 1.0) * 255.0) as u8;
                row_buf[idx + 3] = 255;
            }
        });

    pixels
}

fn nearest_hit(scene: &RasterScene<'_>, origin: Vec3, dir: Vec3, half: f32) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    let mut best_t = f32::INFINITY;

    for (index, b) in scene.instances.iter().enumerate() {
        if let Some(t) = ray_box(origin, dir, b.min(), b.max()) {
            if t < best_t {
                best_t = t;
                best = Some(Hit::Box { index, t });
            }
        }
    }

    // ground plane y = 0, limited to the map square
    if dir.y < 0.0 {
        let t = -origin.y / dir.y;
        let p = origin + dir * t;
        if t > 0.0 && t < best_t && p.x.abs() <= half && p.z.abs() <= half {
            best = Some(Hit::Ground { t });
        }
    }

    best
}

/// Face normal of the box face containing `p`.
fn box_normal(b: &BoxInstance, p: Vec3) -> Vec3 {
    let local = (p - Vec3::from(b.center)) / (Vec3::from(b.scale) * 0.5).max(Vec3::splat(1e-6));
    let a = local.abs();
    if a.x >= a.y && a.x >= a.z {
        Vec3::new(local.x.signum(), 0.0, 0.0)
    } else if a.y >= a.z {
        Vec3::new(0.0, local.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, local.z.signum())
    }
}

fn rgb(c: Rgba) -> Vec3 {
    let [r, g, b, _] = c.to_f32();
    Vec3::new(r, g, b)
}

fn sky(dir: Vec3, bg: Vec3) -> Vec3 {
    let t = (dir.y * 0.5 + 0.5).clamp(0.0, 1.0);
    let zenith = Vec3::new((bg.x * 0.5).min(0.4), (bg.y * 0.6).min(0.5), (bg.z * 0.8).min(0.9));
    bg * (1.0 - t) + zenith * t
}
