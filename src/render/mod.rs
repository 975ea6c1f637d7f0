use crate::error::RenderError;
use crate::marcher::{estimate_normal, trace, Renderable, Shape, Trace};
use crate::math::{normalize, v, Ray, O, V3};
use crate::scene::SceneConfig;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Row-major linear RGB samples, row 0 at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    w: u32,
    h: u32,
    buf: Vec<V3>,
}

impl Framebuffer {
    pub fn new(w: u32, h: u32) -> Self {
        Framebuffer {
            w,
            h,
            buf: vec![O; w as usize * h as usize],
        }
    }

    pub fn from_pixels(w: u32, h: u32, buf: Vec<V3>) -> Result<Self, RenderError> {
        let expected = w as usize * h as usize;
        if buf.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Framebuffer { w, h, buf })
    }

    pub fn at(&self, x: u32, y: u32) -> V3 {
        self.buf[(y * self.w + x) as usize]
    }

    pub fn pixels(&self) -> &[V3] {
        &self.buf
    }

    pub fn w(&self) -> u32 {
        self.w
    }
    pub fn h(&self) -> u32 {
        self.h
    }
}

/// Unit direction through the center of pixel `(i, j)` for a camera looking
/// down -z. The y axis is flipped so `j = 0` is the top row.
pub fn camera_direction(i: u32, j: u32, width: u32, height: u32, fov: f64) -> V3 {
    let dir_x = (i as f64 + 0.5) - width as f64 / 2.;
    let dir_y = -(j as f64 + 0.5) + height as f64 / 2.;
    let dir_z = -(height as f64) / (2. * (fov / 2.).tan());
    normalize(&v(dir_x, dir_y, dir_z))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub color: V3,
    /// The hit's gradient vanished and the reversed view direction stood
    /// in for the normal.
    pub degenerate_normal: bool,
}

pub fn render_pixel(scene: &SceneConfig, shape: &Shape, i: u32, j: u32) -> Sample {
    let dir = camera_direction(i, j, scene.width, scene.height, scene.fov);
    let ray = Ray {
        x: scene.camera(),
        d: dir,
    };
    shade_ray(scene, shape, &ray)
}

fn shade_ray(scene: &SceneConfig, r: &impl Renderable, ray: &Ray) -> Sample {
    match trace(r, ray, &scene.trace) {
        Trace::Hit { position, .. } => {
            let (normal, degenerate_normal) = match estimate_normal(r, &position, scene.normal_eps)
            {
                Some(n) => (n, false),
                None => (-ray.d, true),
            };
            Sample {
                color: scene.lighting.shade(&position, &normal),
                degenerate_normal,
            }
        }
        Trace::Miss => Sample {
            color: scene.background,
            degenerate_normal: false,
        },
    }
}

/// Fills one row and returns how many of its pixels needed the fallback
/// normal.
fn render_row(scene: &SceneConfig, shape: &Shape, j: usize, row: &mut [V3]) -> usize {
    let mut degenerate = 0;
    for (i, p) in row.iter_mut().enumerate() {
        let sample = render_pixel(scene, shape, i as u32, j as u32);
        *p = sample.color;
        degenerate += sample.degenerate_normal as usize;
    }
    degenerate
}

fn finish(scene: &SceneConfig, buf: Vec<V3>, degenerate: usize) -> Result<Framebuffer, RenderError> {
    if degenerate > 0 {
        warn!(degenerate, "hit points with a vanishing gradient, used view direction as normal");
    }
    Framebuffer::from_pixels(scene.width, scene.height, buf)
}

/// Renders the scene across `threads` workers, one row per task. `0` picks
/// rayon's default worker count.
pub fn render(scene: &SceneConfig, threads: usize) -> Result<Framebuffer, RenderError> {
    scene.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;
    debug!(
        width = scene.width,
        height = scene.height,
        fov = scene.fov,
        primitive = ?scene.primitive,
        workers = pool.current_num_threads(),
        "rendering"
    );
    info!("calculating rays");

    let shape = scene.shape();
    let width = scene.width as usize;
    let mut buf = vec![O; scene.pixel_count()];
    let degenerate: usize = pool.install(|| {
        buf.par_chunks_mut(width)
            .enumerate()
            .map(|(j, row)| render_row(scene, &shape, j, row))
            .sum()
    });
    finish(scene, buf, degenerate)
}

/// Single-threaded equivalent of [`render`].
pub fn render_serial(scene: &SceneConfig) -> Result<Framebuffer, RenderError> {
    scene.validate()?;
    let shape = scene.shape();
    let width = scene.width as usize;
    let mut buf = vec![O; scene.pixel_count()];
    let degenerate = buf
        .chunks_mut(width)
        .enumerate()
        .map(|(j, row)| render_row(scene, &shape, j, row))
        .sum();
    finish(scene, buf, degenerate)
}
