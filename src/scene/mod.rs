use crate::error::RenderError;
use crate::marcher::{Lighting, Shape, TiledBox, TiledSphere, TraceParams};
use crate::math::{v, V3};
use serde::Deserialize;
use std::f64::consts::PI;
use std::path::Path;

/// Which primitive a render traces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Sphere,
    #[default]
    Box,
}

/// Everything a render needs. Immutable once built; the defaults reproduce
/// the reference scene.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in radians.
    pub fov: f64,
    pub primitive: Primitive,
    pub sphere: TiledSphere,
    #[serde(rename = "box")]
    pub cube: TiledBox,
    pub sphere_camera: V3,
    pub box_camera: V3,
    pub trace: TraceParams,
    pub normal_eps: f64,
    pub lighting: Lighting,
    pub background: V3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            width: 640,
            height: 480,
            fov: PI / 3.,
            primitive: Primitive::Box,
            sphere: TiledSphere::default(),
            cube: TiledBox::default(),
            sphere_camera: v(1., 1., 3.),
            box_camera: v(0.5, 0.5, 3.),
            trace: TraceParams::default(),
            normal_eps: 0.1,
            lighting: Lighting::default(),
            background: v(0.2, 0.7, 0.8),
        }
    }
}

impl SceneConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, RenderError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.fov > 0. && self.fov < PI) {
            return Err(RenderError::InvalidFov(self.fov));
        }
        Ok(())
    }

    pub fn shape(&self) -> Shape {
        match self.primitive {
            Primitive::Sphere => Shape::Sphere(self.sphere),
            Primitive::Box => Shape::Box(self.cube),
        }
    }

    /// Camera position for the selected primitive. The camera always looks
    /// down -z.
    pub fn camera(&self) -> V3 {
        match self.primitive {
            Primitive::Sphere => self.sphere_camera,
            Primitive::Box => self.box_camera,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
