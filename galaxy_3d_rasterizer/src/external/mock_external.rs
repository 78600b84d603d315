/// Mock collaborators for unit tests: canvas, shader library, ray caster

use std::sync::{Arc, Mutex};
use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::graphics_device::{HdrPrecision, PixelRect};
use super::{
    Canvas, ShaderLibrary, ProgramHandle, UniformLocation, UniformValue,
    BuiltinProgram, AttachedInterface, RayCaster, RayHit,
};

// ============================================================================
// Mock Canvas
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MockCanvas {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub hdr: HdrPrecision,
    pub viewport: PixelRect,
}

impl MockCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: 0,
            hdr: HdrPrecision::None,
            viewport: PixelRect::from_size(width, height),
        }
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }
}

impl Canvas for MockCanvas {
    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }
    fn samples(&self) -> u32 { self.samples }
    fn hdr(&self) -> HdrPrecision { self.hdr }
    fn viewport(&self) -> PixelRect { self.viewport }
}

// ============================================================================
// Mock Shader Library
// ============================================================================

/// Inspectable state of a `MockShaderLibrary`
#[derive(Default)]
pub struct MockShaderState {
    /// Programs that `builtin_program` refuses to hand out
    pub unavailable: FxHashSet<BuiltinProgram>,
    /// Currently bound program
    pub bound: Option<ProgramHandle>,
    pub bind_count: usize,
    /// Number of `uniform_location` calls
    pub location_lookups: usize,
    /// (program, uniform name, value) in call order
    pub uniforms: Vec<(ProgramHandle, String, UniformValue)>,
    /// Uniform names by location
    pub location_names: Vec<String>,
    pub interfaces: FxHashMap<ProgramHandle, AttachedInterface>,
}

impl MockShaderState {
    /// Last value written to the uniform `name`
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.iter().rev().find(|(_, n, _)| n == name).map(|(_, _, v)| *v)
    }
}

#[derive(Default)]
pub struct MockShaderLibrary {
    pub state: Arc<Mutex<MockShaderState>>,
}

impl MockShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library on which `kind` is unavailable
    pub fn without(kind: BuiltinProgram) -> Self {
        let library = Self::default();
        library.state.lock().unwrap().unavailable.insert(kind);
        library
    }

    pub fn program_of(kind: BuiltinProgram) -> ProgramHandle {
        ProgramHandle(match kind {
            BuiltinProgram::DrawFrameBuffer => 1,
            BuiltinProgram::StereoStipple => 2,
            BuiltinProgram::StereoAnaglyph => 3,
            BuiltinProgram::SeparableGaussianBlur => 4,
        })
    }
}

impl ShaderLibrary for MockShaderLibrary {
    fn builtin_program(&mut self, kind: BuiltinProgram) -> Option<ProgramHandle> {
        if self.state.lock().unwrap().unavailable.contains(&kind) {
            return None;
        }
        Some(Self::program_of(kind))
    }

    fn bind(&mut self, program: ProgramHandle) {
        let mut state = self.state.lock().unwrap();
        state.bound = Some(program);
        state.bind_count += 1;
    }

    fn unbind(&mut self) {
        self.state.lock().unwrap().bound = None;
    }

    fn uniform_location(&self, _program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.lock().unwrap();
        state.location_lookups += 1;
        let index = match state.location_names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                state.location_names.push(name.to_string());
                state.location_names.len() - 1
            }
        };
        Some(UniformLocation(index as i32))
    }

    fn set_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.lock().unwrap();
        let name = state.location_names[location.0 as usize].clone();
        state.uniforms.push((program, name, value));
    }

    fn attached_interface(&self, program: ProgramHandle) -> Option<AttachedInterface> {
        self.state.lock().unwrap().interfaces.get(&program).cloned()
    }

    fn set_attached_interface(&mut self, program: ProgramHandle, data: AttachedInterface) {
        self.state.lock().unwrap().interfaces.insert(program, data);
    }
}

// ============================================================================
// Mock Ray Caster
// ============================================================================

/// Reports a fixed list of hits in order; records the cast rays
#[derive(Default)]
pub struct MockRayCaster {
    pub hits: Vec<RayHit>,
    pub rays: Mutex<Vec<(Vec3, Vec3)>>,
}

impl MockRayCaster {
    pub fn with_hits(hits: Vec<RayHit>) -> Self {
        Self { hits, rays: Mutex::new(Vec::new()) }
    }
}

impl RayCaster for MockRayCaster {
    fn ray_test(&self, from: Vec3, to: Vec3, callback: &mut dyn FnMut(&RayHit) -> bool) -> bool {
        self.rays.lock().unwrap().push((from, to));
        self.hits.iter().any(|hit| callback(hit))
    }
}
