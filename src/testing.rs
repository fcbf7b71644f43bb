//! Test doubles: a recording [`GlApi`] backend and a per-thread log capture.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::Once,
};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::gl::{self, GlApi};

/// Uniform and attribute locations handed out by [`RecordingGl`].
const ATTRIBUTES: [(&str, u32); 2] = [("a_position", 0), ("a_tex_coords", 1)];
const UNIFORMS: [(&str, u32); 3] = [("u_start", 10), ("u_end", 11), ("u_texture", 12)];

/// Snapshot of the state relevant to one `draw_elements` call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawCall {
    pub mode: u32,
    pub count: i32,
    pub element_type: u32,
    pub program: Option<u32>,
    pub framebuffer: Option<u32>,
    pub viewport: [i32; 4],
    /// Scissor box, if the scissor test was enabled.
    pub scissor: Option<[i32; 4]>,
    pub element_buffer: Option<u32>,
    pub vertex_array: Option<u32>,
    /// Attribute index -> buffer it was pointed at.
    pub attrib_buffers: BTreeMap<u32, u32>,
    pub enabled_attribs: BTreeSet<u32>,
    pub active_texture: u32,
    pub texture_unit0: Option<u32>,
    /// Uniform location -> last `vec2` value for the current program.
    pub uniforms: BTreeMap<u32, [f32; 2]>,
}

#[derive(Default)]
struct State {
    next_name: u32,

    shaders: HashMap<u32, u32>,
    programs: BTreeSet<u32>,
    buffers: BTreeSet<u32>,
    textures: BTreeSet<u32>,
    vertex_arrays: BTreeSet<u32>,

    deleted_programs: Vec<u32>,
    deleted_buffers: Vec<u32>,
    deleted_textures: Vec<u32>,
    deleted_vertex_arrays: Vec<u32>,
    detached: Vec<(u32, u32)>,

    array_buffer: Option<u32>,
    element_buffer: Option<u32>,
    buffer_data: HashMap<u32, (Vec<u8>, u32)>,
    attrib_buffers: BTreeMap<u32, u32>,
    enabled_attribs: BTreeSet<u32>,
    vertex_array: Option<u32>,

    program: Option<u32>,
    uniforms_f2: HashMap<(u32, u32), [f32; 2]>,
    uniforms_i: HashMap<(u32, u32), i32>,

    active_texture: u32,
    texture_units: HashMap<u32, Option<u32>>,
    tex_params: HashMap<(u32, u32), i32>,
    tex_images: HashMap<u32, (i32, i32, usize)>,
    mipmapped: BTreeSet<u32>,

    framebuffer: Option<u32>,
    viewport: [i32; 4],
    scissor: [i32; 4],
    capabilities: BTreeSet<u32>,
    clear_color: [f32; 4],
    clears: Vec<u32>,

    draws: Vec<DrawCall>,
    errors: VecDeque<u32>,

    failing_stage: Option<u32>,
    failing_link: bool,
    hidden_names: BTreeSet<String>,
    buffer_budget: Option<usize>,
    core_profile: bool,
}

impl State {
    fn name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }
}

/// An in-memory GL context that records what the renderer does to it.
///
/// Object names are small integers starting at 1. Attribute and uniform
/// locations are fixed per name; see [`RecordingGl::hide_name`] to make one
/// inactive.
pub(crate) struct RecordingGl {
    state: RefCell<State>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                active_texture: gl::TEXTURE0,
                ..State::default()
            }),
        }
    }

    /// Queue an error for the next `get_error` calls.
    pub fn push_error(&self, code: u32) {
        self.state.borrow_mut().errors.push_back(code);
    }

    pub fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }

    /// Make compilation of the given shader type fail.
    pub fn fail_compile(&self, shader_type: u32) {
        self.state.borrow_mut().failing_stage = Some(shader_type);
    }

    pub fn fail_link(&self) {
        self.state.borrow_mut().failing_link = true;
    }

    /// Report an attribute or uniform as inactive.
    pub fn hide_name(&self, name: &str) {
        self.state.borrow_mut().hidden_names.insert(name.to_owned());
    }

    /// Reject `ELEMENT_ARRAY_BUFFER` bindings made with no vertex array
    /// bound, as a strict core profile does.
    pub fn require_vertex_array(&self) {
        self.state.borrow_mut().core_profile = true;
    }

    /// Let only `count` more buffers be created.
    pub fn limit_buffers(&self, count: usize) {
        self.state.borrow_mut().buffer_budget = Some(count);
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn live_buffers(&self) -> Vec<u32> {
        self.state.borrow().buffers.iter().copied().collect()
    }

    pub fn deleted_buffers(&self) -> Vec<u32> {
        self.state.borrow().deleted_buffers.clone()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn deleted_programs(&self) -> usize {
        self.state.borrow().deleted_programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn detached_shaders(&self) -> usize {
        self.state.borrow().detached.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn deleted_vertex_arrays(&self) -> usize {
        self.state.borrow().deleted_vertex_arrays.len()
    }

    pub fn live_textures(&self) -> Vec<u32> {
        self.state.borrow().textures.iter().copied().collect()
    }

    pub fn deleted_textures(&self) -> Vec<u32> {
        self.state.borrow().deleted_textures.clone()
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<(Vec<u8>, u32)> {
        self.state.borrow().buffer_data.get(&buffer).cloned()
    }

    pub fn array_buffer_binding(&self) -> Option<u32> {
        self.state.borrow().array_buffer
    }

    pub fn element_buffer_binding(&self) -> Option<u32> {
        self.state.borrow().element_buffer
    }

    pub fn vertex_array_binding(&self) -> Option<u32> {
        self.state.borrow().vertex_array
    }

    pub fn texture_binding(&self) -> Option<u32> {
        let state = self.state.borrow();
        state
            .texture_units
            .get(&state.active_texture)
            .copied()
            .flatten()
    }

    pub fn active_texture(&self) -> u32 {
        self.state.borrow().active_texture
    }

    pub fn is_enabled(&self, capability: u32) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    /// Force a capability on, as an application might leave it.
    pub fn set_enabled(&self, capability: u32) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    pub fn framebuffer_binding(&self) -> Option<u32> {
        self.state.borrow().framebuffer
    }

    pub fn viewport_box(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn clears(&self) -> Vec<u32> {
        self.state.borrow().clears.clone()
    }

    pub fn uniform_i32(&self, program: u32, location: u32) -> Option<i32> {
        self.state
            .borrow()
            .uniforms_i
            .get(&(program, location))
            .copied()
    }

    pub fn tex_parameter(&self, texture: u32, parameter: u32) -> Option<i32> {
        self.state
            .borrow()
            .tex_params
            .get(&(texture, parameter))
            .copied()
    }

    /// `(width, height, byte length)` of a texture's level-0 image.
    pub fn tex_image(&self, texture: u32) -> Option<(i32, i32, usize)> {
        self.state.borrow().tex_images.get(&texture).copied()
    }

    pub fn is_mipmapped(&self, texture: u32) -> bool {
        self.state.borrow().mipmapped.contains(&texture)
    }

    fn bound_texture(state: &State) -> Option<u32> {
        state
            .texture_units
            .get(&state.active_texture)
            .copied()
            .flatten()
    }
}

fn lookup(table: &[(&str, u32)], hidden: &BTreeSet<String>, name: &str) -> Option<u32> {
    if hidden.contains(name) {
        return None;
    }
    table.iter().find(|(n, _)| *n == name).map(|&(_, loc)| loc)
}

impl GlApi for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn texture_from_raw(&self, raw: u64) -> Option<u32> {
        u32::try_from(raw).ok().filter(|&name| name != 0)
    }

    fn texture_to_raw(&self, texture: u32) -> u64 {
        u64::from(texture)
    }

    fn framebuffer_from_raw(&self, raw: u64) -> Option<u32> {
        u32::try_from(raw).ok().filter(|&name| name != 0)
    }

    unsafe fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let name = state.name();
        state.shaders.insert(name, shader_type);
        Ok(name)
    }

    unsafe fn shader_source(&self, _shader: u32, _source: &str) {}

    unsafe fn compile_shader(&self, _shader: u32) {}

    unsafe fn get_shader_compile_status(&self, shader: u32) -> bool {
        let state = self.state.borrow();
        state.failing_stage.is_none() || state.shaders.get(&shader) != state.failing_stage.as_ref()
    }

    unsafe fn get_shader_info_log(&self, shader: u32) -> String {
        format!("0:1(1): error: syntax error in shader {shader}")
    }

    unsafe fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    unsafe fn create_program(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let name = state.name();
        state.programs.insert(name);
        Ok(name)
    }

    unsafe fn attach_shader(&self, _program: u32, _shader: u32) {}

    unsafe fn detach_shader(&self, program: u32, shader: u32) {
        self.state.borrow_mut().detached.push((program, shader));
    }

    unsafe fn link_program(&self, _program: u32) {}

    unsafe fn get_program_link_status(&self, _program: u32) -> bool {
        !self.state.borrow().failing_link
    }

    unsafe fn get_program_info_log(&self, _program: u32) -> String {
        "error: vertex output `v_tex_coords` not read by fragment shader".to_owned()
    }

    unsafe fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.deleted_programs.push(program);
    }

    unsafe fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().program = program;
    }

    unsafe fn get_attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        lookup(&ATTRIBUTES, &self.state.borrow().hidden_names, name)
    }

    unsafe fn get_uniform_location(&self, _program: u32, name: &str) -> Option<u32> {
        lookup(&UNIFORMS, &self.state.borrow().hidden_names, name)
    }

    unsafe fn uniform_1_i32(&self, location: Option<&u32>, x: i32) {
        let mut state = self.state.borrow_mut();
        if let (Some(program), Some(&location)) = (state.program, location) {
            state.uniforms_i.insert((program, location), x);
        }
    }

    unsafe fn uniform_2_f32(&self, location: Option<&u32>, x: f32, y: f32) {
        let mut state = self.state.borrow_mut();
        if let (Some(program), Some(&location)) = (state.program, location) {
            state.uniforms_f2.insert((program, location), [x, y]);
        }
    }

    unsafe fn create_buffer(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        if let Some(budget) = state.buffer_budget.as_mut() {
            if *budget == 0 {
                return Err("out of buffer names".to_owned());
            }
            *budget -= 1;
        }
        let name = state.name();
        state.buffers.insert(name);
        Ok(name)
    }

    unsafe fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        assert!(state.buffers.remove(&buffer), "double delete of buffer {buffer}");
        state.deleted_buffers.push(buffer);
        state.buffer_data.remove(&buffer);
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match target {
            gl::ARRAY_BUFFER => state.array_buffer = buffer,
            gl::ELEMENT_ARRAY_BUFFER if state.core_profile && state.vertex_array.is_none() => {
                state.errors.push_back(gl::INVALID_OPERATION);
            }
            gl::ELEMENT_ARRAY_BUFFER => state.element_buffer = buffer,
            _ => state.errors.push_back(gl::INVALID_ENUM),
        }
    }

    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        let mut state = self.state.borrow_mut();
        let bound = match target {
            gl::ARRAY_BUFFER => state.array_buffer,
            gl::ELEMENT_ARRAY_BUFFER => state.element_buffer,
            _ => None,
        };
        match bound {
            Some(buffer) => {
                state.buffer_data.insert(buffer, (data.to_vec(), usage));
            }
            None => state.errors.push_back(gl::INVALID_OPERATION),
        }
    }

    unsafe fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        _size: i32,
        _data_type: u32,
        _normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
        let mut state = self.state.borrow_mut();
        match state.array_buffer {
            Some(buffer) => {
                state.attrib_buffers.insert(index, buffer);
            }
            None => state.errors.push_back(gl::INVALID_OPERATION),
        }
    }

    unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        self.state.borrow_mut().enabled_attribs.insert(index);
    }

    unsafe fn create_vertex_array(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let name = state.name();
        state.vertex_arrays.insert(name);
        Ok(name)
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.state.borrow_mut().vertex_array = vertex_array;
    }

    unsafe fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        state.deleted_vertex_arrays.push(vertex_array);
    }

    unsafe fn create_texture(&self) -> Result<u32, String> {
        let mut state = self.state.borrow_mut();
        let name = state.name();
        state.textures.insert(name);
        Ok(name)
    }

    unsafe fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.deleted_textures.push(texture);
    }

    unsafe fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_texture = unit;
    }

    unsafe fn bind_texture(&self, _target: u32, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_texture;
        state.texture_units.insert(unit, texture);
    }

    unsafe fn tex_parameter_i32(&self, _target: u32, parameter: u32, value: i32) {
        let mut state = self.state.borrow_mut();
        match Self::bound_texture(&state) {
            Some(texture) => {
                state.tex_params.insert((texture, parameter), value);
            }
            None => state.errors.push_back(gl::INVALID_OPERATION),
        }
    }

    unsafe fn tex_image_2d(
        &self,
        _target: u32,
        _level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        _border: i32,
        _format: u32,
        _ty: u32,
        pixels: Option<&[u8]>,
    ) {
        let mut state = self.state.borrow_mut();
        match Self::bound_texture(&state) {
            Some(texture) => {
                let len = pixels.map_or(0, <[u8]>::len);
                state.tex_images.insert(texture, (width, height, len));
            }
            None => state.errors.push_back(gl::INVALID_OPERATION),
        }
    }

    unsafe fn generate_mipmap(&self, _target: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(texture) = Self::bound_texture(&state) {
            state.mipmapped.insert(texture);
        }
    }

    unsafe fn bind_framebuffer(&self, _target: u32, framebuffer: Option<u32>) {
        self.state.borrow_mut().framebuffer = framebuffer;
    }

    unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    unsafe fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().scissor = [x, y, width, height];
    }

    unsafe fn enable(&self, capability: u32) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    unsafe fn disable(&self, capability: u32) {
        self.state.borrow_mut().capabilities.remove(&capability);
    }

    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.state.borrow_mut().clear_color = [red, green, blue, alpha];
    }

    unsafe fn clear(&self, mask: u32) {
        self.state.borrow_mut().clears.push(mask);
    }

    unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, _offset: i32) {
        let mut state = self.state.borrow_mut();
        let uniforms = state
            .program
            .map(|program| {
                state
                    .uniforms_f2
                    .iter()
                    .filter(|((p, _), _)| *p == program)
                    .map(|(&(_, location), &value)| (location, value))
                    .collect()
            })
            .unwrap_or_default();
        let draw = DrawCall {
            mode,
            count,
            element_type,
            program: state.program,
            framebuffer: state.framebuffer,
            viewport: state.viewport,
            scissor: state
                .capabilities
                .contains(&gl::SCISSOR_TEST)
                .then_some(state.scissor),
            element_buffer: state.element_buffer,
            vertex_array: state.vertex_array,
            attrib_buffers: state.attrib_buffers.clone(),
            enabled_attribs: state.enabled_attribs.clone(),
            active_texture: state.active_texture,
            texture_unit0: state.texture_units.get(&gl::TEXTURE0).copied().flatten(),
            uniforms,
        };
        state.draws.push(draw);
    }

    unsafe fn get_error(&self) -> u32 {
        self.state
            .borrow_mut()
            .errors
            .pop_front()
            .unwrap_or(gl::NO_ERROR)
    }
}

thread_local! {
    static CAPTURED: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if record.level() > Level::Warn {
            return;
        }
        CAPTURED.with(|captured| {
            if let Some(lines) = captured.borrow_mut().as_mut() {
                lines.push(record.args().to_string());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Start capturing warnings and errors logged on this thread.
pub(crate) fn capture_logs() {
    INSTALL.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|captured| *captured.borrow_mut() = Some(Vec::new()));
}

/// Warnings and errors logged on this thread since the last call.
pub(crate) fn take_logs() -> Vec<String> {
    CAPTURED.with(|captured| {
        captured
            .borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    })
}
