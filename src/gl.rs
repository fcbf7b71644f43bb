//! The graphics-context handle the renderer draws through.
//!
//! [`GlApi`] is the subset of OpenGL (ES) 2.0 / 3.x entry points the
//! distortion pipeline needs. The renderer never touches a global context:
//! it holds an `Arc<G: GlApi>` and every operation goes through it, so the
//! footprint of each public operation on context state is exactly the calls
//! it makes here.
//!
//! With the `glow` feature, [`glow::Context`] implements this trait by
//! forwarding to [`glow::HasContext`].

use std::fmt::Debug;

pub use self::enums::*;

/// GL enum values, identical across GL ES 2.0 and desktop GL.
#[expect(missing_docs)]
mod enums {
    pub const VERTEX_SHADER: u32 = 0x8B31;
    pub const FRAGMENT_SHADER: u32 = 0x8B30;

    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
    pub const STATIC_DRAW: u32 = 0x88E4;

    pub const FLOAT: u32 = 0x1406;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const TRIANGLE_STRIP: u32 = 0x0005;

    pub const TEXTURE0: u32 = 0x84C0;
    pub const TEXTURE_2D: u32 = 0x0DE1;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const LINEAR: u32 = 0x2601;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const RGBA: u32 = 0x1908;

    pub const FRAMEBUFFER: u32 = 0x8D40;
    pub const SCISSOR_TEST: u32 = 0x0C11;
    pub const CULL_FACE: u32 = 0x0B44;
    pub const COLOR_BUFFER_BIT: u32 = 0x4000;
    pub const DEPTH_BUFFER_BIT: u32 = 0x0100;

    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const STACK_OVERFLOW: u32 = 0x0503;
    pub const STACK_UNDERFLOW: u32 = 0x0504;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;
    pub const CONTEXT_LOST: u32 = 0x0507;
}

/// OpenGL entry points used by the distortion renderer.
///
/// Method names and argument orders follow [`glow::HasContext`].
///
/// # Safety
///
/// Every `unsafe` method requires the implementing context to be current on
/// the calling thread, and handle arguments to have been created by the same
/// context.
#[expect(missing_docs, clippy::missing_safety_doc, clippy::too_many_arguments)]
pub trait GlApi {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug + PartialEq;
    type Texture: Copy + Debug;
    type Framebuffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type UniformLocation: Debug;

    /// Interpret a raw texture name. `0` means no texture.
    fn texture_from_raw(&self, raw: u64) -> Option<Self::Texture>;
    /// The raw name of a texture, for [`EyeTextureDescription`](crate::EyeTextureDescription).
    fn texture_to_raw(&self, texture: Self::Texture) -> u64;
    /// Interpret a raw framebuffer name. `0` means the default framebuffer.
    fn framebuffer_from_raw(&self, raw: u64) -> Option<Self::Framebuffer>;

    unsafe fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String>;
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn delete_shader(&self, shader: Self::Shader);

    unsafe fn create_program(&self) -> Result<Self::Program, String>;
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn use_program(&self, program: Option<Self::Program>);
    unsafe fn get_attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    unsafe fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    unsafe fn uniform_2_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32);

    unsafe fn create_buffer(&self) -> Result<Self::Buffer, String>;
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);
    unsafe fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    unsafe fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    unsafe fn enable_vertex_attrib_array(&self, index: u32);

    unsafe fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    unsafe fn create_texture(&self) -> Result<Self::Texture, String>;
    unsafe fn delete_texture(&self, texture: Self::Texture);
    unsafe fn active_texture(&self, unit: u32);
    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    unsafe fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    );
    unsafe fn generate_mipmap(&self, target: u32);

    unsafe fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>);
    unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    unsafe fn scissor(&self, x: i32, y: i32, width: i32, height: i32);
    unsafe fn enable(&self, capability: u32);
    unsafe fn disable(&self, capability: u32);
    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    unsafe fn clear(&self, mask: u32);
    unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);

    unsafe fn get_error(&self) -> u32;
}

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod glow_backend {
    use std::num::NonZeroU32;

    use glow::{HasContext, PixelUnpackData};

    use super::GlApi;

    fn native_name(raw: u64) -> Option<NonZeroU32> {
        u32::try_from(raw).ok().and_then(NonZeroU32::new)
    }

    impl GlApi for glow::Context {
        type Shader = glow::Shader;
        type Program = glow::Program;
        type Buffer = glow::Buffer;
        type Texture = glow::Texture;
        type Framebuffer = glow::Framebuffer;
        type VertexArray = glow::VertexArray;
        type UniformLocation = glow::UniformLocation;

        fn texture_from_raw(&self, raw: u64) -> Option<glow::Texture> {
            native_name(raw).map(glow::NativeTexture)
        }

        fn texture_to_raw(&self, texture: glow::Texture) -> u64 {
            u64::from(texture.0.get())
        }

        fn framebuffer_from_raw(&self, raw: u64) -> Option<glow::Framebuffer> {
            native_name(raw).map(glow::NativeFramebuffer)
        }

        unsafe fn create_shader(&self, shader_type: u32) -> Result<glow::Shader, String> {
            unsafe { HasContext::create_shader(self, shader_type) }
        }

        unsafe fn shader_source(&self, shader: glow::Shader, source: &str) {
            unsafe { HasContext::shader_source(self, shader, source) }
        }

        unsafe fn compile_shader(&self, shader: glow::Shader) {
            unsafe { HasContext::compile_shader(self, shader) }
        }

        unsafe fn get_shader_compile_status(&self, shader: glow::Shader) -> bool {
            unsafe { HasContext::get_shader_compile_status(self, shader) }
        }

        unsafe fn get_shader_info_log(&self, shader: glow::Shader) -> String {
            unsafe { HasContext::get_shader_info_log(self, shader) }
        }

        unsafe fn delete_shader(&self, shader: glow::Shader) {
            unsafe { HasContext::delete_shader(self, shader) }
        }

        unsafe fn create_program(&self) -> Result<glow::Program, String> {
            unsafe { HasContext::create_program(self) }
        }

        unsafe fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
            unsafe { HasContext::attach_shader(self, program, shader) }
        }

        unsafe fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
            unsafe { HasContext::detach_shader(self, program, shader) }
        }

        unsafe fn link_program(&self, program: glow::Program) {
            unsafe { HasContext::link_program(self, program) }
        }

        unsafe fn get_program_link_status(&self, program: glow::Program) -> bool {
            unsafe { HasContext::get_program_link_status(self, program) }
        }

        unsafe fn get_program_info_log(&self, program: glow::Program) -> String {
            unsafe { HasContext::get_program_info_log(self, program) }
        }

        unsafe fn delete_program(&self, program: glow::Program) {
            unsafe { HasContext::delete_program(self, program) }
        }

        unsafe fn use_program(&self, program: Option<glow::Program>) {
            unsafe { HasContext::use_program(self, program) }
        }

        unsafe fn get_attrib_location(&self, program: glow::Program, name: &str) -> Option<u32> {
            unsafe { HasContext::get_attrib_location(self, program, name) }
        }

        unsafe fn get_uniform_location(
            &self,
            program: glow::Program,
            name: &str,
        ) -> Option<glow::UniformLocation> {
            unsafe { HasContext::get_uniform_location(self, program, name) }
        }

        unsafe fn uniform_1_i32(&self, location: Option<&glow::UniformLocation>, x: i32) {
            unsafe { HasContext::uniform_1_i32(self, location, x) }
        }

        unsafe fn uniform_2_f32(&self, location: Option<&glow::UniformLocation>, x: f32, y: f32) {
            unsafe { HasContext::uniform_2_f32(self, location, x, y) }
        }

        unsafe fn create_buffer(&self) -> Result<glow::Buffer, String> {
            unsafe { HasContext::create_buffer(self) }
        }

        unsafe fn delete_buffer(&self, buffer: glow::Buffer) {
            unsafe { HasContext::delete_buffer(self, buffer) }
        }

        unsafe fn bind_buffer(&self, target: u32, buffer: Option<glow::Buffer>) {
            unsafe { HasContext::bind_buffer(self, target, buffer) }
        }

        unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
            unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
        }

        unsafe fn vertex_attrib_pointer_f32(
            &self,
            index: u32,
            size: i32,
            data_type: u32,
            normalized: bool,
            stride: i32,
            offset: i32,
        ) {
            unsafe {
                HasContext::vertex_attrib_pointer_f32(
                    self, index, size, data_type, normalized, stride, offset,
                );
            }
        }

        unsafe fn enable_vertex_attrib_array(&self, index: u32) {
            unsafe { HasContext::enable_vertex_attrib_array(self, index) }
        }

        unsafe fn create_vertex_array(&self) -> Result<glow::VertexArray, String> {
            unsafe { HasContext::create_vertex_array(self) }
        }

        unsafe fn bind_vertex_array(&self, vertex_array: Option<glow::VertexArray>) {
            unsafe { HasContext::bind_vertex_array(self, vertex_array) }
        }

        unsafe fn delete_vertex_array(&self, vertex_array: glow::VertexArray) {
            unsafe { HasContext::delete_vertex_array(self, vertex_array) }
        }

        unsafe fn create_texture(&self) -> Result<glow::Texture, String> {
            unsafe { HasContext::create_texture(self) }
        }

        unsafe fn delete_texture(&self, texture: glow::Texture) {
            unsafe { HasContext::delete_texture(self, texture) }
        }

        unsafe fn active_texture(&self, unit: u32) {
            unsafe { HasContext::active_texture(self, unit) }
        }

        unsafe fn bind_texture(&self, target: u32, texture: Option<glow::Texture>) {
            unsafe { HasContext::bind_texture(self, target, texture) }
        }

        unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
            unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
        }

        unsafe fn tex_image_2d(
            &self,
            target: u32,
            level: i32,
            internal_format: i32,
            width: i32,
            height: i32,
            border: i32,
            format: u32,
            ty: u32,
            pixels: Option<&[u8]>,
        ) {
            unsafe {
                HasContext::tex_image_2d(
                    self,
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    PixelUnpackData::Slice(pixels),
                );
            }
        }

        unsafe fn generate_mipmap(&self, target: u32) {
            unsafe { HasContext::generate_mipmap(self, target) }
        }

        unsafe fn bind_framebuffer(&self, target: u32, framebuffer: Option<glow::Framebuffer>) {
            unsafe { HasContext::bind_framebuffer(self, target, framebuffer) }
        }

        unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
            unsafe { HasContext::viewport(self, x, y, width, height) }
        }

        unsafe fn scissor(&self, x: i32, y: i32, width: i32, height: i32) {
            unsafe { HasContext::scissor(self, x, y, width, height) }
        }

        unsafe fn enable(&self, capability: u32) {
            unsafe { HasContext::enable(self, capability) }
        }

        unsafe fn disable(&self, capability: u32) {
            unsafe { HasContext::disable(self, capability) }
        }

        unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
            unsafe { HasContext::clear_color(self, red, green, blue, alpha) }
        }

        unsafe fn clear(&self, mask: u32) {
            unsafe { HasContext::clear(self, mask) }
        }

        unsafe fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
            unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
        }

        unsafe fn get_error(&self) -> u32 {
            unsafe { HasContext::get_error(self) }
        }
    }

}
