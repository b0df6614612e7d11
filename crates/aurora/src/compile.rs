use std::borrow::Cow;
use std::fmt;

use thiserror::Error;
use wgpu::naga;
use wgpu::naga::ShaderStage;

use crate::shading::{
    Band, BAND_HIGH, BAND_HIGHLIGHT, BAND_LOW, BAND_SECONDARY, BREATH_AMPLITUDE,
    BREATH_FREQUENCY, FLOW_DETAIL_AMPLITUDE, FLOW_DETAIL_FREQUENCY, FLOW_DETAIL_RATE,
    FLOW_DETAIL_SHEAR, FLOW_PRIMARY_AMPLITUDE, FLOW_PRIMARY_FREQUENCY, FLOW_PRIMARY_RATE, GAMMA,
    POINTER_PULL, ROTATION_AMPLITUDE, ROTATION_FREQUENCY, SWIRL_FALLOFF, SWIRL_STRENGTH,
    VIGNETTE_FLOOR, WEIGHT_HIGH, WEIGHT_HIGHLIGHT, WEIGHT_LOW, WEIGHT_SECONDARY,
};

/// Pipeline stage a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn naga(self) -> ShaderStage {
        match self {
            Stage::Vertex => ShaderStage::Vertex,
            Stage::Fragment => ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failure while turning GLSL into a usable pipeline.
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile:\n{diagnostics}")]
    Compile { stage: Stage, diagnostics: String },
    #[error("render pipeline failed to link: {0}")]
    Link(String),
}

/// Fullscreen triangle; `v_uv` has a bottom-left origin.
pub const FULLSCREEN_VERTEX: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

void main() {
    int index = gl_VertexIndex;
    vec2 pos = vec2(float((index << 1) & 2), float(index & 2)) * 2.0 - 1.0;
    v_uv = pos * 0.5 + vec2(0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Fullscreen triangle for sampling a texture with a top-left origin.
pub const BLIT_VERTEX: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

void main() {
    int index = gl_VertexIndex;
    vec2 pos = vec2(float((index << 1) & 2), float(index & 2)) * 2.0 - 1.0;
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

pub const BLIT_FRAGMENT: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

layout(set = 0, binding = 0) uniform texture2D source_texture;
layout(set = 0, binding = 1) uniform sampler source_sampler;

void main() {
    out_color = vec4(texture(sampler2D(source_texture, source_sampler), v_uv).rgb, 1.0);
}
";

/// Block layout shared with [`crate::uniforms::AuroraUniforms`].
const PARAMS_BLOCK: &str = r"layout(std140, set = 0, binding = 0) uniform AuroraParams {
    vec2 resolution;
    float time;
    float speed;
    vec2 pointer;
    vec2 _padding;
    vec4 primary;
    vec4 secondary;
    vec4 base;
} params;
";

/// Builds the aurora fragment shader with the pattern constants inlined.
pub fn aurora_fragment_source() -> String {
    format!(
        r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

{PARAMS_BLOCK}
vec2 rotate2(vec2 v, float a) {{
    float s = sin(a);
    float c = cos(a);
    return vec2(c * v.x - s * v.y, s * v.x + c * v.y);
}}

float band(float y, float center, float width) {{
    float z = (y - center) / width;
    return exp(-0.5 * z * z);
}}

void main() {{
    float aspect = params.resolution.x / max(params.resolution.y, 1.0);
    float t = params.time * params.speed;

    vec2 p = vec2((v_uv.x - 0.5) * aspect, v_uv.y - 0.5);
    p = rotate2(p, {rot_amp:?} * sin(t * {rot_freq:?}));

    vec2 m = vec2((params.pointer.x - 0.5) * aspect, params.pointer.y - 0.5);
    vec2 d = p - m;
    float r = length(d);
    p = m + rotate2(d, {swirl:?} * exp(-r * {falloff:?})) - m * {pull:?};

    vec2 q = p + {a1:?} * vec2(
        sin(p.y * {f1:?} + t * {r1x:?}),
        cos(p.x * {f1:?} - t * {r1y:?}));
    p = q + {a2:?} * vec2(
        sin(q.y * {f2x:?} - t * {r2x:?} + q.x * {shear:?}),
        cos(q.x * {f2y:?} + t * {r2y:?} - q.y * {shear:?}));

    float y = p.y + 0.5;
    float low = {low};
    float high = {high};
    float second = {second};
    float glow = {glow};

    vec3 col = params.base.rgb
        + params.primary.rgb * (low * {w_low:?} + high * {w_high:?})
        + params.secondary.rgb * second * {w_second:?}
        + vec3(1.0) * glow * {w_glow:?};

    float breath = 1.0 + {breath_amp:?} * sin(t * {breath_freq:?});
    float vignette = mix(1.0, {floor:?}, smoothstep(0.0, 1.0, length(v_uv - vec2(0.5)) * 1.4142135));

    col = pow(clamp(col * breath * vignette, 0.0, 1.0), vec3({gamma:?}));
    out_color = vec4(col, 1.0);
}}
",
        rot_amp = ROTATION_AMPLITUDE,
        rot_freq = ROTATION_FREQUENCY,
        swirl = SWIRL_STRENGTH,
        falloff = SWIRL_FALLOFF,
        pull = POINTER_PULL,
        a1 = FLOW_PRIMARY_AMPLITUDE,
        f1 = FLOW_PRIMARY_FREQUENCY,
        r1x = FLOW_PRIMARY_RATE[0],
        r1y = FLOW_PRIMARY_RATE[1],
        a2 = FLOW_DETAIL_AMPLITUDE,
        f2x = FLOW_DETAIL_FREQUENCY[0],
        f2y = FLOW_DETAIL_FREQUENCY[1],
        r2x = FLOW_DETAIL_RATE[0],
        r2y = FLOW_DETAIL_RATE[1],
        shear = FLOW_DETAIL_SHEAR,
        low = band_call(BAND_LOW),
        high = band_call(BAND_HIGH),
        second = band_call(BAND_SECONDARY),
        glow = band_call(BAND_HIGHLIGHT),
        w_low = WEIGHT_LOW,
        w_high = WEIGHT_HIGH,
        w_second = WEIGHT_SECONDARY,
        w_glow = WEIGHT_HIGHLIGHT,
        breath_amp = BREATH_AMPLITUDE,
        breath_freq = BREATH_FREQUENCY,
        floor = VIGNETTE_FLOOR,
        gamma = GAMMA,
    )
}

fn band_call(band: Band) -> String {
    format!("band(y, {:?}, {:?})", band.center, band.width)
}

/// Parses and validates GLSL with naga, returning the diagnostics as text.
///
/// wgpu only reports shader problems through its error callback, so running
/// the front-end up front is what gives callers a readable compile log.
pub fn validate_glsl(source: &str, stage: Stage) -> Result<(), ProgramError> {
    let options = naga::front::glsl::Options::from(stage.naga());
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, source)
        .map_err(|errors| ProgramError::Compile {
            stage,
            diagnostics: errors
                .errors
                .iter()
                .map(|error| error.kind.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|error| ProgramError::Compile {
        stage,
        diagnostics: error.to_string(),
    })?;
    Ok(())
}

/// Validates `source` and hands it to wgpu.
pub(crate) fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    source: Cow<'static, str>,
    stage: Stage,
) -> Result<wgpu::ShaderModule, ProgramError> {
    validate_glsl(&source, stage)?;
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: source,
            stage: stage.naga(),
            defines: &[],
        },
    }))
}
