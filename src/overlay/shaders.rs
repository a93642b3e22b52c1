//! GLSL for the UI overlay, one vertex/fragment pair per dialect.
//!
//! Both pairs share the same interface:
//!
//! | Name          | Kind      | Type        | Description                         |
//! |---------------|-----------|-------------|-------------------------------------|
//! | `aPos`        | attribute | `vec2`      | Position in display coordinates     |
//! | `aUV`         | attribute | `vec2`      | Font-atlas coordinates              |
//! | `aColor`      | attribute | `vec4`      | Normalized RGBA8 vertex color       |
//! | `uProjection` | uniform   | `mat4`      | Display rectangle to clip space     |
//! | `uTexture`    | uniform   | `sampler2D` | Atlas (or user) texture on unit 0   |

use crate::platform::Dialect;

/// Vertex shader, desktop GL 4.6 core.
pub const VERTEX_GL46_SRC: &str = r"#version 460 core
layout(location = 0) in vec2 aPos;
layout(location = 1) in vec2 aUV;
layout(location = 2) in vec4 aColor;

uniform mat4 uProjection;

out vec2 vUV;
out vec4 vColor;

void main() {
    vUV = aUV;
    vColor = aColor;
    gl_Position = uProjection * vec4(aPos, 0.0, 1.0);
}
";

/// Fragment shader, desktop GL 4.6 core.
pub const FRAGMENT_GL46_SRC: &str = r"#version 460 core
in vec2 vUV;
in vec4 vColor;

uniform sampler2D uTexture;

out vec4 FragColor;

void main() {
    FragColor = vColor * texture(uTexture, vUV);
}
";

/// Vertex shader, GLSL ES 3.00.
pub const VERTEX_ES3_SRC: &str = r"#version 300 es
layout(location = 0) in vec2 aPos;
layout(location = 1) in vec2 aUV;
layout(location = 2) in vec4 aColor;

uniform mat4 uProjection;

out vec2 vUV;
out vec4 vColor;

void main() {
    vUV = aUV;
    vColor = aColor;
    gl_Position = uProjection * vec4(aPos, 0.0, 1.0);
}
";

/// Fragment shader, GLSL ES 3.00. ES has no default float precision in
/// fragment shaders, so it is declared here.
pub const FRAGMENT_ES3_SRC: &str = r"#version 300 es
precision mediump float;

in vec2 vUV;
in vec4 vColor;

uniform sampler2D uTexture;

out vec4 FragColor;

void main() {
    FragColor = vColor * texture(uTexture, vUV);
}
";

/// `(vertex, fragment)` sources for `dialect`.
#[must_use]
pub fn sources(dialect: Dialect) -> (&'static str, &'static str) {
    match dialect {
        Dialect::Desktop => (VERTEX_GL46_SRC, FRAGMENT_GL46_SRC),
        Dialect::Es3 => (VERTEX_ES3_SRC, FRAGMENT_ES3_SRC),
    }
}
