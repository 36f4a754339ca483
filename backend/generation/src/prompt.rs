/// Style directive sent with every job: flat vector look, original motion.
pub const STYLE_PROMPT: &str = "\
Transform this video into a clean flat vector animation style — simple, plain, and minimal. \
Keep the exact same motion, camera movement, and timing from the original video. \
Replace all visual textures, lighting, and depth with flat colors and clean shapes, \
as if drawn in Adobe Illustrator or Figma.

Maintain smooth outlines, subtle line weight, and balanced proportions. \
The characters and objects should look hand-drawn yet digitally precise — no gradients, \
no shadows, no textures. Only solid pastel tones, consistent color palette, and vector-like surfaces.

The animation should feel like a living illustration: every movement stays natural and continuous, \
without visual noise or artificial effects. No particle effects, no glow, no 3D rendering — \
just pure vector motion.

Use clean framing and static backgrounds; emphasize simplicity and form clarity. \
Keep the visual tone elegant, soft, and emotionally calm.

Keywords: flat vector | minimalist | plain illustration | clean outlines | solid pastel | \
no shading | smooth motion | illustrator style | video-to-video | same timing | \
no cinematic effect | simple motion | living drawing";
