use bitflags::bitflags;
use std::fmt;

/// Shading mode a viewport renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    BrushWireframe,
    Wireframe,
    Unlit,
    Lit,
    LitDetailLighting,
    LightingOnly,
    LightComplexity,
    ShaderComplexity,
    LightmapDensity,
    LitLightmapDensity,
    ReflectionOverride,
    VisualizeBuffer,
    StationaryLightOverlap,
    CollisionPawn,
    CollisionVisibility,
    LodColoration,
    PrimitiveDistanceAccuracy,
    MeshUvDensityAccuracy,
    HlodColoration,
    GroupLodColoration,
    VisualizeNanite,
    VisualizeLumen,
    VisualizeSubstrate,
    VisualizeGroom,
    VisualizeVirtualShadowMap,
    RayTracingDebug,
    PathTracing,
    VisualizeGpuSkinCache,
}

impl ViewMode {
    pub const ALL: [ViewMode; 28] = [
        ViewMode::BrushWireframe,
        ViewMode::Wireframe,
        ViewMode::Unlit,
        ViewMode::Lit,
        ViewMode::LitDetailLighting,
        ViewMode::LightingOnly,
        ViewMode::LightComplexity,
        ViewMode::ShaderComplexity,
        ViewMode::LightmapDensity,
        ViewMode::LitLightmapDensity,
        ViewMode::ReflectionOverride,
        ViewMode::VisualizeBuffer,
        ViewMode::StationaryLightOverlap,
        ViewMode::CollisionPawn,
        ViewMode::CollisionVisibility,
        ViewMode::LodColoration,
        ViewMode::PrimitiveDistanceAccuracy,
        ViewMode::MeshUvDensityAccuracy,
        ViewMode::HlodColoration,
        ViewMode::GroupLodColoration,
        ViewMode::VisualizeNanite,
        ViewMode::VisualizeLumen,
        ViewMode::VisualizeSubstrate,
        ViewMode::VisualizeGroom,
        ViewMode::VisualizeVirtualShadowMap,
        ViewMode::RayTracingDebug,
        ViewMode::PathTracing,
        ViewMode::VisualizeGpuSkinCache,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::BrushWireframe => "Brush Wireframe",
            ViewMode::Wireframe => "Wireframe",
            ViewMode::Unlit => "Unlit",
            ViewMode::Lit => "Lit",
            ViewMode::LitDetailLighting => "Detail Lighting",
            ViewMode::LightingOnly => "Lighting Only",
            ViewMode::LightComplexity => "Light Complexity",
            ViewMode::ShaderComplexity => "Shader Complexity",
            ViewMode::LightmapDensity => "Lightmap Density",
            ViewMode::LitLightmapDensity => "Lit Lightmap Density",
            ViewMode::ReflectionOverride => "Reflections",
            ViewMode::VisualizeBuffer => "Buffer Visualization",
            ViewMode::StationaryLightOverlap => "Stationary Light Overlap",
            ViewMode::CollisionPawn => "Player Collision",
            ViewMode::CollisionVisibility => "Visibility Collision",
            ViewMode::LodColoration => "Mesh LOD Coloration",
            ViewMode::PrimitiveDistanceAccuracy => "Primitive Distance Accuracy",
            ViewMode::MeshUvDensityAccuracy => "Mesh UV Density Accuracy",
            ViewMode::HlodColoration => "Hierarchical LOD Coloration",
            ViewMode::GroupLodColoration => "Group LOD Coloration",
            ViewMode::VisualizeNanite => "Nanite Visualization",
            ViewMode::VisualizeLumen => "Lumen Visualization",
            ViewMode::VisualizeSubstrate => "Substrate Visualization",
            ViewMode::VisualizeGroom => "Groom Visualization",
            ViewMode::VisualizeVirtualShadowMap => "Virtual Shadow Map Visualization",
            ViewMode::RayTracingDebug => "Ray Tracing Debug",
            ViewMode::PathTracing => "Path Tracing",
            ViewMode::VisualizeGpuSkinCache => "GPU Skin Cache Visualization",
        }
    }

    pub fn is_wireframe(self) -> bool {
        matches!(self, ViewMode::BrushWireframe | ViewMode::Wireframe)
    }

    /// Modes whose output is a debug encoding that cannot be resampled by a
    /// reduced render resolution.
    pub fn supports_resolution_fraction(self) -> bool {
        !matches!(
            self,
            ViewMode::BrushWireframe
                | ViewMode::Wireframe
                | ViewMode::LightComplexity
                | ViewMode::LightmapDensity
                | ViewMode::LitLightmapDensity
                | ViewMode::ReflectionOverride
                | ViewMode::StationaryLightOverlap
                | ViewMode::CollisionPawn
                | ViewMode::CollisionVisibility
                | ViewMode::LodColoration
                | ViewMode::PrimitiveDistanceAccuracy
                | ViewMode::MeshUvDensityAccuracy
                | ViewMode::HlodColoration
                | ViewMode::GroupLodColoration
                | ViewMode::VisualizeGpuSkinCache
        )
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShowFlags: u64 {
        const GAME = 1 << 0;
        const LIGHTING = 1 << 1;
        const POST_PROCESSING = 1 << 2;
        const TONEMAPPER = 1 << 3;
        const MATERIALS = 1 << 4;
        const DIFFUSE = 1 << 5;
        const SPECULAR = 1 << 6;
        const WIREFRAME = 1 << 7;
        const OVERRIDE_DIFFUSE_AND_SPECULAR = 1 << 8;
        const LIGHTING_ONLY_OVERRIDE = 1 << 9;
        const REFLECTION_OVERRIDE = 1 << 10;
        const CAMERA_INTERPOLATION = 1 << 11;
        const SCREEN_PERCENTAGE = 1 << 12;
        const CAMERA_ASPECT_RATIO_BARS = 1 << 13;
        const CAMERA_SAFE_FRAMES = 1 << 14;
        const COMPOSITE_EDITOR_PRIMITIVES = 1 << 15;
        const MODE_WIDGETS = 1 << 16;
        const SELECTION = 1 << 17;
        const SELECTION_OUTLINE = 1 << 18;
        const GRID = 1 << 19;
        const FOG = 1 << 20;
        const ATMOSPHERE = 1 << 21;
        const MOTION_BLUR = 1 << 22;
        const DEPTH_OF_FIELD = 1 << 23;
        const BLOOM = 1 << 24;
        const LENS_FLARES = 1 << 25;
        const EYE_ADAPTATION = 1 << 26;
        const AMBIENT_OCCLUSION = 1 << 27;
        const TEMPORAL_AA = 1 << 28;
        const ANTI_ALIASING = 1 << 29;
        const DYNAMIC_SHADOWS = 1 << 30;
        const SKY_LIGHTING = 1 << 31;
        const REFLECTION_ENVIRONMENT = 1 << 32;
        const LIGHT_COMPLEXITY = 1 << 33;
        const SHADER_COMPLEXITY = 1 << 34;
        const LIGHTMAP_DENSITY = 1 << 35;
        const STATIONARY_LIGHT_OVERLAP = 1 << 36;
        const COLLISION = 1 << 37;
        const LOD_COLORATION = 1 << 38;
        const VISUALIZE_BUFFER = 1 << 39;
        const VISUALIZE_NANITE = 1 << 40;
        const VISUALIZE_LUMEN = 1 << 41;
        const VISUALIZE_SUBSTRATE = 1 << 42;
        const VISUALIZE_GROOM = 1 << 43;
        const VISUALIZE_VIRTUAL_SHADOW_MAP = 1 << 44;
        const RAY_TRACING_DEBUG = 1 << 45;
        const PATH_TRACING = 1 << 46;
        const VISUALIZE_GPU_SKIN_CACHE = 1 << 47;
        const VISUALIZE_CALIBRATION_COLOR = 1 << 48;
        const VISUALIZE_CALIBRATION_GRAYSCALE = 1 << 49;
        const VISUALIZE_CALIBRATION_CUSTOM = 1 << 50;
        const SNAP = 1 << 51;
        const PRIMITIVE_DISTANCE_ACCURACY = 1 << 52;
        const MESH_UV_DENSITY_ACCURACY = 1 << 53;
        const HLOD_COLORATION = 1 << 54;

        const VISUALIZATIONS = Self::LIGHT_COMPLEXITY.bits()
            | Self::SHADER_COMPLEXITY.bits()
            | Self::LIGHTMAP_DENSITY.bits()
            | Self::STATIONARY_LIGHT_OVERLAP.bits()
            | Self::COLLISION.bits()
            | Self::LOD_COLORATION.bits()
            | Self::VISUALIZE_BUFFER.bits()
            | Self::VISUALIZE_NANITE.bits()
            | Self::VISUALIZE_LUMEN.bits()
            | Self::VISUALIZE_SUBSTRATE.bits()
            | Self::VISUALIZE_GROOM.bits()
            | Self::VISUALIZE_VIRTUAL_SHADOW_MAP.bits()
            | Self::RAY_TRACING_DEBUG.bits()
            | Self::PATH_TRACING.bits()
            | Self::VISUALIZE_GPU_SKIN_CACHE.bits()
            | Self::PRIMITIVE_DISTANCE_ACCURACY.bits()
            | Self::MESH_UV_DENSITY_ACCURACY.bits()
            | Self::HLOD_COLORATION.bits();

        const EDITOR_ONLY = Self::COMPOSITE_EDITOR_PRIMITIVES.bits()
            | Self::MODE_WIDGETS.bits()
            | Self::SELECTION.bits()
            | Self::SELECTION_OUTLINE.bits()
            | Self::GRID.bits()
            | Self::SNAP.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFlagInitMode {
    Editor,
    Game,
}

impl ShowFlags {
    const RENDERING: ShowFlags = ShowFlags::LIGHTING
        .union(ShowFlags::POST_PROCESSING)
        .union(ShowFlags::TONEMAPPER)
        .union(ShowFlags::MATERIALS)
        .union(ShowFlags::DIFFUSE)
        .union(ShowFlags::SPECULAR)
        .union(ShowFlags::FOG)
        .union(ShowFlags::ATMOSPHERE)
        .union(ShowFlags::MOTION_BLUR)
        .union(ShowFlags::DEPTH_OF_FIELD)
        .union(ShowFlags::BLOOM)
        .union(ShowFlags::LENS_FLARES)
        .union(ShowFlags::EYE_ADAPTATION)
        .union(ShowFlags::AMBIENT_OCCLUSION)
        .union(ShowFlags::TEMPORAL_AA)
        .union(ShowFlags::ANTI_ALIASING)
        .union(ShowFlags::DYNAMIC_SHADOWS)
        .union(ShowFlags::SKY_LIGHTING)
        .union(ShowFlags::REFLECTION_ENVIRONMENT)
        .union(ShowFlags::CAMERA_INTERPOLATION)
        .union(ShowFlags::SCREEN_PERCENTAGE);

    /// Default flag set for an editor viewport or an in-game view.
    pub fn for_mode(mode: ShowFlagInitMode) -> Self {
        match mode {
            ShowFlagInitMode::Editor => Self::RENDERING | Self::EDITOR_ONLY,
            ShowFlagInitMode::Game => Self::RENDERING | Self::GAME,
        }
    }

    pub fn any_calibration_material(self) -> bool {
        self.intersects(
            ShowFlags::VISUALIZE_CALIBRATION_COLOR
                | ShowFlags::VISUALIZE_CALIBRATION_GRAYSCALE
                | ShowFlags::VISUALIZE_CALIBRATION_CUSTOM,
        )
    }
}

/// Rewrites the flags that a view mode owns so that exactly that mode's
/// visualization is enabled.
pub fn apply_view_mode(mode: ViewMode, perspective: bool, flags: &mut ShowFlags) {
    let wireframe = mode.is_wireframe();
    let unlit = matches!(
        mode,
        ViewMode::BrushWireframe
            | ViewMode::Wireframe
            | ViewMode::Unlit
            | ViewMode::LightmapDensity
            | ViewMode::LodColoration
            | ViewMode::HlodColoration
            | ViewMode::GroupLodColoration
            | ViewMode::CollisionPawn
            | ViewMode::CollisionVisibility
            | ViewMode::PrimitiveDistanceAccuracy
            | ViewMode::MeshUvDensityAccuracy
    );

    flags.set(ShowFlags::POST_PROCESSING, !wireframe);
    flags.set(ShowFlags::WIREFRAME, wireframe);
    flags.set(ShowFlags::LIGHTING, !unlit);
    flags.set(ShowFlags::OVERRIDE_DIFFUSE_AND_SPECULAR, mode == ViewMode::LitDetailLighting);
    flags.set(ShowFlags::LIGHTING_ONLY_OVERRIDE, mode == ViewMode::LightingOnly);
    flags.set(ShowFlags::REFLECTION_OVERRIDE, mode == ViewMode::ReflectionOverride);

    flags.remove(ShowFlags::VISUALIZATIONS);
    let visualization = match mode {
        ViewMode::LightComplexity => ShowFlags::LIGHT_COMPLEXITY,
        ViewMode::ShaderComplexity => ShowFlags::SHADER_COMPLEXITY,
        ViewMode::LightmapDensity | ViewMode::LitLightmapDensity => ShowFlags::LIGHTMAP_DENSITY,
        ViewMode::StationaryLightOverlap => ShowFlags::STATIONARY_LIGHT_OVERLAP,
        ViewMode::CollisionPawn | ViewMode::CollisionVisibility => ShowFlags::COLLISION,
        ViewMode::LodColoration | ViewMode::GroupLodColoration => ShowFlags::LOD_COLORATION,
        ViewMode::HlodColoration => ShowFlags::HLOD_COLORATION,
        ViewMode::PrimitiveDistanceAccuracy => ShowFlags::PRIMITIVE_DISTANCE_ACCURACY,
        ViewMode::MeshUvDensityAccuracy => ShowFlags::MESH_UV_DENSITY_ACCURACY,
        ViewMode::VisualizeBuffer => ShowFlags::VISUALIZE_BUFFER,
        ViewMode::VisualizeNanite => ShowFlags::VISUALIZE_NANITE,
        ViewMode::VisualizeLumen => ShowFlags::VISUALIZE_LUMEN,
        ViewMode::VisualizeSubstrate => ShowFlags::VISUALIZE_SUBSTRATE,
        ViewMode::VisualizeGroom => ShowFlags::VISUALIZE_GROOM,
        ViewMode::VisualizeVirtualShadowMap => ShowFlags::VISUALIZE_VIRTUAL_SHADOW_MAP,
        ViewMode::RayTracingDebug => ShowFlags::RAY_TRACING_DEBUG,
        ViewMode::PathTracing => ShowFlags::PATH_TRACING,
        ViewMode::VisualizeGpuSkinCache => ShowFlags::VISUALIZE_GPU_SKIN_CACHE,
        _ => ShowFlags::empty(),
    };
    flags.insert(visualization);

    if !perspective && wireframe {
        flags.remove(ShowFlags::FOG | ShowFlags::ATMOSPHERE);
    }
}

/// Switches off features that are meaningless under the active view mode.
pub fn apply_editor_overrides(mode: ViewMode, flags: &mut ShowFlags, can_disable_tonemapper: bool) {
    if mode.is_wireframe() {
        flags.remove(
            ShowFlags::BLOOM
                | ShowFlags::LENS_FLARES
                | ShowFlags::EYE_ADAPTATION
                | ShowFlags::AMBIENT_OCCLUSION
                | ShowFlags::MOTION_BLUR
                | ShowFlags::DEPTH_OF_FIELD,
        );
    }
    if !flags.contains(ShowFlags::LIGHTING) {
        flags.remove(ShowFlags::DYNAMIC_SHADOWS | ShowFlags::SKY_LIGHTING | ShowFlags::REFLECTION_ENVIRONMENT);
    }
    if flags.intersects(ShowFlags::VISUALIZATIONS) {
        flags.remove(ShowFlags::MOTION_BLUR | ShowFlags::TEMPORAL_AA);
    }
    if can_disable_tonemapper {
        flags.remove(ShowFlags::TONEMAPPER | ShowFlags::EYE_ADAPTATION);
    }
}

/// Features that do not work with a parallel projection.
pub fn apply_orthographic_overrides(perspective: bool, flags: &mut ShowFlags) {
    if !perspective {
        flags.remove(
            ShowFlags::MOTION_BLUR
                | ShowFlags::DEPTH_OF_FIELD
                | ShowFlags::LENS_FLARES
                | ShowFlags::FOG
                | ShowFlags::AMBIENT_OCCLUSION,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_a_visualization_clears_the_previous_one() {
        let mut flags = ShowFlags::for_mode(ShowFlagInitMode::Editor);
        apply_view_mode(ViewMode::VisualizeBuffer, true, &mut flags);
        assert!(flags.contains(ShowFlags::VISUALIZE_BUFFER));
        apply_view_mode(ViewMode::VisualizeNanite, true, &mut flags);
        assert!(flags.contains(ShowFlags::VISUALIZE_NANITE));
        assert!(!flags.contains(ShowFlags::VISUALIZE_BUFFER));
    }

    #[test]
    fn wireframe_disables_lighting_and_post() {
        let mut flags = ShowFlags::for_mode(ShowFlagInitMode::Editor);
        apply_view_mode(ViewMode::Wireframe, true, &mut flags);
        assert!(flags.contains(ShowFlags::WIREFRAME));
        assert!(!flags.contains(ShowFlags::LIGHTING));
        assert!(!flags.contains(ShowFlags::POST_PROCESSING));
        apply_view_mode(ViewMode::Lit, true, &mut flags);
        assert!(flags.contains(ShowFlags::LIGHTING));
        assert!(!flags.contains(ShowFlags::WIREFRAME));
    }

    #[test]
    fn game_defaults_exclude_editor_primitives() {
        let game = ShowFlags::for_mode(ShowFlagInitMode::Game);
        assert!(game.contains(ShowFlags::GAME));
        assert!(!game.intersects(ShowFlags::EDITOR_ONLY));
        let editor = ShowFlags::for_mode(ShowFlagInitMode::Editor);
        assert!(!editor.contains(ShowFlags::GAME));
        assert!(editor.contains(ShowFlags::SELECTION));
    }

    #[test]
    fn tonemapper_override_only_when_allowed() {
        let mut flags = ShowFlags::for_mode(ShowFlagInitMode::Editor);
        apply_editor_overrides(ViewMode::VisualizeBuffer, &mut flags, false);
        assert!(flags.contains(ShowFlags::TONEMAPPER));
        apply_editor_overrides(ViewMode::VisualizeBuffer, &mut flags, true);
        assert!(!flags.contains(ShowFlags::TONEMAPPER));
    }

    #[test]
    fn skin_cache_visualization_rejects_resolution_fraction() {
        assert!(!ViewMode::VisualizeGpuSkinCache.supports_resolution_fraction());
        assert!(ViewMode::Lit.supports_resolution_fraction());
        assert!(ViewMode::VisualizeNanite.supports_resolution_fraction());
    }
}
