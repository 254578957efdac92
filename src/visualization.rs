//! Named debug visualizations, one slot per category.
//!
//! Each category owns a dedicated [`ViewMode`]; only the slot whose mode is
//! active means anything when the view is rendered.

use crate::show_flags::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizationCategory {
    Buffer,
    Nanite,
    Lumen,
    Strata,
    Groom,
    VirtualShadowMap,
    RayTracingDebug,
    GpuSkinCache,
}

impl VisualizationCategory {
    pub const ALL: [VisualizationCategory; 8] = [
        VisualizationCategory::Buffer,
        VisualizationCategory::Nanite,
        VisualizationCategory::Lumen,
        VisualizationCategory::Strata,
        VisualizationCategory::Groom,
        VisualizationCategory::VirtualShadowMap,
        VisualizationCategory::RayTracingDebug,
        VisualizationCategory::GpuSkinCache,
    ];

    pub fn view_mode(self) -> ViewMode {
        match self {
            VisualizationCategory::Buffer => ViewMode::VisualizeBuffer,
            VisualizationCategory::Nanite => ViewMode::VisualizeNanite,
            VisualizationCategory::Lumen => ViewMode::VisualizeLumen,
            VisualizationCategory::Strata => ViewMode::VisualizeSubstrate,
            VisualizationCategory::Groom => ViewMode::VisualizeGroom,
            VisualizationCategory::VirtualShadowMap => ViewMode::VisualizeVirtualShadowMap,
            VisualizationCategory::RayTracingDebug => ViewMode::RayTracingDebug,
            VisualizationCategory::GpuSkinCache => ViewMode::VisualizeGpuSkinCache,
        }
    }

    pub fn for_view_mode(mode: ViewMode) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.view_mode() == mode)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Known modes as (name, display name). Names outside the catalog are
    /// shown verbatim.
    fn catalog(self) -> &'static [(&'static str, &'static str)] {
        match self {
            VisualizationCategory::Buffer => &[
                ("", "Overview"),
                ("BaseColor", "Base Color"),
                ("WorldNormal", "World Normal"),
                ("Roughness", "Roughness"),
                ("Metallic", "Metallic"),
                ("SceneDepth", "Scene Depth"),
                ("AmbientOcclusion", "Ambient Occlusion"),
            ],
            VisualizationCategory::Nanite => &[
                ("Triangles", "Triangles"),
                ("Clusters", "Clusters"),
                ("Overdraw", "Overdraw"),
                ("Overview", "Overview"),
            ],
            VisualizationCategory::Lumen => &[
                ("Overview", "Overview"),
                ("SurfaceCache", "Surface Cache"),
                ("GeometryNormals", "Geometry Normals"),
            ],
            VisualizationCategory::Strata => &[("MaterialCount", "Material Count"), ("Overview", "Overview")],
            VisualizationCategory::Groom => &[("Clusters", "Clusters"), ("LODColoration", "LOD Coloration")],
            VisualizationCategory::VirtualShadowMap => {
                &[("ShadowMask", "Shadow Mask"), ("CachedPage", "Cached Page"), ("VirtualPage", "Virtual Page")]
            }
            VisualizationCategory::RayTracingDebug => {
                &[("Barycentrics", "Barycentrics"), ("Instances", "Instances"), ("Triangles", "Triangles")]
            }
            VisualizationCategory::GpuSkinCache => {
                &[("Overview", "Overview"), ("Memory", "Memory"), ("RayTracingLODOffset", "Ray Tracing LOD Offset")]
            }
        }
    }

    pub fn display_name(self, name: &str) -> String {
        self.catalog()
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, display)| (*display).to_string())
            .unwrap_or_else(|| name.to_string())
    }
}

/// Selected mode name for each visualization category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualizationModes {
    slots: [String; 8],
}

impl VisualizationModes {
    pub fn get(&self, category: VisualizationCategory) -> &str {
        &self.slots[category.index()]
    }

    pub fn set(&mut self, category: VisualizationCategory, name: &str) {
        self.slots[category.index()] = name.to_string();
    }

    pub fn is_set(&self, category: VisualizationCategory) -> bool {
        !self.slots[category.index()].is_empty()
    }
}
