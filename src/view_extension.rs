use crate::ecs::WorldId;
use crate::view::{SceneView, SceneViewFamily};
use std::rc::Rc;

/// Context passed when deciding which extensions take part in a frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewExtensionContext {
    pub world: Option<WorldId>,
    pub stereo_enabled: bool,
}

/// Render feature hook. Both callbacks run synchronously in registration order.
pub trait ViewExtension {
    fn name(&self) -> &str;

    fn is_active(&self, _context: &ViewExtensionContext) -> bool {
        true
    }

    fn setup_view_family(&self, _family: &mut SceneViewFamily) {}

    fn setup_view(&self, _family: &SceneViewFamily, _view: &mut SceneView) {}
}

#[derive(Default, Clone)]
pub struct ViewExtensionRegistry {
    extensions: Vec<Rc<dyn ViewExtension>>,
}

impl ViewExtensionRegistry {
    pub fn register(&mut self, extension: Rc<dyn ViewExtension>) {
        log::debug!("[viewport] registered view extension '{}'", extension.name());
        self.extensions.push(extension);
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn gather_active(&self, context: &ViewExtensionContext) -> Vec<Rc<dyn ViewExtension>> {
        self.extensions.iter().filter(|extension| extension.is_active(context)).cloned().collect()
    }
}
