//! Drawing tools owned by control tags.
//!
//! A tool is the runtime helper that turns pointer input into shapes for its
//! control. Each control owns its tools exclusively (`Tool` is not `Clone`);
//! the tool refers back to the control by id only.

use log::debug;
use serde::Serialize;
use uuid::Uuid;

use super::attrs::Attrs;
use super::traits::ToolFactory;

/// Supported tool kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToolKind {
    Ellipse,
}

impl ToolKind {
    /// Key the tool is stored under on its control
    pub fn key(&self) -> &'static str {
        match self {
            ToolKind::Ellipse => "ellipse",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ToolKind::Ellipse => "Ellipse",
        }
    }
}

/// Parameters for [`ToolFactory::create_tool`].
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub kind: ToolKind,
    /// Shape currently being drawn, if any
    pub active_shape: Option<Uuid>,
    /// Style attributes copied from the owning control
    pub style: Attrs,
}

impl ToolConfig {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            active_shape: None,
            style: Attrs::new(),
        }
    }

    pub fn with_style(mut self, style: Attrs) -> Self {
        self.style = style;
        self
    }
}

/// Tool instance.
#[derive(Debug, Serialize)]
pub struct Tool {
    id: Uuid,
    kind: ToolKind,
    active_shape: Option<Uuid>,
    /// Back-reference to the owning control (non-owning)
    control: Option<Uuid>,
    style: Attrs,
}

impl Tool {
    pub fn new(config: ToolConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: config.kind,
            active_shape: config.active_shape,
            control: None,
            style: config.style,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn active_shape(&self) -> Option<Uuid> {
        self.active_shape
    }

    pub fn set_active_shape(&mut self, shape: Option<Uuid>) {
        self.active_shape = shape;
    }

    /// Id of the control this tool draws for
    pub fn control(&self) -> Option<Uuid> {
        self.control
    }

    pub fn set_control(&mut self, control: Uuid) {
        self.control = Some(control);
    }

    pub fn style(&self) -> &Attrs {
        &self.style
    }
}

/// Default tools subsystem: plain tool instances, no drawing backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTools;

impl ToolFactory for BuiltinTools {
    fn create_tool(&self, config: ToolConfig) -> Tool {
        let tool = Tool::new(config);
        debug!("Created {} tool {}", tool.kind().display_name(), tool.id());
        tool
    }
}
