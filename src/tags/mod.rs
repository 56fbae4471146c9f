//! Concrete tags and their registration.
//!
//! | Tag | Type | Renders |
//! |-----|------|---------|
//! | `<View>` | `ViewModel` | container |
//! | `<Image>` | `ImageModel` | image |
//! | `<Labels>` / `<Label>` | `LabelsModel` / `LabelModel` | label list |
//! | `<Ellipse>` | `EllipseModel` | nothing |

pub mod ellipse;
pub mod image;
pub mod labels;
pub mod view;

use log::info;

use crate::core::registry::TagRegistry;
use crate::error::TagError;

/// Register every built-in tag. Any composition or duplicate-name error is a
/// startup failure.
pub fn register_all(registry: &TagRegistry) -> Result<(), TagError> {
    view::register(registry)?;
    image::register(registry)?;
    labels::register(registry)?;
    ellipse::register(registry)?;
    info!("Registered {} tags", registry.len());
    Ok(())
}
