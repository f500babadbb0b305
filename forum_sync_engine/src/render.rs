//! Rendering of match events into forum post bodies.
//!
//! The template is supplied by configuration and rendered with [`handlebars`] in strict mode: a template that refers to
//! a field the event does not have fails to render, rather than silently rendering an empty string. The template sees
//! the serialized [`MatchEvent`], i.e. `match_id`, `match_title` and everything under `payload`.
use handlebars::Handlebars;
use log::*;
use thiserror::Error;

use crate::events::MatchEvent;

const POST_TEMPLATE_NAME: &str = "forum_post";

/// Used when no template has been configured.
pub const DEFAULT_POST_TEMPLATE: &str = r#"<h3>{{match_title}}</h3>
<p>Match <strong>{{match_id}}</strong></p>
"#;

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("The post template is invalid. {0}")]
    InvalidTemplate(String),
    #[error("Could not render the post for match {match_id}. {reason}")]
    RenderFailed { match_id: String, reason: String },
}

/// Turns a match event into the HTML body of the match's forum post.
pub trait PostRenderer {
    fn render(&self, event: &MatchEvent) -> Result<String, RenderError>;
}

pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new(template: &str) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(POST_TEMPLATE_NAME, template)
            .map_err(|e| RenderError::InvalidTemplate(e.to_string()))?;
        Ok(Self { registry })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        if let Err(e) = registry.register_template_string(POST_TEMPLATE_NAME, DEFAULT_POST_TEMPLATE) {
            error!("🎨️ The default post template does not compile: {e}");
        }
        Self { registry }
    }
}

impl PostRenderer for TemplateRenderer {
    fn render(&self, event: &MatchEvent) -> Result<String, RenderError> {
        let body = self.registry.render(POST_TEMPLATE_NAME, event).map_err(|e| RenderError::RenderFailed {
            match_id: event.match_id.to_string(),
            reason: e.to_string(),
        })?;
        trace!("🎨️ Rendered post for match {}: {body}", event.match_id);
        Ok(body)
    }
}
